use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub addressid: String,
    pub cpf: String,
    pub email: String,
    pub fullname: String,
}
