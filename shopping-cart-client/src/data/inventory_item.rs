use serde::{Deserialize, Serialize};

/// A stocked product as `mm-inventory` reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: u64,
    pub productid: u64,
    pub storeid: u64,
    pub price: f64,
    pub stock: u32,
}
