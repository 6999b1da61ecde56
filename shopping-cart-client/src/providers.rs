//! Mock provider setups and the interactions the cart expects from its upstream services.

use pact_mock::{
    Interaction, Matcher, MockProviderConfiguration, RequestMatcher, ResponseTemplate, WriteMode,
};
use serde_json::json;

pub const CONSUMER: &str = "mm-shopping-cart";
pub const INVENTORY_PROVIDER: &str = "mm-inventory";
pub const CUSTOMER_PROVIDER: &str = "mm-customer";

pub fn inventory_provider(config: &mut MockProviderConfiguration) {
    configure(config, INVENTORY_PROVIDER);
}

pub fn customer_provider(config: &mut MockProviderConfiguration) {
    configure(config, CUSTOMER_PROVIDER);
}

// Several tests share a provider, so each one merges its interactions into the same contract.
fn configure(config: &mut MockProviderConfiguration, provider: &str) {
    config.set_consumer(CONSUMER);
    config.set_provider(provider);
    config.set_pact_dir("pacts");
    config.set_log_file("logs/pact.log");
    config.set_log_level("DEBUG");
    config.set_write_mode(WriteMode::Merge);
}

pub fn inventory_item_details() -> Interaction {
    Interaction::new("a request for inventory item details")
        .given("it has inventory item details")
        .with_request(
            RequestMatcher::get("/mm-inventory/1").with_header("Accept", "application/json"),
        )
        .will_respond_with(
            ResponseTemplate::new(200)
                .with_header("Content-Type", "application/json")
                .with_body(Matcher::like(json!({
                    "id": 1,
                    "productid": 36,
                    "storeid": 34,
                    "price": 6,
                    "stock": 10
                }))),
        )
}

pub fn missing_inventory_item() -> Interaction {
    Interaction::new("a request for an inventory item that doesn't exist")
        .given("it has no inventory item 2")
        .with_request(
            RequestMatcher::get("/mm-inventory/2").with_header("Accept", "application/json"),
        )
        .will_respond_with(
            ResponseTemplate::new(404)
                .with_header("Content-Type", "application/json")
                .with_body(Matcher::like(json!({ "message": "Inventory item not found" }))),
        )
}

pub fn customer_details() -> Interaction {
    Interaction::new("a request for customer details")
        .given("it has a customer with cpf 11111111111")
        .with_request(
            RequestMatcher::get("/customers/11111111111").with_header("Accept", "application/json"),
        )
        .will_respond_with(
            ResponseTemplate::new(200)
                .with_header("Content-Type", "application/json")
                .with_body(Matcher::like(json!({
                    "addressid": "14",
                    "cpf": "11111111111",
                    "email": "r@r.com",
                    "fullname": "Rodrigo Alves Costa"
                }))),
        )
}
