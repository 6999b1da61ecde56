mod cart_upstream_client;
mod data;
mod error;

pub mod hypothetical_requests;
pub mod providers;

pub use cart_upstream_client::{CartUpstreamClient, CartUpstreamClientBuilder};
pub use data::{customer::Customer, inventory_item::InventoryItem};
pub use error::Error;
pub use hypothetical_requests::UpstreamResponse;
