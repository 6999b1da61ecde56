pub mod customer;
pub mod inventory_item;
