use crate::{
    data::{customer::Customer, inventory_item::InventoryItem},
    error::Error,
    hypothetical_requests::{self, UpstreamResponse},
};
use serde::de::DeserializeOwned;
use std::env;
type ReqwestClient = reqwest::blocking::Client;

const DEFAULT_INVENTORY_URL: &str = "http://mm-inventory:5704";
const DEFAULT_CUSTOMER_URL: &str = "http://mm-customer:5701";

/// Builder used to build a CartUpstreamClient instance
#[derive(Debug, Clone, Default)]
pub struct CartUpstreamClientBuilder {
    inventory_url: Option<String>,
    customer_url: Option<String>,
    http_client: Option<ReqwestClient>,
}

impl CartUpstreamClientBuilder {
    /// Create a new CartUpstreamClientBuilder instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given base URL for the inventory service.
    ///
    /// # Arguments
    /// `inventory_url` - scheme, host and port of `mm-inventory`, without a trailing path.
    ///
    /// # Returns
    /// This builder.
    pub fn with_inventory_url<T: Into<String>>(mut self, inventory_url: T) -> Self {
        self.inventory_url = Some(inventory_url.into());
        self
    }

    /// Use the given base URL for the customer service.
    ///
    /// # Arguments
    /// `customer_url` - scheme, host and port of `mm-customer`, without a trailing path.
    ///
    /// # Returns
    /// This builder.
    pub fn with_customer_url<T: Into<String>>(mut self, customer_url: T) -> Self {
        self.customer_url = Some(customer_url.into());
        self
    }

    /// Use the given blocking reqwest client when building a CartUpstreamClient instance.
    pub fn with_http_client(mut self, client: ReqwestClient) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Consume the builder and create a CartUpstreamClient. URLs that weren't set come from
    /// `MM_INVENTORY_URL` and `MM_CUSTOMER_URL`, then from the service defaults.
    pub fn build(mut self) -> CartUpstreamClient {
        CartUpstreamClient {
            http: self.http_client.take().unwrap_or_default(),
            inventory_url: Self::resolve(
                self.inventory_url.take(),
                "MM_INVENTORY_URL",
                DEFAULT_INVENTORY_URL,
            ),
            customer_url: Self::resolve(
                self.customer_url.take(),
                "MM_CUSTOMER_URL",
                DEFAULT_CUSTOMER_URL,
            ),
        }
    }

    fn resolve(explicit: Option<String>, variable: &str, default: &str) -> String {
        let url = explicit
            .or_else(|| env::var(variable).ok())
            .unwrap_or_else(|| String::from(default));

        url.trim_end_matches('/').to_string()
    }
}

/// The shopping cart's view of `mm-inventory` and `mm-customer`.
#[derive(Debug, Clone)]
pub struct CartUpstreamClient {
    http: ReqwestClient,
    inventory_url: String,
    customer_url: String,
}

impl CartUpstreamClient {
    pub fn new() -> Self {
        CartUpstreamClientBuilder::new().build()
    }

    pub fn inventory_url(&self) -> &str {
        &self.inventory_url
    }

    pub fn customer_url(&self) -> &str {
        &self.customer_url
    }

    pub fn get_inventory_item(&self, product_item_id: u64) -> UpstreamResponse {
        let url = format!("{}/mm-inventory/{}", self.inventory_url, product_item_id);
        hypothetical_requests::get_with(&self.http, &url)
    }

    pub fn get_customer<T: AsRef<str>>(&self, cpf: T) -> UpstreamResponse {
        let url = format!("{}/customers/{}", self.customer_url, cpf.as_ref());
        hypothetical_requests::get_with(&self.http, &url)
    }

    pub fn inventory_item(&self, product_item_id: u64) -> Result<InventoryItem, Error> {
        Self::parse(
            self.get_inventory_item(product_item_id),
            "inventory item",
            product_item_id.to_string(),
        )
    }

    pub fn customer<T: AsRef<str>>(&self, cpf: T) -> Result<Customer, Error> {
        Self::parse(self.get_customer(cpf.as_ref()), "customer", cpf.as_ref().into())
    }

    /// The unit price of an item, or zero when the inventory can't provide one.
    pub fn item_price(&self, product_item_id: u64) -> f64 {
        let response = self.get_inventory_item(product_item_id);
        if response.status != 200 {
            return 0.0;
        }

        response
            .data
            .get("price")
            .and_then(|price| price.as_f64())
            .unwrap_or(0.0)
    }

    /// Whether the inventory holds at least `quantity` units of the item.
    pub fn has_stock(&self, product_item_id: u64, quantity: u32) -> Result<bool, Error> {
        Ok(self.inventory_item(product_item_id)?.stock >= quantity)
    }

    fn parse<T: DeserializeOwned>(
        response: UpstreamResponse,
        resource: &'static str,
        id: String,
    ) -> Result<T, Error> {
        match response.status {
            200 => Ok(serde_json::from_value(response.data)?),
            404 => Err(Error::NotFound { resource, id }),
            status => Err(Error::UnexpectedStatus {
                status,
                data: response.data,
            }),
        }
    }
}

impl Default for CartUpstreamClient {
    fn default() -> Self {
        Self::new()
    }
}
