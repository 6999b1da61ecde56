//! The portable contract document ("pact") written at the end of a session.
//!
//! Documents follow the Pact v2 layout: every interaction carries the example request and
//! response plus the matching rules that loosen them. Serialization is deterministic, so an
//! unchanged session always produces the same bytes.

mod difference;

pub use difference::ContractDifference;

use crate::{error::Error, interaction::Interaction};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const PACT_SPECIFICATION_VERSION: &str = "2.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pacticipant {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractDocument {
    pub consumer: Pacticipant,
    pub provider: Pacticipant,
    pub interactions: Vec<ContractInteraction>,
    pub metadata: ContractMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractMetadata {
    pub pact_specification: PactSpecification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PactSpecification {
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInteraction {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_state: Option<String>,
    pub request: ContractRequest,
    pub response: ContractResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRequest {
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub matching_rules: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractResponse {
    pub status: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub matching_rules: BTreeMap<String, Value>,
}

type SortKey = (String, Option<String>, String, String);

impl ContractInteraction {
    /// Description followed by the request identity. A regex path is identified by its
    /// pattern, as the registry does.
    fn sort_key(&self) -> SortKey {
        let path = self
            .request
            .matching_rules
            .get("$.path")
            .and_then(|rule| rule.get("regex"))
            .and_then(Value::as_str)
            .map_or_else(|| self.request.path.clone(), String::from);

        (
            self.description.clone(),
            self.provider_state.clone(),
            self.request.method.clone(),
            path,
        )
    }
}

fn interaction_sort_key(interaction: &Interaction) -> SortKey {
    let key = interaction.key();
    (
        interaction.description().into(),
        key.provider_state,
        key.method,
        key.path,
    )
}

impl From<&Interaction> for ContractInteraction {
    fn from(interaction: &Interaction) -> Self {
        let request = interaction.request();
        let response = interaction.response();

        let mut request_rules = BTreeMap::new();
        request.path().matching_rules("$.path", &mut request_rules);

        let query = if request.query().is_empty() {
            None
        } else {
            let mut serializer = url::form_urlencoded::Serializer::new(String::new());
            for (name, matcher) in request.query() {
                serializer.append_pair(name, &matcher.example_text());
                matcher.matching_rules(&format!("$.query.{}", name), &mut request_rules);
            }
            Some(serializer.finish())
        };

        let mut request_headers = BTreeMap::new();
        for (name, matcher) in request.headers() {
            request_headers.insert(name.clone(), matcher.example_text());
            matcher.matching_rules(&format!("$.headers.{}", name), &mut request_rules);
        }

        if let Some(body) = request.body() {
            body.matching_rules("$.body", &mut request_rules);
        }

        let rendered = response.render();
        let mut response_rules = BTreeMap::new();
        for (name, matcher) in response.headers() {
            matcher.matching_rules(&format!("$.headers.{}", name), &mut response_rules);
        }
        if let Some(body) = response.body() {
            body.matching_rules("$.body", &mut response_rules);
        }

        ContractInteraction {
            description: interaction.description().into(),
            provider_state: interaction.provider_state().map(String::from),
            request: ContractRequest {
                method: request.method().into(),
                path: request.path().example_text(),
                query,
                headers: request_headers,
                body: request.body().map(|body| body.example()),
                matching_rules: request_rules,
            },
            response: ContractResponse {
                status: rendered.status_code,
                headers: rendered.headers,
                body: response.body().map(|body| body.example()),
                matching_rules: response_rules,
            },
        }
    }
}

impl ContractDocument {
    /// Builds a document from the interactions of a session. Interactions are deduplicated and
    /// sorted, so the order they were registered or invoked in doesn't show in the output.
    pub fn new<'a, S1, S2, I>(consumer: S1, provider: S2, interactions: I) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        I: IntoIterator<Item = &'a Interaction>,
    {
        let entries: BTreeMap<SortKey, ContractInteraction> = interactions
            .into_iter()
            .map(|interaction| {
                (
                    interaction_sort_key(interaction),
                    ContractInteraction::from(interaction),
                )
            })
            .collect();

        Self {
            consumer: Pacticipant {
                name: consumer.into(),
            },
            provider: Pacticipant {
                name: provider.into(),
            },
            interactions: entries.into_iter().map(|(_, interaction)| interaction).collect(),
            metadata: ContractMetadata {
                pact_specification: PactSpecification {
                    version: PACT_SPECIFICATION_VERSION.into(),
                },
            },
        }
    }

    /// `<consumer>-<provider>.json`
    pub fn file_name(&self) -> String {
        format!("{}-{}.json", self.consumer.name, self.provider.name)
    }

    /// Adds the interactions of `existing` that this document doesn't redeclare, matched by
    /// description and provider state.
    pub fn merged_with(mut self, existing: ContractDocument) -> Self {
        let declared: Vec<(String, Option<String>)> = self
            .interactions
            .iter()
            .map(|interaction| {
                (
                    interaction.description.clone(),
                    interaction.provider_state.clone(),
                )
            })
            .collect();

        self.interactions
            .extend(existing.interactions.into_iter().filter(|interaction| {
                !declared.contains(&(
                    interaction.description.clone(),
                    interaction.provider_state.clone(),
                ))
            }));
        self.interactions.sort_by_key(ContractInteraction::sort_key);
        self
    }

    pub fn to_json_string(&self) -> Result<String, Error> {
        let mut contents = serde_json::to_string_pretty(self)?;
        contents.push('\n');
        Ok(contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, Error> {
        serde_json::from_str(contents).map_err(|e| Error::InvalidContract(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        interaction::{RequestMatcher, ResponseTemplate},
        matchers::Matcher,
    };
    use serde_json::json;

    fn inventory_interaction() -> Interaction {
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

    fn customer_interaction() -> Interaction {
        Interaction::new("a request for customer details")
            .given("it has a customer with cpf 11111111111")
            .with_request(RequestMatcher::get(
                Matcher::term("/customers/[0-9]{11}", "/customers/11111111111").unwrap(),
            ))
    }

    #[test]
    fn documents_examples_and_matching_rules() {
        let interaction = inventory_interaction();
        let document =
            ContractDocument::new("mm-shopping-cart", "mm-inventory", vec![&interaction]);
        let value = serde_json::to_value(&document).unwrap();

        assert_eq!(value["consumer"]["name"], "mm-shopping-cart");
        assert_eq!(value["metadata"]["pactSpecification"]["version"], "2.0.0");

        let documented = &value["interactions"][0];
        assert_eq!(documented["providerState"], "it has inventory item details");
        assert_eq!(documented["request"]["headers"]["Accept"], "application/json");
        assert!(documented["request"].get("matchingRules").is_none());
        assert_eq!(documented["response"]["body"]["stock"], 10);
        assert_eq!(
            documented["response"]["matchingRules"]["$.body.price"],
            json!({ "match": "type" })
        );
    }

    #[test]
    fn regex_paths_document_their_pattern() {
        let interaction = customer_interaction();
        let document = ContractDocument::new("mm-shopping-cart", "mm-customer", vec![&interaction]);

        let request = &document.interactions[0].request;
        assert_eq!(request.path, "/customers/11111111111");
        assert_eq!(
            request.matching_rules["$.path"],
            json!({ "match": "regex", "regex": "/customers/[0-9]{11}" })
        );
    }

    #[test]
    fn output_does_not_depend_on_registration_order() {
        let inventory = inventory_interaction();
        let customer = customer_interaction();

        let forward = ContractDocument::new("c", "p", vec![&inventory, &customer]);
        let backward = ContractDocument::new("c", "p", vec![&customer, &inventory]);

        assert_eq!(
            forward.to_json_string().unwrap(),
            backward.to_json_string().unwrap()
        );
    }

    #[test]
    fn regex_and_literal_paths_stay_separate_entries() {
        let regex = customer_interaction();
        let literal = Interaction::new("a request for customer details")
            .given("it has a customer with cpf 11111111111")
            .with_request(RequestMatcher::get("/customers/11111111111"));

        let document = ContractDocument::new("c", "p", vec![&regex, &literal]);

        assert_eq!(document.interactions.len(), 2);
        assert_eq!(
            document.interactions[0].sort_key().3,
            "/customers/11111111111"
        );
        assert_eq!(document.interactions[1].sort_key().3, "/customers/[0-9]{11}");
    }

    #[test]
    fn merge_keeps_interactions_not_redeclared() {
        let inventory = inventory_interaction();
        let customer = customer_interaction();
        let existing = ContractDocument::new("c", "p", vec![&inventory, &customer]);
        let updated_inventory =
            inventory_interaction().will_respond_with(ResponseTemplate::new(404));

        let merged =
            ContractDocument::new("c", "p", vec![&updated_inventory]).merged_with(existing);

        assert_eq!(merged.interactions.len(), 2);
        let statuses: Vec<_> = merged
            .interactions
            .iter()
            .map(|interaction| interaction.response.status)
            .collect();
        assert_eq!(statuses, vec![200, 404]);
    }

    #[test]
    fn parses_what_it_writes() {
        let interaction = inventory_interaction();
        let document = ContractDocument::new("c", "p", vec![&interaction]);

        let parsed = ContractDocument::from_json_str(&document.to_json_string().unwrap()).unwrap();

        assert_eq!(parsed, document);
        assert!(matches!(
            ContractDocument::from_json_str("{\"consumer\": 1}"),
            Err(Error::InvalidContract(_))
        ));
    }
}
