mod contract_store;
mod data;
mod error;
mod interaction;
mod mock_provider;
mod pact_configuration;
mod registry;
mod runner;
mod session;
mod test_outcome;
mod tracker;
mod util;

pub mod contract;
pub mod http_client;
pub mod logging;
pub mod matchers;
pub mod matching;
pub mod publish;

pub use contract::ContractDocument;
pub use contract_store::{ContractStore, FileContractStore};
pub use data::{RequestData, ResponseData};
pub use error::Error;
pub use interaction::{Interaction, InteractionKey, RequestMatcher, ResponseTemplate};
pub use matchers::Matcher;
pub use mock_provider::MockProvider;
pub use pact_configuration::{MockProviderConfiguration, WriteMode};
pub use pact_mock_codegen::pact_consumer_test;
pub use publish::{BrokerConfiguration, PublishError, PublishReceipt, Publisher};
pub use registry::{DuplicateInteraction, InteractionId, RegisteredInteraction};
pub use test_outcome::TestOutcome;
pub use tracker::{MissingInteraction, UnexpectedRequest, VerificationFailure, VerificationReport};
