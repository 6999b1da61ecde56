use crate::{
    data::{RequestData, ResponseData},
    matching,
    registry::InteractionRegistry,
    tracker::VerificationTracker,
};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// The mutable state of one mock provider session, shared with its server.
#[derive(Debug, Default)]
pub(crate) struct SessionData {
    pub registry: InteractionRegistry,
    pub tracker: VerificationTracker,
    pub active_state: Option<String>,
    pub verified: bool,
}

impl SessionData {
    /// Answers a request from the registry and records the outcome for verification.
    pub fn dispatch(&mut self, request: &RequestData) -> ResponseData {
        let candidates = self.registry.active(self.active_state.as_deref());

        match matching::find_match(request, candidates) {
            Ok(entry) => {
                debug!(
                    method = %request.method,
                    uri = %request.uri,
                    interaction = entry.interaction().description(),
                    "request matched"
                );
                let response = entry.interaction().response().render();
                self.tracker.record_match(entry.id());
                response
            }
            Err(no_match) => {
                warn!(%no_match, "unexpected request");
                let body = json!({
                    "error": "No interaction matched the request",
                    "method": no_match.method,
                    "path": no_match.path,
                    "closest": no_match.closest,
                    "mismatches": no_match
                        .mismatches
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>(),
                });
                self.tracker.record_unexpected(no_match.into());

                let mut headers = BTreeMap::new();
                headers.insert("Content-Type".to_string(), "application/json".to_string());
                ResponseData {
                    status_code: 500,
                    headers,
                    body: body.to_string(),
                }
            }
        }
    }
}
