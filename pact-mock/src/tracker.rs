use crate::{
    matching::{Mismatch, NoMatch},
    registry::{InteractionId, RegisteredInteraction},
};
use std::{collections::HashMap, fmt, mem};
use tracing::{debug, info};

/// A registered interaction nobody called since the previous verification.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingInteraction {
    pub description: String,
    pub provider_state: Option<String>,
    pub request: String,
}

impl fmt::Display for MissingInteraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Missing interaction \"{}\" ({})", self.description, self.request)?;
        if let Some(state) = &self.provider_state {
            write!(f, " given \"{}\"", state)?;
        }
        Ok(())
    }
}

/// A request that no registered interaction accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct UnexpectedRequest {
    pub method: String,
    pub path: String,
    pub closest: Option<String>,
    pub mismatches: Vec<Mismatch>,
}

impl fmt::Display for UnexpectedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unexpected request {} {}", self.method, self.path)?;
        if let Some(closest) = &self.closest {
            write!(f, " (closest: \"{}\")", closest)?;
        }
        for mismatch in &self.mismatches {
            write!(f, "\n      {}", mismatch)?;
        }
        Ok(())
    }
}

impl From<NoMatch> for UnexpectedRequest {
    fn from(no_match: NoMatch) -> Self {
        Self {
            method: no_match.method,
            path: no_match.path,
            closest: no_match.closest,
            mismatches: no_match.mismatches,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerificationFailure {
    pub missing: Vec<MissingInteraction>,
    pub unexpected: Vec<UnexpectedRequest>,
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pact verification failed!")?;
        for missing in &self.missing {
            write!(f, "\n  - {}", missing)?;
        }
        for unexpected in &self.unexpected {
            write!(f, "\n  - {}", unexpected)?;
        }
        Ok(())
    }
}

/// How many times each interaction was invoked during a verified window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationReport {
    pub invocations: Vec<(String, u32)>,
}

/// Counts invocations and unexpected requests between two verifications.
#[derive(Debug, Default)]
pub struct VerificationTracker {
    invocations: HashMap<InteractionId, u32>,
    unexpected: Vec<UnexpectedRequest>,
}

impl VerificationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_match(&mut self, id: InteractionId) {
        *self.invocations.entry(id).or_insert(0) += 1;
    }

    pub fn record_unexpected(&mut self, request: UnexpectedRequest) {
        debug!(method = %request.method, path = %request.path, "unexpected request recorded");
        self.unexpected.push(request);
    }

    pub fn invocation_count(&self, id: InteractionId) -> u32 {
        self.invocations.get(&id).copied().unwrap_or(0)
    }

    pub fn unexpected(&self) -> &[UnexpectedRequest] {
        &self.unexpected
    }

    /// Checks that every active interaction was invoked and nothing unexpected arrived, then
    /// starts a new window whatever the outcome.
    pub fn verify<'a, I>(&mut self, active: I) -> Result<VerificationReport, VerificationFailure>
    where
        I: IntoIterator<Item = &'a RegisteredInteraction>,
    {
        let invocations = mem::take(&mut self.invocations);
        let unexpected = mem::take(&mut self.unexpected);

        let mut report = VerificationReport::default();
        let mut missing = Vec::new();

        for entry in active {
            let interaction = entry.interaction();
            let count = invocations.get(&entry.id()).copied().unwrap_or(0);

            if count == 0 {
                let key = interaction.key();
                missing.push(MissingInteraction {
                    description: interaction.description().into(),
                    provider_state: key.provider_state,
                    request: format!("{} {}", key.method, key.path),
                });
            } else {
                report
                    .invocations
                    .push((interaction.description().into(), count));
            }
        }

        if missing.is_empty() && unexpected.is_empty() {
            info!(verified = report.invocations.len(), "pact verification succeeded");
            Ok(report)
        } else {
            Err(VerificationFailure {
                missing,
                unexpected,
            })
        }
    }

    pub fn reset(&mut self) {
        self.invocations.clear();
        self.unexpected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        interaction::{Interaction, RequestMatcher},
        registry::InteractionRegistry,
    };

    fn registry() -> InteractionRegistry {
        let mut registry = InteractionRegistry::new();
        registry.register(
            Interaction::new("a request for inventory item details")
                .given("it has inventory item details")
                .with_request(RequestMatcher::get("/mm-inventory/1")),
        );
        registry
    }

    fn unexpected() -> UnexpectedRequest {
        UnexpectedRequest {
            method: "GET".into(),
            path: "/mm-inventory/2".into(),
            closest: None,
            mismatches: Vec::new(),
        }
    }

    #[test]
    fn passes_when_every_interaction_was_invoked() {
        let registry = registry();
        let mut tracker = VerificationTracker::new();
        tracker.record_match(registry.list()[0].id());
        tracker.record_match(registry.list()[0].id());

        let report = tracker.verify(registry.list()).unwrap();

        assert_eq!(
            report.invocations,
            vec![("a request for inventory item details".to_string(), 2)]
        );
    }

    #[test]
    fn reports_missing_interactions() {
        let registry = registry();
        let mut tracker = VerificationTracker::new();

        let failure = tracker.verify(registry.list()).unwrap_err();

        assert_eq!(failure.missing.len(), 1);
        assert_eq!(failure.missing[0].request, "GET /mm-inventory/1");
        assert!(failure.to_string().contains("Missing interaction"));
    }

    #[test]
    fn unexpected_requests_fail_even_when_nothing_is_missing() {
        let registry = registry();
        let mut tracker = VerificationTracker::new();
        tracker.record_match(registry.list()[0].id());
        tracker.record_unexpected(unexpected());

        let failure = tracker.verify(registry.list()).unwrap_err();

        assert!(failure.missing.is_empty());
        assert_eq!(failure.unexpected, vec![unexpected()]);
    }

    #[test]
    fn verification_starts_a_new_window() {
        let registry = registry();
        let mut tracker = VerificationTracker::new();
        tracker.record_match(registry.list()[0].id());
        tracker.record_unexpected(unexpected());
        assert!(tracker.verify(registry.list()).is_err());

        assert_eq!(tracker.invocation_count(registry.list()[0].id()), 0);
        assert!(tracker.unexpected().is_empty());
        assert!(tracker.verify(registry.list()).is_err());
    }
}
