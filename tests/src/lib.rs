#[cfg(test)]
mod tests {
    use pact_mock::{
        pact_consumer_test, Interaction, MockProvider, MockProviderConfiguration, RequestMatcher,
        ResponseTemplate,
    };
    use std::{env, path::PathBuf};

    fn pact_dir() -> PathBuf {
        env::temp_dir().join("pact-mock-smoke-tests")
    }

    fn configure_pact(config: &mut MockProviderConfiguration) {
        config.set_consumer("smoke-consumer");
        config.set_provider("smoke-provider");
        config.set_pact_dir(pact_dir());
    }

    fn configure_other_pact(config: &mut MockProviderConfiguration) {
        config.set_consumer("smoke-consumer");
        config.set_provider("smoke-other-provider");
        config.set_pact_dir(pact_dir());
    }

    fn configure_failing_pact(config: &mut MockProviderConfiguration) {
        config.set_consumer("smoke-consumer");
        config.set_provider("smoke-failing-provider");
        config.set_pact_dir(pact_dir());
    }

    fn configure_result_pact(config: &mut MockProviderConfiguration) {
        config.set_consumer("smoke-consumer");
        config.set_provider("smoke-result-provider");
        config.set_pact_dir(pact_dir());
    }

    #[pact_consumer_test(configure_pact)]
    fn simple_consumer_test(provider: &MockProvider) {
        provider
            .add_interaction(
                Interaction::new("a ping")
                    .with_request(RequestMatcher::get("/ping"))
                    .will_respond_with(ResponseTemplate::new(204)),
            )
            .unwrap();

        let response = reqwest::blocking::get(format!("{}/ping", provider.url().unwrap())).unwrap();

        assert_eq!(response.status().as_u16(), 204);
    }

    #[pact_consumer_test(configure_other_pact)]
    #[should_panic(expected = "Missing interaction")]
    fn uncalled_interaction_fails_the_test(provider: &MockProvider) {
        provider
            .add_interaction(
                Interaction::new("a ping nobody sends")
                    .with_request(RequestMatcher::get("/ping")),
            )
            .unwrap();
    }

    #[pact_consumer_test(configure_result_pact)]
    fn ok_result_passes(provider: &MockProvider) -> Result<(), reqwest::Error> {
        provider
            .add_interaction(
                Interaction::new("a ping")
                    .with_request(RequestMatcher::get("/ping"))
                    .will_respond_with(ResponseTemplate::new(204)),
            )
            .unwrap();

        let response = reqwest::blocking::get(format!("{}/ping", provider.url().unwrap()))?;

        assert_eq!(response.status().as_u16(), 204);
        Ok(())
    }

    #[pact_consumer_test(configure_failing_pact)]
    #[should_panic(expected = "the test returned Err(\"the body failed\")")]
    fn err_result_fails_the_test(provider: &MockProvider) -> Result<(), String> {
        provider
            .add_interaction(
                Interaction::new("a ping")
                    .with_request(RequestMatcher::get("/ping"))
                    .will_respond_with(ResponseTemplate::new(204)),
            )
            .unwrap();

        reqwest::blocking::get(format!("{}/ping", provider.url().unwrap())).unwrap();

        Err("the body failed".into())
    }

    #[test]
    fn err_result_writes_no_contract() {
        let result = std::panic::catch_unwind(err_result_fails_the_test);

        assert!(result.is_err());
        assert!(!pact_dir()
            .join("smoke-consumer-smoke-failing-provider.json")
            .exists());
    }
}
