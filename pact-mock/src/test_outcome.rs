use std::fmt::Debug;

/// What a `#[pact_consumer_test]` body may return. An `Err` fails the test before the session
/// is verified.
pub trait TestOutcome {
    fn into_result(self) -> Result<(), String>;
}

impl TestOutcome for () {
    fn into_result(self) -> Result<(), String> {
        Ok(())
    }
}

impl<T, E: Debug> TestOutcome for Result<T, E> {
    fn into_result(self) -> Result<(), String> {
        self.map(|_| ()).map_err(|e| format!("Err({:?})", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_and_ok_pass() {
        assert_eq!(().into_result(), Ok(()));
        assert_eq!(Ok::<u8, String>(3).into_result(), Ok(()));
    }

    #[test]
    fn err_keeps_its_debug_text() {
        let outcome: Result<(), String> = Err("upstream unreachable".into());

        assert_eq!(
            outcome.into_result(),
            Err(String::from("Err(\"upstream unreachable\")"))
        );
    }
}
