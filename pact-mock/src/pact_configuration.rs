use crate::contract_store::ContractStore;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// What happens to interactions already present in a contract file.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WriteMode {
    /// Replace the file with the interactions of the current session.
    Overwrite,
    /// Keep interactions from the file that the session doesn't declare again.
    Merge,
}

#[derive(Debug, Clone)]
pub struct MockProviderConfiguration {
    consumer: String,
    provider: String,
    port: u16,
    pact_dir: PathBuf,
    write_mode: WriteMode,
    fail_if_contract_changed: bool,
    log_file: Option<PathBuf>,
    log_level: String,
    drain_timeout: Duration,
    contract_store: Option<Arc<dyn ContractStore + Send + Sync>>,
}

impl MockProviderConfiguration {
    pub fn new<S1: Into<String>, S2: Into<String>>(consumer: S1, provider: S2) -> Self {
        Self {
            consumer: consumer.into(),
            provider: provider.into(),
            port: 0,
            pact_dir: PathBuf::from("pacts"),
            write_mode: WriteMode::Overwrite,
            fail_if_contract_changed: false,
            log_file: None,
            log_level: String::from("info"),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            contract_store: None,
        }
    }

    pub fn set_consumer<S: Into<String>>(&mut self, consumer: S) {
        self.consumer = consumer.into();
    }

    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    pub fn set_provider<S: Into<String>>(&mut self, provider: S) {
        self.provider = provider.into();
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// `0`, the default, binds an ephemeral port.
    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn set_pact_dir<P: AsRef<Path>>(&mut self, pact_dir: P) {
        self.pact_dir = pact_dir.as_ref().to_path_buf();
    }

    pub fn pact_dir(&self) -> &Path {
        &self.pact_dir
    }

    pub fn set_write_mode(&mut self, write_mode: WriteMode) {
        self.write_mode = write_mode;
    }

    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    pub fn set_fail_if_contract_changed(&mut self, value: bool) {
        self.fail_if_contract_changed = value;
    }

    pub fn fail_if_contract_changed(&self) -> bool {
        self.fail_if_contract_changed
    }

    pub fn set_log_file<P: AsRef<Path>>(&mut self, log_file: P) {
        self.log_file = Some(log_file.as_ref().to_path_buf());
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub fn set_log_level<S: Into<String>>(&mut self, log_level: S) {
        self.log_level = log_level.into();
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// How long `finalize` waits for in-flight requests before closing the endpoint.
    pub fn set_drain_timeout(&mut self, drain_timeout: Duration) {
        self.drain_timeout = drain_timeout;
    }

    pub fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }

    pub fn set_contract_store(&mut self, contract_store: Arc<dyn ContractStore + Send + Sync>) {
        self.contract_store = Some(contract_store);
    }

    /// The configured store, or a file store under `pact_dir`.
    pub fn contract_store(&self) -> Arc<dyn ContractStore + Send + Sync> {
        self.contract_store.clone().unwrap_or_else(|| {
            Arc::new(crate::contract_store::FileContractStore::new(
                &self.pact_dir,
                self.write_mode,
                self.fail_if_contract_changed,
            ))
        })
    }
}

impl Default for MockProviderConfiguration {
    fn default() -> Self {
        Self::new("consumer", "provider")
    }
}
