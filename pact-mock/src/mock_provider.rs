use crate::{
    contract::ContractDocument,
    error::Error,
    interaction::Interaction,
    logging,
    pact_configuration::MockProviderConfiguration,
    registry::DuplicateInteraction,
    runner::{self, RunningServer},
    session::SessionData,
    tracker::VerificationReport,
};
use std::{
    mem,
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::{info, warn};

#[derive(Debug)]
enum Lifecycle {
    Idle,
    Listening(RunningServer),
    Finalized,
}

/// A mock provider session: an HTTP endpoint answering from declared interactions, the record
/// of what it received, and the contract produced from it.
///
/// Sessions are independent of each other, so tests for different providers can run in parallel.
#[derive(Debug)]
pub struct MockProvider {
    configuration: MockProviderConfiguration,
    session: Arc<Mutex<SessionData>>,
    lifecycle: Lifecycle,
}

impl MockProvider {
    pub fn new(configuration: MockProviderConfiguration) -> Self {
        Self {
            configuration,
            session: Arc::new(Mutex::new(SessionData::default())),
            lifecycle: Lifecycle::Idle,
        }
    }

    pub fn configuration(&self) -> &MockProviderConfiguration {
        &self.configuration
    }

    /// Binds the endpoint and starts answering requests.
    pub fn setup(&mut self) -> Result<SocketAddr, Error> {
        match self.lifecycle {
            Lifecycle::Idle => {}
            Lifecycle::Listening(_) => return Err(Error::AlreadyListening),
            Lifecycle::Finalized => return Err(Error::SessionClosed),
        }

        logging::init(
            self.configuration.log_level(),
            self.configuration.log_file(),
        );

        let server = runner::start(
            self.configuration.port(),
            self.session.clone(),
            self.configuration.drain_timeout(),
        )?;
        let addr = server.addr();

        info!(
            consumer = self.configuration.consumer(),
            provider = self.configuration.provider(),
            %addr,
            "mock provider session started"
        );
        self.lifecycle = Lifecycle::Listening(server);

        Ok(addr)
    }

    pub fn address(&self) -> Result<SocketAddr, Error> {
        match &self.lifecycle {
            Lifecycle::Idle => Err(Error::NotListening),
            Lifecycle::Listening(server) => Ok(server.addr()),
            Lifecycle::Finalized => Err(Error::SessionClosed),
        }
    }

    pub fn port(&self) -> Result<u16, Error> {
        Ok(self.address()?.port())
    }

    /// The base URL consumers should be pointed at, without a trailing slash.
    pub fn url(&self) -> Result<String, Error> {
        Ok(format!("http://{}", self.address()?))
    }

    /// Registers an interaction. Replacing one with the same method, path and provider state is
    /// allowed and reported back.
    pub fn add_interaction(
        &self,
        interaction: Interaction,
    ) -> Result<Option<DuplicateInteraction>, Error> {
        Ok(self.open_session()?.registry.register(interaction))
    }

    pub fn clear_interactions(&self) -> Result<(), Error> {
        let mut session = self.open_session()?;
        session.registry.clear();
        session.tracker.reset();
        Ok(())
    }

    pub fn interactions(&self) -> Result<Vec<Interaction>, Error> {
        Ok(self
            .open_session()?
            .registry
            .list()
            .iter()
            .map(|entry| entry.interaction().clone())
            .collect())
    }

    /// Restricts matching and verification to the interactions given `provider_state`.
    pub fn use_provider_state<S: Into<String>>(&self, provider_state: S) -> Result<(), Error> {
        self.open_session()?.active_state = Some(provider_state.into());
        Ok(())
    }

    pub fn clear_provider_state(&self) -> Result<(), Error> {
        self.open_session()?.active_state = None;
        Ok(())
    }

    /// Checks that every active interaction was invoked and no unexpected request arrived since
    /// the previous verification.
    pub fn verify(&self) -> Result<VerificationReport, Error> {
        let mut guard = self.open_session()?;
        let session = &mut *guard;

        let report = session
            .tracker
            .verify(session.registry.active(session.active_state.as_deref()))?;
        session.verified = true;

        Ok(report)
    }

    /// Writes the contract of this session and returns where it went.
    #[doc(alias = "export")]
    pub fn write_contract(&self) -> Result<PathBuf, Error> {
        let document = {
            let session = self.open_session()?;
            if !session.verified {
                return Err(Error::NotVerified);
            }

            ContractDocument::new(
                self.configuration.consumer(),
                self.configuration.provider(),
                session.registry.list().iter().map(|entry| entry.interaction()),
            )
        };

        self.configuration.contract_store().save(&document)
    }

    /// Stops the endpoint and closes the session. Nothing can be done with it afterwards.
    pub fn finalize(&mut self) -> Result<(), Error> {
        let result = match mem::replace(&mut self.lifecycle, Lifecycle::Finalized) {
            Lifecycle::Finalized => return Err(Error::SessionClosed),
            Lifecycle::Idle => Ok(()),
            Lifecycle::Listening(mut server) => server.shutdown(),
        };

        let mut session = self.session.lock()?;
        session.registry.clear();
        session.tracker.reset();

        info!(
            consumer = self.configuration.consumer(),
            provider = self.configuration.provider(),
            "mock provider session finalized"
        );

        result
    }

    /// Verifies, writes the contract when verification passed, and finalizes in any case.
    pub fn finish(&mut self) -> Result<PathBuf, Error> {
        let result = self.verify().and_then(|_| self.write_contract());
        let finalized = self.finalize();

        let path = result?;
        finalized?;
        Ok(path)
    }

    fn open_session(&self) -> Result<MutexGuard<'_, SessionData>, Error> {
        if let Lifecycle::Finalized = self.lifecycle {
            return Err(Error::SessionClosed);
        }

        Ok(self.session.lock()?)
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        if let Lifecycle::Listening(_) = self.lifecycle {
            if let Err(e) = self.finalize() {
                warn!(error = %e, "couldn't finalize the mock provider session");
            }
        }
    }
}
