use crate::{
    contract::{ContractDifference, ContractDocument},
    error::Error,
    pact_configuration::WriteMode,
};
use lazy_static::lazy_static;
use std::{
    fmt::Debug,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::{debug, info};

lazy_static! {
    // Sessions of one process share contract files, writes must not interleave.
    static ref WRITE_LOCK: Mutex<()> = Mutex::new(());
}

/// Where finished contracts go.
pub trait ContractStore: Debug {
    /// Persists the document and returns its location.
    fn save(&self, document: &ContractDocument) -> Result<PathBuf, Error>;
}

/// Stores contracts as `<consumer>-<provider>.json` files in a directory.
#[derive(Debug, Clone)]
pub struct FileContractStore {
    pact_dir: PathBuf,
    write_mode: WriteMode,
    fail_if_contract_changed: bool,
}

impl FileContractStore {
    pub fn new<P: AsRef<Path>>(
        pact_dir: P,
        write_mode: WriteMode,
        fail_if_contract_changed: bool,
    ) -> Self {
        Self {
            pact_dir: pact_dir.as_ref().to_path_buf(),
            write_mode,
            fail_if_contract_changed,
        }
    }

    pub fn contract_path(&self, document: &ContractDocument) -> PathBuf {
        self.pact_dir.join(document.file_name())
    }

    fn read_existing(path: &Path) -> Result<Option<String>, Error> {
        if !path.exists() {
            return Ok(None);
        }

        Ok(Some(fs::read_to_string(path)?))
    }
}

impl ContractStore for FileContractStore {
    fn save(&self, document: &ContractDocument) -> Result<PathBuf, Error> {
        let _guard = WRITE_LOCK.lock()?;

        let path = self.contract_path(document);
        let existing = Self::read_existing(&path)?;

        let document = match (self.write_mode, &existing) {
            (WriteMode::Merge, Some(contents)) => {
                debug!(path = %path.display(), "merging with the existing contract");
                document
                    .clone()
                    .merged_with(ContractDocument::from_json_str(contents)?)
            }
            _ => document.clone(),
        };
        let contents = document.to_json_string()?;

        if let Some(existing) = &existing {
            if existing == &contents {
                debug!(path = %path.display(), "contract unchanged");
                return Ok(path);
            }

            if self.fail_if_contract_changed {
                if let Some(difference) = ContractDifference::between(existing, &contents) {
                    return Err(Error::ContractChanged { path, difference });
                }
            }
        }

        write_atomic_file(&path, contents.as_bytes())?;
        info!(
            path = %path.display(),
            interactions = document.interactions.len(),
            "contract written"
        );

        Ok(path)
    }
}

/// Writes to a sibling temp file first so readers never see a partial document.
fn write_atomic_file(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let tmp = parent.join(format!(
        ".{}.tmp.{}",
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("contract"),
        std::process::id()
    ));
    {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;

    if let Ok(dir) = File::open(parent) {
        let _ = dir.sync_all();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{Interaction, RequestMatcher, ResponseTemplate};

    fn document(status: u16) -> ContractDocument {
        let interaction = Interaction::new("a request for inventory item details")
            .given("it has inventory item details")
            .with_request(RequestMatcher::get("/mm-inventory/1"))
            .will_respond_with(ResponseTemplate::new(status));

        ContractDocument::new("mm-shopping-cart", "mm-inventory", vec![&interaction])
    }

    #[test]
    fn writes_into_the_pact_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileContractStore::new(dir.path().join("pacts"), WriteMode::Overwrite, false);

        let path = store.save(&document(200)).unwrap();

        assert_eq!(path, dir.path().join("pacts/mm-shopping-cart-mm-inventory.json"));
        let written = ContractDocument::from_json_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, document(200));
    }

    #[test]
    fn change_guard_rejects_a_different_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileContractStore::new(dir.path(), WriteMode::Overwrite, true);

        store.save(&document(200)).unwrap();
        assert!(store.save(&document(200)).is_ok());

        match store.save(&document(404)) {
            Err(Error::ContractChanged { difference, .. }) => {
                assert_eq!(difference.new_context.as_deref(), Some("\"status\": 404"));
            }
            other => panic!("Expected ContractChanged, got {:?}", other),
        }
    }

    #[test]
    fn merge_rejects_a_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileContractStore::new(dir.path(), WriteMode::Merge, false);
        fs::write(store.contract_path(&document(200)), "not json").unwrap();

        assert!(matches!(
            store.save(&document(200)),
            Err(Error::InvalidContract(_))
        ));
    }
}
