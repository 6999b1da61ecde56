//! Uploads contract documents to a broker so providers can verify against them.

use crate::{
    contract::ContractDocument,
    data::{RequestData, ResponseData},
    error::Error,
    http_client::{HttpClient, HyperHttpClient},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tracing::{debug, info};
use url::{Position, Url};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Couldn't read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not a contract document: {reason}", .path.display())]
    InvalidContract { path: PathBuf, reason: String },
    #[error("Broker request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Error,
    },
    #[error("Broker rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Invalid broker URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrokerConfiguration {
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl BrokerConfiguration {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            password: None,
        }
    }

    pub fn with_basic_auth<S1: Into<String>, S2: Into<String>>(
        mut self,
        username: S1,
        password: S2,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorization(&self) -> Option<String> {
        let username = self.username.as_ref()?;
        let credentials = format!(
            "{}:{}",
            username,
            self.password.as_deref().unwrap_or_default()
        );

        Some(format!("Basic {}", STANDARD.encode(credentials)))
    }
}

/// What the broker accepted for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReceipt {
    pub path: PathBuf,
    pub consumer: String,
    pub provider: String,
    pub version: String,
    pub url: String,
    pub tags: Vec<String>,
}

#[derive(Debug)]
pub struct Publisher {
    broker: BrokerConfiguration,
    http_client: Arc<dyn HttpClient + Send + Sync>,
}

impl Publisher {
    pub fn new(broker: BrokerConfiguration) -> Self {
        Self {
            broker,
            http_client: Arc::new(HyperHttpClient::new()),
        }
    }

    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient + Send + Sync>) -> Self {
        self.http_client = http_client;
        self
    }

    /// Publishes every document found in `paths` under `consumer_version`, then tags that
    /// version. Stops at the first failure.
    pub async fn publish<P: AsRef<Path>>(
        &self,
        paths: &[P],
        consumer_version: &str,
        tags: &[String],
    ) -> Result<Vec<PublishReceipt>, PublishError> {
        let mut receipts = Vec::new();

        for path in collect_contract_files(paths)? {
            let contents = fs::read_to_string(&path).map_err(|source| PublishError::Io {
                path: path.clone(),
                source,
            })?;
            let document = ContractDocument::from_json_str(&contents).map_err(|e| {
                PublishError::InvalidContract {
                    path: path.clone(),
                    reason: e.to_string(),
                }
            })?;

            let consumer = document.consumer.name.as_str();
            let provider = document.provider.name.as_str();

            let url = self.broker_url(&[
                "pacts",
                "provider",
                provider,
                "consumer",
                consumer,
                "version",
                consumer_version,
            ])?;
            self.put(&url, contents.clone()).await?;
            info!(path = %path.display(), %url, "contract published");

            for tag in tags {
                let tag_url = self.broker_url(&[
                    "pacticipants",
                    consumer,
                    "versions",
                    consumer_version,
                    "tags",
                    tag.as_str(),
                ])?;
                self.put(&tag_url, String::from("{}")).await?;
                debug!(%consumer, version = consumer_version, %tag, "version tagged");
            }

            receipts.push(PublishReceipt {
                path,
                consumer: consumer.into(),
                provider: provider.into(),
                version: consumer_version.into(),
                url: url.into(),
                tags: tags.to_vec(),
            });
        }

        Ok(receipts)
    }

    fn broker_url(&self, segments: &[&str]) -> Result<Url, PublishError> {
        let invalid = |reason: String| PublishError::InvalidUrl {
            url: self.broker.base_url.clone(),
            reason,
        };

        let mut url = Url::parse(&self.broker.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("it can't be a base URL".into()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    async fn put(&self, url: &Url, body: String) -> Result<ResponseData, PublishError> {
        let mut request = RequestData::new("PUT", &url[Position::BeforePath..])
            .with_header("Content-Type", "application/json")
            .with_header("Accept", "application/hal+json, application/json")
            .with_body(body);
        if let Some(authorization) = self.broker.authorization() {
            request = request.with_header("Authorization", authorization);
        }

        let response = self
            .http_client
            .make_request(&url[..Position::BeforePath], &request)
            .await
            .map_err(|source| PublishError::Transport {
                url: url.to_string(),
                source,
            })?;

        if !(200..300).contains(&response.status_code) {
            return Err(PublishError::Rejected {
                status: response.status_code,
                body: response.body,
            });
        }

        Ok(response)
    }
}

/// Expands directories to the `*.json` files directly inside them, sorted by name.
pub fn collect_contract_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>, PublishError> {
    let mut files = Vec::new();

    for path in paths {
        let path = path.as_ref();
        if !path.is_dir() {
            files.push(path.to_path_buf());
            continue;
        }

        let io_error = |source: io::Error| PublishError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut contracts = Vec::new();
        for entry in fs::read_dir(path).map_err(io_error)? {
            let entry_path = entry.map_err(io_error)?.path();
            if entry_path.is_file() && entry_path.extension().map_or(false, |ext| ext == "json") {
                contracts.push(entry_path);
            }
        }
        contracts.sort();
        files.extend(contracts);
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct RecordingHttpClient {
        status_code: u16,
        requests: Mutex<Vec<(String, RequestData)>>,
    }

    impl RecordingHttpClient {
        fn new(status_code: u16) -> Arc<Self> {
            Arc::new(Self {
                status_code,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpClient for RecordingHttpClient {
        async fn make_request(
            &self,
            base_url: &str,
            request_data: &RequestData,
        ) -> Result<ResponseData, Error> {
            self.requests
                .lock()
                .unwrap()
                .push((base_url.to_string(), request_data.clone()));

            Ok(ResponseData {
                status_code: self.status_code,
                body: String::from("{\"error\": \"nope\"}"),
                ..ResponseData::default()
            })
        }
    }

    fn write_contract(dir: &Path) -> PathBuf {
        let document = ContractDocument::new("mm-shopping-cart", "mm-inventory", Vec::new());
        let path = dir.join(document.file_name());
        fs::write(&path, document.to_json_string().unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn puts_contract_and_tags() {
        let dir = tempfile::tempdir().unwrap();
        write_contract(dir.path());
        let client = RecordingHttpClient::new(201);
        let publisher = Publisher::new(
            BrokerConfiguration::new("https://broker.example.com/base/")
                .with_basic_auth("user", "secret"),
        )
        .with_http_client(client.clone());

        let receipts = publisher
            .publish(&[dir.path()], "1.0.0", &["main".to_string()])
            .await
            .unwrap();

        assert_eq!(receipts.len(), 1);
        assert_eq!(
            receipts[0].url,
            "https://broker.example.com/base/pacts/provider/mm-inventory/consumer/mm-shopping-cart/version/1.0.0"
        );

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].0, "https://broker.example.com");
        assert_eq!(requests[0].1.method, "PUT");
        assert_eq!(
            requests[0].1.header("authorization"),
            Some("Basic dXNlcjpzZWNyZXQ=")
        );
        assert_eq!(
            requests[1].1.uri,
            "/base/pacticipants/mm-shopping-cart/versions/1.0.0/tags/main"
        );
    }

    #[tokio::test]
    async fn rejected_status_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_contract(dir.path());
        let publisher = Publisher::new(BrokerConfiguration::new("http://localhost:9292"))
            .with_http_client(RecordingHttpClient::new(401));

        match publisher.publish(&[path], "1.0.0", &[]).await {
            Err(PublishError::Rejected { status, .. }) => assert_eq!(status, 401),
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unparsable_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "[]").unwrap();
        let publisher = Publisher::new(BrokerConfiguration::new("http://localhost:9292"))
            .with_http_client(RecordingHttpClient::new(200));

        assert!(matches!(
            publisher.publish(&[path], "1.0.0", &[]).await,
            Err(PublishError::InvalidContract { .. })
        ));
    }

    #[test]
    fn directories_expand_to_sorted_json_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = collect_contract_files(&[dir.path()]).unwrap();

        assert_eq!(files, vec![dir.path().join("a.json"), dir.path().join("b.json")]);
    }
}
