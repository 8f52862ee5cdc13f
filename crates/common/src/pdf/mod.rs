//! PDF byte resolution
//!
//! A stored file is described by a `storage_uri` and an optional
//! `public_url`. Resolution order:
//! 1. `public_url` (or `storage_uri` when there is none) over HTTP(S)
//! 2. `storage_uri` as a local path (`file://` prefix allowed)
//! 3. object-storage schemes are rejected without a public URL
//! 4. anything else is not found
//!
//! Every call resolves fresh; there is no retry and no cache.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

use crate::config::StorageConfig;
use crate::metrics;

/// Schemes that need a presigned or public URL to be downloadable
const OBJECT_STORAGE_SCHEMES: &[&str] = &["s3://", "gs://", "az://"];

/// Failure modes of document resolution
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage_uri '{uri}' uses an object-storage scheme and needs an http(s) public_url")]
    UnsupportedScheme { uri: String },

    #[error("unable to resolve the PDF from '{uri}'")]
    NotFound { uri: String },
}

/// Fetches a document over the network
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Download the full body behind `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ResolveError>;
}

/// reqwest-backed fetcher with a fixed timeout
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher with the given timeout and user agent
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ResolveError> {
        let transport = |e: reqwest::Error| ResolveError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        Ok(body.to_vec())
    }
}

/// Turns stored location descriptors into PDF bytes
#[derive(Clone)]
pub struct PdfResolver {
    fetcher: Arc<dyn RemoteFetcher>,
}

impl PdfResolver {
    /// Create a resolver around an arbitrary fetcher
    pub fn new(fetcher: Arc<dyn RemoteFetcher>) -> Self {
        Self { fetcher }
    }

    /// Create a resolver using the HTTP fetcher described by `config`
    pub fn from_config(config: &StorageConfig) -> Result<Self, reqwest::Error> {
        let fetcher = HttpFetcher::new(config.fetch_timeout(), &config.user_agent)?;

        Ok(Self::new(Arc::new(fetcher)))
    }

    /// Resolve the bytes of a stored document
    pub async fn resolve(
        &self,
        storage_uri: &str,
        public_url: Option<&str>,
    ) -> Result<Vec<u8>, ResolveError> {
        let candidate = public_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(storage_uri);

        if is_http(candidate) {
            debug!(url = %candidate, "Fetching PDF over HTTP");
            let start = Instant::now();
            let result = self.fetcher.fetch(candidate).await;
            metrics::record_pdf_resolution("remote", result.is_ok(), start.elapsed().as_secs_f64());
            return result;
        }

        let local = local_path(storage_uri);
        if is_file(local).await {
            debug!(path = %local, "Reading PDF from local storage");
            let start = Instant::now();
            let result = tokio::fs::read(local).await.map_err(|source| ResolveError::Io {
                path: local.to_string(),
                source,
            });
            metrics::record_pdf_resolution("local", result.is_ok(), start.elapsed().as_secs_f64());
            return result;
        }

        if is_object_storage(storage_uri) {
            return Err(ResolveError::UnsupportedScheme {
                uri: storage_uri.to_string(),
            });
        }

        Err(ResolveError::NotFound {
            uri: storage_uri.to_string(),
        })
    }
}

fn has_scheme(uri: &str, scheme: &str) -> bool {
    uri.get(..scheme.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
}

fn is_http(uri: &str) -> bool {
    has_scheme(uri, "http://") || has_scheme(uri, "https://")
}

fn is_object_storage(uri: &str) -> bool {
    OBJECT_STORAGE_SCHEMES
        .iter()
        .any(|scheme| has_scheme(uri, scheme))
}

fn local_path(storage_uri: &str) -> &str {
    if has_scheme(storage_uri, "file://") {
        &storage_uri["file://".len()..]
    } else {
        storage_uri
    }
}

async fn is_file(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }
    tokio::fs::metadata(Path::new(path))
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    /// Records requested URLs and answers with a canned body
    struct StubFetcher {
        calls: Mutex<Vec<String>>,
        fail_with: Option<u16>,
    }

    impl StubFetcher {
        fn ok() -> Arc<Self> {
            Arc::new(Self { calls: Mutex::new(Vec::new()), fail_with: None })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self { calls: Mutex::new(Vec::new()), fail_with: Some(status) })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, ResolveError> {
            self.calls.lock().unwrap().push(url.to_string());
            match self.fail_with {
                Some(status) => Err(ResolveError::Status { url: url.to_string(), status }),
                None => Ok(format!("remote:{}", url).into_bytes()),
            }
        }
    }

    #[tokio::test]
    async fn test_object_storage_without_public_url_is_unsupported() {
        let fetcher = StubFetcher::ok();
        let resolver = PdfResolver::new(fetcher.clone());

        let err = resolver.resolve("s3://bucket/key.pdf", None).await.unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedScheme { .. }));
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_public_url_is_fetched_directly() {
        let fetcher = StubFetcher::ok();
        let resolver = PdfResolver::new(fetcher.clone());

        let bytes = resolver
            .resolve("s3://bucket/key.pdf", Some("http://cdn.example.test/key.pdf"))
            .await
            .unwrap();

        assert_eq!(bytes, b"remote:http://cdn.example.test/key.pdf");
        assert_eq!(fetcher.calls(), vec!["http://cdn.example.test/key.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_http_storage_uri_used_when_public_url_blank() {
        let fetcher = StubFetcher::ok();
        let resolver = PdfResolver::new(fetcher.clone());

        resolver
            .resolve("HTTPS://dof.example.test/2024/a.pdf", Some("  "))
            .await
            .unwrap();

        assert_eq!(fetcher.calls(), vec!["HTTPS://dof.example.test/2024/a.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_remote_failure_is_reported() {
        let resolver = PdfResolver::new(StubFetcher::failing(404));

        let err = resolver
            .resolve("/unused", Some("https://dof.example.test/missing.pdf"))
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_local_file_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.7 local").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let fetcher = StubFetcher::ok();
        let resolver = PdfResolver::new(fetcher.clone());

        let bytes = resolver.resolve(&path, None).await.unwrap();
        assert_eq!(bytes, b"%PDF-1.7 local");

        let with_scheme = format!("file://{}", path);
        let bytes = resolver.resolve(&with_scheme, None).await.unwrap();
        assert_eq!(bytes, b"%PDF-1.7 local");
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_non_http_public_url_falls_back_to_local_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF local copy").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let resolver = PdfResolver::new(StubFetcher::ok());
        let bytes = resolver
            .resolve(&path, Some("s3://bucket/other.pdf"))
            .await
            .unwrap();

        assert_eq!(bytes, b"%PDF local copy");
    }

    #[tokio::test]
    async fn test_missing_local_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.pdf");

        let resolver = PdfResolver::new(StubFetcher::ok());
        let err = resolver
            .resolve(missing.to_str().unwrap(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::NotFound { .. }));
    }

    #[test]
    fn test_scheme_detection() {
        assert!(is_http("http://a"));
        assert!(is_http("Https://a"));
        assert!(!is_http("ftp://a"));
        assert!(is_object_storage("S3://bucket/key"));
        assert!(is_object_storage("gs://bucket/key"));
        assert!(!is_object_storage("/var/dof/a.pdf"));
        assert_eq!(local_path("file:///var/dof/a.pdf"), "/var/dof/a.pdf");
    }
}
