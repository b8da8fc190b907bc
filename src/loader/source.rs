//! Content sources - where the loader fetches the manifest and posts from

use std::future::Future;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Failure to fetch a resource
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{path}: path escapes the site root")]
    OutsideRoot { path: String },

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: invalid URL: {message}")]
    InvalidUrl { path: String, message: String },

    #[error("{path}: HTTP status {status}")]
    Status { path: String, status: u16 },

    #[error("{path}: {source}")]
    Http {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Fetches site-relative resources as text
pub trait ContentSource {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Reads resources from a directory, usually the build output
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Map a site-relative path to a file under the root, refusing `..`
    fn resolve(&self, path: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(path.trim_start_matches('/'));
        let mut resolved = self.root.clone();

        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(FetchError::OutsideRoot {
                        path: path.to_string(),
                    })
                }
            }
        }

        Ok(resolved)
    }
}

impl ContentSource for DirSource {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let file = self.resolve(path)?;
        tokio::fs::read_to_string(&file)
            .await
            .map_err(|source| FetchError::Io {
                path: path.to_string(),
                source,
            })
    }
}

/// Fetches resources relative to an HTTP origin
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base: reqwest::Url,
}

impl HttpSource {
    /// Create a source for `origin`, e.g. `http://localhost:4000/`
    pub fn new(origin: &str) -> Result<Self, FetchError> {
        let mut origin = origin.to_string();
        if !origin.ends_with('/') {
            origin.push('/');
        }
        let base = reqwest::Url::parse(&origin).map_err(|e| FetchError::InvalidUrl {
            path: origin.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            base,
        })
    }
}

impl ContentSource for HttpSource {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| FetchError::InvalidUrl {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let http_error = |source| FetchError::Http {
            path: path.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(http_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(http_error)
    }
}
