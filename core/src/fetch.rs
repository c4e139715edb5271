//! Reading module and image bytes from disk or over http(s)

use std::fmt;
use std::path::{Path, PathBuf};

use reqwest::Url;
use thiserror::Error;

/// Where a resource lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    Url(Url),
}

/// Failures while fetching bytes
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("request to {url} failed: {source}")]
    Http { url: Url, source: reqwest::Error },

    #[error("{url} answered with status {status}")]
    Status {
        url: Url,
        status: reqwest::StatusCode,
    },
}

impl Location {
    /// `http://` and `https://` sources are URLs, anything else a path
    pub fn parse(source: &str) -> Self {
        match Url::parse(source) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Url(url),
            _ => Self::File(PathBuf::from(source)),
        }
    }

    /// Base that relative asset references of this resource resolve against.
    ///
    /// For a file this is its directory; a URL already joins relative to
    /// its own last path segment.
    pub fn asset_base(&self) -> Location {
        match self {
            Self::File(path) => Self::File(
                path.parent()
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(".")),
            ),
            Self::Url(url) => Self::Url(url.clone()),
        }
    }

    /// Resolve `source` relative to this base
    pub fn join(&self, source: &str) -> Location {
        match (Self::parse(source), self) {
            (absolute @ Self::Url(_), _) => absolute,
            (Self::File(path), _) if path.is_absolute() => Self::File(path),
            (Self::File(path), Self::File(dir)) => Self::File(dir.join(path)),
            (Self::File(path), Self::Url(base)) => match base.join(source) {
                Ok(url) => Self::Url(url),
                Err(_) => Self::File(path),
            },
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Fetch the full contents of `location`
pub async fn fetch_bytes(location: &Location) -> Result<Vec<u8>, FetchError> {
    match location {
        Location::File(path) => tokio::fs::read(path).await.map_err(|source| FetchError::Io {
            path: path.clone(),
            source,
        }),
        Location::Url(url) => {
            let http = |source: reqwest::Error| FetchError::Http {
                url: url.clone(),
                source,
            };
            let response = reqwest::get(url.clone()).await.map_err(http)?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.clone(),
                    status,
                });
            }
            let bytes = response.bytes().await.map_err(http)?;
            Ok(bytes.to_vec())
        }
    }
}
