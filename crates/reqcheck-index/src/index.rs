use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::{StatusCode, header};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::{debug, trace};
use url::Url;
use uv_normalize::{InvalidNameError, PackageName};
use uv_pep440::Version;

/// A source of released versions.
#[async_trait]
pub trait PackageIndex: Send + Sync {
    /// Every published version of `name`, in no particular order.
    async fn versions(&self, name: &PackageName) -> Result<Vec<Version>, IndexError>;
}

/// An offline index read from a JSON object of package names to version
/// lists:
///
/// ```json
/// { "numpy": ["1.19.5", "1.20.0"], "black": ["19.10b0", "22.1.0"] }
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    packages: FxHashMap<PackageName, Vec<Version>>,
}

impl FlatIndex {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let content = fs_err::read_to_string(path)?;
        Self::from_json(&content).map_err(|err| match err {
            IndexError::Json { source, .. } => IndexError::Json {
                location: path.display().to_string(),
                source,
            },
            err => err,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, IndexError> {
        let raw: FxHashMap<String, Vec<String>> =
            serde_json::from_str(content).map_err(|source| IndexError::Json {
                location: "<flat index>".to_owned(),
                source,
            })?;

        let mut packages: FxHashMap<PackageName, Vec<Version>> = FxHashMap::default();
        for (name, versions) in raw {
            let name = PackageName::from_str(&name)
                .map_err(|source| IndexError::InvalidName { name, source })?;
            packages
                .entry(name.clone())
                .or_default()
                .extend(parse_versions(&name, versions));
        }
        Ok(Self { packages })
    }
}

#[async_trait]
impl PackageIndex for FlatIndex {
    async fn versions(&self, name: &PackageName) -> Result<Vec<Version>, IndexError> {
        self.packages
            .get(name)
            .cloned()
            .ok_or_else(|| IndexError::NotFound(name.clone()))
    }
}

/// A PEP 691 (JSON) simple repository API client, such as `https://pypi.org/simple`.
#[derive(Debug, Clone)]
pub struct SimpleIndex {
    client: reqwest::Client,
    url: Url,
}

/// The PEP 691 JSON media type, version 1.
const SIMPLE_JSON: &str = "application/vnd.pypi.simple.v1+json";

/// The subset of a PEP 691 project page that is read. `versions` was added by
/// PEP 700.
#[derive(Debug, Deserialize)]
struct ProjectPage {
    #[serde(default)]
    versions: Vec<String>,
}

impl SimpleIndex {
    pub const PYPI: &'static str = "https://pypi.org/simple";

    pub fn new(url: Url) -> Result<Self, IndexError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("reqcheck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(IndexError::Client)?;
        Ok(Self::with_client(url, client))
    }

    pub fn pypi() -> Result<Self, IndexError> {
        Self::new(Url::parse(Self::PYPI)?)
    }

    pub fn with_client(mut url: Url, client: reqwest::Client) -> Self {
        // `Url::join` replaces the last segment unless the path ends in `/`.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Self { client, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn project_url(&self, name: &PackageName) -> Result<Url, IndexError> {
        Ok(self.url.join(&format!("{name}/"))?)
    }
}

#[async_trait]
impl PackageIndex for SimpleIndex {
    async fn versions(&self, name: &PackageName) -> Result<Vec<Version>, IndexError> {
        let url = self.project_url(name)?;
        debug!("Fetching `{url}`");

        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, SIMPLE_JSON)
            .send()
            .await
            .map_err(|source| IndexError::Request {
                url: url.clone(),
                source,
            })?;
        match response.status() {
            StatusCode::NOT_FOUND => return Err(IndexError::NotFound(name.clone())),
            status if !status.is_success() => return Err(IndexError::Status { url, status }),
            _ => {}
        }
        let body = response.text().await.map_err(|source| IndexError::Request {
            url: url.clone(),
            source,
        })?;
        let page: ProjectPage =
            serde_json::from_str(&body).map_err(|source| IndexError::Json {
                location: url.to_string(),
                source,
            })?;

        trace!("`{url}` lists {} versions", page.versions.len());
        Ok(parse_versions(name, page.versions).collect())
    }
}

fn parse_versions(
    name: &PackageName,
    versions: Vec<String>,
) -> impl Iterator<Item = Version> + '_ {
    versions
        .into_iter()
        .filter_map(move |version| match Version::from_str(&version) {
            Ok(version) => Some(version),
            Err(err) => {
                debug!("Skipping version `{version}` of `{name}`: {err}");
                None
            }
        })
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("package `{0}` was not found in the index")]
    NotFound(PackageName),
    #[error("failed to build the HTTP client")]
    Client(#[source] reqwest::Error),
    #[error("request to `{url}` failed")]
    Request {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("`{url}` returned {status}")]
    Status { url: Url, status: StatusCode },
    #[error("invalid JSON in `{location}`")]
    Json {
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid package name `{name}` in the index")]
    InvalidName {
        name: String,
        #[source]
        source: InvalidNameError,
    },
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
