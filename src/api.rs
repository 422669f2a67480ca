//! HTTP boundary to the scanning/moving/searching service.
//!
//! Everything that talks to the network goes through [`Backend`]; the rest of
//! the crate only sees the wire types defined here.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("reshelf/", env!("CARGO_PKG_VERSION"));

/// One proposed move, both paths relative to [`ScanPlan::root_path`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMapping {
    #[serde(rename = "src_path")]
    pub source_path: String,
    #[serde(rename = "dst_path")]
    pub destination_path: String,
}

/// Full `get_files` result; posted back unchanged to `update_files`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanPlan {
    pub root_path: String,
    pub items: Vec<FileMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub file: String,
}

/// Filters shared by scan and search requests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanQuery {
    pub root_path: String,
    pub recursive: bool,
    /// `;`-joined extensions, as sent in `required_exts`.
    pub required_exts: String,
}

impl ScanQuery {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("root_path", self.root_path.clone()),
            ("recursive", self.recursive.to_string()),
            ("required_exts", self.required_exts.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    pub scan: ScanQuery,
    pub query: String,
}

impl SearchQuery {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = self.scan.params();
        params.push(("search_query", self.query.clone()));
        params
    }
}

#[derive(Serialize)]
struct OpenFileRequest<'a> {
    file_path: &'a str,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid server URL '{0}'")]
    InvalidBaseUrl(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {status}: {body}")]
    Status { status: u16, body: String },
}

/// Remote service operations.
///
/// Production uses [`HttpBackend`]; tests inject `MockBackend`.
#[cfg_attr(test, mockall::automock)]
pub trait Backend: Send + Sync {
    /// `GET /get_files`: propose a destination for every matching file.
    fn get_files(&self, query: &ScanQuery) -> Result<ScanPlan, ApiError>;

    /// `POST /update_files`: carry out a previously returned plan.
    fn update_files(&self, plan: &ScanPlan) -> Result<serde_json::Value, ApiError>;

    /// `GET /search_files`: files under the root matching `query`.
    fn search_files(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ApiError>;

    /// `POST /open_file`: ask the service host to open a file.
    fn open_file(&self, file_path: &str) -> Result<serde_json::Value, ApiError>;
}

pub struct HttpBackend {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let parsed = reqwest::Url::parse(base_url)
            .map_err(|_| ApiError::InvalidBaseUrl(base_url.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }

        // Blocking clients default to a 30 s timeout; `None` disables it.
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(HttpBackend {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    fn checked(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

impl Backend for HttpBackend {
    fn get_files(&self, query: &ScanQuery) -> Result<ScanPlan, ApiError> {
        let response = self
            .client
            .get(self.endpoint("get_files"))
            .query(&query.params())
            .send()?;
        Ok(Self::checked(response)?.json()?)
    }

    fn update_files(&self, plan: &ScanPlan) -> Result<serde_json::Value, ApiError> {
        let response = self
            .client
            .post(self.endpoint("update_files"))
            .json(plan)
            .send()?;
        Ok(Self::checked(response)?.json()?)
    }

    fn search_files(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ApiError> {
        let response = self
            .client
            .get(self.endpoint("search_files"))
            .query(&query.params())
            .send()?;
        Ok(Self::checked(response)?.json()?)
    }

    fn open_file(&self, file_path: &str) -> Result<serde_json::Value, ApiError> {
        let response = self
            .client
            .post(self.endpoint("open_file"))
            .json(&OpenFileRequest { file_path })
            .send()?;
        Ok(Self::checked(response)?.json()?)
    }
}
