pub mod category;
pub mod random;

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;

use crate::internal::errors::SourceError;
use crate::internal::models::Candidate;

pub use category::CategorySource;
pub use random::RandomArticleSource;

pub const WIKI_BASE_URL: &str = "https://en.wikipedia.org";
pub const DEFAULT_USER_AGENT: &str = "UniqueWikiBot/4.0";

/// Topic entry meaning "no category restriction".
pub const ANY_TOPIC: &str = "Any (Totally Random)";

/// Title prefixes of pages that are not encyclopedia articles.
pub const NON_ARTICLE_PREFIXES: [&str; 6] = [
    "Category:",
    "File:",
    "Talk:",
    "Portal:",
    "Template:",
    "Help:",
];

/// True when `title` lives in one of the non-article namespaces.
pub fn is_non_article(title: &str) -> bool {
    NON_ARTICLE_PREFIXES
        .iter()
        .any(|prefix| title.starts_with(prefix))
}

/// Something that can propose one random article.
pub trait CandidateSource: Send + Sync {
    /// Fetch a single candidate. Network, parse and resolution problems are
    /// all reported as `SourceError`.
    fn fetch_one(&self) -> Result<Candidate, SourceError>;

    /// Human readable description used in the activity log.
    fn label(&self) -> String;
}

impl<S: CandidateSource + ?Sized> CandidateSource for Box<S> {
    fn fetch_one(&self) -> Result<Candidate, SourceError> {
        (**self).fetch_one()
    }

    fn label(&self) -> String {
        (**self).label()
    }
}

/// Which pool random articles are drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Unrestricted,
    Category(String),
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrestricted => f.write_str(ANY_TOPIC),
            Self::Category(category) => f.write_str(category),
        }
    }
}

impl SourceKind {
    /// Map a topic name picked by the user. Anything starting with "Any"
    /// (or blank) means no restriction.
    pub fn from_topic(topic: &str) -> Self {
        let topic = topic.trim();
        match topic.is_empty() || topic.starts_with("Any") {
            true => Self::Unrestricted,
            false => Self::Category(topic.to_string()),
        }
    }

    pub fn build(&self, client: WikiClient) -> Box<dyn CandidateSource> {
        match self {
            Self::Unrestricted => Box::new(RandomArticleSource::new(client)),
            Self::Category(category) => Box::new(CategorySource::new(client, category.clone())),
        }
    }
}

/// Blocking HTTP client for the Wikipedia endpoints.
///
/// Every request carries the configured user agent and timeout so a stalled
/// connection cannot hold up the retry loop for longer than one attempt.
#[derive(Clone, Debug)]
pub struct WikiClient {
    client: Client,
    base_url: String,
}

impl WikiClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Client against the public English Wikipedia with a 10 second timeout.
    pub fn with_defaults() -> Result<Self> {
        Self::new(WIKI_BASE_URL, DEFAULT_USER_AGENT, Duration::from_secs(10))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `url`, following redirects, and reject non-success statuses.
    pub fn get(&self, url: &str) -> Result<Response, SourceError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|source| SourceError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        match status.is_success() {
            true => Ok(resp),
            false => Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }),
        }
    }

    /// GET `url` and deserialize the JSON body into `T`.
    pub fn get_json<T>(&self, url: &str) -> Result<T, SourceError>
    where
        T: DeserializeOwned,
    {
        let resp = self.get(url)?;
        let body = resp.text().map_err(|source| SourceError::Http {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_str(&body).map_err(|e| SourceError::Parse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}
