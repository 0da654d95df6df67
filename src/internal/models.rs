use serde::Deserialize;

/// A randomly fetched article that has not been accepted into history yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Candidate {
    pub title: String,
    pub url: String,
    /// Value used for membership tests in the history store.
    pub identifier: String,
}

/// Result of one run of the dedup fetch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success(Candidate),
    ExhaustedRetries,
    /// Every attempt failed before a candidate was produced.
    TransientFailure(String),
}

impl FetchOutcome {
    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            Self::Success(candidate) => Some(candidate),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Body of `action=query&list=random`.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct RandomQueryResponse {
    #[serde(default)]
    pub query: Option<RandomQuery>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct RandomQuery {
    #[serde(default)]
    pub random: Vec<RandomPage>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct RandomPage {
    pub id: u64,
    #[serde(default)]
    pub ns: i64,
    pub title: String,
}
