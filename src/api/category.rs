use tracing::debug;

use super::{CandidateSource, WikiClient};
use crate::internal::errors::SourceError;
use crate::internal::models::Candidate;
use crate::utils::url::title_from_wiki_url;

/// Draws through `Special:RandomInCategory/<category>`, which answers with a
/// redirect to a member page.
///
/// Identifiers are the normalized titles taken from the final address, not
/// page ids, so history written by this source does not overlap with
/// `RandomArticleSource`.
#[derive(Clone, Debug)]
pub struct CategorySource {
    client: WikiClient,
    category: String,
}

impl CategorySource {
    pub fn new(client: WikiClient, category: impl Into<String>) -> Self {
        Self {
            client,
            category: category.into(),
        }
    }

    fn entry_url(&self) -> String {
        format!(
            "{}/wiki/Special:RandomInCategory/{}",
            self.client.base_url(),
            urlencoding::encode(&self.category.replace(' ', "_"))
        )
    }
}

impl CandidateSource for CategorySource {
    fn fetch_one(&self) -> Result<Candidate, SourceError> {
        let resp = self.client.get(&self.entry_url())?;
        let final_url = resp.url().to_string();

        let title = title_from_wiki_url(&final_url)
            .ok_or_else(|| SourceError::Unresolved(final_url.clone()))?;

        // Still on the special page: the category had nothing to redirect to.
        if title.starts_with("Special:") {
            return Err(SourceError::Unresolved(final_url));
        }

        debug!(category = %self.category, title = %title, "Resolved category redirect");

        Ok(Candidate {
            identifier: title.clone(),
            title,
            url: final_url,
        })
    }

    fn label(&self) -> String {
        self.category.clone()
    }
}
