use tracing::debug;

use super::{ANY_TOPIC, CandidateSource, WikiClient};
use crate::internal::errors::SourceError;
use crate::internal::models::{Candidate, RandomQueryResponse};
use crate::utils::url::article_url;

const RANDOM_QUERY: &str =
    "w/api.php?action=query&format=json&list=random&rnlimit=1&rnnamespace=0";

/// Draws from the whole main namespace via `list=random`.
///
/// Identifiers are numeric page ids, which survive renames.
#[derive(Clone, Debug)]
pub struct RandomArticleSource {
    client: WikiClient,
}

impl RandomArticleSource {
    pub fn new(client: WikiClient) -> Self {
        Self { client }
    }

    fn query_url(&self) -> String {
        format!("{}/{}", self.client.base_url(), RANDOM_QUERY)
    }
}

impl CandidateSource for RandomArticleSource {
    fn fetch_one(&self) -> Result<Candidate, SourceError> {
        let url = self.query_url();
        let body: RandomQueryResponse = self.client.get_json(&url)?;

        let page = body
            .query
            .and_then(|q| q.random.into_iter().next())
            .ok_or_else(|| SourceError::Empty(url.clone()))?;

        debug!(id = page.id, title = %page.title, ns = page.ns, "Random page");

        Ok(Candidate {
            url: article_url(self.client.base_url(), &page.title),
            identifier: page.id.to_string(),
            title: page.title,
        })
    }

    fn label(&self) -> String {
        ANY_TOPIC.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::time::Duration;

    fn client_for(server: &mockito::Server) -> WikiClient {
        WikiClient::new(&server.url(), "TestBot/1.0", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_fetch_one_success() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("list".into(), "random".into()),
                Matcher::UrlEncoded("rnlimit".into(), "1".into()),
                Matcher::UrlEncoded("rnnamespace".into(), "0".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"query":{"random":[{"id":42,"ns":0,"title":"Alpha Centauri"}]}}"#)
            .create();

        let source = RandomArticleSource::new(client_for(&server));
        let candidate = source.fetch_one().unwrap();

        mock.assert();
        assert_eq!(candidate.identifier, "42");
        assert_eq!(candidate.title, "Alpha Centauri");
        assert_eq!(
            candidate.url,
            format!("{}/wiki/Alpha_Centauri", server.url())
        );
    }

    #[test]
    fn test_fetch_one_empty_list() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"query":{"random":[]}}"#)
            .create();

        let source = RandomArticleSource::new(client_for(&server));
        let result = source.fetch_one();

        mock.assert();
        assert!(matches!(result, Err(SourceError::Empty(_))));
    }

    #[test]
    fn test_fetch_one_invalid_json() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create();

        let source = RandomArticleSource::new(client_for(&server));
        let result = source.fetch_one();

        mock.assert();
        assert!(matches!(result, Err(SourceError::Parse { .. })));
    }
}
