/// Build the canonical article address for `title`.
/// Example: ("https://en.wikipedia.org", "Ada Lovelace") -> "https://en.wikipedia.org/wiki/Ada_Lovelace"
pub fn article_url(base_url: &str, title: &str) -> String {
    format!(
        "{}/wiki/{}",
        base_url.trim_end_matches('/'),
        title.trim().replace(' ', "_")
    )
}

/// Extract the page title from a resolved article address.
///
/// Takes the path segment after the last `/wiki/` marker, drops any query or
/// fragment, percent-decodes it and turns underscores into spaces.
/// Returns `None` when there is no marker or nothing usable after it.
pub fn title_from_wiki_url(url: &str) -> Option<String> {
    let (_, segment) = url.trim().rsplit_once("/wiki/")?;

    let segment = segment.split(['?', '#']).next()?;

    let decoded = urlencoding::decode(segment).ok()?;
    let title = decoded.replace('_', " ").trim().to_string();

    match title.is_empty() {
        true => None,
        false => Some(title),
    }
}
