//! Wikipedia summaries
//!
//! A lookup is three requests at most: a search to pick the best-matching
//! title, a page query for the plain-text intro extract, and (only for
//! disambiguation pages) the rendered page, whose list entries give the
//! candidate titles in the order the page lists them.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;

use super::{Encyclopedia, LookupError};
use crate::config::EncyclopediaConfig;
use crate::{Error, Result};

/// Request timeout for every Wikipedia call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PagesResponse {
    query: Option<PagesQuery>,
}

#[derive(Debug, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    pageprops: Option<PageProps>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    disambiguation: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: Option<ParsedPage>,
}

#[derive(Debug, Deserialize)]
struct ParsedPage {
    #[serde(default)]
    text: String,
}

/// What a page query found
#[derive(Debug, PartialEq, Eq)]
enum PageLookup {
    Summary(String),
    Disambiguation(String),
    Missing,
}

/// Wikipedia client using the MediaWiki action API
pub struct WikipediaClient {
    client: reqwest::Client,
    endpoint: String,
}

impl WikipediaClient {
    /// Create a client for the configured language edition
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &EncyclopediaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("hark/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Http)?;

        let endpoint = format!("https://{}.wikipedia.org/w/api.php", config.language);
        tracing::debug!(endpoint = %endpoint, "wikipedia client initialized");

        Ok(Self { client, endpoint })
    }

    /// Call the action API and decode the JSON body
    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        action: &str,
        params: &[(&str, &str)],
    ) -> std::result::Result<T, LookupError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("action", action), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "wikipedia request failed");
                LookupError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "wikipedia API error");
            return Err(LookupError::Unavailable(format!("HTTP {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| LookupError::Unavailable(format!("invalid response: {e}")))
    }

    /// Find the best-matching page title for a free-form term
    async fn search(&self, subject: &str) -> std::result::Result<String, LookupError> {
        let response: SearchResponse = self
            .call("query", &[("list", "search"), ("srsearch", subject), ("srlimit", "1"), ("srprop", "")])
            .await?;
        first_title(response).ok_or(LookupError::NotFound)
    }

    /// Fetch the intro extract for an exact title
    async fn page(&self, title: &str, sentences: usize) -> std::result::Result<PageLookup, LookupError> {
        let sentences = sentences.max(1).to_string();
        let response: PagesResponse = self
            .call(
                "query",
                &[
                    ("prop", "extracts|pageprops"),
                    ("ppprop", "disambiguation"),
                    ("exintro", "1"),
                    ("explaintext", "1"),
                    ("exsentences", sentences.as_str()),
                    ("redirects", "1"),
                    ("titles", title),
                ],
            )
            .await?;
        Ok(classify_page(response))
    }

    /// List the options a disambiguation page offers, in page order
    async fn candidates(&self, title: &str) -> std::result::Result<Vec<String>, LookupError> {
        let response: ParseResponse = self
            .call("parse", &[("page", title), ("prop", "text"), ("redirects", "1")])
            .await?;
        Ok(response
            .parse
            .map(|page| disambiguation_options(&page.text))
            .unwrap_or_default())
    }
}

#[async_trait]
impl Encyclopedia for WikipediaClient {
    async fn summary(&self, subject: &str, sentences: usize) -> std::result::Result<String, LookupError> {
        let title = self.search(subject).await?;
        tracing::debug!(subject, title = %title, "wikipedia search matched");

        match self.page(&title, sentences).await? {
            PageLookup::Summary(text) => Ok(text),
            PageLookup::Missing => Err(LookupError::NotFound),
            PageLookup::Disambiguation(title) => {
                let candidates = self.candidates(&title).await?;
                tracing::info!(title = %title, count = candidates.len(), "ambiguous term");
                Err(LookupError::Ambiguous(candidates))
            }
        }
    }
}

fn first_title(response: SearchResponse) -> Option<String> {
    response
        .query
        .and_then(|q| q.search.into_iter().next())
        .map(|hit| hit.title)
}

fn classify_page(response: PagesResponse) -> PageLookup {
    let Some(page) = response.query.and_then(|q| q.pages.into_iter().next()) else {
        return PageLookup::Missing;
    };

    if page.missing {
        return PageLookup::Missing;
    }

    if page
        .pageprops
        .as_ref()
        .is_some_and(|p| p.disambiguation.is_some())
    {
        return PageLookup::Disambiguation(page.title);
    }

    match page.extract.map(|e| e.trim().to_string()) {
        Some(text) if !text.is_empty() => PageLookup::Summary(text),
        _ => PageLookup::Missing,
    }
}

/// Titles of the first article link in each list entry, in document order
///
/// Table-of-contents entries, red links and links outside the article
/// namespace are skipped, as are repeats.
fn disambiguation_options(html: &str) -> Vec<String> {
    let (Ok(items), Ok(links)) = (Selector::parse("li"), Selector::parse("a[title]")) else {
        return Vec::new();
    };

    let document = Html::parse_fragment(html);
    let mut options: Vec<String> = Vec::new();

    for item in document.select(&items) {
        if has_class(item, |c| c.starts_with("tocsection")) {
            continue;
        }

        let Some(title) = item
            .select(&links)
            .next()
            .filter(|link| !has_class(*link, |c| c == "new"))
            .and_then(|link| link.value().attr("title"))
        else {
            continue;
        };

        if !title.contains(':') && !options.iter().any(|o| o == title) {
            options.push(title.to_string());
        }
    }

    options
}

fn has_class(element: ElementRef<'_>, matches: impl Fn(&str) -> bool) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|classes| classes.split_whitespace().any(matches))
}
