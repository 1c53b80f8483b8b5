//! Exploratory fetcher that folds in same-host linked pages.

use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::StageResult;
use crate::fetchers::http::HttpFetcher;
use crate::traits::fetcher::{FetchCapability, SourceFetcher};
use crate::types::content::RawContent;

static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).unwrap());

/// Paths that are never worth following for research content.
const SKIP_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".zip", ".css", ".js", ".ico", ".mp4",
];

/// Fetches the requested page, then up to `max_linked_pages` pages it links
/// to on the same host. Linked pages ride along in `RawContent::linked`.
///
/// Only the primary fetch can fail the stage; a linked page that fails is
/// logged and skipped.
#[derive(Debug, Clone)]
pub struct LinkFollowingFetcher {
    http: HttpFetcher,
    max_linked_pages: usize,
}

impl LinkFollowingFetcher {
    pub fn new(http: HttpFetcher) -> Self {
        Self {
            http,
            max_linked_pages: 3,
        }
    }

    pub fn with_max_linked_pages(mut self, max: usize) -> Self {
        self.max_linked_pages = max;
        self
    }

    /// Same-host links in document order, deduped, excluding the page itself.
    fn extract_links(&self, base_url: &Url, html: &str) -> Vec<Url> {
        let mut seen = HashSet::new();
        seen.insert(strip_fragment(base_url.clone()));

        HREF.captures_iter(html)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str())
            .filter(|href| {
                !(href.starts_with('#')
                    || href.starts_with("javascript:")
                    || href.starts_with("mailto:")
                    || href.starts_with("tel:"))
            })
            .filter_map(|href| base_url.join(href).ok())
            .map(strip_fragment)
            .filter(|url| self.should_follow(url, base_url))
            .filter(|url| seen.insert(url.clone()))
            .take(self.max_linked_pages)
            .collect()
    }

    fn should_follow(&self, url: &Url, base_url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        if url.host_str() != base_url.host_str() {
            return false;
        }
        let path = url.path().to_ascii_lowercase();
        !SKIP_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
    }
}

fn strip_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

#[async_trait]
impl SourceFetcher for LinkFollowingFetcher {
    async fn fetch(&self, url: &str) -> StageResult<RawContent> {
        let mut page = self.http.fetch_page(url).await?;
        if self.max_linked_pages == 0 {
            return Ok(page);
        }

        let base = page.final_url.as_deref().unwrap_or(url);
        let Ok(base_url) = Url::parse(base) else {
            return Ok(page);
        };

        let links = self.extract_links(&base_url, &page.body);
        debug!(url = %url, links = links.len(), "Following linked pages");

        for link in links {
            match self.http.fetch_page(link.as_str()).await {
                Ok(linked) => page.linked.push(linked),
                Err(e) => warn!(url = %link, error = %e, "Skipping linked page"),
            }
        }

        info!(url = %url, linked_pages = page.linked.len(), "Exploratory fetch finished");
        Ok(page)
    }

    fn capability(&self) -> FetchCapability {
        FetchCapability::Exploratory
    }

    fn name(&self) -> &str {
        "link-following"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> LinkFollowingFetcher {
        LinkFollowingFetcher::new(HttpFetcher::new()).with_max_linked_pages(2)
    }

    #[test]
    fn test_extract_links_same_host_only() {
        let base = Url::parse("https://example.com/fires").unwrap();
        let html = r##"
            <a href="/about">About</a>
            <a href="https://other.com/x">Elsewhere</a>
            <a href="#top">Top</a>
            <a href="javascript:void(0)">JS</a>
            <a href="/report.pdf">PDF</a>
            <a href="/data">Data</a>
            <a href="/more">More</a>
        "##;

        let links = fetcher().extract_links(&base, html);
        let links: Vec<_> = links.iter().map(Url::as_str).collect();
        assert_eq!(links, vec!["https://example.com/about", "https://example.com/data"]);
    }

    #[test]
    fn test_extract_links_skips_self_and_duplicates() {
        let base = Url::parse("https://example.com/fires").unwrap();
        let html = r#"<a href="/fires#map">Self</a><a href="/a">A</a><a href="/a#x">A again</a>"#;

        let links = fetcher().extract_links(&base, html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].as_str(), "https://example.com/a");
    }

    #[test]
    fn test_capability_is_exploratory() {
        assert_eq!(fetcher().capability(), FetchCapability::Exploratory);
    }
}
