//! Regex-based HTML to text extraction.
//!
//! Steps: title and `<meta>` metadata from the full document, strip
//! boilerplate tags, pick the main content block, drop the remaining tags,
//! decode entities, normalize whitespace.

use async_trait::async_trait;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

use crate::error::{StageError, StageResult};
use crate::traits::extractor::ContentExtractor;
use crate::types::content::{ExtractedText, RawContent};

static BOILERPLATE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        "script", "style", "noscript", "nav", "header", "footer", "aside", "iframe", "form",
        "button", "svg",
    ]
    .iter()
    .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).unwrap())
    .collect()
});
static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static ARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<article\b[^>]*>(.*?)</article\s*>").unwrap());
static MAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<main\b[^>]*>(.*?)</main\s*>").unwrap());
static BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(?:section|div)\b[^>]*>(.*?)</(?:section|div)\s*>").unwrap());
static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>").unwrap());
static BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*?)(?:</body\s*>|$)").unwrap());
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title\s*>").unwrap());
static H1: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1\s*>").unwrap());
static META: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").unwrap());
static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z:_-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});
static BLOCK_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|section|article|li|tr|h[1-6]|blockquote|pre)\s*>").unwrap()
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());
static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(?:[xX]([0-9a-fA-F]+)|([0-9]+));").unwrap());
static INLINE_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());
static MULTI_NEWLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// `<meta>` keys copied into `ExtractedText::metadata`, and the key they land under.
const META_KEYS: &[(&str, &str)] = &[
    ("og:description", "description"),
    ("description", "description"),
    ("og:site_name", "site_name"),
    ("author", "author"),
    ("keywords", "keywords"),
    ("article:published_time", "published_time"),
];

/// Minimum text length for a `<section>`/`<div>` to count as main content.
const MIN_BLOCK_CHARS: usize = 100;

/// Boilerplate-stripping HTML extractor.
///
/// Non-HTML text bodies (`text/plain`, JSON) pass through with whitespace
/// normalization only. Pages folded in by an exploratory fetcher are
/// extracted the same way and appended after the main page.
#[derive(Debug, Clone, Default)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_page(&self, raw: &RawContent) -> ExtractedText {
        if !looks_like_html(raw) {
            return ExtractedText::new(normalize_whitespace(&raw.body));
        }

        let html = raw.body.as_str();
        let title = extract_title(html);
        let mut metadata = extract_metadata(html);

        let mut cleaned = COMMENT.replace_all(html, "").into_owned();
        for pattern in BOILERPLATE.iter() {
            cleaned = pattern.replace_all(&cleaned, "").into_owned();
        }

        let main = main_content(&cleaned);
        let text = html_to_text(&main);

        if let Some(url) = raw.final_url.as_deref() {
            metadata.push(("final_url".to_string(), url.to_string()));
        }

        let mut extracted = ExtractedText::new(text);
        if let Some(title) = title {
            extracted = extracted.with_title(title);
        }
        for (key, value) in metadata {
            extracted = extracted.with_metadata(key, value);
        }
        extracted
    }
}

#[async_trait]
impl ContentExtractor for HtmlExtractor {
    async fn extract(&self, raw: &RawContent) -> StageResult<ExtractedText> {
        let page = self.extract_page(raw);

        let mut sections = vec![page.text.clone()];
        for linked in &raw.linked {
            let linked_page = self.extract_page(linked);
            if linked_page.text.is_empty() {
                continue;
            }
            let heading = linked_page.title.as_deref().unwrap_or(&linked.url);
            sections.push(format!("## {heading}\n\n{}", linked_page.text));
        }

        let text = sections
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        if text.is_empty() {
            return Err(StageError::malformed(format!("no text content in {}", raw.url)));
        }

        let mut extracted = ExtractedText::new(text);
        extracted.title = page.title;
        extracted.metadata = page.metadata;
        if !raw.linked.is_empty() {
            extracted = extracted.with_metadata("linked_pages", raw.linked.len().to_string());
        }

        debug!(
            url = %raw.url,
            words = extracted.word_count,
            title = ?extracted.title,
            "Extracted text"
        );
        Ok(extracted)
    }

    fn name(&self) -> &str {
        "html"
    }
}

fn looks_like_html(raw: &RawContent) -> bool {
    match raw.content_type.as_deref() {
        Some(ct) => {
            let ct = ct.to_ascii_lowercase();
            ct.contains("html") || ct.contains("xml")
        }
        None => raw.body.trim_start().starts_with('<'),
    }
}

/// og:title, then `<title>`, then the first `<h1>`.
fn extract_title(html: &str) -> Option<String> {
    let from_meta = META.find_iter(html).find_map(|tag| {
        let attrs = parse_attrs(tag.as_str());
        let key = attr(&attrs, "property").or_else(|| attr(&attrs, "name"))?;
        if key.eq_ignore_ascii_case("og:title") {
            attr(&attrs, "content").map(str::to_string)
        } else {
            None
        }
    });

    from_meta
        .or_else(|| TITLE.captures(html).map(|c| c[1].to_string()))
        .or_else(|| H1.captures(html).map(|c| c[1].to_string()))
        .map(|t| normalize_whitespace(&decode_entities(&TAG.replace_all(&t, ""))))
        .filter(|t| !t.is_empty())
}

/// Descriptive `<meta>` tags; first occurrence of each target key wins.
fn extract_metadata(html: &str) -> Vec<(String, String)> {
    let mut found: Vec<(String, String)> = Vec::new();
    for tag in META.find_iter(html) {
        let attrs = parse_attrs(tag.as_str());
        let Some(key) = attr(&attrs, "property").or_else(|| attr(&attrs, "name")) else {
            continue;
        };
        let Some(content) = attr(&attrs, "content") else {
            continue;
        };
        let key = key.to_ascii_lowercase();
        let Some((_, target)) = META_KEYS.iter().find(|(k, _)| *k == key) else {
            continue;
        };
        if content.trim().is_empty() || found.iter().any(|(k, _)| k.as_str() == *target) {
            continue;
        }
        found.push((target.to_string(), decode_entities(content.trim())));
    }
    found
}

fn parse_attrs(tag: &str) -> Vec<(String, String)> {
    ATTR.captures_iter(tag)
        .map(|c| {
            let value = c.get(2).or_else(|| c.get(3)).map(|m| m.as_str()).unwrap_or_default();
            (c[1].to_ascii_lowercase(), value.to_string())
        })
        .collect()
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// `<article>`, then `<main>`, then the largest `<section>`/`<div>`, then
/// all paragraphs, then the whole body.
fn main_content(html: &str) -> String {
    let articles: Vec<&str> = ARTICLE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect();
    if !articles.is_empty() {
        return articles.join("\n");
    }

    if let Some(main) = MAIN.captures(html).and_then(|c| c.get(1)) {
        return main.as_str().to_string();
    }

    let largest = BLOCK
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .max_by_key(|block| html_to_text(block).len());
    if let Some(block) = largest {
        if html_to_text(block).len() >= MIN_BLOCK_CHARS {
            return block.to_string();
        }
    }

    let paragraphs: Vec<&str> = PARAGRAPH
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect();
    if !paragraphs.is_empty() {
        return paragraphs.join("\n\n");
    }

    BODY.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| html.to_string())
}

fn html_to_text(html: &str) -> String {
    let text = BLOCK_BREAK.replace_all(html, "\n");
    let text = TAG.replace_all(&text, " ");
    normalize_whitespace(&decode_entities(&text))
}

fn decode_entities(text: &str) -> String {
    let text = NUMERIC_ENTITY.replace_all(text, |c: &Captures| {
        let code = match (c.get(1), c.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (_, Some(dec)) => dec.as_str().parse().ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });

    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&mdash;", "-")
        .replace("&ndash;", "-")
        .replace("&hellip;", "...")
        .replace("&amp;", "&")
}

/// Collapse runs of spaces and tabs, trim each line, keep at most one blank
/// line between paragraphs.
pub fn normalize_whitespace(text: &str) -> String {
    let text = INLINE_SPACE.replace_all(text, " ");
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let joined = lines.join("\n");
    MULTI_NEWLINE.replace_all(&joined, "\n\n").trim().to_string()
}
