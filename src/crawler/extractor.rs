//! Structured content extraction from fetched HTML
//!
//! Pure function of page content and the request's extraction flags. Link
//! extraction always runs when the `links` flag is set because discovery
//! depends on it; everything else is opt-in per request.

use crate::models::ExtractFlags;
use scraper::{Html, Selector};
use std::collections::HashMap;
use url::Url;

/// Content extracted from one page
#[derive(Debug, Clone, Default)]
pub struct ExtractedContent {
    pub title: Option<String>,
    pub text_content: Option<String>,
    pub images: Vec<String>,
    /// Observed links: absolute http(s) URLs, including cross-domain ones
    pub links: Vec<String>,
    pub meta_description: Option<String>,
    pub headings: HashMap<String, Vec<String>>,
    pub image_alt_text: Vec<String>,
    pub canonical_url: Option<String>,
}

/// Extracts structured content from an HTML body
///
/// # Arguments
///
/// * `body` - The raw HTML
/// * `base` - The page's own URL, for resolving relative references
/// * `flags` - Which fields to extract
pub fn extract(body: &str, base: &Url, flags: &ExtractFlags) -> ExtractedContent {
    let document = Html::parse_document(body);
    let mut content = ExtractedContent {
        title: extract_title(&document),
        meta_description: extract_meta_description(&document),
        ..Default::default()
    };

    if flags.text {
        content.text_content = extract_text(&document);
    }

    if flags.images || flags.image_alt_text {
        let (images, alt_text) = extract_images(&document, base);
        if flags.images {
            content.images = images;
        }
        if flags.image_alt_text {
            content.image_alt_text = alt_text;
        }
    }

    if flags.links {
        content.links = extract_links(&document, base);
    }

    if flags.headings {
        content.headings = extract_headings(&document);
    }

    if flags.canonical_url {
        content.canonical_url = extract_canonical(&document, base);
    }

    content
}

/// Extracts the page title
fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts the meta description
fn extract_meta_description(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[name="description"]"#).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts visible text, skipping script and style contents, with
/// whitespace collapsed to single spaces
fn extract_text(document: &Html) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let inside_skipped = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| matches!(el.name(), "script" | "style"))
        });
        if !inside_skipped {
            parts.push(text);
        }
    }

    let collapsed = parts
        .iter()
        .flat_map(|s| s.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");

    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Extracts image URLs and alt texts
fn extract_images(document: &Html, base: &Url) -> (Vec<String>, Vec<String>) {
    let mut images = Vec::new();
    let mut alt_text = Vec::new();

    if let Ok(selector) = Selector::parse("img") {
        for element in document.select(&selector) {
            if let Some(src) = element.value().attr("src") {
                if let Ok(absolute) = base.join(src) {
                    images.push(absolute.to_string());
                }
            }
            if let Some(alt) = element.value().attr("alt") {
                let alt = alt.trim();
                if !alt.is_empty() {
                    alt_text.push(alt.to_string());
                }
            }
        }
    }

    (images, alt_text)
}

/// Extracts all http(s) links as absolute URLs
fn extract_links(document: &Html, base: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Ok(absolute) = base.join(href) {
                    if absolute.scheme() == "http" || absolute.scheme() == "https" {
                        links.push(absolute.to_string());
                    }
                }
            }
        }
    }

    links
}

/// Extracts h1-h3 headings keyed by level
fn extract_headings(document: &Html) -> HashMap<String, Vec<String>> {
    let mut headings = HashMap::new();

    for level in ["h1", "h2", "h3"] {
        let Ok(selector) = Selector::parse(level) else {
            continue;
        };
        let texts: Vec<String> = document
            .select(&selector)
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        headings.insert(level.to_string(), texts);
    }

    headings
}

/// Extracts the canonical URL from a link[rel=canonical] tag
fn extract_canonical(document: &Html, base: &Url) -> Option<String> {
    let selector = Selector::parse(r#"link[rel="canonical"][href]"#).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| base.join(href).ok())
        .map(|url| url.to_string())
}
