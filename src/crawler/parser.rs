//! HTML parsing for link and metadata extraction

use scraper::{Html, Selector};
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from the <title> tag)
    pub title: Option<String>,

    /// Content of <meta name="description">
    pub description: Option<String>,

    /// Canonical URL from <link rel="canonical">
    pub canonical: Option<String>,

    /// Number of h1-h3 headings
    pub headings: usize,

    /// All followable links on the page (absolute URLs)
    pub links: Vec<String>,
}

/// Parses an HTML page, extracting metadata and links
///
/// # Link Extraction Rules
///
/// `<a href>` tags are followed; `javascript:`, `mailto:`, `tel:`, and
/// `data:` schemes, fragment-only anchors, download links, and anything
/// that resolves to a non-HTTP(S) URL are excluded.
///
/// # Example
///
/// ```
/// use sitelens::crawler::parse_page;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_page(html, &base);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, vec!["https://example.com/page"]);
/// ```
pub fn parse_page(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let title = select_text(&document, "title");

    let description = Selector::parse("meta[name='description']")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|element| element.value().attr("content"))
                .map(|content| content.trim().to_string())
        })
        .filter(|s| !s.is_empty());

    let canonical = Selector::parse("link[rel='canonical'][href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|element| element.value().attr("href"))
                .and_then(|href| resolve_link(href, base_url))
        });

    let headings = Selector::parse("h1, h2, h3")
        .ok()
        .map(|selector| document.select(&selector).count())
        .unwrap_or(0);

    let mut links = Vec::new();
    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute) = resolve_link(href, base_url) {
                    links.push(absolute);
                }
            }
        }
    }

    ParsedPage {
        title,
        description,
        canonical,
        headings,
        links,
    }
}

/// Text content of the first element matching `selector`
fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolves an href to an absolute URL, or None if it should be excluded
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>  Test Page  </title></head><body></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let html = r#"<html><head></head><body></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_extract_description_and_canonical() {
        let html = r#"<html><head>
            <meta name="description" content="A sample page">
            <link rel="canonical" href="https://example.com/canonical">
            </head><body></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.description, Some("A sample page".to_string()));
        assert_eq!(
            parsed.canonical,
            Some("https://example.com/canonical".to_string())
        );
    }

    #[test]
    fn test_counts_headings() {
        let html = r#"<html><body><h1>A</h1><h2>B</h2><h2>C</h2><h3>D</h3><h4>E</h4></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.headings, 4);
    }

    #[test]
    fn test_extract_relative_and_absolute_links() {
        let html = r#"<html><body>
            <a href="/other">Relative</a>
            <a href="https://other.com/page">Absolute</a>
            </body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(
            parsed.links,
            vec!["https://example.com/other", "https://other.com/page"]
        );
    }

    #[test]
    fn test_skips_special_schemes_and_anchors() {
        let html = r##"<html><body>
            <a href="javascript:void(0)">JS</a>
            <a href="mailto:test@example.com">Email</a>
            <a href="tel:+1234567890">Call</a>
            <a href="data:text/html,hi">Data</a>
            <a href="#section">Anchor</a>
            <a href="/file.pdf" download>Download</a>
            <a href="/valid">Valid</a>
            </body></html>"##;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.links, vec!["https://example.com/valid"]);
    }
}
