//! Font detection analyzer
//!
//! Detects the font families a page uses, from three sources: Google Fonts
//! `<link>` tags, inline `<style>` blocks, and external stylesheets.
//! Families are classified as `google` (matches a known Google Fonts name)
//! or `web`, and de-duplicated by (family, type).

use crate::analyzer::{Analyzer, AnalyzerError};
use crate::crawler::{fetch_html, CrawlError};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use url::Url;

/// Families recognized as Google Fonts
const GOOGLE_FONTS: &[&str] = &[
    "Roboto",
    "Open Sans",
    "Lato",
    "Montserrat",
    "Source Sans Pro",
    "Raleway",
    "Poppins",
    "Oswald",
    "Nunito",
    "Ubuntu",
    "Mulish",
    "Inter",
    "Playfair Display",
    "Merriweather",
    "PT Sans",
];

/// CSS generic families that never identify a real font
const GENERIC_FAMILIES: &[&str] = &["serif", "sans-serif", "monospace", "cursive", "fantasy"];

/// One detected font
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FontFace {
    pub family: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
}

/// Detects fonts used by a page
pub struct FontAnalyzer {
    client: Client,
    import_re: Regex,
    family_param_re: Regex,
    font_family_re: Regex,
}

impl FontAnalyzer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            import_re: Regex::new(
                r#"@import\s+url\(['"]?([^'")]*fonts\.googleapis\.com[^'")]*)['"]?\)"#,
            )
            .expect("valid regex"),
            family_param_re: Regex::new(r"family=([^&]*)").expect("valid regex"),
            font_family_re: Regex::new(r"(?i)font-family\s*:\s*([^;}]+)").expect("valid regex"),
        }
    }

    /// Extracts Google Fonts families from a fonts.googleapis.com URL
    ///
    /// `family=Open+Sans:400,700|Lato` yields `["Open Sans", "Lato"]`.
    fn parse_google_families(&self, fonts_url: &str) -> Vec<String> {
        let Some(capture) = self.family_param_re.captures(fonts_url) else {
            return Vec::new();
        };

        capture[1]
            .replace('+', " ")
            .split('|')
            .map(|family| family.split(':').next().unwrap_or_default().trim().to_string())
            .filter(|family| !family.is_empty())
            .collect()
    }

    /// Extracts fonts from a CSS body: Google Fonts `@import` statements and
    /// `font-family` declarations
    fn extract_fonts_from_css(&self, css: &str, source: &str) -> Vec<FontFace> {
        let mut fonts = Vec::new();

        for capture in self.import_re.captures_iter(css) {
            let import_url = capture[1].to_string();
            for family in self.parse_google_families(&import_url) {
                fonts.push(FontFace {
                    family,
                    kind: "google".to_string(),
                    source: import_url.clone(),
                });
            }
        }

        for capture in self.font_family_re.captures_iter(css) {
            for family in capture[1].split(',') {
                let family = family.trim().trim_matches(|c| c == '\'' || c == '"').trim();
                if family.is_empty() || GENERIC_FAMILIES.contains(&family) {
                    continue;
                }
                fonts.push(FontFace {
                    family: family.to_string(),
                    kind: classify_family(family).to_string(),
                    source: source.to_string(),
                });
            }
        }

        fonts
    }

    /// Pulls the font sources out of a page: Google Fonts link tags, inline
    /// style bodies, and resolved stylesheet URLs
    fn extract_font_sources(&self, html: &str, base: &Url) -> (Vec<FontFace>, Vec<String>, Vec<Url>) {
        let document = Html::parse_document(html);

        let mut link_fonts = Vec::new();
        if let Ok(selector) = Selector::parse("link[href]") {
            for element in document.select(&selector) {
                let Some(href) = element.value().attr("href") else {
                    continue;
                };
                if !href.contains("fonts.googleapis.com") {
                    continue;
                }
                for family in self.parse_google_families(href) {
                    link_fonts.push(FontFace {
                        family,
                        kind: "google".to_string(),
                        source: href.to_string(),
                    });
                }
            }
        }

        let mut inline_css = Vec::new();
        if let Ok(selector) = Selector::parse("style") {
            for element in document.select(&selector) {
                inline_css.push(element.text().collect::<String>());
            }
        }

        let mut stylesheets = Vec::new();
        if let Ok(selector) = Selector::parse("link[rel='stylesheet'][href]") {
            for element in document.select(&selector) {
                if let Some(href) = element.value().attr("href") {
                    if let Ok(resolved) = base.join(href) {
                        stylesheets.push(resolved);
                    }
                }
            }
        }

        (link_fonts, inline_css, stylesheets)
    }
}

#[async_trait]
impl Analyzer for FontAnalyzer {
    fn name(&self) -> &str {
        "fonts"
    }

    async fn analyze(&self, page_url: &str) -> Result<Value, AnalyzerError> {
        let html = fetch_html(&self.client, page_url).await.map_err(|e| match e {
            CrawlError::ContentMismatch { url, content_type } => {
                AnalyzerError::ContentMismatch { url, content_type }
            }
            other => AnalyzerError::Fetch {
                url: page_url.to_string(),
                message: other.to_string(),
            },
        })?;

        let base = Url::parse(page_url).map_err(|e| AnalyzerError::Analysis {
            url: page_url.to_string(),
            message: e.to_string(),
        })?;

        let (mut fonts, inline_css, stylesheets) = self.extract_font_sources(&html, &base);

        for css in &inline_css {
            fonts.extend(self.extract_fonts_from_css(css, "inline style"));
        }

        // Stylesheet fetches are per-sheet best-effort: a broken stylesheet
        // loses its fonts, not the page
        for sheet_url in stylesheets {
            match self.client.get(sheet_url.as_str()).send().await {
                Ok(response) if response.status().is_success() => match response.text().await {
                    Ok(css) => fonts.extend(self.extract_fonts_from_css(&css, sheet_url.as_str())),
                    Err(e) => {
                        tracing::warn!("Failed to read stylesheet {}: {}", sheet_url, e);
                    }
                },
                Ok(response) => {
                    tracing::warn!("Stylesheet {} returned HTTP {}", sheet_url, response.status());
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch stylesheet {}: {}", sheet_url, e);
                }
            }
        }

        let fonts = dedupe_fonts(fonts);
        tracing::debug!("Found {} unique fonts on {}", fonts.len(), page_url);

        Ok(json!({
            "fonts": fonts,
            "totalFonts": fonts.len(),
            "url": page_url,
        }))
    }
}

/// Classifies a family name as `google` or `web`
fn classify_family(family: &str) -> &'static str {
    if is_google_font(family) {
        "google"
    } else {
        "web"
    }
}

/// True when the family name matches a known Google Fonts family
fn is_google_font(family: &str) -> bool {
    let family = family.to_lowercase();
    GOOGLE_FONTS
        .iter()
        .any(|google| family.contains(&google.to_lowercase()))
}

/// De-duplicates by (family, type), keeping first-seen order
fn dedupe_fonts(fonts: Vec<FontFace>) -> Vec<FontFace> {
    let mut seen = HashSet::new();
    fonts
        .into_iter()
        .filter(|font| seen.insert((font.family.clone(), font.kind.clone())))
        .collect()
}
