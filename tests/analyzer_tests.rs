//! Integration tests for the bundled analyzers

use sitelens::analyzer::{Analyzer, FontAnalyzer, MetaAnalyzer};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    // `set_body_raw` sets the mime directly; `set_body_string` would force
    // `text/plain` and override a later `content-type` header.
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html")
}

#[tokio::test]
async fn font_analyzer_detects_fonts_from_all_sources() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><head>
            <link href="https://fonts.googleapis.com/css?family=Roboto">
            <link rel="stylesheet" href="/site.css">
            <style>body { font-family: 'Open Sans', serif; }</style>
            </head><body></body></html>"#
                .to_string(),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/site.css"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("h1 { font-family: Georgia; }")
                .insert_header("content-type", "text/css"),
        )
        .mount(&server)
        .await;

    let analyzer = FontAnalyzer::new(reqwest::Client::new());
    let data = analyzer.analyze(&format!("{}/", base)).await.unwrap();

    assert_eq!(data["totalFonts"], 3);

    let families: Vec<&str> = data["fonts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|font| font["family"].as_str().unwrap())
        .collect();
    assert!(families.contains(&"Roboto"));
    assert!(families.contains(&"Open Sans"));
    assert!(families.contains(&"Georgia"));

    let kinds: Vec<(&str, &str)> = data["fonts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|font| (font["family"].as_str().unwrap(), font["type"].as_str().unwrap()))
        .collect();
    assert!(kinds.contains(&("Roboto", "google")));
    assert!(kinds.contains(&("Georgia", "web")));
}

#[tokio::test]
async fn font_analyzer_tolerates_broken_stylesheet() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><head>
            <link rel="stylesheet" href="/broken.css">
            <style>p { font-family: Verdana; }</style>
            </head><body></body></html>"#
                .to_string(),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken.css"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let analyzer = FontAnalyzer::new(reqwest::Client::new());
    let data = analyzer.analyze(&format!("{}/", base)).await.unwrap();

    // The broken stylesheet loses its fonts, not the page
    assert_eq!(data["totalFonts"], 1);
    assert_eq!(data["fonts"][0]["family"], "Verdana");
}

#[tokio::test]
async fn font_analyzer_fails_on_unreachable_page() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let analyzer = FontAnalyzer::new(reqwest::Client::new());
    let result = analyzer.analyze(&format!("{}/", base)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn meta_analyzer_reports_page_metadata() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<html><head>
            <title>Example Site</title>
            <meta name="description" content="An example website">
            <link rel="canonical" href="{}/canonical">
            </head><body><h1>Welcome</h1><h2>Section</h2></body></html>"#,
            base
        )))
        .mount(&server)
        .await;

    let analyzer = MetaAnalyzer::new(reqwest::Client::new());
    let data = analyzer.analyze(&format!("{}/", base)).await.unwrap();

    assert_eq!(data["title"], "Example Site");
    assert_eq!(data["description"], "An example website");
    assert_eq!(data["canonical"], format!("{}/canonical", base));
    assert_eq!(data["headings"], 2);
}
