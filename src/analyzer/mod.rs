//! Page analyzers
//!
//! An analyzer is one named unit of page analysis invoked by the worker
//! pipeline. Analyzers are registered by name in an [`AnalyzerRegistry`]
//! and selected per job from the request options; their internals are
//! opaque to the orchestration core.

mod fonts;
mod meta;

pub use fonts::FontAnalyzer;
pub use meta::MetaAnalyzer;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by analyzers; caught per page by the worker and recorded
/// rather than failing the attempt
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Expected HTML at {url}, got {content_type}")]
    ContentMismatch { url: String, content_type: String },

    #[error("Analysis failed for {url}: {message}")]
    Analysis { url: String, message: String },
}

/// A single page-analysis unit
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Registry name, also used as the result key in the aggregate
    fn name(&self) -> &str;

    /// Analyzes one page, returning an analyzer-specific JSON object
    async fn analyze(&self, page_url: &str) -> Result<Value, AnalyzerError>;
}

/// Named set of analyzers selectable per scan request
#[derive(Default)]
pub struct AnalyzerRegistry {
    analyzers: HashMap<String, Arc<dyn Analyzer>>,
    /// Registration order; doubles as the default selection
    default_set: Vec<String>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an analyzer under its own name
    ///
    /// Re-registering a name replaces the previous analyzer without
    /// changing the default-set order.
    pub fn register(&mut self, analyzer: Arc<dyn Analyzer>) {
        let name = analyzer.name().to_string();
        if self.analyzers.insert(name.clone(), analyzer).is_none() {
            self.default_set.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Analyzer>> {
        self.analyzers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.analyzers.contains_key(name)
    }

    /// All registered names in registration order
    pub fn names(&self) -> &[String] {
        &self.default_set
    }

    /// Resolves a request's analyzer selection: the requested names as
    /// given, or the full default set when the request names none
    pub fn select(&self, requested: Option<&[String]>) -> Vec<String> {
        match requested {
            Some(names) if !names.is_empty() => names.to_vec(),
            _ => self.default_set.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedAnalyzer {
        name: &'static str,
    }

    #[async_trait]
    impl Analyzer for FixedAnalyzer {
        fn name(&self) -> &str {
            self.name
        }

        async fn analyze(&self, _page_url: &str) -> Result<Value, AnalyzerError> {
            Ok(json!({}))
        }
    }

    fn registry() -> AnalyzerRegistry {
        let mut registry = AnalyzerRegistry::new();
        registry.register(Arc::new(FixedAnalyzer { name: "fonts" }));
        registry.register(Arc::new(FixedAnalyzer { name: "meta" }));
        registry
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = registry();
        assert!(registry.contains("fonts"));
        assert!(registry.contains("meta"));
        assert!(!registry.contains("lighthouse"));
        assert!(registry.get("fonts").is_some());
    }

    #[test]
    fn test_select_defaults_to_registration_order() {
        let registry = registry();
        assert_eq!(registry.select(None), vec!["fonts", "meta"]);
        assert_eq!(registry.select(Some(&[])), vec!["fonts", "meta"]);
    }

    #[test]
    fn test_select_honors_request() {
        let registry = registry();
        let requested = vec!["meta".to_string()];
        assert_eq!(registry.select(Some(&requested)), vec!["meta"]);
    }

    #[test]
    fn test_reregistering_keeps_order() {
        let mut registry = registry();
        registry.register(Arc::new(FixedAnalyzer { name: "fonts" }));
        assert_eq!(registry.names(), &["fonts".to_string(), "meta".to_string()]);
    }
}
