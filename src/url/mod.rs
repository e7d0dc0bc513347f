//! URL validation and normalization
//!
//! Scan targets are validated once at submission time; crawled links are
//! normalized so the frontier can de-duplicate them.

mod normalize;
mod validate;

pub use normalize::normalize_url;
pub use validate::validate_target;
