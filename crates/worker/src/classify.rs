//! Resource classification for policy selection.
//!
//! Classification is a pure function over the request, with fixed
//! precedence; the first matching rule wins:
//!
//! 1. Path under a configured API prefix → api data
//! 2. Style/script/image destination, or path under the static prefix →
//!    static asset
//! 3. Document navigation → navigation document
//! 4. Anything else → other

use crate::request::{Destination, WorkerRequest};

/// Path-prefix rules driving classification, taken from configuration.
#[derive(Debug, Clone)]
pub struct ClassifyRules {
    pub api_prefixes: Vec<String>,
    pub static_prefix: String,
}

/// Resource kind of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    ApiData,
    StaticAsset,
    NavigationDocument,
    Other,
}

/// Classify a request by destination and path.
pub fn classify(request: &WorkerRequest, rules: &ClassifyRules) -> ResourceClass {
    let path = request.url.path();

    if rules.api_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str())) {
        return ResourceClass::ApiData;
    }

    if matches!(request.destination, Destination::Style | Destination::Script | Destination::Image)
        || path.starts_with(rules.static_prefix.as_str())
    {
        return ResourceClass::StaticAsset;
    }

    if request.is_navigation() {
        return ResourceClass::NavigationDocument;
    }

    ResourceClass::Other
}
