//! Typed model of an intercepted request.

use lantern_core::cache::key::compute_cache_key;
use reqwest::Method;
use url::Url;

/// The resource kind a request is destined for, as reported by the
/// intercepting client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Document,
    Style,
    Script,
    Image,
    Font,
    Other,
}

impl std::str::FromStr for Destination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "document" => Ok(Destination::Document),
            "style" => Ok(Destination::Style),
            "script" => Ok(Destination::Script),
            "image" => Ok(Destination::Image),
            "font" => Ok(Destination::Font),
            "other" | "" => Ok(Destination::Other),
            other => Err(format!("unknown destination: {other}")),
        }
    }
}

/// An intercepted request, normalized for classification and cache lookup.
#[derive(Debug, Clone)]
pub struct WorkerRequest {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
    pub accept: Option<String>,
}

impl WorkerRequest {
    /// Build a GET request for the given canonical URL.
    pub fn get(url: Url) -> Self {
        Self { method: Method::GET, url, destination: Destination::Other, accept: None }
    }

    /// Override the HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the destination hint.
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Set the Accept header.
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Whether this request is a document navigation: a document
    /// destination, or an Accept header asking for HTML.
    pub fn is_navigation(&self) -> bool {
        self.destination == Destination::Document
            || self.accept.as_deref().is_some_and(|a| a.contains("text/html"))
    }

    /// Content-addressed cache key for this request.
    pub fn cache_key(&self) -> String {
        compute_cache_key(self.method.as_str(), self.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn test_navigation_by_destination() {
        let request = WorkerRequest::get(parse("https://example.com/page")).with_destination(Destination::Document);
        assert!(request.is_navigation());
    }

    #[test]
    fn test_navigation_by_accept_header() {
        let request = WorkerRequest::get(parse("https://example.com/page"))
            .with_accept("text/html,application/xhtml+xml");
        assert!(request.is_navigation());
    }

    #[test]
    fn test_not_navigation_by_default() {
        let request = WorkerRequest::get(parse("https://example.com/data.json"));
        assert!(!request.is_navigation());
    }

    #[test]
    fn test_cache_key_varies_by_method() {
        let url = parse("https://example.com/api/items");
        let get = WorkerRequest::get(url.clone());
        let post = WorkerRequest::get(url).with_method(Method::POST);
        assert_ne!(get.cache_key(), post.cache_key());
    }

    #[test]
    fn test_destination_from_str() {
        assert_eq!("style".parse::<Destination>().unwrap(), Destination::Style);
        assert_eq!("Document".parse::<Destination>().unwrap(), Destination::Document);
        assert!("widget".parse::<Destination>().is_err());
    }
}
