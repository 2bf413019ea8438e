//! Response values produced by the controller.

use bytes::Bytes;
use reqwest::StatusCode;
use serde::Serialize;

use crate::fetch::FetchResponse;
use lantern_core::CacheEntry;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServedFrom {
    /// Fresh data from network
    Network,
    /// Replayed from a stored snapshot
    Cache,
    /// The reserved offline document
    OfflineFallback,
    /// Synthesized by the controller (failure path)
    Synthesized,
}

/// A response handed back to the intercepted client.
#[derive(Debug, Clone)]
pub struct WorkerResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub served_from: ServedFrom,
}

impl WorkerResponse {
    /// Wrap a live network response.
    pub fn from_network(response: FetchResponse) -> Self {
        Self {
            status: response.status,
            content_type: response.content_type,
            headers: header_pairs(&response.headers),
            body: response.bytes,
            served_from: ServedFrom::Network,
        }
    }

    /// Rehydrate a stored snapshot.
    pub fn from_entry(entry: CacheEntry, served_from: ServedFrom) -> Self {
        let headers = entry
            .headers_json
            .as_deref()
            .and_then(|j| serde_json::from_str(j).ok())
            .unwrap_or_default();
        Self {
            status: StatusCode::from_u16(entry.status).unwrap_or(StatusCode::OK),
            content_type: entry.content_type,
            headers,
            body: Bytes::from(entry.body),
            served_from,
        }
    }

    /// Synthesized 503 with a plain-text body.
    pub fn service_unavailable(reason: &str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            content_type: Some("text/plain".to_string()),
            headers: Vec::new(),
            body: Bytes::copy_from_slice(reason.as_bytes()),
            served_from: ServedFrom::Synthesized,
        }
    }
}

/// Flatten a header map into serializable pairs, skipping non-UTF8 values.
pub(crate) fn header_pairs(headers: &reqwest::header::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect()
}

/// Snapshot a network response into a cache entry.
pub(crate) fn entry_from_response(
    generation: &str, key: &str, request_url: &str, response: &FetchResponse,
) -> CacheEntry {
    CacheEntry {
        generation: generation.to_string(),
        key: key.to_string(),
        url: request_url.to_string(),
        status: response.status.as_u16(),
        content_type: response.content_type.clone(),
        headers_json: serde_json::to_string(&header_pairs(&response.headers)).ok(),
        body: response.bytes.to_vec(),
        stored_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_unavailable() {
        let response = WorkerResponse::service_unavailable("Network error");
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.content_type.as_deref(), Some("text/plain"));
        assert_eq!(&response.body[..], b"Network error");
        assert_eq!(response.served_from, ServedFrom::Synthesized);
    }

    #[test]
    fn test_from_entry_restores_headers() {
        let entry = CacheEntry {
            generation: "app-static-v1".into(),
            key: "k".into(),
            url: "https://example.com/app.css".into(),
            status: 200,
            content_type: Some("text/css".into()),
            headers_json: Some(r#"[["etag","\"abc\""]]"#.into()),
            body: b"body { }".to_vec(),
            stored_at: "2025-01-01T00:00:00Z".into(),
        };

        let response = WorkerResponse::from_entry(entry, ServedFrom::Cache);
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.headers, vec![("etag".to_string(), "\"abc\"".to_string())]);
        assert_eq!(&response.body[..], b"body { }");
    }

    #[test]
    fn test_from_entry_tolerates_bad_header_json() {
        let entry = CacheEntry {
            generation: "app-static-v1".into(),
            key: "k".into(),
            url: "https://example.com/app.css".into(),
            status: 200,
            content_type: None,
            headers_json: Some("not json".into()),
            body: Vec::new(),
            stored_at: "2025-01-01T00:00:00Z".into(),
        };

        let response = WorkerResponse::from_entry(entry, ServedFrom::Cache);
        assert!(response.headers.is_empty());
    }
}
