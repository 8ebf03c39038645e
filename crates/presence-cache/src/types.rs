//! Core types for the presence cache service

use marker_index::CacheStats;
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}

/// Split a request body into entry names.
///
/// The body is comma-delimited if it contains any comma, otherwise
/// newline-delimited. Empty tokens are dropped.
pub fn parse_names(body: &str) -> Vec<String> {
    if body.contains(',') {
        body.split(',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        body.lines()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comma_delimited() {
        assert_eq!(parse_names("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_names(",a,,b,"), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_newline_delimited() {
        assert_eq!(parse_names("a\nb\n\nc\n"), vec!["a", "b", "c"]);
        assert_eq!(parse_names("a\r\nb\r\n"), vec!["a", "b"]);
    }

    #[test]
    fn test_comma_wins_over_newline() {
        // Newlines stay part of the names when commas are present
        assert_eq!(parse_names("a,b\nc"), vec!["a", "b\nc"]);
    }

    #[test]
    fn test_parse_empty_body() {
        assert!(parse_names("").is_empty());
        assert!(parse_names("\n\n").is_empty());
        assert!(parse_names(",,").is_empty());
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            uptime_secs: 3600,
            cache: CacheStats {
                entries: 100,
                capacity: 500,
                ..Default::default()
            },
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("3600"));
        assert!(json.contains("\"capacity\":500"));
    }
}
