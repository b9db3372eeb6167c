use std::net::SocketAddr;

use axum::http::{HeaderMap, header::USER_AGENT};

use crate::error::AppError;

pub fn validate_numeric(value: &str, field: &'static str) -> Result<(), AppError> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::NonNumericField(field));
    }

    Ok(())
}

pub fn validate_length(
    value: &str,
    field: &'static str,
    min: usize,
    max: usize,
) -> Result<(), AppError> {
    let length = value.chars().count();

    if length < min || length > max {
        return Err(AppError::FieldLength(field));
    }

    Ok(())
}

/// Strips the leading `+` and interior spaces so the remainder can be
/// digit-checked. The stored phone keeps its original formatting.
pub fn normalize_phone(phone: &str) -> String {
    phone.trim().trim_start_matches('+').replace(' ', "")
}

/// Real client IP behind proxies/CDN: first forwarded-for entry when
/// present, transport peer address otherwise.
pub fn get_client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}

pub fn get_user_agent(headers: &HeaderMap) -> String {
    headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::http::{HeaderMap, HeaderValue};

    use super::{get_client_ip, normalize_phone, parse_origins, validate_length, validate_numeric};

    fn peer() -> SocketAddr {
        "10.0.0.1:443".parse().unwrap()
    }

    #[test]
    fn test_numeric_validation() {
        assert!(validate_numeric("1020304050", "document").is_ok());
        assert!(validate_numeric("102030a050", "document").is_err());
        assert!(validate_numeric("", "document").is_err());
        assert!(validate_numeric("3001 2345", "phone").is_err());
    }

    #[test]
    fn test_phone_normalization() {
        assert_eq!(normalize_phone("+57 300 1234567"), "573001234567");
        assert_eq!(normalize_phone("3001234567"), "3001234567");
        assert_eq!(normalize_phone(" +3001234567 "), "3001234567");
    }

    #[test]
    fn test_length_bounds() {
        assert!(validate_length("123456", "document", 6, 20).is_ok());
        assert!(validate_length("12345", "document", 6, 20).is_err());
        assert!(validate_length(&"9".repeat(21), "document", 6, 20).is_err());
    }

    #[test]
    fn test_forwarded_for_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.2"),
        );

        assert_eq!(get_client_ip(&headers, peer()), "203.0.113.9");
    }

    #[test]
    fn test_peer_fallback() {
        assert_eq!(get_client_ip(&HeaderMap::new(), peer()), "10.0.0.1");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("   "));

        assert_eq!(get_client_ip(&headers, peer()), "10.0.0.1");
    }

    #[test]
    fn test_origin_parsing() {
        assert_eq!(parse_origins("*"), vec!["*"]);
        assert_eq!(
            parse_origins("https://a.example, https://b.example"),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(parse_origins("").is_empty());
    }
}
