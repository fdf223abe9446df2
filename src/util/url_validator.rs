use std::net::IpAddr;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host: {0}")]
    MissingHost(String),
    #[error("URL must not carry credentials")]
    Credentials,
}

/// Validate the API base URL from the config file or `--base-url`.
///
/// Only http(s) with a host and no embedded credentials is accepted. Query
/// strings and fragments are dropped since request paths are appended to the
/// base. Plain http and loopback/private hosts are allowed (local WordPress
/// instances, mock servers) but logged, because the session token travels in
/// a header.
pub fn validate_base_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let mut url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    let Some(host) = url.host_str() else {
        return Err(UrlValidationError::MissingHost(url_str.to_owned()));
    };

    if !url.username().is_empty() || url.password().is_some() {
        return Err(UrlValidationError::Credentials);
    }

    if is_local_host(host) {
        tracing::warn!(host, "API base URL points at a local address");
    } else if url.scheme() == "http" {
        tracing::warn!(host, "API base URL is not using https; token is sent in clear");
    }

    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Validate a link before handing it to the system browser.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
}

fn is_local_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    match bare.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified()
        }
        Ok(IpAddr::V6(v6)) => {
            let first = v6.segments()[0];
            v6.is_loopback() || v6.is_unspecified() || (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_url_accepted() {
        let url = validate_base_url("https://sarvail.net/wp-json/ds-custom_endpoints/v1").unwrap();
        assert_eq!(url.host_str(), Some("sarvail.net"));
        assert_eq!(url.path(), "/wp-json/ds-custom_endpoints/v1");
    }

    #[test]
    fn test_local_urls_accepted() {
        assert!(validate_base_url("http://127.0.0.1:8080").is_ok());
        assert!(validate_base_url("http://localhost/wp-json").is_ok());
        assert!(validate_base_url("http://[::1]:3000").is_ok());
    }

    #[test]
    fn test_query_and_fragment_dropped() {
        let url = validate_base_url("https://example.com/api?x=1#top").unwrap();
        assert_eq!(url.as_str(), "https://example.com/api");
    }

    #[test]
    fn test_bad_schemes_rejected() {
        assert!(matches!(
            validate_base_url("ftp://example.com"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
        assert!(validate_base_url("file:///etc/passwd").is_err());
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn test_credentials_rejected() {
        assert!(matches!(
            validate_base_url("https://user:pw@example.com"),
            Err(UrlValidationError::Credentials)
        ));
    }

    #[test]
    fn test_local_host_detection() {
        assert!(is_local_host("localhost"));
        assert!(is_local_host("192.168.1.10"));
        assert!(is_local_host("[fe80::1]"));
        assert!(!is_local_host("sarvail.net"));
        assert!(!is_local_host("8.8.8.8"));
    }

    #[test]
    fn test_open_validation() {
        assert!(validate_url_for_open("https://sarvail.net/img.jpg").is_ok());
        assert!(validate_url_for_open("javascript:alert(1)").is_err());
    }
}
