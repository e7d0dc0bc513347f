use crate::UrlError;
use url::{Host, Url};

/// Validates a scan target URL at submission time.
///
/// # Rejection Rules
///
/// - Malformed URLs
/// - Schemes other than HTTP and HTTPS
/// - URLs without a host
/// - Loopback, private, link-local, and unspecified addresses, and the
///   `localhost` name (unsafe targets for a server-side fetcher)
///
/// # Examples
///
/// ```
/// use sitelens::url::validate_target;
///
/// assert!(validate_target("https://example.com").is_ok());
/// assert!(validate_target("ftp://example.com").is_err());
/// assert!(validate_target("http://127.0.0.1/admin").is_err());
/// ```
pub fn validate_target(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host() {
        None => return Err(UrlError::MissingHost),
        Some(Host::Domain(domain)) => {
            if domain.eq_ignore_ascii_case("localhost") {
                return Err(UrlError::Blocked(format!(
                    "'{}' resolves to the local machine",
                    domain
                )));
            }
        }
        Some(Host::Ipv4(addr)) => {
            if addr.is_loopback()
                || addr.is_private()
                || addr.is_link_local()
                || addr.is_unspecified()
            {
                return Err(UrlError::Blocked(format!(
                    "address {} is not publicly routable",
                    addr
                )));
            }
        }
        Some(Host::Ipv6(addr)) => {
            if addr.is_loopback() || addr.is_unspecified() {
                return Err(UrlError::Blocked(format!(
                    "address {} is not publicly routable",
                    addr
                )));
            }
        }
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_public_targets() {
        assert!(validate_target("https://example.com").is_ok());
        assert!(validate_target("http://example.com/path?q=1").is_ok());
        assert!(validate_target("https://sub.example.co.uk/deep/page").is_ok());
    }

    #[test]
    fn test_rejects_bad_scheme() {
        let result = validate_target("ftp://example.com");
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));

        let result = validate_target("javascript:alert(1)");
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_malformed() {
        let result = validate_target("not a url");
        assert!(matches!(result.unwrap_err(), UrlError::Parse(_)));
    }

    #[test]
    fn test_rejects_localhost() {
        let result = validate_target("http://localhost:3000/");
        assert!(matches!(result.unwrap_err(), UrlError::Blocked(_)));

        let result = validate_target("http://LOCALHOST/");
        assert!(matches!(result.unwrap_err(), UrlError::Blocked(_)));
    }

    #[test]
    fn test_rejects_loopback_and_private_addresses() {
        for target in [
            "http://127.0.0.1/",
            "http://10.0.0.5/",
            "http://192.168.1.1/",
            "http://172.16.0.1/",
            "http://169.254.1.1/",
            "http://0.0.0.0/",
            "http://[::1]/",
        ] {
            let result = validate_target(target);
            assert!(
                matches!(result, Err(UrlError::Blocked(_))),
                "expected {} to be blocked",
                target
            );
        }
    }
}
