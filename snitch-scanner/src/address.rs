use std::fmt;
use url::Url;

/// Schemes considered secure for mixed content purposes
const SECURE_SCHEMES: [&str; 2] = ["https", "data"];

/// A URL as seen by the auditor.
///
/// Anything that fails to parse is kept as raw text so it can still be
/// reported. Unparseable addresses are always insecure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Parsed(Url),
    Unparseable(String),
}

impl Address {
    /// Parse an absolute URL
    pub fn parse(raw: &str) -> Self {
        match Url::parse(raw.trim()) {
            Ok(url) => Address::Parsed(url),
            Err(_) => Address::Unparseable(raw.to_string()),
        }
    }

    /// Resolve an href, action or src attribute against a page base URL,
    /// the same way a browser would for an anchor's `href` property
    pub fn resolve(base: &Url, raw: &str) -> Self {
        match base.join(raw.trim()) {
            Ok(url) => Address::Parsed(url),
            Err(_) => Address::Unparseable(raw.to_string()),
        }
    }

    pub fn url(&self) -> Option<&Url> {
        match self {
            Address::Parsed(url) => Some(url),
            Address::Unparseable(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Address::Parsed(url) => url.as_str(),
            Address::Unparseable(raw) => raw,
        }
    }

    pub fn scheme(&self) -> Option<&str> {
        self.url().map(Url::scheme)
    }

    pub fn host(&self) -> Option<&str> {
        self.url().and_then(Url::host_str)
    }

    pub fn is_secure(&self) -> bool {
        self.scheme()
            .is_some_and(|scheme| SECURE_SCHEMES.contains(&scheme))
    }

    /// Key used for every visited/pending check: scheme, host, explicit
    /// port, path and query. The fragment never takes part.
    pub fn identity_key(&self) -> String {
        match self {
            Address::Parsed(url) => {
                let mut key = format!("{}://{}", url.scheme(), url.host_str().unwrap_or(""));
                if let Some(port) = url.port() {
                    key.push_str(&format!(":{}", port));
                }
                key.push_str(url.path());
                if let Some(query) = url.query() {
                    key.push('?');
                    key.push_str(query);
                }
                key
            }
            Address::Unparseable(raw) => raw
                .split_once('#')
                .map(|(head, _)| head)
                .unwrap_or(raw)
                .to_string(),
        }
    }

    /// Hostname equality. Scheme and port are not compared.
    pub fn same_host(&self, other: &Address) -> bool {
        match (self.host(), other.host()) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }

    /// True when both point at the same path and query, ignoring fragments
    pub fn same_document(&self, other: &Address) -> bool {
        match (self.url(), other.url()) {
            (Some(a), Some(b)) => a.path() == b.path() && a.query() == b.query(),
            _ => false,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Url> for Address {
    fn from(url: Url) -> Self {
        Address::Parsed(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_and_data_are_secure() {
        assert!(Address::parse("https://example.com/").is_secure());
        assert!(Address::parse("data:image/png;base64,AAAA").is_secure());
        assert!(Address::parse("HTTPS://EXAMPLE.COM/").is_secure());
    }

    #[test]
    fn test_other_schemes_are_insecure() {
        assert!(!Address::parse("http://example.com/").is_secure());
        assert!(!Address::parse("ftp://example.com/file").is_secure());
        assert!(!Address::parse("ws://example.com/socket").is_secure());
        assert!(!Address::parse("javascript:void(0)").is_secure());
    }

    #[test]
    fn test_unparseable_is_insecure() {
        let address = Address::parse("not a url");
        assert!(matches!(address, Address::Unparseable(_)));
        assert!(!address.is_secure());
        assert_eq!(address.as_str(), "not a url");
    }

    #[test]
    fn test_identity_key_ignores_fragment() {
        let a = Address::parse("https://example.com/page?x=1#top");
        let b = Address::parse("https://example.com/page?x=1");
        assert_eq!(a.identity_key(), b.identity_key());
        assert_eq!(a.identity_key(), "https://example.com/page?x=1");
    }

    #[test]
    fn test_identity_key_keeps_scheme_and_query() {
        let secure = Address::parse("https://example.com/page");
        let insecure = Address::parse("http://example.com/page");
        let queried = Address::parse("https://example.com/page?y=2");
        assert_ne!(secure.identity_key(), insecure.identity_key());
        assert_ne!(secure.identity_key(), queried.identity_key());
    }

    #[test]
    fn test_identity_key_includes_explicit_port() {
        let default_port = Address::parse("https://example.com:443/a");
        let custom_port = Address::parse("https://example.com:8443/a");
        assert_eq!(default_port.identity_key(), "https://example.com/a");
        assert_eq!(custom_port.identity_key(), "https://example.com:8443/a");
    }

    #[test]
    fn test_identity_key_unparseable_strips_fragment() {
        let address = Address::Unparseable("::bad::#frag".to_string());
        assert_eq!(address.identity_key(), "::bad::");
    }

    #[test]
    fn test_same_host_ignores_scheme() {
        let a = Address::parse("https://example.com/a");
        let b = Address::parse("http://example.com/b");
        let c = Address::parse("https://cdn.example.com/c");
        assert!(a.same_host(&b));
        assert!(!a.same_host(&c));
    }

    #[test]
    fn test_same_host_without_host() {
        let a = Address::parse("https://example.com/a");
        let mail = Address::parse("mailto:someone@example.com");
        assert!(!a.same_host(&mail));
        assert!(!a.same_host(&Address::parse("garbage")));
    }

    #[test]
    fn test_same_document() {
        let page = Address::parse("https://example.com/page?q=1");
        assert!(page.same_document(&Address::parse("https://example.com/page?q=1#section")));
        assert!(!page.same_document(&Address::parse("https://example.com/page?q=2")));
        assert!(!page.same_document(&Address::parse("https://example.com/other?q=1")));
    }

    #[test]
    fn test_resolve_relative() {
        let base = Url::parse("https://example.com/dir/page.html").unwrap();
        assert_eq!(
            Address::resolve(&base, "other.html").as_str(),
            "https://example.com/dir/other.html"
        );
        assert_eq!(
            Address::resolve(&base, "/root").as_str(),
            "https://example.com/root"
        );
        assert_eq!(
            Address::resolve(&base, "//cdn.example.com/x.js").as_str(),
            "https://cdn.example.com/x.js"
        );
        assert_eq!(
            Address::resolve(&base, "  http://example.com/a  ").as_str(),
            "http://example.com/a"
        );
    }

    #[test]
    fn test_resolve_keeps_unparseable_raw() {
        let base = Url::parse("https://example.com/").unwrap();
        let address = Address::resolve(&base, "http://[::1");
        assert!(matches!(address, Address::Unparseable(_)));
        assert!(!address.is_secure());
    }
}
