//! Proxy records, transport schemes and identity keys.

use std::fmt;

/// Transport under which a proxy can be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Socks5,
    Https,
}

impl Scheme {
    /// Order in which the validator tries each transport.
    pub const TRIAL_ORDER: [Scheme; 3] = [Scheme::Http, Scheme::Socks5, Scheme::Https];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Socks5 => "socks5",
            Scheme::Https => "https",
        }
    }

    /// Parse a scheme name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "http" => Some(Scheme::Http),
            "socks5" => Some(Scheme::Socks5),
            "https" => Some(Scheme::Https),
            _ => None,
        }
    }

    /// Full proxy URL for `host_port` under this scheme.
    pub fn proxy_url(&self, host_port: &str) -> String {
        format!("{}://{}", self.as_str(), host_port)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strip any `scheme://` prefix and trailing slash, leaving the `host:port` identity key.
pub fn identity_key(raw: &str) -> &str {
    let raw = raw.trim();
    let rest = match raw.split_once("://") {
        Some((_, rest)) => rest,
        None => raw,
    };
    rest.trim_end_matches('/')
}

/// A verified proxy held in the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRecord {
    scheme: Scheme,
    key: String,
}

impl ProxyRecord {
    /// Create a record for `candidate` (with or without a scheme prefix) under `scheme`.
    pub fn new(scheme: Scheme, candidate: &str) -> Self {
        Self {
            scheme,
            key: identity_key(candidate).to_string(),
        }
    }

    /// Rebuild a record from a stored `scheme://host:port` address.
    ///
    /// Unknown or missing schemes fall back to `http`.
    pub fn from_address(address: &str) -> Self {
        let scheme = address
            .trim()
            .split_once("://")
            .and_then(|(name, _)| Scheme::from_name(name))
            .unwrap_or(Scheme::Http);
        Self::new(scheme, address)
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// The scheme-independent `host:port` used for dedup.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Normalized `scheme://host:port` form.
    pub fn address(&self) -> String {
        self.scheme.proxy_url(&self.key)
    }

    /// Convert the record to a reqwest::Proxy.
    pub fn to_reqwest_proxy(&self) -> Result<reqwest::Proxy, reqwest::Error> {
        reqwest::Proxy::all(self.address())
    }
}

impl fmt::Display for ProxyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_key_ignores_scheme() {
        assert_eq!(identity_key("1.2.3.4:80"), "1.2.3.4:80");
        assert_eq!(identity_key("http://1.2.3.4:80"), "1.2.3.4:80");
        assert_eq!(identity_key(" socks5://1.2.3.4:80/ "), "1.2.3.4:80");
    }

    #[test]
    fn record_address_is_normalized() {
        let record = ProxyRecord::new(Scheme::Http, "https://5.6.7.8:3128");
        assert_eq!(record.address(), "http://5.6.7.8:3128");
        assert_eq!(record.key(), "5.6.7.8:3128");
        assert_eq!(record.to_string(), record.address());
    }

    #[test]
    fn from_address_keeps_known_scheme() {
        assert_eq!(ProxyRecord::from_address("socks5://9.9.9.9:1080").scheme(), Scheme::Socks5);
        assert_eq!(ProxyRecord::from_address("SOCKS5://9.9.9.9:1080").scheme(), Scheme::Socks5);
        assert_eq!(ProxyRecord::from_address("ftp://9.9.9.9:21").scheme(), Scheme::Http);
        assert_eq!(ProxyRecord::from_address("9.9.9.9:8080").address(), "http://9.9.9.9:8080");
    }

    #[test]
    fn trial_order_is_http_socks5_https() {
        let names: Vec<_> = Scheme::TRIAL_ORDER.iter().map(Scheme::as_str).collect();
        assert_eq!(names, ["http", "socks5", "https"]);
    }
}
