// Shared transport configuration for building reqwest::Client instances.
//
// The presence fetch and the liveness probe share timeout, TLS, and
// local-destination policy through this module, avoiding duplicated
// builder logic.

use std::net::IpAddr;
use std::time::Duration;

use url::{Host, Url};

use crate::error::Error;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Request timeout for every call.
    pub timeout: Duration,
    /// Verify the server certificate (off for self-signed installs).
    pub verify_ssl: bool,
    /// Permit requests to loopback/private/link-local destinations.
    ///
    /// Off by default: a misconfigured base URL must not turn the
    /// service into a probe of the hosting network.
    pub allow_local: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            verify_ssl: true,
            allow_local: false,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` with additional default headers.
    ///
    /// Used by [`HaClient`](crate::HaClient) to inject the
    /// `Authorization: Bearer` header on every request.
    pub fn build_client_with_headers(
        &self,
        headers: reqwest::header::HeaderMap,
    ) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("hapresence/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);

        if !self.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Returns `true` if the URL's host is a local/private destination:
/// loopback, RFC1918, link-local, unspecified, or a `localhost` name.
///
/// Only literal hosts are classified; DNS names other than `localhost`
/// pass, since resolution happens inside reqwest at request time.
pub(crate) fn is_local_destination(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(name)) => {
            let name = name.trim_end_matches('.');
            name.eq_ignore_ascii_case("localhost")
                || name.to_ascii_lowercase().ends_with(".localhost")
        }
        Some(Host::Ipv4(ip)) => is_local_v4(ip),
        Some(Host::Ipv6(ip)) => is_local_v6(ip),
        None => true,
    }
}

fn is_local_v4(ip: std::net::Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    ip.is_loopback()
        || ip.is_unspecified()
        || a == 10
        || (a == 172 && (16..=31).contains(&b))
        || (a == 192 && b == 168)
        || (a == 169 && b == 254)
}

fn is_local_v6(ip: std::net::Ipv6Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() {
        return true;
    }
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_local_v4(v4);
    }
    let seg = ip.segments();
    // fc00::/7 (unique local) and fe80::/10 (link local)
    (seg[0] & 0xfe00) == 0xfc00 || (seg[0] & 0xffc0) == 0xfe80
}

/// Classify the request target, returning `Err(LocalAddressBlocked)`
/// when the policy forbids it.
pub(crate) fn check_destination(url: &Url, allow_local: bool) -> Result<(), Error> {
    if !allow_local && is_local_destination(url) {
        return Err(Error::LocalAddressBlocked {
            host: url.host_str().unwrap_or("<no host>").to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        s.parse().expect("test URL should parse")
    }

    #[test]
    fn loopback_and_private_ranges_are_local() {
        for u in [
            "http://127.0.0.1:8123",
            "http://10.0.0.5:8123",
            "http://172.16.0.1",
            "http://172.31.255.255",
            "http://192.168.1.20:8123",
            "http://169.254.0.1",
            "http://0.0.0.0",
            "http://[::1]:8123",
            "http://[fd12:3456::1]",
            "http://[fe80::1]",
            "http://localhost:8123",
            "http://ha.localhost",
        ] {
            assert!(is_local_destination(&url(u)), "{u} should be local");
        }
    }

    #[test]
    fn public_destinations_are_not_local() {
        for u in [
            "https://example.com",
            "http://172.32.0.1",
            "http://8.8.8.8",
            "https://ha.example.org:8123",
            "http://[2001:db8::1]",
        ] {
            assert!(!is_local_destination(&url(u)), "{u} should not be local");
        }
    }

    #[test]
    fn check_destination_respects_allow_flag() {
        let local = url("http://192.168.1.20:8123");
        assert!(check_destination(&local, true).is_ok());
        assert!(matches!(
            check_destination(&local, false),
            Err(Error::LocalAddressBlocked { ref host }) if host == "192.168.1.20"
        ));
    }
}
