//! Client address resolution for view deduplication.
//!
//! Behind `trusted_proxy_count` proxies, the client is the entry just before the last
//! `trusted_proxy_count` entries of `X-Forwarded-For`. Entries further left are
//! client-controlled and ignored.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

const UNKNOWN: &str = "unknown";

/// Resolve the client address as a normalized IP string, or `"unknown"`
pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trusted_proxy_count: usize,
) -> String {
    forwarded_for(headers, trusted_proxy_count)
        .or_else(|| header_ip(headers, "x-real-ip"))
        .or_else(|| socket_addr.map(SocketAddr::ip))
        .map(|ip| canonical(ip).to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn forwarded_for(headers: &HeaderMap, trusted_proxy_count: usize) -> Option<IpAddr> {
    let value = headers.get("x-forwarded-for")?.to_str().ok()?;
    let hops: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    // With no trusted proxy, or a chain shorter than expected, only the closest hop is usable
    let index = if trusted_proxy_count == 0 || hops.len() <= trusted_proxy_count {
        hops.len().checked_sub(1)?
    } else {
        hops.len() - trusted_proxy_count - 1
    };

    hops.get(index)?.parse().ok()
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// IPv4-mapped IPv6 addresses count as the IPv4 client they wrap
fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map(IpAddr::V4)
            .unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_client_before_trusted_proxies() {
        let h = headers("x-forwarded-for", "203.0.113.9, 10.0.0.1");
        assert_eq!(extract_client_ip(&h, None, 1), "203.0.113.9");

        let h = headers("x-forwarded-for", "198.51.100.1, 203.0.113.9, 10.0.0.1, 10.0.0.2");
        assert_eq!(extract_client_ip(&h, None, 2), "203.0.113.9");
    }

    #[test]
    fn test_untrusted_chain_uses_closest_hop() {
        let h = headers("x-forwarded-for", "203.0.113.9, 10.0.0.1");
        assert_eq!(extract_client_ip(&h, None, 0), "10.0.0.1");

        let h = headers("x-forwarded-for", "203.0.113.9");
        assert_eq!(extract_client_ip(&h, None, 3), "203.0.113.9");
    }

    #[test]
    fn test_falls_back_to_real_ip_then_socket() {
        let h = headers("x-forwarded-for", "garbage");
        let socket = SocketAddr::from(([127, 0, 0, 1], 8080));
        assert_eq!(extract_client_ip(&h, Some(&socket), 1), "127.0.0.1");

        let h = headers("x-real-ip", " 192.0.2.4 ");
        assert_eq!(extract_client_ip(&h, Some(&socket), 1), "192.0.2.4");

        assert_eq!(extract_client_ip(&HeaderMap::new(), None, 1), "unknown");
    }

    #[test]
    fn test_ipv4_mapped_addresses_are_normalized() {
        let h = headers("x-real-ip", "::ffff:192.0.2.4");
        assert_eq!(extract_client_ip(&h, None, 0), "192.0.2.4");
        let h = headers("x-real-ip", "2001:db8::1");
        assert_eq!(extract_client_ip(&h, None, 0), "2001:db8::1");
    }
}
