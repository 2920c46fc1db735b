use axum::http::HeaderMap;
use std::net::IpAddr;

/// Extract the client IP from proxy headers and optional transport metadata.
/// Falls back to loopback when neither headers nor connection info yield one.
pub fn extract_ip_from_headers(headers: &HeaderMap, fallback: Option<IpAddr>) -> IpAddr {
    if let Some(h) = headers.get("x-forwarded-for").and_then(|hv| hv.to_str().ok()) {
        if let Some(first) = h.split(',').next() {
            if let Ok(ip) = first.trim().parse::<IpAddr>() {
                return ip;
            }
        }
    }
    if let Some(h) = headers.get("x-real-ip").and_then(|hv| hv.to_str().ok()) {
        if let Ok(ip) = h.parse::<IpAddr>() {
            return ip;
        }
    }
    if let Some(ip) = fallback {
        return ip;
    }
    IpAddr::from([127, 0, 0, 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_for_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.1.2.3, 192.168.0.1".parse().unwrap());
        headers.insert("x-real-ip", "10.9.9.9".parse().unwrap());
        assert_eq!(extract_ip_from_headers(&headers, None), IpAddr::from([10, 1, 2, 3]));
    }

    #[test]
    fn falls_back_to_loopback() {
        assert_eq!(
            extract_ip_from_headers(&HeaderMap::new(), None),
            IpAddr::from([127, 0, 0, 1])
        );
    }
}
