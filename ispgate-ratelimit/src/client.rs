//! Client identity for rate limiting.

use std::net::IpAddr;

/// Proxies whose `X-Forwarded-For` header is believed.
///
/// An empty list trusts the header from any peer, which lets any client
/// pick its own identity. Configure the real proxy addresses in production.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedProxies {
    proxies: Vec<IpAddr>,
}

impl TrustedProxies {
    pub fn new(proxies: Vec<IpAddr>) -> Self {
        Self { proxies }
    }

    /// True when no proxy list is configured.
    pub fn trusts_everyone(&self) -> bool {
        self.proxies.is_empty()
    }

    fn trusts(&self, peer: IpAddr) -> bool {
        self.proxies.is_empty() || self.proxies.contains(&peer)
    }

    /// The identity to count `peer`'s request under: the first forwarded
    /// address if the peer is trusted, otherwise the peer address itself.
    pub fn client_identity(&self, peer: IpAddr, forwarded_for: Option<&str>) -> String {
        if self.trusts(peer) {
            let first = forwarded_for
                .and_then(|h| h.split(',').next())
                .map(str::trim)
                .filter(|s| !s.is_empty());
            if let Some(client) = first {
                return client.to_string();
            }
        }
        peer.to_string()
    }
}
