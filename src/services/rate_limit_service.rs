use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode, header::HeaderName};
use ipnetwork::IpNetwork;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_governor::GovernorError;
use tower_governor::key_extractor::KeyExtractor;

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// The two governor tiers mounted by the router.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    /// Login and refresh, which check credentials.
    Credentials,
    Standard,
}

impl Tier {
    #[must_use]
    pub fn for_path(path: &str) -> Self {
        if path.ends_with("/auth/login") || path.ends_with("/auth/refresh") { Self::Credentials } else { Self::Standard }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Credentials => "credentials",
            Self::Standard => "standard",
        }
    }
}

/// Governor key: the client address. Forwarded hops are only read when the
/// connecting peer is a trusted proxy.
#[derive(Clone, Debug)]
pub struct ClientIpKey {
    trusted_proxies: Arc<[IpNetwork]>,
}

impl ClientIpKey {
    #[must_use]
    pub fn new(trusted_proxies: Vec<IpNetwork>) -> Self {
        Self { trusted_proxies: trusted_proxies.into() }
    }

    fn trusts(&self, ip: IpAddr) -> bool {
        self.trusted_proxies.iter().any(|net| net.contains(ip))
    }

    /// Walks `X-Forwarded-For` from the right and returns the first hop that is
    /// not a trusted proxy. Repeated headers are read as one list.
    #[must_use]
    pub fn client_ip(&self, headers: &HeaderMap, peer: IpAddr) -> IpAddr {
        if !self.trusts(peer) {
            return peer;
        }
        let hops: Vec<IpAddr> = headers
            .get_all(X_FORWARDED_FOR)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .filter_map(|hop| hop.trim().parse().ok())
            .collect();
        hops.into_iter().rev().find(|ip| !self.trusts(*ip)).unwrap_or(peer)
    }
}

impl KeyExtractor for ClientIpKey {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let ConnectInfo(peer) =
            req.extensions().get::<ConnectInfo<SocketAddr>>().ok_or(GovernorError::UnableToExtractKey)?;
        Ok(self.client_ip(req.headers(), peer.ip()))
    }
}

#[derive(Clone, Debug)]
pub struct RateLimitService {
    pub key: ClientIpKey,
    decisions_total: Counter<u64>,
}

impl RateLimitService {
    #[must_use]
    pub fn new(trusted_proxies: Vec<IpNetwork>) -> Self {
        let decisions_total = global::meter("pharmacy-server")
            .u64_counter("rate_limit_decisions_total")
            .with_description("Requests seen by the rate limiter, by tier and outcome")
            .build();
        Self { key: ClientIpKey::new(trusted_proxies), decisions_total }
    }

    pub fn record(&self, tier: Tier, status: StatusCode, retry_after: Option<&str>) {
        let outcome = if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(tier = tier.label(), retry_after_secs = retry_after.unwrap_or("-"), "Rate limit exceeded");
            "throttled"
        } else {
            "allowed"
        };
        self.decisions_total.add(1, &[KeyValue::new("tier", tier.label()), KeyValue::new("outcome", outcome)]);
    }
}
