//! Network-origin allow-list for webhook deliveries.

use std::collections::HashSet;
use std::net::{AddrParseError, IpAddr};

use super::webhook_errors::WebhookError;

/// Published source addresses for processor webhook notifications.
pub const PROCESSOR_WEBHOOK_IPS: [&str; 12] = [
    "3.18.12.63",
    "3.130.192.231",
    "13.235.14.237",
    "13.235.122.149",
    "18.211.135.69",
    "35.154.171.200",
    "52.15.183.38",
    "54.88.130.119",
    "54.88.130.237",
    "54.187.174.169",
    "54.187.205.235",
    "54.187.216.72",
];

/// Immutable set of addresses allowed to deliver webhooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginAllowList {
    addresses: HashSet<IpAddr>,
}

impl OriginAllowList {
    pub fn new(addresses: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            addresses: addresses.into_iter().map(canonical).collect(),
        }
    }

    /// Parses a comma-separated list, ignoring blank entries.
    pub fn parse(list: &str) -> Result<Self, AddrParseError> {
        let addresses = list
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::parse::<IpAddr>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(addresses))
    }

    /// The processor's published webhook addresses.
    pub fn processor_defaults() -> Self {
        Self::new(
            PROCESSOR_WEBHOOK_IPS
                .iter()
                .filter_map(|ip| ip.parse::<IpAddr>().ok()),
        )
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn permits(&self, origin: IpAddr) -> bool {
        self.addresses.contains(&canonical(origin))
    }

    /// Admits the origin or fails with `OriginRejected`.
    ///
    /// An origin that could not be determined is never admitted.
    pub fn check(&self, origin: Option<IpAddr>) -> Result<IpAddr, WebhookError> {
        match origin {
            Some(ip) if self.permits(ip) => Ok(ip),
            Some(ip) => Err(WebhookError::OriginRejected(ip.to_string())),
            None => Err(WebhookError::OriginRejected("unknown".to_string())),
        }
    }
}

/// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) compare as IPv4.
fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn defaults_contain_every_published_address() {
        let list = OriginAllowList::processor_defaults();

        assert_eq!(list.len(), PROCESSOR_WEBHOOK_IPS.len());
        assert!(list.permits(ip("54.187.216.72")));
        assert!(list.permits(ip("3.18.12.63")));
    }

    #[test]
    fn defaults_do_not_admit_loopback() {
        let list = OriginAllowList::processor_defaults();
        assert!(!list.permits(ip("127.0.0.1")));
        assert!(!list.permits(ip("::1")));
    }

    #[test]
    fn parse_accepts_mixed_families_and_whitespace() {
        let list = OriginAllowList::parse(" 10.0.0.1, ::1 ,,").unwrap();

        assert_eq!(list.len(), 2);
        assert!(list.permits(ip("10.0.0.1")));
        assert!(list.permits(ip("::1")));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(OriginAllowList::parse("10.0.0.1,not-an-ip").is_err());
    }

    #[test]
    fn mapped_ipv6_matches_ipv4_entry() {
        let list = OriginAllowList::parse("3.18.12.63").unwrap();
        assert!(list.permits(ip("::ffff:3.18.12.63")));
    }

    #[test]
    fn check_rejects_unlisted_and_unknown_origins() {
        let list = OriginAllowList::parse("10.0.0.1").unwrap();

        assert_eq!(list.check(Some(ip("10.0.0.1"))), Ok(ip("10.0.0.1")));
        assert_eq!(
            list.check(Some(ip("10.0.0.2"))),
            Err(WebhookError::OriginRejected("10.0.0.2".to_string()))
        );
        assert_eq!(
            list.check(None),
            Err(WebhookError::OriginRejected("unknown".to_string()))
        );
    }
}
