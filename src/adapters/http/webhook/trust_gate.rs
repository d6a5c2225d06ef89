//! TrustGate - admits only authentic webhook deliveries.
//!
//! Checks run in a fixed order and the first failure wins:
//! 1. Origin address against the allow-list (before any body bytes are read)
//! 2. Body read under a byte cap
//! 3. Signature and replay window
//! 4. Envelope decode

use std::net::{IpAddr, SocketAddr};

use axum::body::{Body, Bytes};
use axum::http::header::HeaderName;
use axum::http::{HeaderMap, Request};
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::domain::billing::{OriginAllowList, WebhookError, WebhookEvent, WebhookVerifier};

pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
pub const DEFAULT_SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Origin, size and signature checks for inbound webhook requests.
pub struct TrustGate {
    allow_list: OriginAllowList,
    verifier: WebhookVerifier,
    trust_forwarded_headers: bool,
    max_body_bytes: usize,
    signature_header: HeaderName,
}

impl TrustGate {
    pub fn new(allow_list: OriginAllowList, verifier: WebhookVerifier) -> Self {
        Self {
            allow_list,
            verifier,
            trust_forwarded_headers: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            signature_header: HeaderName::from_static("stripe-signature"),
        }
    }

    /// Prefer `X-Forwarded-For` / `X-Real-IP` over the socket peer.
    ///
    /// Only safe behind a proxy that overwrites these headers.
    pub fn with_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded_headers = trust;
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn with_signature_header(mut self, header: HeaderName) -> Self {
        self.signature_header = header;
        self
    }

    /// Determine the sender's address.
    pub fn resolve_origin(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
        if self.trust_forwarded_headers {
            let forwarded = headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|value| value.split(',').next())
                .and_then(|first| first.trim().parse::<IpAddr>().ok());
            if forwarded.is_some() {
                return forwarded;
            }

            let real_ip = headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .and_then(|value| value.trim().parse::<IpAddr>().ok());
            if real_ip.is_some() {
                return real_ip;
            }
        }

        peer.map(|addr| addr.ip())
    }

    /// Run every check and return the verified event.
    pub async fn admit(
        &self,
        peer: Option<SocketAddr>,
        request: Request<Body>,
    ) -> Result<WebhookEvent, WebhookError> {
        self.allow_list
            .check(self.resolve_origin(request.headers(), peer))?;

        let (parts, body) = request.into_parts();
        let payload = read_capped(body, self.max_body_bytes).await?;

        let signature = parts
            .headers
            .get(&self.signature_header)
            .and_then(|v| v.to_str().ok());

        self.verifier.verify_and_parse(&payload, signature)
    }
}

async fn read_capped(body: Body, limit: usize) -> Result<Bytes, WebhookError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            Err(WebhookError::BodyTooLarge { limit })
        }
        Err(err) => Err(WebhookError::BodyRead(err.to_string())),
    }
}
