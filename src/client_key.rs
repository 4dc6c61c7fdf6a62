// src/client_key.rs

//! Client identity: turning request metadata into the key a gate accounts
//! requests under.
//!
//! Trusted proxy headers win over the transport peer: `X-Real-IP` first,
//! then the first entry of `X-Forwarded-For`, then the peer address with its
//! port stripped. Only put a gate behind a proxy that overwrites these
//! headers; otherwise clients can pick their own key.

// dependencies
use crate::gate::UNKNOWN_CLIENT;
use http::HeaderMap;
use std::fmt;
use std::net::SocketAddr;
use std::ops::Deref;

pub const REAL_IP_HEADER: &str = "x-real-ip";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Non-empty identifier for one rate limiting domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientKey(String);

impl ClientKey {
    /// Trimmed key, or `None` if nothing but whitespace was given.
    pub fn new(key: impl AsRef<str>) -> Option<Self> {
        let key = key.as_ref().trim();
        (!key.is_empty()).then(|| Self(key.to_string()))
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_CLIENT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for ClientKey {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ClientKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything a client key can be derived from. Must always produce a key.
pub trait ClientIdentity {
    fn client_key(&self) -> ClientKey;
}

/// Reads the peer from a `SocketAddr` request extension when one is present,
/// as connection-info layers typically insert.
impl<B> ClientIdentity for http::Request<B> {
    fn client_key(&self) -> ClientKey {
        extract_with_peer(self.headers(), self.extensions().get::<SocketAddr>().copied())
    }
}

/// Key for a request given its headers and the raw peer address string
/// (`host:port`, `[v6]:port` or a bare address).
pub fn extract(headers: &HeaderMap, peer: Option<&str>) -> ClientKey {
    from_headers(headers)
        .or_else(|| peer.and_then(|peer| ClientKey::new(strip_port(peer))))
        .unwrap_or_else(ClientKey::unknown)
}

/// Same as [`extract`] for an already parsed peer address.
pub fn extract_with_peer(headers: &HeaderMap, peer: Option<SocketAddr>) -> ClientKey {
    from_headers(headers)
        .or_else(|| peer.and_then(|peer| ClientKey::new(peer.ip().to_string())))
        .unwrap_or_else(ClientKey::unknown)
}

fn from_headers(headers: &HeaderMap) -> Option<ClientKey> {
    let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());

    header(REAL_IP_HEADER)
        .and_then(ClientKey::new)
        .or_else(|| {
            header(FORWARDED_FOR_HEADER)
                .and_then(|forwarded| forwarded.split(',').next())
                .and_then(ClientKey::new)
        })
}

fn strip_port(peer: &str) -> String {
    let peer = peer.trim();
    if let Ok(addr) = peer.parse::<SocketAddr>() {
        return addr.ip().to_string();
    }
    // `[host]:port` that did not parse as an IP, or bracketed without port
    if let Some(rest) = peer.strip_prefix('[') {
        if let Some((host, _)) = rest.split_once(']') {
            return host.to_string();
        }
    }
    // `host:port`; more than one colon means a bare IPv6 address
    match peer.split_once(':') {
        Some((host, port)) if !port.contains(':') => host.to_string(),
        _ => peer.to_string(),
    }
}
