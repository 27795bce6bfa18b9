use serde::{Deserialize, Serialize};

/// Port used when neither the identity nor its address names one.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// A user-named SSH connection profile.
///
/// JSON looks like:
/// `{ "name":"db", "username":"root", "address":"10.0.0.5", "port":2222, "description":"primary" }`
///
/// `port` is omitted when zero. `username`, `port` and `description` fall back
/// to their defaults when absent so older files keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    #[serde(default)]
    pub username: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "is_default_port")]
    pub port: u16,
    #[serde(default)]
    pub description: String,
}

fn is_default_port(port: &u16) -> bool {
    *port == 0
}

/// Where to open the transport connection for an [`Identity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: Option<u16>,
}

impl Endpoint {
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_SSH_PORT)
    }
}

impl Identity {
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        address: impl Into<String>,
        port: u16,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            address: address.into(),
            port,
            description: description.into(),
        }
    }

    /// Splits `address` into host and port.
    ///
    /// A non-zero `port` field always wins over a port embedded in the
    /// address (`host:2222` or `[::1]:2222`). Bare IPv6 literals are taken
    /// as a host without port.
    pub fn endpoint(&self) -> Endpoint {
        let (host, embedded) = split_address(&self.address);
        let port = if self.port != 0 { Some(self.port) } else { embedded };
        Endpoint {
            host: host.to_string(),
            port,
        }
    }

    /// `username@host`, or just `host` when no username is stored.
    pub fn destination(&self) -> String {
        let endpoint = self.endpoint();
        if self.username.is_empty() {
            endpoint.host
        } else {
            format!("{}@{}", self.username, endpoint.host)
        }
    }
}

fn split_address(address: &str) -> (&str, Option<u16>) {
    if let Some(rest) = address.strip_prefix('[') {
        if let Some((host, tail)) = rest.split_once(']') {
            let port = tail.strip_prefix(':').and_then(|p| p.parse().ok());
            return (host, port);
        }
    }

    match address.split_once(':') {
        // more than one colon means an unbracketed IPv6 literal
        Some((host, port)) if !port.contains(':') => match port.parse::<u16>() {
            Ok(port) if port != 0 => (host, Some(port)),
            _ => (address, None),
        },
        _ => (address, None),
    }
}
