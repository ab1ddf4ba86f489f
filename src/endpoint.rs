// Server kinds, endpoint requests and resolved endpoints

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::BindpointError;

/// Scheme used when a request does not name one
pub const DEFAULT_SCHEME: &str = "http";

/// How a server under test lets the harness learn its port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ServerKind {
    /// Binds whatever port it is given (including 0) and announces the bound
    /// port in a status message at startup
    StatusReporting,
    /// Has no such status message, so the port must be chosen before launch
    PreAssigned,
}

impl ServerKind {
    pub fn reports_bound_port(self) -> bool {
        matches!(self, ServerKind::StatusReporting)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServerKind::StatusReporting => "status-reporting",
            ServerKind::PreAssigned => "pre-assigned",
        }
    }
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerKind {
    type Err = BindpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status-reporting" => Ok(ServerKind::StatusReporting),
            "pre-assigned" => Ok(ServerKind::PreAssigned),
            _ => Err(BindpointError::invalid_server_kind(s)),
        }
    }
}

/// Inputs to a single endpoint resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRequest {
    pub server_kind: ServerKind,
    pub scheme: String,
    pub hint: Option<String>,
    pub status_messages_enabled: bool,
}

impl EndpointRequest {
    /// A request with the `http` scheme, no hint, and status messages
    /// enabled only for servers that report their bound port.
    pub fn new(server_kind: ServerKind) -> Self {
        Self {
            server_kind,
            scheme: DEFAULT_SCHEME.to_string(),
            hint: None,
            status_messages_enabled: server_kind.reports_bound_port(),
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_optional_hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint;
        self
    }

    pub fn with_status_messages(mut self, enabled: bool) -> Self {
        self.status_messages_enabled = enabled;
        self
    }

    /// The hint, treating an empty string the same as no hint
    pub fn effective_hint(&self) -> Option<&str> {
        self.hint.as_deref().filter(|h| !h.is_empty())
    }
}

/// A fully formed URI to bind the server under test to and connect to it on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ResolvedEndpoint(Url);

impl ResolvedEndpoint {
    pub(crate) fn new(url: Url) -> Self {
        Self(url)
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    /// The explicit port, or the scheme's well-known default when the URI
    /// carries none (`http` without a port is 80).
    pub fn port(&self) -> Option<u16> {
        self.0.port_or_known_default()
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }

    /// Whether the server should bind a dynamic port and report it back
    pub fn is_dynamic(&self) -> bool {
        self.port() == Some(0)
    }

    /// `host:port` form suitable for handing to a listener
    pub fn socket_addr_string(&self) -> Option<String> {
        let host = self.host()?;
        let port = self.port()?;
        Some(format!("{}:{}", host, port))
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn into_url(self) -> Url {
        self.0
    }
}

impl fmt::Display for ResolvedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl AsRef<Url> for ResolvedEndpoint {
    fn as_ref(&self) -> &Url {
        &self.0
    }
}

impl From<ResolvedEndpoint> for Url {
    fn from(endpoint: ResolvedEndpoint) -> Self {
        endpoint.0
    }
}
