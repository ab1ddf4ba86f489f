// Endpoint resolution for servers under test

use tracing::{debug, instrument};
use url::Url;

use crate::endpoint::{EndpointRequest, ResolvedEndpoint, ServerKind};
use crate::errors::{BindpointError, Result};
use crate::ports::{self, OsPortSupplier, PortSupplier};
use crate::validation;

/// Host for dynamic-port binds; port 0 cannot be bound on both loopbacks
/// at once, so these are IPv4 only.
pub const DYNAMIC_PORT_HOST: &str = "127.0.0.1";

/// Host for pre-assigned ports, covering IPv4 and IPv6 loopback
pub const ASSIGNED_PORT_HOST: &str = "localhost";

/// Picks the URI a test server binds to and the test connects to
#[derive(Debug)]
pub struct EndpointResolver<S> {
    supplier: S,
}

impl EndpointResolver<&'static OsPortSupplier> {
    /// Resolver backed by the process-wide port supplier
    pub fn process_wide() -> Self {
        Self::new(ports::process_supplier())
    }
}

impl<S: PortSupplier> EndpointResolver<S> {
    pub fn new(supplier: S) -> Self {
        Self { supplier }
    }

    pub fn supplier(&self) -> &S {
        &self.supplier
    }

    /// Resolve with no hint, the `http` scheme, and status messages assumed
    /// for servers that report their bound port
    pub fn resolve_default(&self, server_kind: ServerKind) -> Result<ResolvedEndpoint> {
        self.resolve(&EndpointRequest::new(server_kind))
    }

    /// Resolve with the `http` scheme and status messages assumed for
    /// servers that report their bound port
    pub fn resolve_with_hint(&self, server_kind: ServerKind, hint: &str) -> Result<ResolvedEndpoint> {
        self.resolve(&EndpointRequest::new(server_kind).with_hint(hint))
    }

    /// Resolve an endpoint request.
    ///
    /// Without a hint, a status-reporting server with status messages on gets
    /// `scheme://127.0.0.1:0/` and reports its real port itself; anything else
    /// gets `scheme://localhost:<supplied port>/`.
    ///
    /// With a hint, an explicit port 0 is replaced by a supplied port and the
    /// rest of the hint is kept. Any other hint is returned unchanged.
    #[instrument(level = "debug", skip(self), fields(kind = %request.server_kind))]
    pub fn resolve(&self, request: &EndpointRequest) -> Result<ResolvedEndpoint> {
        match request.effective_hint() {
            None => self.resolve_without_hint(request),
            Some(hint) => self.resolve_hint(hint),
        }
    }

    fn resolve_without_hint(&self, request: &EndpointRequest) -> Result<ResolvedEndpoint> {
        validation::validate_scheme(&request.scheme)?;

        if request.server_kind.reports_bound_port() && request.status_messages_enabled {
            debug!("Using dynamic port on IPv4 loopback");
            return Ok(ResolvedEndpoint::new(base_url(&request.scheme, DYNAMIC_PORT_HOST)?));
        }

        // A supplied port is consumed for good, so the scheme must be able to
        // carry a host and port before asking for one.
        let mut url = base_url(&request.scheme, ASSIGNED_PORT_HOST)?;
        let port = self.supplier.next_port()?;
        url.set_port(Some(port))
            .map_err(|_| BindpointError::port_not_settable(url.as_str()))?;
        debug!(port, "Using pre-assigned port on localhost");
        Ok(ResolvedEndpoint::new(url))
    }

    fn resolve_hint(&self, hint: &str) -> Result<ResolvedEndpoint> {
        let mut url = Url::parse(hint).map_err(|e| BindpointError::malformed_uri(hint, e))?;

        if url.port() != Some(0) {
            debug!(%url, "Hint has a specific port, keeping it");
            return Ok(ResolvedEndpoint::new(url));
        }

        let port = self.supplier.next_port()?;
        url.set_port(Some(port))
            .map_err(|_| BindpointError::port_not_settable(hint))?;
        debug!(port, %url, "Replaced port 0 in hint");
        Ok(ResolvedEndpoint::new(url))
    }
}

/// `scheme://host:0/`, which fails for schemes that cannot carry a port
fn base_url(scheme: &str, host: &str) -> Result<Url> {
    let raw = format!("{}://{}:0/", scheme, host);
    Url::parse(&raw).map_err(|e| BindpointError::malformed_uri(&raw, e))
}

/// Resolve a request against the process-wide port supplier
pub fn resolve(request: &EndpointRequest) -> Result<ResolvedEndpoint> {
    EndpointResolver::process_wide().resolve(request)
}

/// Build a test URI for a server kind with default settings
pub fn build_test_uri(server_kind: ServerKind) -> Result<ResolvedEndpoint> {
    EndpointResolver::process_wide().resolve_default(server_kind)
}

/// Build a test URI for a server kind from a hint
pub fn build_test_uri_with_hint(server_kind: ServerKind, hint: &str) -> Result<ResolvedEndpoint> {
    EndpointResolver::process_wide().resolve_with_hint(server_kind, hint)
}
