// SSL port discovery
//
// Some test machines pre-register SSL certificate bindings for a fixed block
// of ports, so SSL tests must bind inside that block. The finder walks it in
// order and returns the first port that binds on IPv4 loopback.
//
// This is a probe, not a reservation: the port is released before it is
// returned and another process may take it first. Callers running SSL tests
// concurrently on one machine must serialize them.

use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, trace, warn};

use crate::errors::{BindpointError, Result};
use crate::validation;

pub const SSL_PORT_RANGE_START: u16 = 44300;
pub const SSL_PORT_RANGE_END: u16 = 44399;

/// Why a probe did not bind
#[derive(Debug)]
pub enum ProbeError {
    /// The bind itself failed; the port is not available
    Bind(io::Error),
    /// No socket could be opened, so nothing was learned about the port
    Socket(io::Error),
}

/// Checks whether a port can be bound right now
pub trait PortProbe {
    /// Bind `port` and release it again
    fn try_bind(&self, port: u16) -> std::result::Result<(), ProbeError>;
}

impl<T: PortProbe + ?Sized> PortProbe for &T {
    fn try_bind(&self, port: u16) -> std::result::Result<(), ProbeError> {
        (**self).try_bind(port)
    }
}

/// Probe that binds a fresh IPv4 TCP socket on loopback
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpBindProbe;

impl PortProbe for TcpBindProbe {
    fn try_bind(&self, port: u16) -> std::result::Result<(), ProbeError> {
        // No SO_REUSEADDR: a port held by a live listener must fail to bind.
        // The socket is closed when it drops, on every path out of here.
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
            .map_err(ProbeError::Socket)?;
        let addr = SocketAddrV4::new(Ipv4Addr::LOCALHOST, port);
        socket.bind(&addr.into()).map_err(ProbeError::Bind)
    }
}

/// Inclusive range of ports with SSL bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SslPortRange {
    pub start: u16,
    pub end: u16,
}

impl Default for SslPortRange {
    fn default() -> Self {
        Self {
            start: SSL_PORT_RANGE_START,
            end: SSL_PORT_RANGE_END,
        }
    }
}

impl SslPortRange {
    pub fn new(start: u16, end: u16) -> Result<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        validation::validate_port_range(self.start, self.end)
    }

    pub fn port_count(&self) -> u32 {
        u32::from(self.end) - u32::from(self.start) + 1
    }

    pub fn contains(&self, port: u16) -> bool {
        (self.start..=self.end).contains(&port)
    }
}

/// Finds a bindable port inside an SSL port range
#[derive(Debug, Clone)]
pub struct SslPortFinder<P = TcpBindProbe> {
    range: SslPortRange,
    probe: P,
}

impl Default for SslPortFinder {
    fn default() -> Self {
        Self {
            range: SslPortRange::default(),
            probe: TcpBindProbe,
        }
    }
}

impl SslPortFinder {
    pub fn new(range: SslPortRange) -> Result<Self> {
        Self::with_probe(range, TcpBindProbe)
    }
}

impl<P: PortProbe> SslPortFinder<P> {
    pub fn with_probe(range: SslPortRange, probe: P) -> Result<Self> {
        range.validate()?;
        Ok(Self { range, probe })
    }

    pub fn range(&self) -> SslPortRange {
        self.range
    }

    /// Return the first port in the range that binds.
    ///
    /// Fails with `PortRangeExhausted`, carrying the last bind error, once
    /// every port in the range has been tried. A probe socket that cannot be
    /// opened fails straight away with `Probe`.
    pub fn find_next_available(&self) -> Result<u16> {
        let mut attempts = 0u32;
        let mut last_error = None;

        for port in self.range.start..=self.range.end {
            attempts += 1;
            match self.probe.try_bind(port) {
                Ok(()) => {
                    debug!(port, attempts, "Found available SSL port");
                    return Ok(port);
                }
                Err(ProbeError::Bind(e)) => {
                    trace!(port, error = %e, "SSL port unavailable");
                    last_error = Some(e);
                }
                Err(ProbeError::Socket(e)) => {
                    warn!(port, attempts, error = %e, "Could not open probe socket");
                    return Err(BindpointError::probe_failed(port, e));
                }
            }
        }

        warn!(
            start = self.range.start,
            end = self.range.end,
            attempts,
            "SSL port range exhausted"
        );
        let cause = last_error
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "empty port range"));
        Err(BindpointError::port_range_exhausted(
            self.range.start,
            self.range.end,
            attempts,
            cause,
        ))
    }
}

/// Find a free port in 44300-44399 on IPv4 loopback
pub fn find_next_available_ssl_port() -> Result<u16> {
    SslPortFinder::default().find_next_available()
}
