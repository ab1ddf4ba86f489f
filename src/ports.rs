// Port number suppliers
//
// A supplier hands out a TCP port number that nothing else in this process
// has been given. It consumes the number; it does not keep the port bound.

use std::collections::HashSet;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddrV4, SocketAddrV6, TcpListener};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use lazy_static::lazy_static;
use tracing::{debug, trace};

use crate::errors::{BindpointError, Result};

/// Number of OS assignments tried before giving up on a fresh port
const MAX_OS_REQUESTS: u32 = 64;

lazy_static! {
    static ref PROCESS_SUPPLIER: OsPortSupplier = OsPortSupplier::new();
}

/// Source of unused TCP port numbers
pub trait PortSupplier: Send + Sync {
    /// Return a port number not previously returned by this supplier
    fn next_port(&self) -> Result<u16>;
}

impl<T: PortSupplier + ?Sized> PortSupplier for &T {
    fn next_port(&self) -> Result<u16> {
        (**self).next_port()
    }
}

impl<T: PortSupplier + ?Sized> PortSupplier for Arc<T> {
    fn next_port(&self) -> Result<u16> {
        (**self).next_port()
    }
}

/// Get the next port from the process-wide supplier
pub fn next_port() -> Result<u16> {
    PROCESS_SUPPLIER.next_port()
}

/// The process-wide supplier used by the free resolver functions
pub fn process_supplier() -> &'static OsPortSupplier {
    &PROCESS_SUPPLIER
}

/// Supplier backed by OS ephemeral port assignment
#[derive(Debug, Default)]
pub struct OsPortSupplier {
    issued: Mutex<HashSet<u16>>,
}

impl OsPortSupplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ports handed out so far
    pub fn issued_count(&self) -> usize {
        self.issued.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn request_from_os() -> io::Result<u16> {
        let listener = TcpListener::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0))?;
        let port = listener.local_addr()?.port();
        drop(listener);

        // Callers pair these ports with "localhost", so the IPv6 loopback
        // must be free too. Hosts without IPv6 are fine.
        match TcpListener::bind(SocketAddrV6::new(Ipv6Addr::LOCALHOST, port, 0, 0)) {
            Ok(_) => Ok(port),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => Err(e),
            Err(e) => {
                trace!(port, error = %e, "IPv6 loopback unavailable, skipping check");
                Ok(port)
            }
        }
    }
}

impl PortSupplier for OsPortSupplier {
    fn next_port(&self) -> Result<u16> {
        let mut last_error = None;

        for _ in 0..MAX_OS_REQUESTS {
            let port = match Self::request_from_os() {
                Ok(port) => port,
                Err(e) => {
                    trace!(error = %e, "OS port request failed");
                    last_error = Some(e);
                    continue;
                }
            };

            let mut issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
            if issued.insert(port) {
                debug!(port, "Issued port");
                return Ok(port);
            }
            trace!(port, "OS reassigned an issued port, asking again");
        }

        Err(BindpointError::port_supply_failed(
            format!("No fresh port after {} OS requests", MAX_OS_REQUESTS),
            last_error,
        ))
    }
}

/// Supplier that counts up from a fixed start, for deterministic tests and
/// harnesses that reserve a block of ports up front.
///
/// Port 0 means "any port" to a server, so it is never handed out; a start
/// of 0 begins at 1. The supply ends after 65535 has been issued.
#[derive(Debug)]
pub struct SequentialPortSupplier {
    // Wider than u16 so 65535 can be issued before running out
    next: AtomicU32,
    issued: AtomicU64,
}

impl SequentialPortSupplier {
    pub fn new(start: u16) -> Self {
        Self {
            next: AtomicU32::new(u32::from(start.max(1))),
            issued: AtomicU64::new(0),
        }
    }

    /// Number of ports handed out so far
    pub fn issued_count(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }
}

impl PortSupplier for SequentialPortSupplier {
    fn next_port(&self) -> Result<u16> {
        let next = self
            .next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |p| {
                (p <= u32::from(u16::MAX)).then_some(p + 1)
            })
            .map_err(|_| BindpointError::port_supply_failed("Sequential port supply exhausted", None))?;
        let port = u16::try_from(next)
            .map_err(|_| BindpointError::port_supply_failed("Sequential port supply exhausted", None))?;

        self.issued.fetch_add(1, Ordering::SeqCst);
        Ok(port)
    }
}
