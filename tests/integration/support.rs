// Shared test doubles

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bindpoint::ssl::{PortProbe, ProbeError};
use bindpoint::{PortSupplier, Result};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serializes tests that set or read `BINDPOINT_*` environment variables
pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Supplier returning a scripted sequence and counting calls
pub struct CountingSupplier {
    ports: Mutex<Vec<u16>>,
    calls: AtomicUsize,
}

impl CountingSupplier {
    pub fn new(ports: &[u16]) -> Self {
        let mut ports = ports.to_vec();
        ports.reverse();
        Self {
            ports: Mutex::new(ports),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PortSupplier for CountingSupplier {
    fn next_port(&self) -> Result<u16> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.ports.lock().unwrap().pop().expect("supplier script exhausted"))
    }
}

/// Probe that reports every port below `first_free` as in use
pub struct OccupiedBelow {
    first_free: u32,
    probed: Mutex<Vec<u16>>,
}

impl OccupiedBelow {
    pub fn new(first_free: u32) -> Self {
        Self {
            first_free,
            probed: Mutex::new(Vec::new()),
        }
    }

    pub fn probed(&self) -> Vec<u16> {
        self.probed.lock().unwrap().clone()
    }
}

impl PortProbe for OccupiedBelow {
    fn try_bind(&self, port: u16) -> std::result::Result<(), ProbeError> {
        self.probed.lock().unwrap().push(port);
        if u32::from(port) < self.first_free {
            Err(ProbeError::Bind(io::Error::new(io::ErrorKind::AddrInUse, "address already in use")))
        } else {
            Ok(())
        }
    }
}

/// Probe whose socket can never be opened, as when file handles run out
pub struct NoSockets {
    pub attempts: AtomicUsize,
}

impl PortProbe for NoSockets {
    fn try_bind(&self, _port: u16) -> std::result::Result<(), ProbeError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ProbeError::Socket(io::Error::from_raw_os_error(24)))
    }
}
