// Integration tests for SSL port discovery

use std::error::Error as _;
use std::io;
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};

use bindpoint::ssl::{SslPortFinder, SslPortRange, TcpBindProbe, SSL_PORT_RANGE_END, SSL_PORT_RANGE_START};
use bindpoint::{BindpointError, ErrorCode, PortProbe, ProbeError};

use crate::support::{NoSockets, OccupiedBelow};

#[test]
fn test_skips_occupied_ports_in_order() {
    let probe = OccupiedBelow::new(44306);
    let finder = SslPortFinder::with_probe(SslPortRange::default(), &probe).unwrap();

    assert_eq!(finder.find_next_available().unwrap(), 44306);
    assert_eq!(probe.probed(), (44300..=44306).collect::<Vec<u16>>());
}

#[test]
fn test_first_port_free() {
    let probe = OccupiedBelow::new(0);
    let finder = SslPortFinder::with_probe(SslPortRange::default(), &probe).unwrap();

    assert_eq!(finder.find_next_available().unwrap(), 44300);
    assert_eq!(probe.probed(), vec![44300]);
}

#[test]
fn test_exhausted_range_after_one_hundred_attempts() {
    let probe = OccupiedBelow::new(44400);
    let finder = SslPortFinder::with_probe(SslPortRange::default(), &probe).unwrap();

    let err = finder.find_next_available().unwrap_err();

    assert!(err.is_port_range_exhausted());
    assert_eq!(err.error_code(), ErrorCode::PortRangeExhausted);
    assert_eq!(probe.probed().len(), 100);
    assert_eq!(probe.probed().last(), Some(&44399));

    match &err {
        BindpointError::PortRangeExhausted { attempts, .. } => assert_eq!(*attempts, 100),
        other => panic!("unexpected error: {}", other),
    }

    let cause = err.source().unwrap().downcast_ref::<io::Error>().unwrap();
    assert_eq!(cause.kind(), io::ErrorKind::AddrInUse);
}

#[test]
fn test_socket_failure_is_not_treated_as_busy_port() {
    let probe = NoSockets { attempts: AtomicUsize::new(0) };
    let finder = SslPortFinder::with_probe(SslPortRange::default(), &probe).unwrap();

    let err = finder.find_next_available().unwrap_err();

    assert!(err.is_probe_failed());
    assert!(!err.is_port_range_exhausted());
    assert_eq!(err.error_code(), ErrorCode::ProbeFailed);
    assert_eq!(probe.attempts.load(Ordering::SeqCst), 1);

    let cause = err.source().unwrap().downcast_ref::<io::Error>().unwrap();
    assert_eq!(cause.raw_os_error(), Some(24));
}

#[test]
fn test_bind_probe_reports_listening_port_busy() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    assert!(matches!(TcpBindProbe.try_bind(port), Err(ProbeError::Bind(_))));

    drop(listener);
}

#[test]
fn test_bind_probe_releases_port() {
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();

    assert!(TcpBindProbe.try_bind(port).is_ok());
    // The probe socket is gone, so the port binds again
    assert!(TcpBindProbe.try_bind(port).is_ok());
    TcpListener::bind(("127.0.0.1", port)).unwrap();
}

#[test]
fn test_real_finder_skips_held_port() {
    // Hold one OS-assigned port and search a one-port range around it
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let finder = SslPortFinder::new(SslPortRange::new(port, port).unwrap()).unwrap();
    let err = finder.find_next_available().unwrap_err();
    assert!(err.is_port_range_exhausted());

    drop(listener);
    assert_eq!(finder.find_next_available().unwrap(), port);
}

#[test]
fn test_default_finder_stays_in_range() {
    match bindpoint::find_next_available_ssl_port() {
        Ok(port) => assert!((SSL_PORT_RANGE_START..=SSL_PORT_RANGE_END).contains(&port)),
        // Acceptable only if the whole range is genuinely taken on this host
        Err(e) => assert!(e.is_port_range_exhausted()),
    }
}
