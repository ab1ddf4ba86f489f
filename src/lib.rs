// Library interface for Bindpoint
// Endpoint and port allocation for integration test servers

pub mod config;
pub mod endpoint;
pub mod errors;
pub mod ports;
pub mod resolver;
pub mod ssl;
pub mod util;
pub mod validation;

pub use endpoint::{EndpointRequest, ResolvedEndpoint, ServerKind};
pub use errors::{BindpointError, ErrorCode, Result};
pub use ports::{next_port, OsPortSupplier, PortSupplier, SequentialPortSupplier};
pub use resolver::{build_test_uri, build_test_uri_with_hint, EndpointResolver};
pub use ssl::{find_next_available_ssl_port, PortProbe, ProbeError, SslPortFinder, SslPortRange, TcpBindProbe};
