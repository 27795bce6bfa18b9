pub mod process_transport;

pub use process_transport::ProcessTransport;
