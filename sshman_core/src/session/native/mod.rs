pub mod native_transport;

pub use native_transport::NativeTransport;
