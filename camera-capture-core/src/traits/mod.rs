pub mod capture_backend;
pub mod device_provider;
pub mod movie_exporter;
pub mod session_delegate;
