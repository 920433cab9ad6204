pub mod error_handling;
pub mod mock_server;
pub mod streaming;
