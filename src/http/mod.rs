//! Single-endpoint HTTP service: `POST /generate` returns the encoded countdown as an attachment.

pub mod errors;
pub mod generate;
pub mod router;
pub mod state;

pub use router::ApiServer;
pub use state::ServiceState;
