//! CLI command implementations.

pub mod completions;
pub mod donation;
pub mod init;
pub mod maintenance;
pub mod serve;

// Re-export command handlers
pub use completions::completions;
pub use donation::{donate, finalize, initiate, request_donation};
pub use init::init;
pub use maintenance::{pending, purge};
pub use serve::serve;
