//! Command implementations for keeper-cli

pub mod status;
pub mod sync;
pub mod watch;

pub use status::run_status;
pub use sync::run_sync;
pub use watch::run_watch;
