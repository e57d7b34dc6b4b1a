//! Filesystem primitives for Status Keeper
//!
//! Provides virtual path handling for mod-library addresses, case-insensitive
//! resolution against the real tree, atomic I/O and a per-path access queue
//! that serializes writers of the same file.

pub mod access;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;
pub mod resolve;

pub use access::AccessQueue;
pub use config::ConfigStore;
pub use constants::KeeperPath;
pub use error::{Error, Result};
pub use path::VirtualPath;
pub use resolve::{find_child_ignore_case, resolve_case_insensitive};
