//! Settings and their layered resolution
//!
//! Settings are merged from these sources (later sources override earlier):
//!
//! 1. **Defaults** - built in
//! 2. **Global config** - `<config_dir>/status-keeper/config.toml`
//! 3. **Local overrides** - `./status-keeper.toml`
//!
//! # Example
//!
//! ```ignore
//! use keeper_core::config::ConfigResolver;
//!
//! let config = ConfigResolver::new(std::env::current_dir()?).resolve()?;
//! let settings = config.sync_settings(&std::env::current_dir()?)?;
//! ```

mod resolver;
mod settings;

pub use resolver::ConfigResolver;
pub use settings::{ConfigLayer, KeeperConfig};
