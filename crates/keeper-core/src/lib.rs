//! Persistent variable synchronization for Status Keeper
//!
//! This crate keeps the values a user tunes inside the injection tool, which
//! are recorded in one central state file (`d3dx_user.ini`), in sync with the
//! configuration files of every mod in a library:
//!
//! - **Registry**: scans the library and maps namespace names to files,
//!   migrating manifests whose dialect no longer matches the mod's content
//! - **Parser**: tokenizes central state lines into direct or namespace
//!   addresses and collects pending updates per target file
//! - **Section patching**: rewrites changed values inside the reserved
//!   section, leaving every other byte alone
//! - **Variant propagation**: copies a changed reserved section into sibling
//!   variant (LOD) files
//! - **SyncEngine / SyncScheduler**: one serialized pipeline fed by manual,
//!   file-change and periodic triggers
//!
//! # Architecture
//!
//! ```text
//!                  keeper-cli
//!                      |
//!   scheduler ---> sync::SyncEngine
//!                      |
//!        +--------+----+-----+--------+
//!        |        |          |        |
//!    registry  parser   ini::patch  ini::propagate
//!        |
//!    manifest (reconcile, store)
//!        |
//!    keeper-fs (paths, resolution, atomic I/O, access queue)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use keeper_core::{SyncEngine, SyncSettings};
//!
//! let engine = SyncEngine::new(SyncSettings::new("/games/XXMI/Mods", "/games/XXMI/d3dx_user.ini"));
//! let result = engine.sync()?;
//! println!("{result}");
//! ```

pub mod config;
pub mod error;
pub mod ini;
pub mod logging;
pub mod manifest;
pub mod parser;
pub mod registry;
pub mod scheduler;
pub mod sync;

pub use config::{ConfigLayer, ConfigResolver, KeeperConfig};
pub use error::{Error, Result};
pub use manifest::{Dialect, ManifestStore, Migration, ModManifest, NamespaceRecord, reconcile};
pub use parser::{AddressToken, ParsedState, PendingUpdates, StateParser, tokenize};
pub use registry::{ManifestRegistry, ModEntry, ModLibrary, NamespaceIndex, RegistryReport};
pub use scheduler::{
    ChangeSource, ManualChangeSource, SchedulerSettings, SchedulerStats, StateFileWatcher, SyncScheduler,
    SyncTarget,
};
pub use sync::{LastSync, SyncEngine, SyncOutcome, SyncResult, SyncSettings, Trigger};
