//! Reading and rewriting target configuration files
//!
//! Only one reserved section is ever interpreted. Every other line, including
//! its terminator, is carried through byte for byte.

pub mod lines;
pub mod patch;
pub mod propagate;
pub mod section;

pub use lines::{Document, LineEnding};
pub use patch::{PatchOutcome, patch_file, patch_section};
pub use propagate::{find_variants, is_variant_file, propagate_to_variants, upsert_section};
pub use section::{Entry, extract_section};
