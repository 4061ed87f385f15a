//! # aldb-settings
//!
//! Layered configuration for the activity directory service.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`AldbSettings::default()`]
//! 2. **User file**: `~/.aldb/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `ALDB_*` overrides (highest priority)
//!
//! Command-line flags, when the binary has them, are applied by the caller
//! after loading.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
