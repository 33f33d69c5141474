//! Configuration for waymark.
//!
//! Engine limits, validator defaults, logging and the default snapshot
//! location, read from `waymark.toml`.

mod settings;

pub use settings::{
    expand_env_vars, LoggingSettings, ResolutionSettings, Settings, SettingsError,
    SnapshotSettings, ValidationSettings,
};
