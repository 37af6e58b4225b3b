pub mod config;

pub use config::{presets, ConfigError, SpacecraftBuilder, SpacecraftConfig};
