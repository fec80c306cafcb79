/// JSON extraction from free-text model replies.
pub mod json;
/// TOML configuration with hot reload.
pub mod toml_config;
