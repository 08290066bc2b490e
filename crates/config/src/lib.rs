//! Configuration loading, validation and env substitution.
//!
//! Config files: `porch.toml`, `porch.yaml`, `porch.yml` or `porch.json`,
//! searched in `./` then `~/.config/porch/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution in the raw
//! file text.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{
        clear_config_dir, config_dir, discover_and_load, find_or_default_config_path,
        load_config, save_config_to, set_config_dir,
    },
    schema::{
        AddOn, Cents, CountdownConfig, PorchConfig, PricingConfig, SubmissionConfig, Tier,
        is_placeholder,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
