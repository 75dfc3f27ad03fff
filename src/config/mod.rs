/// Configuration system
///
/// - `macros`: `config_struct!` for single-line field/default declarations
/// - `schemas`: every section of `config.toml`
/// - `utils`: loading, environment overrides, validation, saving
pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::*;
pub use utils::{
    apply_env_overrides, load_config, load_config_from_path, save_config, validate_config,
    CONFIG_FILE_PATH,
};
