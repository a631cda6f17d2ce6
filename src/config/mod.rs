pub mod settings;

pub use settings::{
    default_config_path, load_settings, save_settings, Settings, CONFIG_ENV, INTERVAL_ENV,
    MAX_TOP_N, TOP_N_ENV,
};
