use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Dawaai";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default `RUST_LOG`-style filter when the environment does not set one.
pub fn default_log_filter() -> String {
    "dawaai=info".to_string()
}

/// Get the application data directory
/// ~/Dawaai/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Dawaai")
}

/// Get the path of the local database
pub fn database_path() -> PathBuf {
    app_data_dir().join("dawaai.db")
}
