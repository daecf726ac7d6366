use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Path of the persistent key-value store under `$HOME/.local/state/mnemo`
    pub fn store_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("mnemo");
            Some(state_dir.join("store.db"))
        } else {
            ProjectDirs::from("", "", "mnemo")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("store.db"))
        }
    }

    /// Directory for the per-session CSV result log
    pub fn log_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "mnemo").map(|pd| pd.config_dir().to_path_buf())
    }
}
