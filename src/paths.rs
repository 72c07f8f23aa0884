use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

const SETTINGS_FILE: &str = "settings.json";

/// Per-user configuration directory of the editor.
pub struct AppPaths {
    pub config: PathBuf,
}

impl AppPaths {
    pub fn from_project_dirs() -> Option<Self> {
        ProjectDirs::from("com", "packskinner", "PackSkinner").map(|dirs| Self {
            config: dirs.config_dir().to_path_buf(),
        })
    }

    pub fn settings_file(&self) -> PathBuf {
        self.config.join(SETTINGS_FILE)
    }

    pub fn ensure_dirs_exist(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.config)
    }
}
