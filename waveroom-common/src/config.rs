//! Configuration and data folder resolution

use std::path::{Path, PathBuf};

use crate::Result;

/// Data folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. `WAVEROOM_ROOT` environment variable
/// 3. OS-dependent compiled default (fallback)
pub fn resolve_data_folder(cli_arg: Option<PathBuf>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path;
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var("WAVEROOM_ROOT") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: OS-dependent compiled default
    default_data_folder()
}

/// Get OS-dependent default data folder path
fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/waveroom (or /var/lib/waveroom for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("waveroom"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/waveroom"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/waveroom
        dirs::data_dir()
            .map(|d| d.join("waveroom"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/waveroom"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\waveroom
        dirs::data_local_dir()
            .map(|d| d.join("waveroom"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\waveroom"))
    } else {
        PathBuf::from("./waveroom_data")
    }
}

/// Resolved data folder layout: database file plus uploads directory
#[derive(Debug, Clone)]
pub struct DataFolder {
    root: PathBuf,
}

impl DataFolder {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the root and uploads directories if missing
    pub fn ensure_layout(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.uploads_dir())?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.root.join("waveroom.db")
    }

    /// Directory holding uploaded audio artifacts
    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_wins() {
        let folder = resolve_data_folder(Some(PathBuf::from("/tmp/waveroom-test")));
        assert_eq!(folder, PathBuf::from("/tmp/waveroom-test"));
    }

    #[test]
    fn layout_paths_are_under_root() {
        let folder = DataFolder::new(PathBuf::from("/data/waveroom"));
        assert_eq!(folder.database_path(), PathBuf::from("/data/waveroom/waveroom.db"));
        assert_eq!(folder.uploads_dir(), PathBuf::from("/data/waveroom/uploads"));
    }

    #[test]
    fn ensure_layout_creates_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let folder = DataFolder::new(tmp.path().join("nested").join("root"));
        folder.ensure_layout().unwrap();
        assert!(folder.uploads_dir().is_dir());
    }
}
