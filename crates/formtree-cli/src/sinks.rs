//! Local stand-ins for the persistence and navigation collaborators.

use std::fs;
use std::path::{Path, PathBuf};

use formtree::{FormError, Navigator, Persistence, Prefill};

/// Writes saved configurations into a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    written: Option<PathBuf>,
}

impl FileStore {
    /// Creates a store writing into `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            written: None,
        }
    }

    /// Returns the path of the last file written.
    pub fn written(&self) -> Option<&Path> {
        self.written.as_deref()
    }
}

impl Persistence for FileStore {
    fn save(&mut self, text: &str, suggested_name: &str) -> formtree::Result<()> {
        let path = self.dir.join(suggested_name);
        fs::write(&path, text)
            .map_err(|e| FormError::persistence(format!("{}: {e}", path.display())))?;
        self.written = Some(path);
        Ok(())
    }
}

/// Prints the prefill payload instead of opening the target page.
#[derive(Debug, Default)]
pub struct PrintNavigator {
    /// Last target opened.
    pub target: Option<String>,
}

impl Navigator for PrintNavigator {
    fn open(&mut self, target: &str, prefill: &Prefill) -> formtree::Result<()> {
        println!("{}", serde_json::to_string_pretty(prefill)?);
        self.target = Some(target.to_string());
        Ok(())
    }
}
