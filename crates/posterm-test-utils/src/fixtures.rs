use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory for files a test needs on disk, such as screensaver
/// images
pub struct TestFixtures {
    temp_dir: TempDir,
}

impl TestFixtures {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    pub fn create_test_file(&self, name: &str, content: &[u8]) -> Result<PathBuf> {
        let file_path = self.temp_dir.path().join(name);
        std::fs::write(&file_path, content)?;
        Ok(file_path)
    }

    /// Placeholder image file; backends only check that it exists
    pub fn create_image(&self, name: &str) -> Result<String> {
        let path = self.create_test_file(name, b"\x89PNG\r\n\x1a\n")?;
        Ok(path.to_string_lossy().into_owned())
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}
