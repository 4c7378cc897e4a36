use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;
use log::debug;

/// The last public IP that was pushed to the provider, kept in a plain text file.
#[derive(Debug)]
pub struct IpCache {
    path: PathBuf,
}

impl IpCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        IpCache { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` only when nothing has been stored yet; an empty file is `Some("")`.
    pub fn load(&self) -> color_eyre::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No cached IP at {}", self.path.display());
                Ok(None)
            }
            Err(e) => Err(e).wrap_err_with(|| {
                format!("Failed to read cached IP from {}", self.path.display())
            }),
        }
    }

    pub fn store(&self, ip: &str) -> color_eyre::Result<()> {
        std::fs::write(&self.path, ip)
            .wrap_err_with(|| format!("Failed to write cached IP to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_no_previous_ip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IpCache::new(dir.path().join("old_ip.txt"));

        assert_eq!(cache.load().unwrap(), None);
    }

    #[test]
    fn stored_ip_is_loaded_back_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old_ip.txt");
        std::fs::write(&path, "1.2.3.4\n").unwrap();
        let cache = IpCache::new(&path);

        assert_eq!(cache.load().unwrap().as_deref(), Some("1.2.3.4"));

        cache.store("5.6.7.8").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "5.6.7.8");
        assert_eq!(cache.load().unwrap().as_deref(), Some("5.6.7.8"));
    }

    #[test]
    fn blank_file_is_an_empty_previous_ip() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "  \n").unwrap();

        assert_eq!(IpCache::new(file.path()).load().unwrap().as_deref(), Some(""));
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be read as a file.
        let cache = IpCache::new(dir.path());

        assert!(cache.load().is_err());
        assert!(cache.store("1.2.3.4").is_err());
    }
}
