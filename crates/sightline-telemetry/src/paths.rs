//! Path resolution for local state

use std::path::PathBuf;

/// Resolves the files sightline keeps under the user's home directory
#[derive(Debug, Clone)]
pub struct Paths {
    pub home: PathBuf,
}

impl Paths {
    pub fn new() -> std::io::Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;
        Ok(Self::with_home(home.join(".sightline")))
    }

    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn config_file(&self) -> PathBuf {
        self.home.join("config.json")
    }

    pub fn audit_file(&self) -> PathBuf {
        self.home.join("audit.jsonl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_under_home() {
        let paths = Paths::with_home("/tmp/sl");
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/sl/config.json"));
        assert_eq!(paths.audit_file(), PathBuf::from("/tmp/sl/audit.jsonl"));
    }
}
