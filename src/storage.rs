use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "STUDYGRIND_HOME";

/// A JSON document on disk, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn get_base_dir() -> Result<PathBuf> {
        let path = match env::var_os(HOME_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => {
                let mut path = dirs::home_dir()
                    .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
                path.push(".studygrind");
                path
            }
        };
        if !path.exists() {
            fs::create_dir_all(&path)?;
        }
        Ok(path)
    }

    pub fn in_dir(dir: &Path, file_name: &str) -> Self {
        Self::from_path(dir.join(file_name))
    }

    pub fn from_path(path: PathBuf) -> Self {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                let _ = fs::create_dir_all(parent);
            }
        }
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load<T: DeserializeOwned + Default>(&self) -> Result<T> {
        if !self.path.exists() {
            return Ok(T::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let value = serde_json::from_str(&data)?;
        Ok(value)
    }

    pub fn save<T: Serialize>(&self, value: &T) -> Result<()> {
        let data = serde_json::to_string_pretty(value)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &data)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
