use crate::{Error, InternalError};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const API_URL_VAR: &str = "SQLMATE_API_URL";
pub const SCHEMA_VAR: &str = "SQLMATE_SCHEMA";

const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    /// The schema document used to populate the table list. It's a local file, the server
    /// does not hand it out.
    pub schema_path: PathBuf,
}

impl Config {
    fn with_defaults(config_dir: &Path) -> Config {
        Config {
            api_url: DEFAULT_API_URL.to_owned(),
            schema_path: config_dir.join("db_schema.json"),
        }
    }

    /// Environment variables win over whatever is in the file.
    pub fn apply_env(mut self) -> Config {
        if let Ok(api_url) = std::env::var(API_URL_VAR) {
            self.api_url = api_url;
        }

        if let Ok(schema_path) = std::env::var(SCHEMA_VAR) {
            self.schema_path = schema_path.into();
        }

        self
    }
}

pub fn config_dir() -> Result<PathBuf, Error> {
    let home = std::env::var("HOME")?;

    Ok(Path::new(&home).join(".config").join("sqlmate"))
}

/// Reads `$HOME/.config/sqlmate/config.json`, then applies the environment.
pub fn read() -> Result<Config, Error> {
    let dir = config_dir()?;

    Ok(FileProvider::new(dir.join("config.json")).get()?.apply_env())
}

pub trait ConfigProvider {
    fn get(&self) -> Result<Config, Error>;
}

pub struct FileProvider {
    file_path: PathBuf,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> FileProvider {
        FileProvider {
            file_path: path.into(),
        }
    }

    fn create_default_config(&self) -> Result<Config, Error> {
        info!("Setting up default config");

        let base_dir = self.file_path.parent().ok_or_else(|| {
            InternalError(format!("Invalid path specified: {:?}", self.file_path))
        })?;

        let default_config = Config::with_defaults(base_dir);

        fs::create_dir_all(base_dir)?;
        fs::write(&self.file_path, serde_json::to_string_pretty(&default_config)?)?;

        println!("Created config file at {:?}", self.file_path);

        Ok(default_config)
    }
}

impl ConfigProvider for FileProvider {
    fn get(&self) -> Result<Config, Error> {
        info!("Reading config from file: {:?}", self.file_path);

        if !self.file_path.exists() {
            return self.create_default_config();
        }

        // A broken file is reported, never overwritten.
        let config = serde_json::from_reader(fs::File::open(&self.file_path)?)?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join("sqlmate-tests")
            .join("config")
            .join(name);
        let _making_sure_file_doesnt_exist = fs::remove_file(&path);

        path
    }

    #[test]
    fn provides_default_if_not_present() {
        let path = config_path("config.json");

        let config = FileProvider::new(&path).get().unwrap();

        let default_file_was_created = path.exists();
        assert!(default_file_was_created);
        assert_eq!(config.api_url, "http://127.0.0.1:8080");
        assert!(config.schema_path.ends_with("db_schema.json"));
    }

    #[test]
    fn does_not_override_invalid_config_files() {
        let path = config_path("config2.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let result = FileProvider::new(&path).get();

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn reads_existing_files() {
        let path = config_path("config3.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{"api_url": "https://sqlmate.example.com", "schema_path": "/srv/schema.json"}"#,
        )
        .unwrap();

        let config = FileProvider::new(&path).get().unwrap();

        assert_eq!(config.api_url, "https://sqlmate.example.com");
        assert_eq!(config.schema_path, PathBuf::from("/srv/schema.json"));
    }
}
