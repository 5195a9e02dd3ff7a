use crate::config::{Settings, SettingsLayer};
use crate::{cd_debug, cd_info};
use std::fs::{read_to_string, write};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read config file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("malformed config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("write config file {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Location of the launcher config file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    /// Default file name, looked up in the working directory.
    pub const DEFAULT_PATH: &'static str = "charmd.toml";
    /// Environment variable with an alternative config file location.
    pub const PATH_ENV: &'static str = "CHARMD_CONFIG";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Choose the config file: explicit path first, then [`Self::PATH_ENV`],
    /// then [`Self::DEFAULT_PATH`].
    pub fn locate(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::new(path);
        }
        match std::env::var_os(Self::PATH_ENV) {
            Some(path) if !path.is_empty() => Self::new(path),
            _ => Self::new(Self::DEFAULT_PATH),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file layer. A missing file yields an empty layer.
    pub fn load(&self) -> Result<SettingsLayer, ConfigError> {
        let data = match read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                cd_debug!("config file {} not found, use defaults", self.path.display());
                return Ok(SettingsLayer::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let layer: SettingsLayer = toml::de::from_str(&data).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;
        cd_debug!("config file {} loaded: {layer:?}", self.path.display());
        Ok(layer)
    }

    /// Write a settings snapshot, replacing the previous file content.
    pub fn store(&self, settings: &Settings) -> Result<(), ConfigError> {
        let data = toml::ser::to_string(&SettingsLayer::from(settings))?;
        write(&self.path, data).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        cd_info!("settings written into {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_missing_file_is_empty_layer() {
        let dir = tempfile::tempdir().unwrap();
        let file = ConfigFile::new(dir.path().join("absent.toml"));
        assert_eq!(file.load().unwrap(), SettingsLayer::default());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charmd.toml");
        fs::write(&path, "port = 7777\nsuspend = true\n").unwrap();

        let layer = ConfigFile::new(&path).load().unwrap();
        assert_eq!(
            layer,
            SettingsLayer {
                port: Some(7777),
                suspend: Some(true),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_malformed_file() {
        struct TestCase {
            content: &'static str,
            expected_fragment: &'static str,
        }

        let cases = [
            TestCase {
                content: "host = \"localhost\"\nport = \n",
                expected_fragment: "line 2",
            },
            TestCase {
                content: "port = \"many\"\n",
                expected_fragment: "port",
            },
            TestCase {
                content: "colour = \"blue\"\n",
                expected_fragment: "colour",
            },
        ];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charmd.toml");
        for tc in cases {
            fs::write(&path, tc.content).unwrap();
            let err = ConfigFile::new(&path).load().unwrap_err();
            assert!(matches!(err, ConfigError::Parse { .. }));
            let msg = err.to_string();
            assert!(
                msg.contains(tc.expected_fragment),
                "`{msg}` should mention `{}`",
                tc.expected_fragment
            );
        }
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = ConfigFile::new(dir.path().join("charmd.toml"));

        let settings = Settings::resolve(
            SettingsLayer::default(),
            SettingsLayer {
                host: Some("192.168.1.2".to_string()),
                stderr_to_server: Some(false),
                pydevd_path: Some(PathBuf::from("/tmp/pydevd")),
                ..Default::default()
            },
        );
        file.store(&settings).unwrap();

        let reloaded = Settings::resolve(file.load().unwrap(), SettingsLayer::default());
        assert_eq!(reloaded, settings);
    }

    #[test]
    fn test_store_into_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = ConfigFile::new(dir.path().join("no/such/dir/charmd.toml"));
        let err = file.store(&Settings::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Write { .. }));
    }

    #[test]
    #[serial]
    fn test_locate() {
        std::env::remove_var(ConfigFile::PATH_ENV);
        assert_eq!(ConfigFile::locate(None).path(), Path::new("charmd.toml"));
        assert_eq!(
            ConfigFile::locate(Some(Path::new("/etc/charmd.toml"))).path(),
            Path::new("/etc/charmd.toml")
        );

        std::env::set_var(ConfigFile::PATH_ENV, "/home/dev/.charmd.toml");
        assert_eq!(
            ConfigFile::locate(None).path(),
            Path::new("/home/dev/.charmd.toml")
        );
        assert_eq!(
            ConfigFile::locate(Some(Path::new("local.toml"))).path(),
            Path::new("local.toml")
        );
        std::env::remove_var(ConfigFile::PATH_ENV);
    }
}
