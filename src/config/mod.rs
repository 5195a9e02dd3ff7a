//! Launcher settings.
//!
//! Every setting is resolved from three layers: built-in defaults, the config file and the
//! command line. A layer is a partial assignment ([`SettingsLayer`]), layers are combined by
//! [`SettingsLayer::merge`] and the result is frozen into a [`Settings`] snapshot.

mod file;

pub use file::{ConfigError, ConfigFile};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: i64 = 5678;

/// Partial settings assignment, one per configuration source.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspend: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout_to_server: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr_to_server: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pydevd_path: Option<PathBuf>,
}

impl SettingsLayer {
    /// Built-in defaults layer.
    pub fn defaults() -> Self {
        Self {
            host: Some(DEFAULT_HOST.to_string()),
            port: Some(DEFAULT_PORT),
            suspend: Some(false),
            stdout_to_server: Some(true),
            stderr_to_server: Some(true),
            pydevd_path: None,
        }
    }

    /// Overlay `upper` onto this layer: every value present in `upper` wins.
    pub fn merge(self, upper: SettingsLayer) -> SettingsLayer {
        SettingsLayer {
            host: upper.host.or(self.host),
            port: upper.port.or(self.port),
            suspend: upper.suspend.or(self.suspend),
            stdout_to_server: upper.stdout_to_server.or(self.stdout_to_server),
            stderr_to_server: upper.stderr_to_server.or(self.stderr_to_server),
            pydevd_path: upper.pydevd_path.or(self.pydevd_path),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &SettingsLayer::default()
    }
}

/// Resolved, read-only launcher settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Debug server address.
    pub host: String,
    /// Debug server port. Range is checked on connect.
    pub port: i64,
    /// Halt on attach until the IDE resumes execution.
    pub suspend: bool,
    /// Tee target stdout to the debug server.
    pub stdout_to_server: bool,
    /// Tee target stderr to the debug server.
    pub stderr_to_server: bool,
    /// Location of the `pydevd_pycharm` library, discovered when unset.
    pub pydevd_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::resolve(SettingsLayer::default(), SettingsLayer::default())
    }
}

impl Settings {
    /// Merge defaults, file and command line layers (in ascending precedence) into a snapshot.
    pub fn resolve(file: SettingsLayer, cli: SettingsLayer) -> Self {
        let merged = SettingsLayer::defaults().merge(file).merge(cli);
        Self::from_complete(merged)
    }

    // every field except `pydevd_path` is set once the defaults layer is merged in
    fn from_complete(layer: SettingsLayer) -> Self {
        Settings {
            host: layer.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: layer.port.unwrap_or(DEFAULT_PORT),
            suspend: layer.suspend.unwrap_or(false),
            stdout_to_server: layer.stdout_to_server.unwrap_or(true),
            stderr_to_server: layer.stderr_to_server.unwrap_or(true),
            pydevd_path: layer.pydevd_path,
        }
    }
}

impl From<&Settings> for SettingsLayer {
    fn from(settings: &Settings) -> Self {
        SettingsLayer {
            host: Some(settings.host.clone()),
            port: Some(settings.port),
            suspend: Some(settings.suspend),
            stdout_to_server: Some(settings.stdout_to_server),
            stderr_to_server: Some(settings.stderr_to_server),
            pydevd_path: settings.pydevd_path.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn file_layer() -> SettingsLayer {
        SettingsLayer {
            host: Some("10.0.0.5".to_string()),
            port: Some(7000),
            suspend: Some(true),
            stdout_to_server: None,
            stderr_to_server: Some(false),
            pydevd_path: Some(PathBuf::from("/opt/pycharm/debug-eggs/pydevd-pycharm.egg")),
        }
    }

    fn cli_layer() -> SettingsLayer {
        SettingsLayer {
            host: Some("127.0.0.1".to_string()),
            port: Some(9999),
            suspend: Some(false),
            stdout_to_server: Some(false),
            stderr_to_server: None,
            pydevd_path: None,
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.host, "localhost");
        assert_eq!(settings.port, 5678);
        assert!(!settings.suspend);
        assert!(settings.stdout_to_server);
        assert!(settings.stderr_to_server);
        assert_eq!(settings.pydevd_path, None);
    }

    #[test]
    fn test_merge_is_associative() {
        struct TestCase {
            layers: [SettingsLayer; 3],
        }

        let cases = [
            TestCase {
                layers: [SettingsLayer::defaults(), file_layer(), cli_layer()],
            },
            TestCase {
                layers: [SettingsLayer::defaults(), SettingsLayer::default(), cli_layer()],
            },
            TestCase {
                layers: [SettingsLayer::defaults(), file_layer(), SettingsLayer::default()],
            },
            TestCase {
                layers: [cli_layer(), file_layer(), SettingsLayer::defaults()],
            },
        ];

        for tc in cases {
            let [a, b, c] = tc.layers;
            let left = a.clone().merge(b.clone().merge(c.clone()));
            let right = a.merge(b).merge(c);
            assert_eq!(left, right);
        }
    }

    #[test]
    fn test_cli_wins_over_file_over_defaults() {
        let settings = Settings::resolve(file_layer(), cli_layer());

        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 9999);
        assert!(!settings.suspend);
        assert!(!settings.stdout_to_server);
        // cli is silent, file wins over default
        assert!(!settings.stderr_to_server);
        assert_eq!(
            settings.pydevd_path,
            Some(PathBuf::from("/opt/pycharm/debug-eggs/pydevd-pycharm.egg"))
        );
    }

    #[test]
    fn test_empty_layers_keep_defaults() {
        let settings = Settings::resolve(SettingsLayer::default(), SettingsLayer::default());
        assert_eq!(settings, Settings::default());
        assert!(SettingsLayer::default().is_empty());
        assert!(!SettingsLayer::defaults().is_empty());
    }

    #[test]
    fn test_snapshot_to_layer() {
        let settings = Settings::resolve(file_layer(), cli_layer());
        let layer = SettingsLayer::from(&settings);
        assert_eq!(Settings::resolve(layer, SettingsLayer::default()), settings);
    }
}
