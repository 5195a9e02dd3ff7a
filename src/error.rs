use crate::args::UsageError;
use crate::config::ConfigError;
use itertools::Itertools;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- invocation errors -----------------------------------------
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    // --------------------------------- environment errors ----------------------------------------
    #[error("python interpreter not found (tried: {})", .0.join(", "))]
    InterpreterNotFound(Vec<String>),
    #[error(
        "pydevd_pycharm is not installed or importable (searched: {})\n\
        Install the PyCharm debug package (e.g. 'pip install pydevd-pycharm') \
        or point --pydevd-path at it",
        .searched.iter().map(|p| p.display()).join(", ")
    )]
    LibraryNotFound { searched: Vec<PathBuf> },

    // --------------------------------- session errors --------------------------------------------
    #[error("failed to connect to debug server at {host}:{port}: {reason}")]
    Connection {
        host: String,
        port: i64,
        reason: String,
    },

    // --------------------------------- generic errors --------------------------------------------
    #[error(transparent)]
    IO(#[from] std::io::Error),
}

impl Error {
    /// Process exit code reported for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_) => 2,
            Error::ScriptNotFound(_) => 2,
            Error::LibraryNotFound { .. } => 4,
            Error::IO(_) => 74,
            Error::Config(_) => 78,
            Error::Connection { .. } => 111,
            Error::InterpreterNotFound(_) => 127,
        }
    }
}

#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "charmd", "{:#}", e);
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "charmd", concat!($msg, " {:#}"), e);
                None
            }
        }
    };
}

/// Transforms `Result` into `Option`, a failure is logged as a warning with a context message.
#[macro_export]
macro_rules! weak_error {
    ($res: expr, $msg: tt) => {
        $crate::_error!(::log::warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` for best-effort probes, a failure goes to debug logs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!(::log::debug, $res)
    };
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            Error::Usage(UsageError::NoTarget),
            Error::Config(ConfigError::Parse {
                path: PathBuf::from("charmd.toml"),
                source: toml::from_str::<toml::Table>("port = ").unwrap_err(),
            }),
            Error::LibraryNotFound { searched: vec![] },
            Error::Connection {
                host: "localhost".to_string(),
                port: 5678,
                reason: "refused".to_string(),
            },
            Error::InterpreterNotFound(vec!["python3".to_string()]),
        ];

        let codes: Vec<i32> = errors.iter().map(Error::exit_code).collect();
        assert!(codes.iter().all(|c| *c != 0));
        assert_eq!(codes.iter().unique().count(), codes.len());
    }

    #[test]
    fn test_error_macros() {
        let lookup: Result<u16, std::io::Error> = Err(std::io::ErrorKind::NotFound.into());
        assert_eq!(muted_error!(lookup), None);
        assert_eq!(weak_error!("5678".parse::<u16>(), "parse port:"), Some(5678));
        assert_eq!(weak_error!("port".parse::<u16>(), "parse port:"), None);
    }

    #[test]
    fn test_connection_error_names_endpoint() {
        let err = Error::Connection {
            host: "10.0.0.1".to_string(),
            port: 5678,
            reason: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to connect to debug server at 10.0.0.1:5678: connection refused"
        );
    }
}
