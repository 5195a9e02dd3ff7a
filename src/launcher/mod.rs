//! Debug session launcher.
//!
//! A launch goes through `Configured -> Connected -> Running -> Terminated` states, each
//! transition consumes the previous state so no state is ever revisited. The target runs inside
//! the interpreter process that owns the debug session.

pub mod library;
pub mod python;

use crate::config::Settings;
use crate::error::Error;
use crate::target::{Target, TargetSpec};
use crate::{cd_debug, cd_info};
use std::net::ToSocketAddrs;
use std::path::{Path, PathBuf};

/// Everything required to open a debug session.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub suspend: bool,
    pub stdout_to_server: bool,
    pub stderr_to_server: bool,
    /// Debug server library location, put on the interpreter import path.
    pub library: PathBuf,
}

/// Finds the debug server library.
pub trait LibraryLocator {
    /// Return library location, `explicit` location (if any) is the only candidate.
    fn locate(&self, explicit: Option<&Path>) -> Result<PathBuf, Error>;
}

/// Opens debug sessions.
pub trait Connector {
    type Session: Session;

    /// Block until the debug server accepts the session or the attempt fails.
    fn connect(&self, options: &ConnectOptions) -> Result<Self::Session, Error>;
}

/// Established debug session.
pub trait Session {
    type Running: Execution;

    /// Start a target inside the session.
    fn start(self, target: &Target) -> Result<Self::Running, Error>;
}

/// Target executing inside a debug session.
pub trait Execution {
    /// Wait for the target to finish. Return the target exit code.
    fn wait(self) -> Result<i32, Error>;
}

/// Launch state.
pub trait State {}

/// Settings and target are known, nothing is started.
pub struct Configured;

impl State for Configured {}

/// Debug session is open, target is not started yet.
pub struct Connected<S: Session> {
    session: S,
}

impl<S: Session> State for Connected<S> {}

/// Target is executing.
pub struct Running<E: Execution> {
    execution: E,
}

impl<E: Execution> State for Running<E> {}

/// Target finished.
pub struct Terminated {
    exit_code: i32,
}

impl State for Terminated {}

pub struct Launch<S: State> {
    settings: Settings,
    target: Target,
    state: S,
}

impl Launch<Configured> {
    pub fn new(settings: Settings, target: Target) -> Self {
        Self {
            settings,
            target,
            state: Configured,
        }
    }

    /// Open a debug session. Nothing of the target is executed here.
    ///
    /// # Arguments
    ///
    /// * `locator`: debug server library locator
    /// * `connector`: session factory
    pub fn connect<C: Connector>(
        self,
        locator: &impl LibraryLocator,
        connector: &C,
    ) -> Result<Launch<Connected<C::Session>>, Error> {
        // directories and zip archives with `__main__.py` are runnable too
        if let TargetSpec::File(path) = &self.target.spec {
            if !path.exists() {
                return Err(Error::ScriptNotFound(path.clone()));
            }
        }

        let library = locator.locate(self.settings.pydevd_path.as_deref())?;
        cd_debug!("debug server library: {}", library.display());

        let port = self.endpoint()?;
        let options = ConnectOptions {
            host: self.settings.host.clone(),
            port,
            suspend: self.settings.suspend,
            stdout_to_server: self.settings.stdout_to_server,
            stderr_to_server: self.settings.stderr_to_server,
            library,
        };

        cd_info!("connect to debug server at {}:{}", options.host, options.port);
        let session = connector.connect(&options)?;

        Ok(Launch {
            settings: self.settings,
            target: self.target,
            state: Connected { session },
        })
    }

    /// Check that debug server address is usable, return the port.
    fn endpoint(&self) -> Result<u16, Error> {
        let host = &self.settings.host;
        let connection_err = |reason: String| Error::Connection {
            host: host.clone(),
            port: self.settings.port,
            reason,
        };

        let port = u16::try_from(self.settings.port)
            .ok()
            .filter(|port| *port != 0)
            .ok_or_else(|| connection_err("port must be in 1..=65535".to_string()))?;

        let mut addrs = (host.as_str(), port)
            .to_socket_addrs()
            .map_err(|e| connection_err(format!("cannot resolve host: {e}")))?;
        if addrs.next().is_none() {
            return Err(connection_err("host resolves to no address".to_string()));
        }
        Ok(port)
    }
}

impl<S: Session> Launch<Connected<S>> {
    /// Release the target.
    pub fn start(self) -> Result<Launch<Running<S::Running>>, Error> {
        cd_info!("run {}", self.target);
        // the target owns standard streams from now on
        crate::log::disable();
        let execution = self.state.session.start(&self.target)?;

        Ok(Launch {
            settings: self.settings,
            target: self.target,
            state: Running { execution },
        })
    }

    /// Run the target to completion.
    pub fn run(self) -> Result<Launch<Terminated>, Error> {
        self.start()?.wait()
    }
}

impl<E: Execution> Launch<Running<E>> {
    /// Wait until the target returns or raises.
    pub fn wait(self) -> Result<Launch<Terminated>, Error> {
        let exit_code = self.state.execution.wait()?;

        Ok(Launch {
            settings: self.settings,
            target: self.target,
            state: Terminated { exit_code },
        })
    }
}

impl Launch<Terminated> {
    /// Exit code of the target.
    pub fn exit_code(&self) -> i32 {
        self.state.exit_code
    }
}
