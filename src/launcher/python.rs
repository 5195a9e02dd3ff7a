//! Python interpreter that hosts the debug session and the target.
//!
//! The interpreter is started with a small bootstrap program. Bootstrap reports the result of
//! the `settrace` handshake through a private status pipe and then waits on a private control
//! pipe until the launcher sends the target. Both pipes are passed to the interpreter as
//! inherited file descriptors, so the target's standard streams stay untouched.

use crate::error::Error;
use crate::launcher::{ConnectOptions, Connector, Execution, Session};
use crate::target::Target;
use crate::{cd_debug, muted_error, weak_error};
use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use nix::sys::signal::{signal, SigHandler, Signal};
use os_pipe::{PipeReader, PipeWriter};
use std::io::{BufRead, BufReader, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};

const BOOTSTRAP: &str = include_str!("bootstrap.py");

/// Python interpreter executable.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpreter {
    program: PathBuf,
}

impl Interpreter {
    /// Environment variable with the interpreter to use.
    pub const PATH_ENV: &'static str = "CHARMD_PYTHON";
    const CANDIDATES: [&'static str; 2] = ["python3", "python"];

    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Find an interpreter: [`Self::PATH_ENV`] if set, `python3` or `python` from `PATH` otherwise.
    pub fn discover() -> Result<Self, Error> {
        if let Some(program) = std::env::var_os(Self::PATH_ENV).filter(|p| !p.is_empty()) {
            return which::which(&program).map(Self::new).map_err(|_| {
                Error::InterpreterNotFound(vec![program.to_string_lossy().to_string()])
            });
        }

        Self::CANDIDATES
            .iter()
            .find_map(|name| muted_error!(which::which(name)))
            .map(Self::new)
            .ok_or_else(|| {
                Error::InterpreterNotFound(Self::CANDIDATES.map(ToString::to_string).to_vec())
            })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub(super) fn command(&self) -> Command {
        Command::new(&self.program)
    }
}

/// Opens sessions with `pydevd_pycharm.settrace` inside a fresh interpreter.
pub struct PydevdConnector {
    interpreter: Interpreter,
}

impl PydevdConnector {
    pub fn new(interpreter: Interpreter) -> Self {
        Self { interpreter }
    }
}

fn switch(flag: bool) -> &'static str {
    if flag {
        "1"
    } else {
        "0"
    }
}

/// Let the file descriptor survive `exec`.
fn inherit(fd: RawFd) -> std::io::Result<()> {
    fcntl(fd, FcntlArg::F_SETFD(FdFlag::empty()))?;
    Ok(())
}

impl Connector for PydevdConnector {
    type Session = PydevdSession;

    fn connect(&self, options: &ConnectOptions) -> Result<Self::Session, Error> {
        let (status_reader, status_writer) = os_pipe::pipe()?;
        let (control_reader, control_writer) = os_pipe::pipe()?;
        let status_fd = status_writer.as_raw_fd();
        let control_fd = control_reader.as_raw_fd();

        let mut cmd = self.interpreter.command();
        cmd.arg("-c")
            .arg(BOOTSTRAP)
            .arg(status_fd.to_string())
            .arg(control_fd.to_string())
            .arg(&options.library)
            .arg(&options.host)
            .arg(options.port.to_string())
            .arg(switch(options.suspend))
            .arg(switch(options.stdout_to_server))
            .arg(switch(options.stderr_to_server));

        unsafe {
            cmd.pre_exec(move || {
                inherit(status_fd)?;
                inherit(control_fd)?;
                Ok(())
            });
        }

        let child = cmd.spawn()?;
        cd_debug!("bootstrap interpreter started, pid {}", child.id());

        // only the interpreter keeps its ends of the pipes, so EOF means it is gone
        drop(status_writer);
        drop(control_reader);

        Handshake {
            child,
            status: status_reader,
            control: control_writer,
        }
        .complete(options)
    }
}

struct Handshake {
    child: Child,
    status: PipeReader,
    control: PipeWriter,
}

impl Handshake {
    fn complete(mut self, options: &ConnectOptions) -> Result<PydevdSession, Error> {
        let mut line = String::new();
        BufReader::new(&self.status).read_line(&mut line)?;
        let line = line.trim_end();
        let (status, details) = line.split_once(' ').unwrap_or((line, ""));

        let connection_err = |reason: String| Error::Connection {
            host: options.host.clone(),
            port: options.port as i64,
            reason,
        };

        match status {
            "ready" => Ok(PydevdSession {
                child: self.child,
                control: self.control,
            }),
            "library" => {
                cd_debug!("import pydevd_pycharm: {details}");
                self.reap();
                Err(Error::LibraryNotFound {
                    searched: vec![options.library.clone()],
                })
            }
            "connect" => {
                self.reap();
                Err(connection_err(details.to_string()))
            }
            _ => {
                let exit = self.reap();
                Err(connection_err(format!(
                    "debug bootstrap exited before handshake ({})",
                    exit.map(|s| s.to_string())
                        .unwrap_or_else(|| "unknown status".to_string())
                )))
            }
        }
    }

    fn reap(&mut self) -> Option<ExitStatus> {
        weak_error!(self.child.wait(), "wait bootstrap interpreter:")
    }
}

/// Debug session living in a bootstrap interpreter process.
pub struct PydevdSession {
    child: Child,
    control: PipeWriter,
}

/// Encode target for the bootstrap: kind, value and `sys.argv`, separated by NUL.
fn encode(target: &Target) -> Vec<u8> {
    let kind: &'static str = target.spec.kind().into();
    let mut fields = vec![kind.to_string(), target.spec.value()];
    fields.extend(target.argv());
    fields.join("\0").into_bytes()
}

/// Exit code of a finished process, `128 + signal` for killed ones.
fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .unwrap_or_else(|| 128 + status.signal().unwrap_or_default())
}

/// Target running in the bootstrap interpreter.
pub struct PydevdExecution {
    child: Child,
}

impl Session for PydevdSession {
    type Running = PydevdExecution;

    fn start(self, target: &Target) -> Result<Self::Running, Error> {
        let PydevdSession { child, mut control } = self;

        // terminal interrupts go to the target, it decides how to finish
        weak_error!(
            unsafe { signal(Signal::SIGINT, SigHandler::SigIgn) },
            "ignore SIGINT:"
        );

        control.write_all(&encode(target))?;
        drop(control);

        Ok(PydevdExecution { child })
    }
}

impl Execution for PydevdExecution {
    fn wait(mut self) -> Result<i32, Error> {
        let status = self.child.wait()?;
        Ok(exit_code(status))
    }
}
