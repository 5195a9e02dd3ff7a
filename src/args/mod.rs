//! Command line of the launcher.
//!
//! Debugger options and the target share one flat token list. [`scan`] finds the boundary
//! between them, then the debugger part is handed to clap for typing, help and version output.

pub mod scan;

use crate::cd_warn;
use crate::config::SettingsLayer;
use crate::target::Target;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use once_cell::sync::Lazy;
use scan::Spellings;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("option `{0}` requires a value")]
    MissingValue(String),
    #[error("`{0}` requires {1}")]
    MissingTarget(&'static str, &'static str),
    #[error(
        "unrecognized debugger option `{0}` before `--`\n\
        Put the target after the separator, e.g. `charmd [OPTIONS] -- {0} ...`"
    )]
    UnknownBeforeSeparator(String),
    #[error(
        "no follow-on target provided\n\
        Examples:\n  \
        charmd -- -m mypkg.mymod arg1\n  \
        charmd -- script.py arg1 arg2\n  \
        charmd -- -c \"print('hello')\""
    )]
    NoTarget,
    #[error("argument is not valid unicode: {0:?}")]
    NotUnicode(OsString),
    #[error("{0}")]
    InvalidOption(String),
}

const USAGE: &str = "charmd [OPTIONS] [--] (-m <MODULE> | -c <CODE> | <FILE>) [ARGS]...";

const AFTER_HELP: &str = "\
Target:
  -m <MODULE> [ARGS]...  run library module as a script
  -c <CODE> [ARGS]...    run program passed in as string
  <FILE> [ARGS]...       run program read from script file

Debugger options end at the first unrecognized argument or at `--`, whichever comes first.
Everything after that belongs to the target, even if it looks like a debugger option.

Examples:
  charmd --host 127.0.0.1 --port 5678 -- -m mypkg.mymod arg1 arg2
  charmd -- script.py arg1 arg2
  charmd --suspend -c \"print('hello')\"";

/// Start PyCharm debugger via pydevd_pycharm.settrace then run a python target in the same
/// process.
#[derive(Parser, Debug, Default)]
#[command(
    name = "charmd",
    version,
    long_about = None,
    no_binary_name = true,
    args_override_self = true,
    override_usage = USAGE,
    after_help = AFTER_HELP,
)]
pub struct DebugOptions {
    /// PyCharm debug server host [default: localhost]
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// PyCharm debug server port [default: 5678]
    #[arg(long, value_name = "PORT")]
    pub port: Option<i64>,

    /// Suspend on start
    #[arg(long, overrides_with = "no_suspend")]
    pub suspend: bool,

    /// Do not suspend on start (default)
    #[arg(long, overrides_with = "suspend")]
    pub no_suspend: bool,

    /// Redirect stdout to debug server (default)
    #[arg(long, overrides_with = "no_stdout_to_server")]
    pub stdout_to_server: bool,

    /// Do not redirect stdout to debug server
    #[arg(long, overrides_with = "stdout_to_server")]
    pub no_stdout_to_server: bool,

    /// Redirect stderr to debug server (default)
    #[arg(long, overrides_with = "no_stderr_to_server")]
    pub stderr_to_server: bool,

    /// Do not redirect stderr to debug server
    #[arg(long, overrides_with = "stderr_to_server")]
    pub no_stderr_to_server: bool,

    /// Location of the pydevd_pycharm library (directory or egg), discovered when omitted
    #[arg(long, value_name = "PATH")]
    pub pydevd_path: Option<PathBuf>,

    /// Config file [default: $CHARMD_CONFIG or ./charmd.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write current settings into the config file and exit
    #[arg(long)]
    pub conf_init: bool,
}

fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl DebugOptions {
    /// Settings given on the command line.
    pub fn layer(&self) -> SettingsLayer {
        SettingsLayer {
            host: self.host.clone(),
            port: self.port,
            suspend: switch(self.suspend, self.no_suspend),
            stdout_to_server: switch(self.stdout_to_server, self.no_stdout_to_server),
            stderr_to_server: switch(self.stderr_to_server, self.no_stderr_to_server),
            pydevd_path: self.pydevd_path.clone(),
        }
    }
}

/// Every spelling clap knows for [`DebugOptions`], including help and version flags.
static SPELLINGS: Lazy<Spellings> = Lazy::new(|| {
    let mut cmd = DebugOptions::command();
    cmd.build();
    Spellings::from_command(&cmd)
});

/// What the launcher was asked to do.
#[derive(Debug, PartialEq)]
pub enum Mode {
    /// Store merged settings into the config file.
    ConfInit,
    /// Debug a target.
    Run(Target),
}

#[derive(Debug, PartialEq)]
pub struct Request {
    /// Command line settings layer.
    pub cli: SettingsLayer,
    /// Explicit config file location.
    pub config: Option<PathBuf>,
    pub mode: Mode,
}

#[derive(Debug, PartialEq)]
pub enum Invocation {
    Help(String),
    Version(String),
    Launch(Request),
}

/// Parse launcher arguments (without the program name).
pub fn parse<I, T>(tokens: I) -> Result<Invocation, UsageError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let tokens = tokens
        .into_iter()
        .map(|token| token.into().into_string().map_err(UsageError::NotUnicode))
        .collect::<Result<Vec<_>, _>>()?;

    let (split, dangling) = match scan::split(&SPELLINGS, &tokens) {
        Ok(split) => (split, None),
        // target flag without an operand is always the last token
        Err(err @ UsageError::MissingTarget(..)) => {
            let split = scan::split(&SPELLINGS, &tokens[..tokens.len() - 1])?;
            (split, Some(err))
        }
        Err(err) => return Err(err),
    };

    let options = match DebugOptions::try_parse_from(&split.options) {
        Ok(options) => options,
        Err(err) => {
            return match err.kind() {
                ErrorKind::DisplayHelp => Ok(Invocation::Help(err.to_string())),
                ErrorKind::DisplayVersion => Ok(Invocation::Version(err.to_string())),
                _ => Err(invalid_option(err)),
            }
        }
    };

    let mode = if options.conf_init {
        if let Some(target) = split.target {
            cd_warn!("--conf-init given, target `{target}` is ignored");
        }
        if let Some(err) = dangling {
            cd_warn!("--conf-init given, incomplete target is ignored: {err}");
        }
        Mode::ConfInit
    } else {
        if let Some(err) = dangling {
            return Err(err);
        }
        Mode::Run(split.target.ok_or(UsageError::NoTarget)?)
    };

    Ok(Invocation::Launch(Request {
        cli: options.layer(),
        config: options.config,
        mode,
    }))
}

fn invalid_option(err: clap::Error) -> UsageError {
    let rendered = err.to_string();
    let msg = rendered.strip_prefix("error: ").unwrap_or(&rendered);
    UsageError::InvalidOption(msg.trim_end().to_string())
}
