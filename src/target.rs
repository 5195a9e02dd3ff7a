use std::fmt;
use std::path::PathBuf;
use strum_macros::{Display, IntoStaticStr};

/// Flag introducing a module target (`-m pkg.mod`).
pub const MODULE_FLAG: &str = "-m";
/// Flag introducing an inline code target (`-c "print(1)"`).
pub const COMMAND_FLAG: &str = "-c";

/// Kind of target, as understood by the interpreter bootstrap.
#[derive(Copy, Clone, PartialEq, Debug, Display, IntoStaticStr)]
pub enum TargetKind {
    #[strum(serialize = "module")]
    Module,
    #[strum(serialize = "command")]
    Command,
    #[strum(serialize = "file")]
    File,
}

/// What to execute.
#[derive(Clone, PartialEq, Debug)]
pub enum TargetSpec {
    Module(String),
    Command(String),
    File(PathBuf),
}

impl TargetSpec {
    pub fn kind(&self) -> TargetKind {
        match self {
            TargetSpec::Module(_) => TargetKind::Module,
            TargetSpec::Command(_) => TargetKind::Command,
            TargetSpec::File(_) => TargetKind::File,
        }
    }

    /// Module name, code or path, depending on the kind.
    pub fn value(&self) -> String {
        match self {
            TargetSpec::Module(name) => name.clone(),
            TargetSpec::Command(code) => code.clone(),
            TargetSpec::File(path) => path.to_string_lossy().to_string(),
        }
    }
}

/// Target specification with the arguments that belong to it.
#[derive(Clone, PartialEq, Debug)]
pub struct Target {
    pub spec: TargetSpec,
    pub args: Vec<String>,
}

impl Target {
    pub fn new<ARGS: IntoIterator<Item = I>, I: Into<String>>(spec: TargetSpec, args: ARGS) -> Self {
        Self {
            spec,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The argument vector the target observes (`sys.argv`).
    pub fn argv(&self) -> Vec<String> {
        let first = match &self.spec {
            TargetSpec::Module(name) => name.clone(),
            TargetSpec::Command(_) => COMMAND_FLAG.to_string(),
            TargetSpec::File(path) => path.to_string_lossy().to_string(),
        };
        std::iter::once(first).chain(self.args.iter().cloned()).collect()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.spec {
            TargetSpec::Module(name) => write!(f, "{MODULE_FLAG} {name}")?,
            TargetSpec::Command(_) => write!(f, "{COMMAND_FLAG} <code>")?,
            TargetSpec::File(path) => write!(f, "{}", path.display())?,
        }
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
