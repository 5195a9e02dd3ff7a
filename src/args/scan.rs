//! Token scanner that finds the single boundary between debugger options and the target.
//!
//! The scanner is a three state machine:
//!
//! ```text
//! ScanningOptions --(first unknown token | "--")--> AtBoundary --(target selected)--> ConsumingTarget
//! ```
//!
//! There are no transitions back, so a token consumed as part of the target is never looked up
//! as a debugger option again.

use crate::args::UsageError;
use crate::target::{Target, TargetSpec, COMMAND_FLAG, MODULE_FLAG};
use std::collections::HashMap;
use std::path::PathBuf;

/// Explicit separator between debugger options and the target.
pub const SEPARATOR: &str = "--";

/// How many tokens a debugger option occupies.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Arity {
    /// Option stands alone (`--suspend`).
    Flag,
    /// Option takes exactly one following token (`--port 5678`).
    Value,
}

/// How a token matched a known spelling.
#[derive(Copy, Clone, PartialEq, Debug)]
enum OptionMatch {
    Flag,
    Value,
    /// `--name=value` form of a value option.
    Inline,
}

/// Set of known debugger option spellings.
#[derive(Debug, Default)]
pub struct Spellings {
    known: HashMap<String, Arity>,
}

impl Spellings {
    pub fn new<S: Into<String>>(spellings: impl IntoIterator<Item = (S, Arity)>) -> Self {
        Self {
            known: spellings
                .into_iter()
                .map(|(spelling, arity)| (spelling.into(), arity))
                .collect(),
        }
    }

    /// Collect spellings of every named argument in a built clap command.
    pub fn from_command(cmd: &clap::Command) -> Self {
        let mut known = HashMap::new();
        for arg in cmd.get_arguments().filter(|arg| !arg.is_positional()) {
            let arity = if arg.get_action().takes_values() {
                Arity::Value
            } else {
                Arity::Flag
            };
            if let Some(long) = arg.get_long() {
                known.insert(format!("--{long}"), arity);
            }
            if let Some(short) = arg.get_short() {
                known.insert(format!("-{short}"), arity);
            }
        }
        Self { known }
    }

    pub fn arity(&self, spelling: &str) -> Option<Arity> {
        self.known.get(spelling).copied()
    }

    fn lookup(&self, token: &str) -> Option<OptionMatch> {
        match self.arity(token) {
            Some(Arity::Flag) => Some(OptionMatch::Flag),
            Some(Arity::Value) => Some(OptionMatch::Value),
            None => {
                let (name, _) = token.split_once('=')?;
                (name.starts_with("--") && self.arity(name) == Some(Arity::Value))
                    .then_some(OptionMatch::Inline)
            }
        }
    }
}

/// Result of a scan.
#[derive(Debug, PartialEq)]
pub struct Split {
    /// Debugger options, value options are normalized into the `--name=value` form.
    pub options: Vec<String>,
    /// Target, if any tokens remain after the options.
    pub target: Option<Target>,
    /// True if the boundary was set by an explicit separator.
    pub separated: bool,
}

enum State {
    ScanningOptions,
    AtBoundary,
    ConsumingTarget(TargetSpec),
}

/// Split raw tokens into debugger options and a target.
pub fn split(spellings: &Spellings, tokens: &[String]) -> Result<Split, UsageError> {
    let mut options = vec![];
    let mut separated = false;
    let mut cursor = 0;
    let mut state = State::ScanningOptions;

    loop {
        state = match state {
            State::ScanningOptions => {
                let Some(token) = tokens.get(cursor) else {
                    return Ok(Split {
                        options,
                        target: None,
                        separated,
                    });
                };

                if token == SEPARATOR {
                    cursor += 1;
                    separated = true;
                    State::AtBoundary
                } else {
                    match spellings.lookup(token) {
                        Some(OptionMatch::Flag) | Some(OptionMatch::Inline) => {
                            options.push(token.clone());
                            cursor += 1;
                            State::ScanningOptions
                        }
                        Some(OptionMatch::Value) => {
                            let value = tokens
                                .get(cursor + 1)
                                .ok_or_else(|| UsageError::MissingValue(token.clone()))?;
                            options.push(format!("{token}={value}"));
                            cursor += 2;
                            State::ScanningOptions
                        }
                        None => {
                            // a separator further on governs the split
                            if tokens[cursor + 1..].iter().any(|t| t == SEPARATOR) {
                                return Err(UsageError::UnknownBeforeSeparator(token.clone()));
                            }
                            State::AtBoundary
                        }
                    }
                }
            }
            State::AtBoundary => {
                let Some(token) = tokens.get(cursor) else {
                    return Ok(Split {
                        options,
                        target: None,
                        separated,
                    });
                };
                cursor += 1;

                let spec = match token.as_str() {
                    MODULE_FLAG => {
                        let name = tokens
                            .get(cursor)
                            .ok_or(UsageError::MissingTarget(MODULE_FLAG, "a module name"))?;
                        cursor += 1;
                        TargetSpec::Module(name.clone())
                    }
                    COMMAND_FLAG => {
                        let code = tokens
                            .get(cursor)
                            .ok_or(UsageError::MissingTarget(COMMAND_FLAG, "a code string"))?;
                        cursor += 1;
                        TargetSpec::Command(code.clone())
                    }
                    attached if attached.starts_with(MODULE_FLAG) => {
                        TargetSpec::Module(attached[MODULE_FLAG.len()..].to_string())
                    }
                    attached if attached.starts_with(COMMAND_FLAG) => {
                        TargetSpec::Command(attached[COMMAND_FLAG.len()..].to_string())
                    }
                    path => TargetSpec::File(PathBuf::from(path)),
                };
                State::ConsumingTarget(spec)
            }
            State::ConsumingTarget(spec) => {
                let target = Target::new(spec, tokens[cursor..].iter().cloned());
                return Ok(Split {
                    options,
                    target: Some(target),
                    separated,
                });
            }
        }
    }
}
