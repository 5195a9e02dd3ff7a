use crate::error::Error;
use crate::launcher::python::Interpreter;
use crate::launcher::LibraryLocator;
use crate::{cd_debug, muted_error};
use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Importable name of the debug server library.
pub const MODULE: &str = "pydevd_pycharm";
/// File name of the library egg shipped with PyCharm.
pub const EGG: &str = "pydevd-pycharm.egg";

const ARCHIVE_EXTENSIONS: [&str; 3] = ["egg", "zip", "whl"];
const SEARCH_DEPTH: usize = 6;

/// Prints the import path entry which provides the library, or nothing.
const FIND_SPEC: &str = "\
import importlib.util, os
spec = importlib.util.find_spec('pydevd_pycharm')
if spec is not None and spec.origin:
    path = os.path.dirname(spec.origin)
    print(os.path.dirname(path) if spec.submodule_search_locations else path)
";

/// Return true if `path` can be put on the import path to make the library importable.
pub fn is_library(path: &Path) -> bool {
    if path.is_dir() {
        return path.join(format!("{MODULE}.py")).is_file()
            || path.join(MODULE).join("__init__.py").is_file();
    }
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ARCHIVE_EXTENSIONS.contains(&ext))
}

/// Locate `pydevd_pycharm`: interpreter import path first, then PyCharm installations.
pub struct PydevdLocator {
    interpreter: Interpreter,
    roots: Vec<PathBuf>,
}

impl PydevdLocator {
    pub fn new(interpreter: Interpreter) -> Self {
        Self::with_roots(interpreter, default_roots())
    }

    /// Create locator that searches for PyCharm eggs in `roots`.
    pub fn with_roots(interpreter: Interpreter, roots: Vec<PathBuf>) -> Self {
        Self { interpreter, roots }
    }

    fn importable_from(&self) -> anyhow::Result<PathBuf> {
        let out = self
            .interpreter
            .command()
            .args(["-c", FIND_SPEC])
            .output()
            .with_context(|| format!("run {}", self.interpreter.program().display()))?;
        if !out.status.success() {
            bail!("find_spec query failed: {}", out.status);
        }

        let stdout = String::from_utf8(out.stdout)?;
        let path = stdout.trim();
        if path.is_empty() {
            bail!("{MODULE} is not importable by {}", self.interpreter.program().display());
        }
        Ok(PathBuf::from(path))
    }
}

impl LibraryLocator for PydevdLocator {
    fn locate(&self, explicit: Option<&Path>) -> Result<PathBuf, Error> {
        if let Some(path) = explicit {
            return if is_library(path) {
                Ok(path.to_path_buf())
            } else {
                Err(Error::LibraryNotFound {
                    searched: vec![path.to_path_buf()],
                })
            };
        }

        let mut searched = vec![self.interpreter.program().to_path_buf()];
        if let Some(path) = muted_error!(self.importable_from()) {
            return Ok(path);
        }

        for root in &self.roots {
            searched.push(root.clone());
            if let Some(egg) = find_egg(root) {
                return Ok(egg);
            }
        }

        Err(Error::LibraryNotFound { searched })
    }
}

fn find_egg(root: &Path) -> Option<PathBuf> {
    if !root.is_dir() {
        return None;
    }
    cd_debug!("search {EGG} in {}", root.display());

    WalkDir::new(root)
        .max_depth(SEARCH_DEPTH)
        .into_iter()
        .filter_map(|entry| muted_error!(entry))
        .find(|entry| entry.file_type().is_file() && entry.file_name() == EGG)
        .map(|entry| entry.into_path())
}

/// Usual PyCharm install locations.
fn default_roots() -> Vec<PathBuf> {
    let mut roots = vec![];
    if let Some(home) = home::home_dir() {
        roots.push(home.join(".local/share/JetBrains"));
        roots.push(home.join("Applications"));
    }
    roots.extend(
        [
            "/opt",
            "/snap/pycharm-professional/current",
            "/snap/pycharm-community/current",
            "/Applications",
        ]
        .map(PathBuf::from),
    );
    roots
}
