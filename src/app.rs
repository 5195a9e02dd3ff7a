use crate::args::{self, Invocation, Mode};
use crate::config::{ConfigFile, Settings};
use crate::error::Error;
use crate::launcher::library::PydevdLocator;
use crate::launcher::python::{Interpreter, PydevdConnector};
use crate::launcher::Launch;
use std::ffi::OsString;

/// Run the launcher with the given arguments (without the program name).
/// Return the process exit code.
pub fn run<I, T>(tokens: I) -> Result<i32, Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let request = match args::parse(tokens)? {
        Invocation::Help(text) | Invocation::Version(text) => {
            print!("{text}");
            return Ok(0);
        }
        Invocation::Launch(request) => request,
    };

    let file = ConfigFile::locate(request.config.as_deref());
    let settings = Settings::resolve(file.load()?, request.cli);

    match request.mode {
        Mode::ConfInit => {
            file.store(&settings)?;
            println!("settings written to {}", file.path().display());
            Ok(0)
        }
        Mode::Run(target) => {
            let interpreter = Interpreter::discover()?;
            let locator = PydevdLocator::new(interpreter.clone());
            let connector = PydevdConnector::new(interpreter);

            let terminated = Launch::new(settings, target)
                .connect(&locator, &connector)?
                .run()?;
            Ok(terminated.exit_code())
        }
    }
}
