use std::io;
use std::process::{Child, Command};

/// Operating-system seam for starting child processes.
///
/// The runner prepares the `Command` (arguments, working directory, piped
/// streams) and hands it to a launcher. Tests substitute launchers that count
/// or refuse start attempts.
pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, command: &mut Command) -> io::Result<Child>;
}

/// Launches processes directly through `std::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, command: &mut Command) -> io::Result<Child> {
        command.spawn()
    }
}
