use std::fmt;
use std::io::{self, Read};

use anyhow::{Context, Result};
use cfg_if::cfg_if;
use portable_pty::{native_pty_system, CommandBuilder, PtySize};

use crate::config::ReadupConfig;
use crate::utils::{grey_format, strip_carriage_returns};

const READ_CHUNK: usize = 1024;

/// A program and its arguments, run without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub program: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn new<S: Into<String>>(program: S, args: impl IntoIterator<Item = S>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

pub trait CommandRunner {
    /// Runs `command` to completion and returns everything it printed.
    /// A command exiting with a failure status is not an error.
    fn run(&self, command: &Command, verbose: bool) -> Result<String>;
}

/// Runs commands attached to a pseudo-terminal so that tools which
/// check `isatty` print what a user would see.
pub struct PtyRunner {
    pub size: PtySize,
}

impl PtyRunner {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self {
            size: PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            },
        }
    }

    pub fn from_config(config: &ReadupConfig) -> Self {
        Self::new(config.rows, config.cols)
    }

    fn capture(&self, command: &Command) -> Result<String> {
        let pair = native_pty_system()
            .openpty(self.size)
            .with_context(|| "Fail to allocate a pseudo-terminal")?;

        let mut builder = CommandBuilder::new(&command.program);
        builder.args(&command.args);
        if let Some(path) = std::env::var_os("PATH") {
            builder.env("PATH", path);
        }
        if let Ok(cwd) = std::env::current_dir() {
            builder.cwd(cwd);
        }

        log::debug!("spawning `{command}` on a {}x{} pty", self.size.rows, self.size.cols);
        let mut child = pair
            .slave
            .spawn_command(builder)
            .with_context(|| format!("Fail to run `{command}`"))?;
        // The master only reports end-of-data once every slave handle is closed.
        drop(pair.slave);

        let mut reader = pair
            .master
            .try_clone_reader()
            .with_context(|| "Fail to read from the pseudo-terminal")?;

        let mut out = Vec::new();
        let mut buf = [0u8; READ_CHUNK];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => out.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if is_end_of_data(&e) => break,
                Err(e) => {
                    return Err(e).with_context(|| format!("Fail to read output of `{command}`"))
                }
            }
        }

        match child.wait() {
            Ok(status) => log::debug!("`{command}` exited with code {}", status.exit_code()),
            Err(e) => log::debug!("could not reap `{command}`: {e}"),
        }

        Ok(strip_carriage_returns(String::from_utf8_lossy(&out)))
    }
}

impl Default for PtyRunner {
    fn default() -> Self {
        Self::from_config(&ReadupConfig::default())
    }
}

impl CommandRunner for PtyRunner {
    fn run(&self, command: &Command, verbose: bool) -> Result<String> {
        if verbose {
            println!("Running: {command}");
        }

        let output = self.capture(command)?;

        if verbose {
            print!("Output:\n{}", grey_format(&output));
        }
        Ok(output)
    }
}

// Linux reports EIO on the master once the child side has hung up
// instead of returning a zero-length read.
cfg_if! {
    if #[cfg(unix)] {
        const EIO: i32 = 5;

        fn is_end_of_data(e: &io::Error) -> bool {
            e.raw_os_error() == Some(EIO)
        }
    } else {
        fn is_end_of_data(e: &io::Error) -> bool {
            matches!(e.kind(), io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof)
        }
    }
}
