use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::{Command as Process, Stdio};

use anyhow::{bail, Context, Result};
use tempfile::{Builder, NamedTempFile};

use crate::config::ReadupConfig;
use crate::runner::{Command, CommandRunner};
use crate::scanner::Scanner;
use crate::utils::diff_format;

const SCRATCH_PREFIX: &str = "readup";
const COPY_COMMAND: &str = "cp";

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Every block already matched its command output.
    UpToDate,
    Declined,
    Applied { scratch: PathBuf },
}

/// Scan, stage, diff, confirm and apply, in that order.
pub struct Review<'a, R: CommandRunner> {
    runner: &'a R,
    config: &'a ReadupConfig,
}

impl<'a, R: CommandRunner> Review<'a, R> {
    pub fn new(runner: &'a R, config: &'a ReadupConfig) -> Self {
        Self { runner, config }
    }

    pub fn run<I: BufRead, O: Write>(&self, path: &Path, input: I, mut output: O) -> Result<Outcome> {
        let original = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let scanned = Scanner::new(self.runner, self.config.verbose)
            .scan_str(&original)
            .with_context(|| format!("Could not update {}", path.display()))?;

        if original == scanned {
            writeln!(output, "{} is up to date", path.display())?;
            return Ok(Outcome::UpToDate);
        }

        let scratch = stage(&scanned)?;
        let diff = self.diff(path, scratch.path())?;
        writeln!(output, "{}", diff_format(&diff))?;

        if !confirm(input, &mut output)? {
            log::debug!("update declined, discarding {}", scratch.path().display());
            return Ok(Outcome::Declined);
        }

        let applied = scratch.path().to_path_buf();
        apply(scratch, path)?;
        Ok(Outcome::Applied { scratch: applied })
    }

    fn diff(&self, original: &Path, scratch: &Path) -> Result<String> {
        let (program, args) = match self.config.diff.split_first() {
            Some(split) => split,
            None => bail!("The diff command in the configuration is empty"),
        };
        let mut command = Command::new(program.clone(), args.iter().cloned());
        command.args.push(original.display().to_string());
        command.args.push(scratch.display().to_string());
        self.runner.run(&command, false)
    }
}

/// Writes the proposed document to a fresh temporary file. The file is
/// removed when the returned handle is dropped.
pub fn stage(content: &str) -> Result<NamedTempFile> {
    let mut scratch = Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempfile()
        .with_context(|| "Could not create a scratch file")?;
    scratch
        .write_all(content.as_bytes())
        .and_then(|_| scratch.flush())
        .with_context(|| format!("Could not write {}", scratch.path().display()))?;
    log::debug!("staged update in {}", scratch.path().display());
    Ok(scratch)
}

/// Asks once. Only `y` or `Y`, surrounding whitespace ignored, accepts.
pub fn confirm<I: BufRead, O: Write>(mut input: I, mut output: O) -> Result<bool> {
    write!(output, "Update file? [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .with_context(|| "Could not read the answer")?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

/// Copies the scratch file over `target` and deletes it. A failed delete
/// is reported even though the copy already happened.
pub fn apply(scratch: NamedTempFile, target: &Path) -> Result<()> {
    let status = Process::new(COPY_COMMAND)
        .arg(scratch.path())
        .arg(target)
        .stdin(Stdio::null())
        .status()
        .with_context(|| format!("Fail to run {COPY_COMMAND}"))?;
    if !status.success() {
        bail!(
            "Could not copy {} to {} ({status})",
            scratch.path().display(),
            target.display()
        );
    }
    log::debug!("copied {} to {}", scratch.path().display(), target.display());

    let path = scratch.path().to_path_buf();
    scratch
        .close()
        .with_context(|| format!("Could not remove {}", path.display()))
}
