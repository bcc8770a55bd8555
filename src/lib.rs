//! Keep the code blocks of a README in sync with the commands they document.
//!
//! # Getting started
//!
//! ```sh
//! cargo install readup
//! readup            # updates ./README.md
//! readup docs/cli.md
//! ```
//!
//! # How to
//!
//! Start the first line inside a fenced code block with `> ` followed by a
//! command:
//!
//! ````markdown
//! # Usage
//!
//! ```console
//! > mytool --help
//! ```
//! ````
//!
//! `readup` runs `mytool --help` on a pseudo-terminal, so the output looks
//! exactly as it would in a terminal, and proposes the new document:
//!
//! ````markdown
//! # Usage
//!
//! ```console
//! Usage: mytool [OPTIONS]
//! ...
//! ```
//! ````
//!
//! The proposed change is shown as a colored diff and only written after
//! answering `y` to the `Update file? [y/N]` prompt.
//!
//! # Details
//!
//! - The directive is split on whitespace: the first word is the program,
//!   the rest are its arguments. There is no shell, so no quoting, pipes or
//!   globbing.
//! - Everything the command prints replaces the block body, including error
//!   output. A command that exits with a failure status does not stop the
//!   run.
//! - Carriage returns are removed from the captured output.
//! - Blocks without a directive, and a trailing block that is never closed,
//!   are left as they are.
//!
//! # Configuration
//!
//! An optional `readup.toml` in the working directory:
//!
//! ```toml
//! verbose = true          # echo commands and their output while scanning
//! rows = 40               # pseudo-terminal size
//! cols = 80
//! diff = ["diff", "-u"]   # the original and the proposed file are appended
//! ```
pub mod config;
pub mod review;
pub mod runner;
pub mod scanner;
mod utils;

pub use config::ReadupConfig;
pub use review::{Outcome, Review};
pub use runner::{Command, CommandRunner, PtyRunner};
pub use scanner::Scanner;
