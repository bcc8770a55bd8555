use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;

use crate::runner::{Command, CommandRunner};

pub const FENCE: &str = "```";

lazy_static! {
    static ref DIRECTIVE: Regex =
        Regex::new(r"^> (.*?)\r?$").expect("Failed to init regex for finding directive pattern");
}

pub fn is_fence(line: &str) -> bool {
    line.starts_with(FENCE)
}

/// Parses the `> program args...` directive. Returns `None` for any line
/// that is not a directive and `Some(Err(..))` for a directive naming no
/// program.
pub fn parse_directive(line: &str) -> Option<Result<Command>> {
    let caps = DIRECTIVE.captures(line)?;
    let mut words = caps[1].split_whitespace();
    Some(match words.next() {
        Some(program) => Ok(Command::new(program, words)),
        None => Err(anyhow::anyhow!("Directive `{}` names no command", line.trim_end())),
    })
}

/// A fenced block, from its opening fence up to and including its closing
/// fence once one has been seen.
#[derive(Debug)]
pub struct CodeBlock {
    /// Index of the opening fence in the output buffer.
    pub start: usize,
    pub lines: Vec<String>,
}

impl CodeBlock {
    fn open(start: usize, fence: &str) -> Self {
        Self {
            start,
            lines: vec![fence.to_string()],
        }
    }

    /// The command of an eligible block. A block with no inner lines is
    /// never eligible.
    pub fn command(&self) -> Option<Result<Command>> {
        match self.lines.as_slice() {
            [_, first, _, ..] => parse_directive(first),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum ScanState {
    Outside,
    InsideBlock(CodeBlock),
}

pub struct Scanner<'a, R: CommandRunner> {
    runner: &'a R,
    verbose: bool,
}

impl<'a, R: CommandRunner> Scanner<'a, R> {
    pub fn new(runner: &'a R, verbose: bool) -> Self {
        Self { runner, verbose }
    }

    pub fn scan_file(&self, path: &Path) -> Result<String> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        self.scan_str(&content)
            .with_context(|| format!("Could not update {}", path.display()))
    }

    pub fn scan_str(&self, content: &str) -> Result<String> {
        let trailing_newline = content.ends_with('\n');
        let body = content.strip_suffix('\n').unwrap_or(content);

        let mut out: Vec<String> = Vec::new();
        let mut state = ScanState::Outside;

        if !content.is_empty() {
            for line in body.split('\n') {
                out.push(line.to_string());
                state = match state {
                    ScanState::Outside if is_fence(line) => {
                        ScanState::InsideBlock(CodeBlock::open(out.len() - 1, line))
                    }
                    ScanState::Outside => ScanState::Outside,
                    ScanState::InsideBlock(mut block) => {
                        block.lines.push(line.to_string());
                        if is_fence(line) {
                            self.close(block, &mut out)?;
                            ScanState::Outside
                        } else {
                            ScanState::InsideBlock(block)
                        }
                    }
                };
            }
        }

        if let ScanState::InsideBlock(block) = state {
            log::warn!(
                "code block opened on line {} is never closed, leaving it untouched",
                block.start + 1
            );
        }

        let mut result = out.join("\n");
        if trailing_newline {
            result.push('\n');
        }
        Ok(result)
    }

    fn close(&self, block: CodeBlock, out: &mut Vec<String>) -> Result<()> {
        let command = match block.command() {
            None => return Ok(()),
            Some(Err(e)) => bail!("{e} (line {})", block.start + 2),
            Some(Ok(command)) => command,
        };

        let output = self.runner.run(&command, self.verbose)?;

        out.truncate(block.start + 1);
        // The output's final newline terminates its last line.
        let output = output.strip_suffix('\n').unwrap_or(&output);
        if !output.is_empty() {
            out.push(output.to_string());
        }
        out.push(FENCE.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use anyhow::{bail, Result};

    use super::{parse_directive, Scanner};
    use crate::runner::{Command, CommandRunner};

    /// Answers `echo` like the real program and records every call.
    #[derive(Default)]
    struct EchoRunner {
        calls: RefCell<Vec<Command>>,
    }

    impl CommandRunner for EchoRunner {
        fn run(&self, command: &Command, _verbose: bool) -> Result<String> {
            self.calls.borrow_mut().push(command.clone());
            match command.program.as_str() {
                "echo" => Ok(format!("{}\n", command.args.join(" "))),
                "true" => Ok(String::new()),
                "false" => Ok("something went wrong\n".into()),
                other => bail!("Fail to run `{other}`"),
            }
        }
    }

    fn scan(content: &str) -> String {
        Scanner::new(&EchoRunner::default(), false)
            .scan_str(content)
            .unwrap()
    }

    #[test]
    pub fn test_parse_directive() {
        let command = parse_directive("> echo hello world").unwrap().unwrap();
        assert_eq!(command, Command::new("echo", ["hello", "world"]));
        assert_eq!(
            parse_directive("> ls  -l\r").unwrap().unwrap(),
            Command::new("ls", ["-l"])
        );
        assert!(parse_directive(">echo hi").is_none());
        assert!(parse_directive("echo hi").is_none());
        assert!(parse_directive("> ").unwrap().is_err());
    }

    #[test]
    pub fn test_splice_replaces_body() {
        let input = "```\n> echo hi\nstale output\n```";
        assert_eq!(scan(input), "```\nhi\n```");
    }

    #[test]
    pub fn test_splice_keeps_surroundings_and_fence_tag() {
        let input = "# Title\n\n```console\n> echo a b\nold\nolder\n```\n\nfooter\n";
        assert_eq!(scan(input), "# Title\n\n```console\na b\n```\n\nfooter\n");
    }

    #[test]
    pub fn test_empty_output() {
        assert_eq!(scan("```\n> true\nleftover\n```\n"), "```\n```\n");
    }

    #[test]
    pub fn test_failing_command_output_is_kept() {
        assert_eq!(
            scan("```\n> false\n```\n"),
            "```\nsomething went wrong\n```\n"
        );
    }

    #[test]
    pub fn test_non_eligible_blocks_untouched() {
        let input = "```rust\nfn main() {}\n```\n\n```\n>not a directive\n```\n\n```\n```\n";
        assert_eq!(scan(input), input);
    }

    #[test]
    pub fn test_round_trip_without_directives() {
        for input in ["", "\n", "plain", "a\r\nb\r\n", "```\ncode\n```", "x\n\n\n"] {
            assert_eq!(scan(input), input);
        }
    }

    #[test]
    pub fn test_unterminated_block_left_alone() {
        let runner = EchoRunner::default();
        let input = "intro\n```\n> echo never\n";
        let output = Scanner::new(&runner, false).scan_str(input).unwrap();
        assert_eq!(output, input);
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    pub fn test_multiple_blocks_run_in_order() {
        let runner = EchoRunner::default();
        let input = "```\n> echo one\n```\ntext\n```\n> echo two\nx\n```\n";
        let output = Scanner::new(&runner, false).scan_str(input).unwrap();
        assert_eq!(output, "```\none\n```\ntext\n```\ntwo\n```\n");
        assert_eq!(
            *runner.calls.borrow(),
            vec![Command::new("echo", ["one"]), Command::new("echo", ["two"])]
        );
    }

    #[test]
    pub fn test_idempotent() {
        let once = scan("```\n> echo hi\n```\n");
        assert_eq!(scan(&once), once);
    }

    #[test]
    pub fn test_runner_failure_aborts() {
        let runner = EchoRunner::default();
        let scanner = Scanner::new(&runner, false);
        let err = scanner.scan_str("```\n> missing-tool\n```\n").unwrap_err();
        assert!(err.to_string().contains("missing-tool"));
    }

    #[test]
    pub fn test_empty_directive_fails() {
        let runner = EchoRunner::default();
        let scanner = Scanner::new(&runner, false);
        let err = scanner.scan_str("text\n```\n> \n```\n").unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }
}
