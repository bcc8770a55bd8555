use std::borrow::Cow;

const GREY: &str = "\x1b[90m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

// A pty translates every "\n" the child writes into "\r\n", and
// progress bars redraw with bare "\r". Neither belongs in a document,
// so every carriage return is dropped.
pub fn strip_carriage_returns(str: Cow<'_, str>) -> String {
    match str.contains('\r') {
        true => str.replace('\r', ""),
        false => str.into_owned(),
    }
}

/// Indents every non-empty line by two spaces and dims it.
pub fn grey_format(str: &str) -> String {
    str.split('\n')
        .map(|line| match line.is_empty() {
            true => String::new(),
            false => format!("  {GREY}{line}{RESET}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Colors removed lines red and added lines green. Both the normal
/// (`<`/`>`) and the unified (`-`/`+`) diff markers are recognized.
pub fn diff_format(str: &str) -> String {
    str.split('\n')
        .map(|line| {
            if line.starts_with('<') || line.starts_with('-') {
                format!("{RED}{line}{RESET}")
            } else if line.starts_with('>') || line.starts_with('+') {
                format!("{GREEN}{line}{RESET}")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
