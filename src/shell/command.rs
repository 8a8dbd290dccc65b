use crate::error::{AxviewError, Result};

/// One line typed at the shell prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Click(usize),
    Focus(usize),
    Type { index: usize, text: String },
    Select { index: usize, start: usize, end: usize },
    Go(String),
    Back,
    Forward,
    Key(String),
    /// Send Enter to the page.
    Enter,
    Refresh,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  click N              activate element N
  focus N              focus element N
  type N TEXT          set the value of input N
  select N START END   select characters START..END of input N
  go URL               navigate to URL
  back | forward       move through history
  key KEY              press KEY on the page (Enter, Tab, Escape, ...)
  enter                press Enter on the page
  refresh              re-render now
  show                 print the current view
  help                 this text
  quit                 exit";

impl ShellCommand {
    /// Parse a command line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "" => return Ok(None),
            "click" | "c" => ShellCommand::Click(index(rest)?),
            "focus" | "f" => ShellCommand::Focus(index(rest)?),
            "type" | "t" => {
                let (n, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                ShellCommand::Type {
                    index: index(n)?,
                    text: text.to_string(),
                }
            }
            "select" => {
                let numbers = rest
                    .split_whitespace()
                    .map(index)
                    .collect::<Result<Vec<_>>>()?;
                let &[index, start, end] = numbers.as_slice() else {
                    return Err(usage("select N START END"));
                };
                ShellCommand::Select { index, start, end }
            }
            "go" | "open" => {
                if rest.is_empty() {
                    return Err(usage("go URL"));
                }
                ShellCommand::Go(rest.to_string())
            }
            "back" => ShellCommand::Back,
            "forward" => ShellCommand::Forward,
            "key" => {
                if rest.is_empty() {
                    return Err(usage("key KEY"));
                }
                ShellCommand::Key(rest.to_string())
            }
            "enter" => ShellCommand::Enter,
            "refresh" | "r" => ShellCommand::Refresh,
            "show" | "ls" => ShellCommand::Show,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            other => {
                return Err(AxviewError::InvalidCommand(format!(
                    "unknown command '{}', try 'help'",
                    other
                )))
            }
        };
        Ok(Some(command))
    }
}

fn index(raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|_| AxviewError::InvalidCommand(format!("expected a number, got '{}'", raw)))
}

fn usage(form: &str) -> AxviewError {
    AxviewError::InvalidCommand(format!("usage: {}", form))
}
