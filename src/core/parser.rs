use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use shlex::Shlex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid command syntax: {0}")]
    InvalidSyntax(String),
    #[error("Missing filename for {0} redirection")]
    MissingRedirectTarget(RedirectKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RedirectKind {
    /// `>`
    StdoutOverwrite,
    /// `>>`
    StdoutAppend,
    /// `<`
    Stdin,
}

impl fmt::Display for RedirectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectKind::StdoutOverwrite => write!(f, "output"),
            RedirectKind::StdoutAppend => write!(f, "append"),
            RedirectKind::Stdin => write!(f, "input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub command: String,
    pub args: Vec<String>,
}

/// Redirection targets pulled out of an argument list. Later occurrences of
/// the same kind replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Redirections {
    targets: BTreeMap<RedirectKind, String>,
}

impl Redirections {
    pub fn get(&self, kind: RedirectKind) -> Option<&str> {
        self.targets.get(&kind).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Where stdout should go. Overwrite wins when both stdout kinds are given.
    pub fn output_target(&self) -> Option<(RedirectKind, &str)> {
        [RedirectKind::StdoutOverwrite, RedirectKind::StdoutAppend]
            .into_iter()
            .find_map(|kind| self.get(kind).map(|target| (kind, target)))
    }

    fn insert(&mut self, kind: RedirectKind, target: &str) {
        self.targets.insert(kind, target.to_string());
    }
}

/// Split a raw line into a command and its arguments using shell quoting.
///
/// Blank input yields `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<CommandLine>, ParseError> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    let escaped = escape_hashes(line);
    let mut lexer = Shlex::new(&escaped);
    let mut tokens: Vec<String> = lexer.by_ref().collect();
    if lexer.had_error {
        return Err(ParseError::InvalidSyntax(syntax_error_reason(line).to_string()));
    }

    if tokens.is_empty() {
        return Ok(None);
    }

    let command = tokens.remove(0);
    Ok(Some(CommandLine {
        command,
        args: tokens,
    }))
}

/// Backslash every unquoted `#`. The lexer would otherwise drop a word
/// starting with `#` and the rest of the line as a comment.
fn escape_hashes(line: &str) -> Cow<'_, str> {
    if !line.contains('#') {
        return Cow::Borrowed(line);
    }

    let mut out = String::with_capacity(line.len() + 4);
    let mut quote: Option<char> = None;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match (quote, c) {
            (None, '#') => out.push_str("\\#"),
            (None, '\\') | (Some('"'), '\\') => {
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            (None, '\'' | '"') => {
                quote = Some(c);
                out.push(c);
            }
            (Some(open), c) if c == open => {
                quote = None;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn syntax_error_reason(line: &str) -> &'static str {
    let trailing_backslashes = line.chars().rev().take_while(|&c| c == '\\').count();
    if trailing_backslashes % 2 == 1 {
        "No escaped character"
    } else {
        "No closing quotation"
    }
}

/// Pull `>`, `>>` and `<` redirections (and the `>file` / `>>file` forms) out
/// of `args`, returning the remaining arguments in their original order.
pub fn extract_redirections(args: &[String]) -> Result<(Vec<String>, Redirections), ParseError> {
    let mut cleaned = Vec::with_capacity(args.len());
    let mut redirections = Redirections::default();
    let mut tokens = args.iter();

    while let Some(arg) = tokens.next() {
        let exact = match arg.as_str() {
            ">" => Some(RedirectKind::StdoutOverwrite),
            ">>" => Some(RedirectKind::StdoutAppend),
            "<" => Some(RedirectKind::Stdin),
            _ => None,
        };

        if let Some(kind) = exact {
            let target = tokens
                .next()
                .ok_or(ParseError::MissingRedirectTarget(kind))?;
            redirections.insert(kind, target);
        } else if let Some(target) = arg.strip_prefix(">>") {
            // `>>` must be tested before `>` or `>>log` would become `>` + `>log`.
            redirections.insert(RedirectKind::StdoutAppend, target);
        } else if let Some(target) = arg.strip_prefix('>') {
            redirections.insert(RedirectKind::StdoutOverwrite, target);
        } else {
            cleaned.push(arg.clone());
        }
    }

    Ok((cleaned, redirections))
}

/// Rebuild a command line from a command and arguments, quoting as needed.
pub fn join(command: &str, args: &[String]) -> Result<String, ParseError> {
    let words = std::iter::once(command).chain(args.iter().map(String::as_str));
    shlex::try_join(words).map_err(|e| ParseError::InvalidSyntax(e.to_string()))
}
