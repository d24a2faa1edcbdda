//! Comment stripping, control-form recognition, and precedence-climbing
//! parse into a `Cmd` tree (§4.7, §4.8).
//!
//! Order, outermost first, per §2 item 7: comments → control forms
//! (`if`/`while`/`repeat`) → `;` → `&&` → `||` → `|` → simple command.
//! A control-form keyword is only recognized when it is the first word
//! of the entire line being parsed — the form then owns everything to
//! the end of that line, which is why `if ... ; other` is not a way to
//! sequence something after an `if`: the `;` belongs to whichever
//! clause of the `if` it falls inside.

use crate::ast::{Cmd, Simple};
use crate::redirect::{RedirectKind, RedirectSpec};
use crate::splitter::{self, SplitError};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing '(' after {0}")]
    MissingOpenParen(String),
    #[error("missing ')' to match '(' after {0}")]
    MissingCloseParen(String),
    #[error("missing body for {0}")]
    MissingBody(String),
    #[error("{0}: bad integer")]
    BadInteger(String),
    #[error("empty command")]
    EmptyCommand,
    #[error("missing filename after redirection")]
    MissingFilename,
    #[error("{0}")]
    Split(#[from] SplitError),
}

/// Parses one already comment-stripped, trimmed line into a `Cmd` tree.
pub fn parse(line: &str) -> Result<Cmd, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::EmptyCommand);
    }

    if let Some(rest) = strip_keyword(line, "if") {
        return parse_if(rest);
    }
    if let Some(rest) = strip_keyword(line, "while") {
        return parse_while(rest);
    }
    if let Some(rest) = strip_keyword(line, "repeat") {
        return parse_repeat(rest);
    }

    parse_background(line)
}

/// Strips an inline comment: a `#` preceded by a space, outside quotes
/// and parens, starts a comment that runs to end of line (§3).
pub fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut quote: Option<u8> = None;
    let mut depth = 0i32;
    let mut prev_space = true;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\'' if depth == 0 && quote != Some(b'"') => {
                quote = if quote == Some(b'\'') { None } else { Some(b'\'') };
            }
            b'"' if depth == 0 && quote != Some(b'\'') => {
                quote = if quote == Some(b'"') { None } else { Some(b'"') };
            }
            b'(' if quote.is_none() => depth += 1,
            b')' if quote.is_none() => depth -= 1,
            b'#' if quote.is_none() && depth == 0 && prev_space => {
                return line[..i].trim_end();
            }
            _ => {}
        }
        prev_space = b == b' ';
    }

    line
}

fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) || rest.starts_with('(') {
        Some(rest.trim_start())
    } else {
        None
    }
}

/// Finds the index, in `s`, of the `(` that matches the one at the
/// start of `s` (which must already be `(`), honoring quotes.
fn matching_close_paren(s: &str) -> Option<usize> {
    let chars: Vec<char> = s.chars().collect();
    let mut quote: Option<char> = None;
    let mut depth = 0i32;

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '\'' if quote != Some('"') => quote = if quote == Some('\'') { None } else { Some('\'') },
            '"' if quote != Some('\'') => quote = if quote == Some('"') { None } else { Some('"') },
            '(' if quote.is_none() => depth += 1,
            ')' if quote.is_none() => {
                depth -= 1;
                if depth == 0 {
                    return Some(char_index_to_byte(s, i));
                }
            }
            _ => {}
        }
    }
    None
}

fn char_index_to_byte(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map(|(b, _)| b).unwrap_or(s.len())
}

/// Finds the byte offset of the last top-level, whitespace-delimited
/// occurrence of `word` in `s` (§9 "greedy-else").
fn last_top_level_word(s: &str, word: &str) -> Option<usize> {
    let chars: Vec<char> = s.chars().collect();
    let n = chars.len();
    let wlen = word.chars().count();
    let mut quote: Option<char> = None;
    let mut depth = 0i32;
    let mut found: Option<usize> = None;

    let mut i = 0;
    while i < n {
        match chars[i] {
            '\'' if quote != Some('"') => {
                quote = if quote == Some('\'') { None } else { Some('\'') }
            }
            '"' if quote != Some('\'') => {
                quote = if quote == Some('"') { None } else { Some('"') }
            }
            '(' if quote.is_none() => depth += 1,
            ')' if quote.is_none() => depth -= 1,
            _ => {}
        }

        if quote.is_none() && depth == 0 && i + wlen <= n {
            let candidate: String = chars[i..i + wlen].iter().collect();
            let before_ok = i == 0 || chars[i - 1].is_whitespace();
            let after_ok = i + wlen == n || chars[i + wlen].is_whitespace();
            if candidate == word && before_ok && after_ok {
                found = Some(char_index_to_byte(s, i));
            }
        }
        i += 1;
    }

    found
}

/// Splits `cond_text` (the inside of an `if`/`while`'s parens) into a
/// negation count and the remaining condition text.
fn split_negation(cond_text: &str) -> (bool, &str) {
    let trimmed = cond_text.trim_start();
    let dashes = trimmed.chars().take_while(|&c| c == '-').count();
    let rest = trimmed[dashes..].trim_start();
    (dashes % 2 == 1, rest)
}

fn extract_parenthesized<'a>(rest: &'a str, keyword: &str) -> Result<(&'a str, &'a str), ParseError> {
    let rest = rest.trim_start();
    if !rest.starts_with('(') {
        return Err(ParseError::MissingOpenParen(keyword.to_string()));
    }
    let close = matching_close_paren(rest).ok_or_else(|| ParseError::MissingCloseParen(keyword.to_string()))?;
    let inside = &rest[1..close];
    let after = rest[close + 1..].trim_start();
    Ok((inside, after))
}

fn parse_if(rest: &str) -> Result<Cmd, ParseError> {
    let (cond_text, after) = extract_parenthesized(rest, "if")?;
    let (negate, cond_text) = split_negation(cond_text);
    if cond_text.is_empty() {
        return Err(ParseError::MissingBody("if condition".to_string()));
    }
    let cond = parse(cond_text)?;

    if after.is_empty() {
        return Err(ParseError::MissingBody("if".to_string()));
    }

    let (body_text, else_text) = match last_top_level_word(after, "else") {
        Some(pos) => (after[..pos].trim(), Some(after[pos + 4..].trim())),
        None => (after.trim(), None),
    };

    if body_text.is_empty() {
        return Err(ParseError::MissingBody("if".to_string()));
    }
    let body = parse(body_text)?;
    let else_branch = match else_text {
        Some(text) if !text.is_empty() => Some(Box::new(parse(text)?)),
        _ => None,
    };

    Ok(Cmd::If { negate, cond: Box::new(cond), body: Box::new(body), else_branch })
}

fn parse_while(rest: &str) -> Result<Cmd, ParseError> {
    let (cond_text, after) = extract_parenthesized(rest, "while")?;
    let (negate, cond_text) = split_negation(cond_text);
    if cond_text.is_empty() {
        return Err(ParseError::MissingBody("while condition".to_string()));
    }
    let cond = parse(cond_text)?;

    if after.is_empty() {
        return Err(ParseError::MissingBody("while".to_string()));
    }
    let body = parse(after)?;

    Ok(Cmd::While { negate, cond: Box::new(cond), body: Box::new(body) })
}

fn parse_repeat(rest: &str) -> Result<Cmd, ParseError> {
    let (count_text, after) = extract_parenthesized(rest, "repeat")?;
    if count_text.trim().is_empty() {
        return Err(ParseError::BadInteger(count_text.to_string()));
    }
    if after.is_empty() {
        return Err(ParseError::MissingBody("repeat".to_string()));
    }
    let body = parse(after)?;

    Ok(Cmd::Repeat { count_expr: count_text.trim().to_string(), body: Box::new(body) })
}

/// A command line is a background command when it ends in a single
/// unquoted `&` not itself preceded by another `&` (§4.9, §9 open
/// question — matched literally, not generalized).
fn parse_background(line: &str) -> Result<Cmd, ParseError> {
    let trimmed = line.trim_end();
    if let Some(body) = trailing_unquoted_ampersand(trimmed) {
        let inner = parse_seq(body.trim_end())?;
        return Ok(Cmd::Background(Box::new(inner)));
    }
    parse_seq(trimmed)
}

fn trailing_unquoted_ampersand(line: &str) -> Option<&str> {
    if !line.ends_with('&') {
        return None;
    }
    if line.ends_with("&&") {
        return None;
    }
    // Confirm the trailing `&` is not inside a quote or parens by
    // running it through the splitter on `&`: a single top-level `&`
    // at the very end splits into exactly two parts, the second empty.
    let parts = splitter::split(line, "&").ok()?;
    if parts.len() == 2 && parts.last().map(|t| t.is_empty()).unwrap_or(false) {
        Some(&line[..line.len() - 1])
    } else {
        None
    }
}

fn parse_seq(line: &str) -> Result<Cmd, ParseError> {
    parse_fold(line, ";", Cmd::Seq, parse_and)
}

fn parse_and(line: &str) -> Result<Cmd, ParseError> {
    parse_fold(line, "&&", Cmd::And, parse_or)
}

fn parse_or(line: &str) -> Result<Cmd, ParseError> {
    parse_fold(line, "||", Cmd::Or, parse_pipe)
}

fn parse_pipe(line: &str) -> Result<Cmd, ParseError> {
    parse_fold(line, "|", Cmd::Pipe, parse_simple)
}

/// Splits `line` on `delim`, recursing into `next` for each piece, and
/// left-folds the pieces with `make`. Used for every left-associative
/// composition level.
fn parse_fold(
    line: &str,
    delim: &str,
    make: fn(Box<Cmd>, Box<Cmd>) -> Cmd,
    next: fn(&str) -> Result<Cmd, ParseError>,
) -> Result<Cmd, ParseError> {
    let parts = splitter::split(line, delim)?;
    let mut parts: Vec<String> = parts.into_iter().map(|t| t.into_owned()).collect();
    // `;`-splitting keeps empty trailing segments (e.g. a trailing `;`);
    // drop blanks so they do not become empty commands.
    parts.retain(|p| !p.trim().is_empty());

    if parts.is_empty() {
        return Err(ParseError::EmptyCommand);
    }

    let mut iter = parts.into_iter();
    let mut acc = next(iter.next().unwrap().trim())?;
    for part in iter {
        let rhs = next(part.trim())?;
        acc = make(Box::new(acc), Box::new(rhs));
    }
    Ok(acc)
}

fn parse_simple(line: &str) -> Result<Cmd, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::EmptyCommand);
    }

    let (words_with_redirects, redirects) = extract_redirects(line)?;
    let tokens = splitter::split(&words_with_redirects, " ")?;
    let words: Vec<String> = tokens.into_iter().map(|t| t.into_owned()).filter(|w| !w.is_empty()).collect();

    if words.is_empty() {
        return Err(ParseError::EmptyCommand);
    }

    Ok(Cmd::Simple(Simple { words, redirects }))
}

/// Scans for `<`, `>`, `>>`, and fd-prefixed `n>`/`n>>`, outside quotes
/// and parens, removing the operator and its filename argument from the
/// returned command text (§4.5).
fn extract_redirects(line: &str) -> Result<(String, Vec<RedirectSpec>), ParseError> {
    let words = splitter::split(line, " ")?;
    let mut kept: Vec<String> = Vec::new();
    let mut redirects = Vec::new();
    let mut i = 0;
    let owned: Vec<String> = words.into_iter().map(|t| t.into_owned()).collect();

    while i < owned.len() {
        let word = &owned[i];
        if let Some((kind, fused_filename)) = redirect_operator(word) {
            let (filename, consumed) = match fused_filename {
                Some(name) => (name, 1),
                None => (owned.get(i + 1).cloned().ok_or(ParseError::MissingFilename)?, 2),
            };
            if filename.is_empty() {
                return Err(ParseError::MissingFilename);
            }
            redirects.push(RedirectSpec { kind, path: filename });
            i += consumed;
            continue;
        }
        kept.push(word.clone());
        i += 1;
    }

    Ok((kept.join(" "), redirects))
}

/// Recognizes a redirection token, returning its kind and, for the
/// fd-prefixed fused form (`2>file`), any filename glued onto the same
/// token. A bare operator (`>`, `>>`, `<`, or `n>`/`n>>` with nothing
/// after it) returns `None` for the filename, meaning it is the next
/// word.
fn redirect_operator(word: &str) -> Option<(RedirectKind, Option<String>)> {
    if word == "<" {
        return Some((RedirectKind::Input, None));
    }
    if word == ">" {
        return Some((RedirectKind::Output, None));
    }
    if word == ">>" {
        return Some((RedirectKind::Append, None));
    }

    let digits: String = word.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || digits.len() == word.len() {
        return None;
    }
    let rest = &word[digits.len()..];
    digits.parse::<u32>().ok()?;

    if let Some(name) = rest.strip_prefix(">>") {
        let filename = if name.is_empty() { None } else { Some(name.to_string()) };
        Some((RedirectKind::Append, filename))
    } else if let Some(name) = rest.strip_prefix('>') {
        let filename = if name.is_empty() { None } else { Some(name.to_string()) };
        Some((RedirectKind::Output, filename))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comment_after_space() {
        assert_eq!(strip_comment("echo hi # comment"), "echo hi");
        assert_eq!(strip_comment("echo hi#not-a-comment"), "echo hi#not-a-comment");
    }

    #[test]
    fn parses_simple_command() {
        let cmd = parse("echo hello world").unwrap();
        match cmd {
            Cmd::Simple(s) => assert_eq!(s.words, vec!["echo", "hello", "world"]),
            other => panic!("expected Simple, got {other:?}"),
        }
    }

    #[test]
    fn parses_sequence() {
        let cmd = parse("echo hello ; echo world").unwrap();
        assert!(matches!(cmd, Cmd::Seq(_, _)));
    }

    #[test]
    fn parses_and_or_pipe_precedence() {
        let cmd = parse("a && b || c | d").unwrap();
        // && binds loosest among these three, so outermost is And.
        match cmd {
            Cmd::And(lhs, rhs) => {
                assert!(matches!(*lhs, Cmd::Simple(_)));
                assert!(matches!(*rhs, Cmd::Or(_, _)));
            }
            other => panic!("expected And at top, got {other:?}"),
        }
    }

    #[test]
    fn background_suffix_is_stripped_and_wrapped() {
        let cmd = parse("sleep 1 &").unwrap();
        assert!(matches!(cmd, Cmd::Background(_)));
    }

    #[test]
    fn double_ampersand_is_not_background() {
        let cmd = parse("true && echo x").unwrap();
        assert!(matches!(cmd, Cmd::And(_, _)));
    }

    #[test]
    fn parses_if_else() {
        let cmd = parse("if (chk 1 lt 2) echo yes else echo no").unwrap();
        match cmd {
            Cmd::If { negate, else_branch, .. } => {
                assert!(!negate);
                assert!(else_branch.is_some());
            }
            other => panic!("expected If, got {other:?}"),
        }
    }

    #[test]
    fn if_negation_dash_toggles() {
        let cmd = parse("if (- chk 1 lt 2) echo yes").unwrap();
        assert!(matches!(cmd, Cmd::If { negate: true, .. }));
        let cmd = parse("if (-- chk 1 lt 2) echo yes").unwrap();
        assert!(matches!(cmd, Cmd::If { negate: false, .. }));
    }

    #[test]
    fn greedy_else_binds_to_last_else() {
        let cmd = parse("if (true) if (false) echo a else echo b else echo c").unwrap();
        match cmd {
            Cmd::If { body, else_branch, .. } => {
                assert!(else_branch.is_some());
                assert!(matches!(*body, Cmd::If { .. }));
            }
            other => panic!("expected If, got {other:?}"),
        }
    }

    #[test]
    fn parses_while() {
        let cmd = parse("while (chk 1 lt 2) echo hi").unwrap();
        assert!(matches!(cmd, Cmd::While { .. }));
    }

    #[test]
    fn parses_repeat() {
        let cmd = parse("repeat (N) echo hi").unwrap();
        match cmd {
            Cmd::Repeat { count_expr, .. } => assert_eq!(count_expr, "N"),
            other => panic!("expected Repeat, got {other:?}"),
        }
    }

    #[test]
    fn missing_paren_is_error() {
        assert!(matches!(parse("if chk 1 lt 2) echo yes"), Err(ParseError::MissingOpenParen(_))));
    }

    #[test]
    fn missing_body_is_error() {
        assert!(matches!(parse("if (chk 1 lt 2)"), Err(ParseError::MissingBody(_))));
    }

    #[test]
    fn output_redirect_is_extracted() {
        let cmd = parse("echo 42 > /tmp/alsh_t1").unwrap();
        match cmd {
            Cmd::Simple(s) => {
                assert_eq!(s.words, vec!["echo", "42"]);
                assert_eq!(s.redirects.len(), 1);
                assert_eq!(s.redirects[0].kind, RedirectKind::Output);
                assert_eq!(s.redirects[0].path, "/tmp/alsh_t1");
            }
            other => panic!("expected Simple, got {other:?}"),
        }
    }

    #[test]
    fn input_redirect_is_extracted() {
        let cmd = parse("cat < /tmp/alsh_t1").unwrap();
        match cmd {
            Cmd::Simple(s) => {
                assert_eq!(s.words, vec!["cat"]);
                assert_eq!(s.redirects[0].kind, RedirectKind::Input);
            }
            other => panic!("expected Simple, got {other:?}"),
        }
    }
}
