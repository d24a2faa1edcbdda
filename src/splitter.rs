//! Quote- and paren-aware delimiter splitter (§4.1).
//!
//! This single function backs every precedence level in the command
//! interpreter (§4.8): the caller picks the delimiter (`" "`, `";"`,
//! `"&&"`, `"||"`, `"|"`, `"="`) and gets back tokens with single- and
//! double-quoting resolved and parenthesized arithmetic regions left
//! untouched for the arithmetic stage to find later.

use crate::token::Token;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SplitError {
    #[error("unterminated quote")]
    UnterminatedQuote,
    #[error("unbalanced parentheses")]
    UnbalancedParens,
}

/// Splits `s` on `d`, honoring quoting and parenthesis nesting.
///
/// - `d == " "` collapses runs of consecutive delimiters (no empty
///   tokens from adjacent spaces).
/// - Any other delimiter does not collapse; e.g. splitting `"a;;b"` on
///   `";"` yields `["a", "", "b"]`.
/// - Single quotes suppress the effect of double quotes and vice versa;
///   inside a parenthesized region quotes have no effect at all.
/// - The outer pair of quotes around a run of quoted text is stripped;
///   nested quotes of the other kind are kept literally.
/// - Parenthesized text, including the parens themselves, is copied
///   through unchanged so the arithmetic evaluator can find it later.
pub fn split<'a>(s: &'a str, d: &str) -> Result<Vec<Token<'a>>, SplitError> {
    let collapse = d == " ";
    let delim: Vec<char> = d.chars().collect();
    let chars: Vec<(usize, char)> = s.char_indices().collect();
    let n = chars.len();
    let total_len = s.len();

    let mut tokens = Vec::new();
    let mut cur = String::new();
    let mut active = false;
    let mut modified = false;
    let mut token_start = 0usize;
    let mut last_end = 0usize;

    let mut quote: Option<char> = None;
    let mut depth: i32 = 0;

    let finalize = |tokens: &mut Vec<Token<'a>>,
                    cur: &mut String,
                    active: &mut bool,
                    modified: &mut bool,
                    token_start: usize,
                    last_end: usize| {
        if collapse && !*active {
            cur.clear();
            *modified = false;
            return;
        }
        if *modified {
            tokens.push(Token::owned(std::mem::take(cur)));
        } else {
            tokens.push(Token::borrowed(&s[token_start..last_end]));
        }
        cur.clear();
        *active = false;
        *modified = false;
    };

    let mut i = 0;
    while i < n {
        if quote.is_none() && depth == 0 && matches_delim(&chars, i, &delim) {
            finalize(&mut tokens, &mut cur, &mut active, &mut modified, token_start, last_end);
            let skip = delim.len().max(1);
            i += skip;
            token_start = if i < n { chars[i].0 } else { total_len };
            last_end = token_start;
            continue;
        }

        let (byte_idx, c) = chars[i];
        if !active {
            active = true;
            token_start = byte_idx;
        }

        match c {
            '\'' if depth == 0 && quote != Some('"') => {
                modified = true;
                quote = if quote == Some('\'') { None } else { Some('\'') };
            }
            '"' if depth == 0 && quote != Some('\'') => {
                modified = true;
                quote = if quote == Some('"') { None } else { Some('"') };
            }
            '(' => {
                depth += 1;
                cur.push(c);
            }
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(SplitError::UnbalancedParens);
                }
                cur.push(c);
            }
            other => cur.push(other),
        }

        last_end = byte_idx + c.len_utf8();
        i += 1;
    }

    if quote.is_some() {
        return Err(SplitError::UnterminatedQuote);
    }
    if depth != 0 {
        return Err(SplitError::UnbalancedParens);
    }

    finalize(&mut tokens, &mut cur, &mut active, &mut modified, token_start, last_end);

    Ok(tokens)
}

fn matches_delim(chars: &[(usize, char)], i: usize, d: &[char]) -> bool {
    if d.is_empty() || i + d.len() > chars.len() {
        return false;
    }
    d.iter().enumerate().all(|(k, dc)| chars[i + k].1 == *dc)
}
