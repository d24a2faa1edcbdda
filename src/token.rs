//! Tokens produced by the splitter (§4.1).
//!
//! A token that required no quote-stripping is a borrowed slice of the
//! original line; a token that had quotes removed needs fresh storage
//! and becomes an owned `String`. `Cow<str>` carries both cases without
//! forcing every token through an allocation.

use std::borrow::Cow;
use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct Token<'a>(Cow<'a, str>);

impl<'a> Token<'a> {
    pub fn borrowed(s: &'a str) -> Self {
        Token(Cow::Borrowed(s))
    }

    pub fn owned(s: String) -> Self {
        Token(Cow::Owned(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if this token required fresh storage (quotes were stripped).
    pub fn is_owned(&self) -> bool {
        matches!(self.0, Cow::Owned(_))
    }

    pub fn into_owned(self) -> String {
        self.0.into_owned()
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?})", self.0)
    }
}

impl From<Token<'_>> for String {
    fn from(t: Token<'_>) -> String {
        t.into_owned()
    }
}
