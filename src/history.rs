//! Command history and `!`-bang expansion (§4.9).
//!
//! History is an ordered, growable list of the literal lines the user
//! entered. Running `history` itself is recorded like any other line,
//! except that two `history` invocations in a row collapse to one entry
//! (so repeatedly pressing "show history" does not bloat the log).

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("!{0}: event not found")]
    EventNotFound(String),
    #[error("history is empty")]
    Empty,
    #[error("{0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Default)]
pub struct HistoryStore {
    entries: Vec<String>,
    path: Option<PathBuf>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads prior history from `path`, if it exists, and remembers the
    /// path so subsequent `push` calls can append to it.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::File::open(&path) {
            Ok(file) => io::BufReader::new(file).lines().map_while(Result::ok).collect(),
            Err(_) => Vec::new(),
        };
        HistoryStore { entries, path: Some(path) }
    }

    /// Records `line`, collapsing consecutive identical `history` entries.
    pub fn push(&mut self, line: &str) {
        if line == "history" && self.entries.last().map(String::as_str) == Some("history") {
            return;
        }
        self.entries.push(line.to_string());
        if let Some(path) = &self.path {
            let _ = append_line(path, line);
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `history -c`: clears the in-memory list. The history file is
    /// untouched until the next `-w` or natural append.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// `history -w`: writes the full in-memory list to the history
    /// file now, truncating whatever was there before.
    pub fn write_to_disk(&self) -> Result<(), HistoryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut file = fs::File::create(path)?;
        for line in &self.entries {
            writeln!(file, "{line}")?;
        }
        Ok(())
    }

    /// Renders the full history, 1-indexed, as `history` prints it.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{:>5}  {line}", i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Resolves a bang form (`!!`, `!N`, `!-N`) against the stored
    /// history. `bang` is everything after the `!`, e.g. `"!"`, `"3"`,
    /// `"-2"`.
    pub fn resolve(&self, bang: &str) -> Result<&str, HistoryError> {
        if self.entries.is_empty() {
            return Err(HistoryError::Empty);
        }

        if bang == "!" {
            return Ok(self.entries.last().unwrap());
        }

        if let Some(offset) = bang.strip_prefix('-') {
            let back: usize = offset.parse().map_err(|_| HistoryError::EventNotFound(bang.to_string()))?;
            if back == 0 || back > self.entries.len() {
                return Err(HistoryError::EventNotFound(bang.to_string()));
            }
            return Ok(&self.entries[self.entries.len() - back]);
        }

        let index: usize = bang.parse().map_err(|_| HistoryError::EventNotFound(bang.to_string()))?;
        self.entries.get(index.wrapping_sub(1)).map(String::as_str).ok_or_else(|| HistoryError::EventNotFound(bang.to_string()))
    }

    /// Expands every `!...` bang reference found in `line`. Only a `!`
    /// at the very end of the line (nothing follows it at all) is left
    /// alone as literal text; a `!` followed by anything that isn't a
    /// `!`, a digit, or a `-` is an unrecognized event and is an error.
    pub fn expand_line(&self, line: &str) -> Result<String, HistoryError> {
        if !line.contains('!') {
            return Ok(line.to_string());
        }

        let chars: Vec<char> = line.chars().collect();
        let n = chars.len();
        let mut out = String::with_capacity(line.len());
        let mut i = 0;

        while i < n {
            if chars[i] != '!' {
                out.push(chars[i]);
                i += 1;
                continue;
            }

            let start = i + 1;
            let mut j = start;
            if j < n && chars[j] == '!' {
                j += 1;
            } else {
                if j < n && chars[j] == '-' {
                    j += 1;
                }
                while j < n && chars[j].is_ascii_digit() {
                    j += 1;
                }
            }

            if j == start {
                if start >= n {
                    out.push('!');
                    i += 1;
                    continue;
                }
                let mut k = start;
                while k < n && !chars[k].is_whitespace() {
                    k += 1;
                }
                let bad: String = chars[start..k].iter().collect();
                return Err(HistoryError::EventNotFound(bad));
            }

            let bang: String = chars[start..j].iter().collect();
            let bang = if bang == "!" { "!".to_string() } else { bang };
            let resolved = self.resolve(&bang)?;
            out.push_str(resolved);
            i = j;
        }

        Ok(out)
    }
}

fn append_line(path: &Path, line: &str) -> io::Result<()> {
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}
