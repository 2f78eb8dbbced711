//! Chapter frontmatter extraction
//!
//! A chapter file opens with a metadata block delimited by `--` lines:
//!
//! ```text
//! ---
//! title: Introduction
//! description: 'Getting started'
//! ---
//! ```
//!
//! Only `title` and `description` are read; every other key is dropped. The
//! output block is a fixed template with navigation links computed from the
//! chapter index alone. Missing fields render as the literal `None`.

use crate::decamp::error::{LineError, Malformed};
use crate::decamp::lines::is_frontmatter_delimiter;
use std::fmt;

/// Rendered in place of a title or description the chapter does not declare.
pub const PLACEHOLDER: &str = "None";

/// The output frontmatter of one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontmatter {
    pub n: usize,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Chapter linked as previous; `None` renders as `null`.
    pub prev: Option<usize>,
    /// Chapter linked as next; `None` renders as `null`.
    pub next: Option<usize>,
}

impl Frontmatter {
    /// Frontmatter for chapter `n` with links to `n - 1` and `n + 1`.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            title: None,
            description: None,
            prev: Some(n.saturating_sub(1)),
            next: Some(n + 1),
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Frontmatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---")?;
        writeln!(f, "title: {}", self.title.as_deref().unwrap_or(PLACEHOLDER))?;
        writeln!(
            f,
            "description: {}",
            self.description.as_deref().unwrap_or(PLACEHOLDER)
        )?;
        writeln!(f, "prev: {}", Link(self.prev))?;
        writeln!(f, "next: {}", Link(self.next))?;
        writeln!(f, "type: chapter")?;
        writeln!(f, "id: {}", self.n)?;
        writeln!(f, "---")
    }
}

struct Link(Option<usize>);

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(n) => write!(f, "/chapter{}", n),
            None => f.write_str("null"),
        }
    }
}

/// Extract the frontmatter of chapter `n`.
///
/// Returns the record and the lines strictly after the closing delimiter.
pub fn extract_frontmatter(n: usize, lines: &[String]) -> Result<(Frontmatter, &[String]), LineError> {
    let mut frontmatter = Frontmatter::new(n);
    let mut opened_at = None;

    for (i, line) in lines.iter().enumerate() {
        if is_frontmatter_delimiter(line) {
            if opened_at.is_none() {
                opened_at = Some(i);
                continue;
            }
            return Ok((frontmatter, &lines[i + 1..]));
        }
        if opened_at.is_none() {
            continue;
        }
        if let Some(value) = field_value(line, "title:") {
            frontmatter.title = Some(value);
        } else if let Some(value) = field_value(line, "description:") {
            frontmatter.description = Some(value);
        }
    }

    Err(LineError::new(
        opened_at.unwrap_or(0),
        Malformed::UnterminatedFrontmatter,
    ))
}

fn field_value(line: &str, key: &str) -> Option<String> {
    let value = line.strip_prefix(key)?.trim();
    (!value.is_empty()).then(|| value.to_string())
}
