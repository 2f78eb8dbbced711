//! Slide deck lookup
//!
//! Slide-type exercises reference their deck by a hash fragment that is
//! embedded in the deck's file name. A lookup must resolve to exactly one deck:
//! no match and several matches are both [`LookupError`]s naming the hash.

use crate::decamp::error::LookupError;
use crate::decamp::lines::split_lines;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A resolved slide deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideDeck {
    /// File name the hash matched.
    pub name: String,
    pub lines: Vec<String>,
}

/// Resolves slide hashes to decks.
pub trait SlideSource {
    fn find(&self, hash: &str) -> Result<SlideDeck, LookupError>;
}

/// Pick the single name containing `hash`.
fn unique_match<'a>(
    hash: &str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<&'a str, LookupError> {
    let mut matches: Vec<&str> = names.into_iter().filter(|name| name.contains(hash)).collect();
    match matches.len() {
        0 => Err(LookupError::NotFound {
            hash: hash.to_string(),
        }),
        1 => Ok(matches.remove(0)),
        _ => {
            matches.sort_unstable();
            Err(LookupError::Ambiguous {
                hash: hash.to_string(),
                candidates: matches.into_iter().map(str::to_string).collect(),
            })
        }
    }
}

/// Decks stored as files in a directory, usually `<input root>/slides`.
#[derive(Debug, Clone)]
pub struct SlideDir {
    dir: PathBuf,
}

impl SlideDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> LookupError {
        LookupError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl SlideSource for SlideDir {
    fn find(&self, hash: &str) -> Result<SlideDeck, LookupError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| self.io_error(&self.dir, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| self.io_error(&self.dir, e))?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        let name = unique_match(hash, names.iter().map(String::as_str))?;
        let path = self.dir.join(name);
        debug!("Slide hash {} resolved to {}", hash, path.display());
        let source = fs::read_to_string(&path).map_err(|e| self.io_error(&path, e))?;
        Ok(SlideDeck {
            name: name.to_string(),
            lines: split_lines(&source),
        })
    }
}

/// Decks held in memory, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct InMemorySlides {
    decks: BTreeMap<String, String>,
}

impl InMemorySlides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deck(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.decks.insert(name.into(), source.into());
    }
}

impl SlideSource for InMemorySlides {
    fn find(&self, hash: &str) -> Result<SlideDeck, LookupError> {
        let name = unique_match(hash, self.decks.keys().map(String::as_str))?;
        Ok(SlideDeck {
            name: name.to_string(),
            lines: split_lines(&self.decks[name]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_unique_match() {
        let slides = InMemorySlides::new()
            .with_deck("chapter1_abc123.md", "## One\n")
            .with_deck("chapter1_def456.md", "## Two\n");

        let deck = slides.find("def456").unwrap();
        assert_eq!(deck.name, "chapter1_def456.md");
        assert_eq!(deck.lines, vec!["## Two"]);
    }

    #[test]
    fn test_no_match_names_hash() {
        let slides = InMemorySlides::new().with_deck("chapter1_abc123.md", "");
        match slides.find("zzz") {
            Err(LookupError::NotFound { hash }) => assert_eq!(hash, "zzz"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_ambiguous_match_lists_candidates() {
        let slides = InMemorySlides::new()
            .with_deck("b_abc.md", "")
            .with_deck("a_abc.md", "");
        match slides.find("abc") {
            Err(LookupError::Ambiguous { candidates, .. }) => {
                assert_eq!(candidates, vec!["a_abc.md", "b_abc.md"])
            }
            other => panic!("expected Ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn test_dir_lookup_reads_deck() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("chapter2_f00d.md"), "## Slide\n`@script`\nHi\n").unwrap();
        fs::write(dir.path().join("chapter2_beef.md"), "").unwrap();
        fs::create_dir(dir.path().join("f00d_dir")).unwrap();

        let deck = SlideDir::new(dir.path()).find("f00d").unwrap();
        assert_eq!(deck.name, "chapter2_f00d.md");
        assert_eq!(deck.lines, vec!["## Slide", "`@script`", "Hi"]);
    }

    #[test]
    fn test_dir_lookup_missing_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let slides = SlideDir::new(dir.path().join("absent"));
        assert_eq!(slides.path(), dir.path().join("absent"));
        match slides.find("f00d") {
            Err(LookupError::Io { path, .. }) => assert_eq!(path, slides.path()),
            other => panic!("expected io error, got {:?}", other),
        }
    }
}
