//! Output mapping and layout
//!
//! [`Outputs`] maps output paths to file contents. Transducers return their own
//! `Outputs` and the caller merges them, so no map is shared between layers.

use serde::Serialize;
use std::collections::btree_map::{self, BTreeMap};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Output path -> content, iterated in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outputs {
    files: BTreeMap<PathBuf, String>,
}

impl Outputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the file at `path`, creating it if needed.
    pub fn append(&mut self, path: impl Into<PathBuf>, content: &str) {
        self.files.entry(path.into()).or_default().push_str(content);
    }

    /// Set the content of `path`, replacing any previous content.
    pub fn insert(&mut self, path: impl Into<PathBuf>, content: String) {
        let path = path.into();
        if self.files.contains_key(&path) {
            warn!("Overwriting output {}", path.display());
        }
        self.files.insert(path, content);
    }

    /// Move every file of `other` into `self`; later content wins per path.
    pub fn merge(&mut self, other: Outputs) {
        for (path, content) in other.files {
            self.insert(path, content);
        }
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    pub fn get_mut(&mut self, path: impl AsRef<Path>) -> Option<&mut String> {
        self.files.get_mut(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, PathBuf, String> {
        self.files.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// One `{path, bytes}` entry per file, for dry runs.
    pub fn summary(&self) -> Vec<OutputSummary> {
        self.files
            .iter()
            .map(|(path, content)| OutputSummary {
                path: path.clone(),
                bytes: content.len(),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Outputs {
    type Item = (&'a PathBuf, &'a String);
    type IntoIter = btree_map::Iter<'a, PathBuf, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputSummary {
    pub path: PathBuf,
    pub bytes: usize,
}

/// Where converted files go under the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub chapters_dir: String,
    pub exercises_dir: String,
    pub slides_dir: String,
}

impl OutputLayout {
    /// Layout with the default `chapters/`, `exercises/` and `slides/` names.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            chapters_dir: "chapters".to_string(),
            exercises_dir: "exercises".to_string(),
            slides_dir: "slides".to_string(),
        }
    }

    /// Layout using the subdirectory names of `config`.
    pub fn from_config(root: impl Into<PathBuf>, config: &decamp_config::OutputConfig) -> Self {
        Self {
            root: root.into(),
            chapters_dir: config.chapters_dir.clone(),
            exercises_dir: config.exercises_dir.clone(),
            slides_dir: config.slides_dir.clone(),
        }
    }

    pub fn chapter_path(&self, n: usize) -> PathBuf {
        self.root
            .join(&self.chapters_dir)
            .join(format!("chapter{}.md", n))
    }

    /// Source name slide files and `<slides>` tags share.
    pub fn slide_source(n_chapter: usize, n: usize) -> String {
        format!("chapter{}_{}", n_chapter, n)
    }

    pub fn slide_path(&self, n_chapter: usize, n: usize) -> PathBuf {
        self.root
            .join(&self.slides_dir)
            .join(format!("{}.md", Self::slide_source(n_chapter, n)))
    }

    /// Every output subdirectory, including the reserved exercises one.
    pub fn directories(&self) -> [PathBuf; 3] {
        [
            self.root.join(&self.chapters_dir),
            self.root.join(&self.exercises_dir),
            self.root.join(&self.slides_dir),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut outputs = Outputs::new();
        outputs.append("a.md", "one\n");
        outputs.append("a.md", "two\n");
        assert_eq!(outputs.get("a.md"), Some("one\ntwo\n"));
        assert_eq!(outputs.len(), 1);
    }

    #[test]
    fn test_merge_unions_paths() {
        let mut outputs = Outputs::new();
        outputs.append("b.md", "b");
        let mut other = Outputs::new();
        other.insert("a.md", "a".to_string());
        outputs.merge(other);

        let paths: Vec<_> = outputs.paths().collect();
        assert_eq!(paths, vec![Path::new("a.md"), Path::new("b.md")]);
    }

    #[test]
    fn test_layout_paths() {
        let layout = OutputLayout::new("/out");
        assert_eq!(layout.chapter_path(2), PathBuf::from("/out/chapters/chapter2.md"));
        assert_eq!(layout.slide_path(2, 3), PathBuf::from("/out/slides/chapter2_3.md"));
        assert_eq!(OutputLayout::slide_source(2, 3), "chapter2_3");
    }

    #[test]
    fn test_summary_counts_bytes() {
        let mut outputs = Outputs::new();
        outputs.append("x.md", "abc");
        assert_eq!(
            outputs.summary(),
            vec![OutputSummary {
                path: PathBuf::from("x.md"),
                bytes: 3
            }]
        );
    }
}
