//! Course driver
//!
//! Discovers the chapter files of an input repository, assembles each one and
//! patches the navigation links at both ends of the course: the first chapter
//! has no previous chapter and the last has no next one. Nothing is written
//! until every chapter converted; see [`write_outputs`].

use crate::decamp::chapter::{assemble_chapter, ChapterContext};
use crate::decamp::error::Error;
use crate::decamp::lines::split_lines;
use crate::decamp::output::{OutputLayout, Outputs};
use crate::decamp::slide_source::SlideDir;
use decamp_config::DecampConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A course repository and where its conversion goes.
#[derive(Debug, Clone)]
pub struct Course {
    input_root: PathBuf,
    chapter_pattern: String,
    slides: SlideDir,
    layout: OutputLayout,
}

impl Course {
    pub fn new(
        config: &DecampConfig,
        input_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        let input_root = input_root.into();
        Self {
            slides: SlideDir::new(input_root.join(&config.input.slides_dir)),
            chapter_pattern: config.input.chapter_pattern.clone(),
            layout: OutputLayout::from_config(output_root, &config.output),
            input_root,
        }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Chapter files of the input root, sorted by path.
    pub fn discover(&self) -> Result<Vec<PathBuf>, Error> {
        let root = self.input_root.to_string_lossy();
        let pattern = format!("{}/{}", glob::Pattern::escape(&root), self.chapter_pattern);
        let pattern_error = |message: String| Error::Pattern {
            pattern: self.chapter_pattern.clone(),
            message,
        };

        let mut paths = Vec::new();
        for entry in glob::glob(&pattern).map_err(|e| pattern_error(e.to_string()))? {
            let path = entry.map_err(|e| pattern_error(e.to_string()))?;
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Convert every chapter, numbering them from 1 in discovery order.
    pub fn convert(&self) -> Result<Outputs, Error> {
        let paths = self.discover()?;
        debug!(
            "Found {} chapter(s); slide decks in {}",
            paths.len(),
            self.slides.path().display()
        );
        let ctx = ChapterContext {
            layout: &self.layout,
            slides: &self.slides,
        };

        let mut outputs = Outputs::new();
        for (i, path) in paths.iter().enumerate() {
            let n = i + 1;
            info!("Converting {} as chapter {}", path.display(), n);
            let source = fs::read_to_string(path).map_err(|source| Error::Read {
                path: path.clone(),
                source,
            })?;
            let chapter = assemble_chapter(&ctx, n, &split_lines(&source))?;
            outputs.merge(chapter.outputs);
        }

        if !paths.is_empty() {
            patch_navigation(&mut outputs, &self.layout, paths.len());
        }
        Ok(outputs)
    }
}

/// Clear the `prev` link of chapter 1 and the `next` link of chapter `last`.
///
/// The links are rewritten in the rendered text, first occurrence only.
pub fn patch_navigation(outputs: &mut Outputs, layout: &OutputLayout, last: usize) {
    if let Some(content) = outputs.get_mut(layout.chapter_path(1)) {
        *content = content.replacen("prev: /chapter0", "prev: null", 1);
    }
    if let Some(content) = outputs.get_mut(layout.chapter_path(last)) {
        let next = format!("next: /chapter{}", last + 1);
        *content = content.replacen(&next, "next: null", 1);
    }
}

/// Write every output file, creating the layout's directories first.
pub fn write_outputs(outputs: &Outputs, layout: &OutputLayout) -> Result<(), Error> {
    for dir in layout.directories() {
        create_dir(&dir)?;
    }
    for (path, content) in outputs {
        if let Some(parent) = path.parent() {
            create_dir(parent)?;
        }
        fs::write(path, content).map_err(|source| Error::Write {
            path: path.clone(),
            source,
        })?;
        info!("Wrote {}", path.display());
    }
    Ok(())
}

fn create_dir(dir: &Path) -> Result<(), Error> {
    fs::create_dir_all(dir).map_err(|source| Error::Write {
        path: dir.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(n: usize) -> String {
        format!(
            "---\ntitle: C{n}\ndescription: D\nprev: /chapter{}\nnext: /chapter{}\ntype: chapter\nid: {n}\n---\n",
            n - 1,
            n + 1
        )
    }

    fn outputs(count: usize, layout: &OutputLayout) -> Outputs {
        let mut outputs = Outputs::new();
        for n in 1..=count {
            outputs.insert(layout.chapter_path(n), chapter(n));
        }
        outputs
    }

    #[test]
    fn test_patch_first_and_last() {
        let layout = OutputLayout::new("out");
        let mut out = outputs(3, &layout);
        patch_navigation(&mut out, &layout, 3);

        let first = out.get(layout.chapter_path(1)).unwrap();
        assert!(first.contains("prev: null\n"));
        assert!(first.contains("next: /chapter2\n"));

        let middle = out.get(layout.chapter_path(2)).unwrap();
        assert!(middle.contains("prev: /chapter1\n"));
        assert!(middle.contains("next: /chapter3\n"));

        let last = out.get(layout.chapter_path(3)).unwrap();
        assert!(last.contains("prev: /chapter2\n"));
        assert!(last.contains("next: null\n"));
    }

    #[test]
    fn test_patch_single_chapter() {
        let layout = OutputLayout::new("out");
        let mut out = outputs(1, &layout);
        patch_navigation(&mut out, &layout, 1);

        let only = out.get(layout.chapter_path(1)).unwrap();
        assert!(only.contains("prev: null\n"));
        assert!(only.contains("next: null\n"));
    }

    #[test]
    fn test_discover_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["chapter2.md", "chapter1.md", "notes.md"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("chapter9.md")).unwrap();

        let config = decamp_config::load_defaults().unwrap();
        let course = Course::new(&config, dir.path(), dir.path().join("out"));
        let found: Vec<_> = course
            .discover()
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(found, vec!["chapter1.md", "chapter2.md"]);
    }

    #[test]
    fn test_write_outputs_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        let mut out = Outputs::new();
        out.insert(layout.slide_path(1, 2), "slides".to_string());

        write_outputs(&out, &layout).unwrap();

        assert!(dir.path().join("chapters").is_dir());
        assert!(dir.path().join("exercises").is_dir());
        assert_eq!(
            fs::read_to_string(dir.path().join("slides/chapter1_2.md")).unwrap(),
            "slides"
        );
    }
}
