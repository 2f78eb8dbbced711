//! Chapter assembler
//!
//! Seeds the chapter file with its frontmatter, then feeds the remaining lines
//! to the exercise transducer until nothing is left. Exercises are numbered
//! contiguously from 1; every call takes a number, including calls that
//! produced nothing (blank runs, unclassified exercises).

use crate::decamp::error::Error;
use crate::decamp::exercise::{transduce_exercise, ExerciseContext};
use crate::decamp::frontmatter::{extract_frontmatter, Frontmatter};
use crate::decamp::output::{OutputLayout, Outputs};
use crate::decamp::slide_source::SlideSource;
use tracing::debug;

/// What every chapter of a course shares.
pub struct ChapterContext<'a> {
    pub layout: &'a OutputLayout,
    pub slides: &'a dyn SlideSource,
}

/// An assembled chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub frontmatter: Frontmatter,
    /// Number of exercise transducer calls it took.
    pub exercises: usize,
    /// The chapter file plus the slide documents it links.
    pub outputs: Outputs,
}

/// Assemble chapter `n` from its lines.
pub fn assemble_chapter(
    ctx: &ChapterContext<'_>,
    n: usize,
    lines: &[String],
) -> Result<Chapter, Error> {
    let (frontmatter, mut remaining) =
        extract_frontmatter(n, lines).map_err(|e| Error::located(n, None, 0, e))?;

    let chapter_path = ctx.layout.chapter_path(n);
    let mut outputs = Outputs::new();
    outputs.insert(&chapter_path, frontmatter.render());
    let mut n_exercise = 0;

    while !remaining.is_empty() {
        n_exercise += 1;
        let offset = lines.len() - remaining.len();
        let exercise = ExerciseContext {
            n: n_exercise,
            n_chapter: n,
            layout: ctx.layout,
            slides: ctx.slides,
        };
        let (output, rest) = transduce_exercise(&exercise, remaining)
            .map_err(|e| Error::located(n, Some(n_exercise), offset, e))?;
        if output.is_empty() {
            debug!("Chapter {}, exercise {}: nothing to emit", n, n_exercise);
        }
        outputs.append(&chapter_path, &output.fragment);
        outputs.merge(output.files);
        remaining = rest;
    }

    debug!("Done processing chapter {}", n);

    Ok(Chapter {
        frontmatter,
        exercises: n_exercise,
        outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decamp::error::Malformed;
    use crate::decamp::lines::split_lines;
    use crate::decamp::slide_source::InMemorySlides;
    use std::path::PathBuf;

    fn assemble(source: &str, slides: &InMemorySlides) -> Result<Chapter, Error> {
        let layout = OutputLayout::new("out");
        let ctx = ChapterContext {
            layout: &layout,
            slides,
        };
        assemble_chapter(&ctx, 3, &split_lines(source))
    }

    const FRONTMATTER: &str = "---\ntitle: Intro\ndescription: Start here\n---\n";

    #[test]
    fn test_chapter_without_exercises_is_frontmatter() {
        let chapter = assemble(FRONTMATTER, &InMemorySlides::new()).unwrap();

        assert_eq!(chapter.exercises, 0);
        assert_eq!(chapter.outputs.len(), 1);
        assert_eq!(
            chapter.outputs.get(PathBuf::from("out/chapters/chapter3.md")),
            Some(chapter.frontmatter.render().as_str())
        );
    }

    #[test]
    fn test_exercise_numbers_count_empty_calls() {
        let source = format!(
            "{}\n---\n## Plain\n```yaml\ntype: NormalExercise\n```\n---\n## Video\n```yaml\ntype: VideoExercise\n```\n`@projector_key`\nbeef\n",
            FRONTMATTER
        );
        let slides = InMemorySlides::new().with_deck("chapter3_beef.md", "## S\n");
        let chapter = assemble(&source, &slides).unwrap();

        assert_eq!(chapter.exercises, 3);
        let body = chapter.outputs.get("out/chapters/chapter3.md").unwrap();
        assert!(body.contains("<exercise id=\"2\" title=\"Plain\">"));
        assert!(body.contains("<exercise id=\"3\" title=\"Video\" type=\"slides\">"));
        assert!(body.contains("<slides source=\"chapter3_3\"></slides>"));
        assert_eq!(
            chapter.outputs.get("out/slides/chapter3_3.md"),
            Some("---\ntype: slides\n---\n\n# S\n")
        );
    }

    #[test]
    fn test_fragments_keep_call_order() {
        let source = format!(
            "{}## A\n```yaml\ntype: X\n```\n---\n## B\n```yaml\ntype: Y\n```\n",
            FRONTMATTER
        );
        let chapter = assemble(&source, &InMemorySlides::new()).unwrap();
        let body = chapter.outputs.get("out/chapters/chapter3.md").unwrap();

        let a = body.find("title=\"A\"").unwrap();
        let b = body.find("title=\"B\"").unwrap();
        assert!(a < b);
        assert!(body.ends_with("</exercise>\n\n"));
    }

    #[test]
    fn test_error_carries_absolute_line() {
        let source = format!("{}## A\n```yaml\ntype: X\n", FRONTMATTER);
        let err = assemble(&source, &InMemorySlides::new()).unwrap_err();

        match &err {
            Error::Input { location, .. } => {
                assert_eq!(location.chapter, 3);
                assert_eq!(location.exercise, Some(1));
                assert_eq!(location.line, 6);
            }
            other => panic!("expected input error, got {:?}", other),
        }
        assert!(matches!(err.malformed(), Some(Malformed::UnterminatedBlock { .. })));
    }

    #[test]
    fn test_frontmatter_error_has_no_exercise() {
        let err = assemble("---\ntitle: open\n", &InMemorySlides::new()).unwrap_err();
        match err {
            Error::Input { location, .. } => {
                assert_eq!(location.exercise, None);
                assert_eq!(location.line, 1);
            }
            other => panic!("expected input error, got {:?}", other),
        }
    }

    #[test]
    fn test_unclassified_exercise_takes_a_number() {
        let source = format!("{}Loose prose
---
## B
```yaml
type: Y
```
", FRONTMATTER);
        let chapter = assemble(&source, &InMemorySlides::new()).unwrap();

        assert_eq!(chapter.exercises, 2);
        let body = chapter.outputs.get("out/chapters/chapter3.md").unwrap();
        assert_eq!(
            body,
            format!(
                "{}<exercise id=\"2\" title=\"B\">\n\n</exercise>\n\n",
                chapter.frontmatter.render()
            )
        );
    }
}
