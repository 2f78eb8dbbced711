//! Main module for decamp library functionality
//!
//! Leaves first: [`lines`] and [`frontmatter`] read chapter files,
//! [`slides`] renders slide decks found through [`slide_source`], [`choice`]
//! and [`feedback`] handle multiple-choice exercises, [`exercise`] is the
//! per-exercise engine, [`chapter`] and [`course`] drive it.

pub mod chapter;
pub mod choice;
pub mod course;
pub mod error;
pub mod exercise;
pub mod feedback;
pub mod frontmatter;
pub mod lines;
pub mod output;
pub mod slide_source;
pub mod slides;

pub use chapter::{assemble_chapter, Chapter, ChapterContext};
pub use course::{patch_navigation, write_outputs, Course};
pub use error::{Error, ErrorKind, LineError, Location, LookupError, Malformed};
pub use exercise::{transduce_exercise, ExerciseContext, ExerciseKind, ExerciseOutput};
pub use frontmatter::{extract_frontmatter, Frontmatter};
pub use output::{OutputLayout, OutputSummary, Outputs};
pub use slide_source::{InMemorySlides, SlideDeck, SlideDir, SlideSource};
pub use slides::transduce_slides;
