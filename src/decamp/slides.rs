//! Slide deck transducer
//!
//! Converts the lines of one slide deck into a slide document. The scan is a
//! single dispatch loop over an explicit [`State`]:
//!
//! - `Outside`: between slides, only headings and metadata blocks matter
//! - `InSlide`: body lines pass through, markers are dropped
//! - `NotesStart`/`InNotes`: narration after `` `@script` ``
//! - `Metadata`: inside a ```` ```yaml ```` block, nothing is emitted
//!
//! No state survives from one deck to the next.

use crate::decamp::error::{LineError, Malformed};
use crate::decamp::lines::{
    heading_text, is_braced_fence, is_delimiter, is_fence, is_marker, is_yaml_fence, marker,
};

/// Prepended to every slide document.
pub const SLIDES_FRONTMATTER: &str = "---\ntype: slides\n---\n\n";

const NOTES_PREFIX: &str = "Notes: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    InSlide,
    /// The next line opens the notes.
    NotesStart,
    InNotes,
    /// Skipping a metadata block opened at `start`, then back to `resume`.
    Metadata { start: usize, resume: Resume },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    Outside,
    InSlide,
}

impl From<Resume> for State {
    fn from(resume: Resume) -> Self {
        match resume {
            Resume::Outside => State::Outside,
            Resume::InSlide => State::InSlide,
        }
    }
}

struct Writer {
    out: String,
}

impl Writer {
    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn heading(&mut self, text: &str) {
        self.out.push_str("# ");
        self.line(text);
    }
}

/// Render one slide deck.
pub fn transduce_slides(lines: &[String]) -> Result<String, LineError> {
    let mut writer = Writer {
        out: String::from(SLIDES_FRONTMATTER),
    };
    let mut state = State::Outside;

    for (i, line) in lines.iter().enumerate() {
        state = step(state, i, line, &mut writer);
    }

    match state {
        State::Metadata { start, .. } => Err(LineError::new(
            start,
            Malformed::UnterminatedBlock {
                block: "slide metadata",
            },
        )),
        _ => Ok(writer.out),
    }
}

fn step(state: State, i: usize, line: &str, writer: &mut Writer) -> State {
    match state {
        State::Metadata { resume, .. } => {
            if is_fence(line) {
                resume.into()
            } else {
                state
            }
        }
        State::Outside => {
            if let Some(text) = heading_text(line) {
                writer.heading(text);
                State::InSlide
            } else if is_yaml_fence(line) {
                State::Metadata {
                    start: i,
                    resume: Resume::Outside,
                }
            } else {
                State::Outside
            }
        }
        State::InSlide => in_slide(i, line, writer),
        State::NotesStart => {
            if is_delimiter(line) {
                writer.line("---");
                State::Outside
            } else {
                writer.out.push_str(NOTES_PREFIX);
                writer.line(line);
                State::InNotes
            }
        }
        State::InNotes => {
            if is_delimiter(line) {
                writer.line("---");
                State::Outside
            } else {
                writer.line(line);
                State::InNotes
            }
        }
    }
}

fn in_slide(i: usize, line: &str, writer: &mut Writer) -> State {
    if let Some(text) = heading_text(line) {
        writer.heading(text);
        return State::InSlide;
    }
    if is_yaml_fence(line) {
        return State::Metadata {
            start: i,
            resume: Resume::InSlide,
        };
    }
    if is_marker(line, "script") {
        return State::NotesStart;
    }
    if marker(line).is_some() {
        // unused metadata
        return State::InSlide;
    }
    if is_delimiter(line) {
        writer.line("---");
        return State::Outside;
    }
    if is_braced_fence(line) {
        writer.line("```");
    } else {
        writer.line(line);
    }
    State::InSlide
}
