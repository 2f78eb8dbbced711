//! Error types for course conversion
//!
//! Transducers report a [`LineError`]: an [`ErrorKind`] plus the 0-based offset
//! of the offending line inside the slice they were handed. The Chapter
//! Assembler lifts those into [`Error::Input`] with the chapter and exercise
//! indices and an absolute, 1-based line number.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Input that does not follow the authoring format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Malformed {
    #[error("frontmatter block is not closed by a `--` delimiter")]
    UnterminatedFrontmatter,

    #[error("{block} block is not closed by a ``` fence")]
    UnterminatedBlock { block: &'static str },

    #[error("`@projector_key` marker is not followed by a slide hash")]
    MissingProjectorKey,

    #[error("`@possible_answers` is not followed by an `@sct` block")]
    MissingFeedbackScript,

    #[error("no answer is marked correct")]
    NoCorrectAnswer,

    #[error("more than one answer is marked correct (choices {choices:?})")]
    MultipleCorrectAnswers { choices: Vec<usize> },

    #[error("correct answer {index} is outside the {answers} listed answers")]
    CorrectIndexOutOfRange { index: usize, answers: usize },

    #[error("{messages} feedback messages for {answers} answers")]
    FeedbackCountMismatch { messages: usize, answers: usize },

    #[error("feedback script does not define any messages")]
    MissingFeedback,

    #[error("unsupported feedback statement `{text}`")]
    UnsupportedFeedback { text: String },

    #[error("feedback script mixes `message :=` entries with assignments")]
    MixedFeedbackFormats,
}

/// Failure to resolve a slide hash to exactly one deck.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("no slide deck matches hash `{hash}`")]
    NotFound { hash: String },

    #[error("slide hash `{hash}` is ambiguous: {}", .candidates.join(", "))]
    Ambiguous {
        hash: String,
        candidates: Vec<String>,
    },

    #[error("failed to read slide decks at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What went wrong at a given line.
#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error(transparent)]
    Malformed(#[from] Malformed),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// A linked slide deck failed to convert; `line` is 1-based within the deck.
    #[error("in slide deck {deck}, line {line}: {source}")]
    SlideDeck {
        deck: String,
        line: usize,
        #[source]
        source: Box<ErrorKind>,
    },
}

/// An [`ErrorKind`] at a 0-based line offset of a transducer's input.
#[derive(Debug)]
pub struct LineError {
    pub line: usize,
    pub kind: ErrorKind,
}

impl LineError {
    pub fn new(line: usize, kind: impl Into<ErrorKind>) -> Self {
        Self {
            line,
            kind: kind.into(),
        }
    }
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line offset {}: {}", self.line, self.kind)
    }
}

impl std::error::Error for LineError {}

/// Top-level error for converting a course.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{location}: {kind}")]
    Input { location: Location, kind: ErrorKind },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid chapter pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },
}

impl Error {
    /// Lift a transducer error, given the absolute offset of the slice it saw.
    pub(crate) fn located(
        chapter: usize,
        exercise: Option<usize>,
        base: usize,
        err: LineError,
    ) -> Self {
        Error::Input {
            location: Location {
                chapter,
                exercise,
                line: base + err.line + 1,
            },
            kind: err.kind,
        }
    }

    /// The malformed-input reason, if this is one.
    pub fn malformed(&self) -> Option<&Malformed> {
        match self {
            Error::Input {
                kind: ErrorKind::Malformed(m),
                ..
            } => Some(m),
            _ => None,
        }
    }
}

/// Where in a course an input error was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub chapter: usize,
    /// `None` for the chapter frontmatter.
    pub exercise: Option<usize>,
    /// 1-based line in the chapter file.
    pub line: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chapter {}", self.chapter)?;
        if let Some(n) = self.exercise {
            write!(f, ", exercise {}", n)?;
        }
        write!(f, ", line {}", self.line)
    }
}
