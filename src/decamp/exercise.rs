//! Exercise transducer
//!
//! Scans one exercise of a chapter and returns its chapter fragment, any extra
//! files (slide documents) and the unconsumed lines. An exercise looks like:
//!
//! ```text
//! ## Exercise title
//!
//! ```yaml
//! type: MultipleChoiceExercise
//! key: 6b2c1f0e3a
//! ```
//!
//! Which city is the capital of France?
//!
//! `@possible_answers`
//! - Paris
//! - London
//!
//! `@sct`
//! ```{python}
//! msgs = ["Correct!", "No, that is in the UK."]
//! Ex().has_chosen(correct=1, msgs=msgs)
//! ```
//!
//! ---
//! ```
//!
//! The exercise ends at a `---` line or at the end of input. The scan is a
//! single loop over an explicit [`State`]; each state handles one sub-grammar.
//! The opening `<exercise>` tag is emitted once, as soon as the metadata block
//! has been read and the kind is known.

use crate::decamp::choice::{
    answer_text, assign_feedback, escape_attribute, mark_correct, render_choices, Choice,
    CHECK_CALL_PREFIX,
};
use crate::decamp::error::{ErrorKind, LineError, Malformed};
use crate::decamp::feedback::FeedbackScript;
use crate::decamp::frontmatter::PLACEHOLDER;
use crate::decamp::lines::{heading_text, is_delimiter, is_fence, is_marker, is_yaml_fence};
use crate::decamp::output::{OutputLayout, Outputs};
use crate::decamp::slide_source::SlideSource;
use crate::decamp::slides::transduce_slides;
use serde::Deserialize;
use tracing::debug;

/// How an exercise is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseKind {
    /// Video exercise backed by a slide deck.
    Slides,
    /// Multiple-choice exercise.
    Choice,
    /// Anything else. Rendered as an empty `<exercise>`.
    Plain,
}

impl ExerciseKind {
    /// Look up the `type` value of a metadata block.
    pub fn from_type(name: Option<&str>) -> Self {
        match name.map(str::to_ascii_lowercase).as_deref() {
            Some("videoexercise") => ExerciseKind::Slides,
            Some("multiplechoiceexercise") => ExerciseKind::Choice,
            _ => ExerciseKind::Plain,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// The `type` value of a metadata block.
///
/// Blocks that are not valid yaml, or whose `type` is not a string, are
/// scanned for a `type:` line instead; the other keys are never validated.
fn metadata_type(yaml: &str) -> Option<String> {
    if yaml.trim().is_empty() {
        return None;
    }
    match serde_yaml::from_str::<Metadata>(yaml) {
        Ok(metadata) => metadata.kind,
        Err(e) => {
            debug!("Scanning metadata for `type:` ({})", e);
            yaml.lines().find_map(|line| {
                let value = line.strip_prefix("type:")?.trim();
                Some(value.trim_matches(|c| c == '"' || c == '\'').to_string())
            })
        }
    }
}

/// What an exercise transducer needs besides its lines.
pub struct ExerciseContext<'a> {
    /// Exercise index within the chapter, from 1.
    pub n: usize,
    pub n_chapter: usize,
    pub layout: &'a OutputLayout,
    pub slides: &'a dyn SlideSource,
}

/// What one exercise contributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExerciseOutput {
    /// Appended to the host chapter file.
    pub fragment: String,
    /// Additional files, keyed by output path.
    pub files: Outputs,
}

impl ExerciseOutput {
    pub fn is_empty(&self) -> bool {
        self.fragment.is_empty() && self.files.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Body,
    /// Inside a ```` ```yaml ```` block opened at `start`.
    Metadata { start: usize },
    /// The next line holds the slide hash.
    ProjectorKey { marker: usize },
    /// Reading `- ` answers after `@possible_answers` at `start`.
    Answers { start: usize },
    /// Looking for `@sct` after the answers.
    SeekingCheck { start: usize },
    /// The line after `@sct` (at `start`) opens the script fence.
    CheckFence { start: usize },
    /// Inside the feedback script of `@sct` at `start`.
    Check { start: usize },
}

enum Flow {
    Next(State),
    Close,
}

struct Scanner<'c, 'a> {
    ctx: &'c ExerciseContext<'a>,
    title: Option<String>,
    kind: Option<ExerciseKind>,
    output: ExerciseOutput,
    yaml: String,
    choices: Vec<Choice>,
    script: Vec<(usize, String)>,
    calls: Vec<(usize, String)>,
}

/// Transduce the exercise at the front of `lines`.
///
/// Returns the exercise output and the lines after its closing delimiter. When
/// the input ends, the remainder is empty; an input without any discernible
/// exercise yields an empty output.
pub fn transduce_exercise<'l>(
    ctx: &ExerciseContext<'_>,
    lines: &'l [String],
) -> Result<(ExerciseOutput, &'l [String]), LineError> {
    let mut scanner = Scanner::new(ctx);
    let mut state = State::Body;

    for (i, line) in lines.iter().enumerate() {
        match scanner.step(state, i, line)? {
            Flow::Next(next) => state = next,
            Flow::Close => {
                scanner.close();
                return Ok((scanner.output, &lines[i + 1..]));
            }
        }
    }

    scanner.finish(state)?;
    Ok((scanner.output, &lines[lines.len()..]))
}

impl<'c, 'a> Scanner<'c, 'a> {
    fn new(ctx: &'c ExerciseContext<'a>) -> Self {
        Self {
            ctx,
            title: None,
            kind: None,
            output: ExerciseOutput::default(),
            yaml: String::new(),
            choices: Vec::new(),
            script: Vec::new(),
            calls: Vec::new(),
        }
    }

    fn step(&mut self, state: State, i: usize, line: &str) -> Result<Flow, LineError> {
        let next = match state {
            State::Body => return Ok(self.body(i, line)),
            State::Metadata { .. } => {
                if is_fence(line) {
                    self.resolve_kind();
                    State::Body
                } else {
                    self.yaml.push_str(line);
                    self.yaml.push('\n');
                    state
                }
            }
            State::ProjectorKey { marker } => {
                self.link_slides(marker, i, line)?;
                State::Body
            }
            State::Answers { start } => match answer_text(line) {
                Some(answer) => {
                    self.choices.push(Choice::new(answer));
                    state
                }
                None => self.seek_check(start, i, line)?,
            },
            State::SeekingCheck { start } => self.seek_check(start, i, line)?,
            State::CheckFence { start } => State::Check { start },
            State::Check { start } => {
                if is_fence(line) {
                    self.finish_choice(start)?;
                    State::Body
                } else if line.trim_start().starts_with(CHECK_CALL_PREFIX) {
                    self.calls.push((i, line.to_string()));
                    state
                } else {
                    self.script.push((i, line.to_string()));
                    state
                }
            }
        };
        Ok(Flow::Next(next))
    }

    fn body(&mut self, i: usize, line: &str) -> Flow {
        if is_delimiter(line) {
            return Flow::Close;
        }
        if let Some(title) = heading_text(line) {
            self.title = Some(title.to_string());
            return Flow::Next(State::Body);
        }
        if is_yaml_fence(line) {
            self.yaml.clear();
            return Flow::Next(State::Metadata { start: i });
        }
        match self.kind {
            Some(ExerciseKind::Slides) if is_marker(line, "projector_key") => {
                return Flow::Next(State::ProjectorKey { marker: i })
            }
            Some(ExerciseKind::Choice) if is_marker(line, "possible_answers") => {
                self.choices.clear();
                return Flow::Next(State::Answers { start: i });
            }
            Some(ExerciseKind::Choice) => {
                self.output.fragment.push_str(line);
                self.output.fragment.push('\n');
            }
            _ => {}
        }
        Flow::Next(State::Body)
    }

    fn resolve_kind(&mut self) {
        if self.kind.is_some() {
            debug!(
                "Exercise {} of chapter {}: ignoring extra metadata block",
                self.ctx.n, self.ctx.n_chapter
            );
            return;
        }
        let type_name = metadata_type(&self.yaml);
        let kind = ExerciseKind::from_type(type_name.as_deref());
        debug!(
            "Exercise {} of chapter {}: type {:?} -> {:?}",
            self.ctx.n, self.ctx.n_chapter, type_name, kind
        );
        self.kind = Some(kind);

        let title = escape_attribute(self.title.as_deref().unwrap_or(PLACEHOLDER));
        let fragment = &mut self.output.fragment;
        fragment.push_str(&format!(
            "<exercise id=\"{}\" title=\"{}\"",
            self.ctx.n, title
        ));
        if kind == ExerciseKind::Slides {
            fragment.push_str(" type=\"slides\"");
        }
        fragment.push_str(">\n\n");
    }

    fn link_slides(&mut self, marker: usize, i: usize, line: &str) -> Result<(), LineError> {
        let hash = line.trim();
        if hash.is_empty() {
            return Err(LineError::new(marker, Malformed::MissingProjectorKey));
        }
        let deck = self
            .ctx
            .slides
            .find(hash)
            .map_err(|e| LineError::new(i, e))?;
        let document = transduce_slides(&deck.lines).map_err(|e| {
            LineError::new(
                i,
                ErrorKind::SlideDeck {
                    deck: deck.name.clone(),
                    line: e.line + 1,
                    source: Box::new(e.kind),
                },
            )
        })?;

        let (n_chapter, n) = (self.ctx.n_chapter, self.ctx.n);
        self.output
            .files
            .insert(self.ctx.layout.slide_path(n_chapter, n), document);
        self.output.fragment.push_str(&format!(
            "<slides source=\"{}\"></slides>\n\n",
            OutputLayout::slide_source(n_chapter, n)
        ));
        Ok(())
    }

    fn seek_check(&mut self, start: usize, i: usize, line: &str) -> Result<State, LineError> {
        if is_marker(line, "sct") {
            Ok(State::CheckFence { start: i })
        } else if is_delimiter(line) {
            Err(LineError::new(start, Malformed::MissingFeedbackScript))
        } else {
            Ok(State::SeekingCheck { start })
        }
    }

    fn finish_choice(&mut self, start: usize) -> Result<(), LineError> {
        let mut choices = std::mem::take(&mut self.choices);
        let script = std::mem::take(&mut self.script);
        let calls = std::mem::take(&mut self.calls);

        mark_correct(&mut choices, &calls, start)?;
        let messages = FeedbackScript::parse(start, &script)?.messages(&calls)?;
        assign_feedback(&mut choices, messages, start)?;

        self.output.fragment.push_str(&render_choices(&choices));
        self.output.fragment.push('\n');
        Ok(())
    }

    fn close(&mut self) {
        if self.kind.is_some() {
            self.output.fragment.push_str("</exercise>\n\n");
        }
    }

    /// End of input in `state`.
    fn finish(&mut self, state: State) -> Result<(), LineError> {
        match state {
            State::Body => {
                self.close();
                Ok(())
            }
            State::Metadata { start } => Err(LineError::new(
                start,
                Malformed::UnterminatedBlock {
                    block: "yaml metadata",
                },
            )),
            State::ProjectorKey { marker } => {
                Err(LineError::new(marker, Malformed::MissingProjectorKey))
            }
            State::Answers { start } | State::SeekingCheck { start } => {
                Err(LineError::new(start, Malformed::MissingFeedbackScript))
            }
            State::CheckFence { start } | State::Check { start } => Err(LineError::new(
                start,
                Malformed::UnterminatedBlock {
                    block: "feedback script",
                },
            )),
        }
    }
}
