//! Multiple-choice feedback micro-format
//!
//! Feedback messages for a multiple-choice exercise come from the body of its
//! `@sct` block. The body is never executed. Two formats are understood:
//!
//! Declarative, one entry per answer in answer order:
//!
//! ```text
//! message := Not quite, try again.
//! message := Correct!
//! ```
//!
//! Legacy assignments, a small subset of the scripts found in existing courses:
//!
//! ```text
//! msg1 = "Not quite, try again."
//! msgs = [msg1, 'Correct!']
//! ```
//!
//! Statements are `name = <expr>` where an expression is a string literal, a
//! name bound by an earlier statement, a `[...]` list (may span lines), `+`
//! between strings, or adjacent string literals. The feedback list is `msgs`,
//! or failing that the `msgs=` argument of a check call. Anything outside this
//! subset is rejected.
//!
//! The body is tokenized by a logos lexer and parsed with chumsky; evaluation
//! of the parsed statements happens afterwards, in order.

use crate::decamp::error::{LineError, Malformed};
use chumsky::prelude::*;
use chumsky::select;
use logos::Logos;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;

/// Name the feedback list is bound to.
pub const MESSAGES_NAME: &str = "msgs";

static MSGS_ARGUMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bmsgs\s*=\s*").unwrap());

/// Tokens of the assignment subset
#[derive(Logos, Debug, Clone, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"#[^\n]*")]
enum Tok {
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r"'([^'\\\n]|\\.)*'", |lex| unescape(lex.slice()))]
    Str(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Name(String),

    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token("+")]
    Plus,
    #[token("=")]
    Assign,

    #[token("\n")]
    Newline,

    /// Anything the lexer does not recognize; no parser accepts it.
    Unsupported,
}

/// Token with its byte range in the joined body
type Spanned = (Tok, Range<usize>);

type FeedbackError = Simple<Spanned>;

/// Strip the quotes of a string literal and resolve its escapes.
fn unescape(literal: &str) -> String {
    let inner = &literal[1..literal.len() - 1];
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some(e @ ('\\' | '\'' | '"')) => value.push(e),
            Some(e) => {
                value.push('\\');
                value.push(e);
            }
            None => value.push('\\'),
        }
    }
    value
}

/// Tokenize `source`; newlines inside brackets are dropped so lists may span lines.
fn lex(source: &str) -> Vec<Spanned> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    for (tok, range) in Tok::lexer(source).spanned() {
        let tok = tok.unwrap_or(Tok::Unsupported);
        match tok {
            Tok::LBracket => depth += 1,
            Tok::RBracket => depth = depth.saturating_sub(1),
            Tok::Newline if depth > 0 => continue,
            _ => {}
        }
        tokens.push((tok, range));
    }
    tokens
}

/// Expression of the assignment subset, before names are resolved.
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Str(String),
    /// A name and the byte position it appears at.
    Name(String, usize),
    List(Vec<Expr>),
    Concat(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
struct Statement {
    name: String,
    range: Range<usize>,
    value: Expr,
}

fn token(t: Tok) -> impl Parser<Spanned, (), Error = FeedbackError> + Clone {
    filter(move |(tok, _): &Spanned| tok == &t).ignored()
}

fn expr() -> impl Parser<Spanned, Expr, Error = FeedbackError> + Clone {
    recursive(|expr| {
        let string = select! { (Tok::Str(s), _) => s }
            .repeated()
            .at_least(1)
            .map(|parts: Vec<String>| Expr::Str(parts.concat()));
        let name = select! { (Tok::Name(name), range) => { let range: Range<usize> = range; Expr::Name(name, range.start) } };
        let list = expr
            .separated_by(token(Tok::Comma))
            .allow_trailing()
            .delimited_by(token(Tok::LBracket), token(Tok::RBracket))
            .map(Expr::List);
        let primary = choice((string, name, list));

        primary
            .clone()
            .then(token(Tok::Plus).ignore_then(primary).repeated())
            .map(|(first, rest): (Expr, Vec<Expr>)| {
                if rest.is_empty() {
                    first
                } else {
                    Expr::Concat(std::iter::once(first).chain(rest).collect())
                }
            })
    })
}

/// `name = expr` statements, one per logical line
fn statements() -> impl Parser<Spanned, Vec<Statement>, Error = FeedbackError> {
    let statement = select! { (Tok::Name(name), range) => (name, range) }
        .then_ignore(token(Tok::Assign))
        .then(expr())
        .map(|((name, range), value)| Statement { name, range, value });

    token(Tok::Newline)
        .repeated()
        .ignore_then(
            statement
                .then_ignore(token(Tok::Newline).repeated().at_least(1))
                .repeated(),
        )
        .then_ignore(end())
}

/// Body lines joined into one source, with the byte offset each line starts at.
struct Body<'a> {
    source: String,
    starts: Vec<usize>,
    lines: &'a [(usize, &'a str)],
}

impl<'a> Body<'a> {
    fn new(lines: &'a [(usize, &'a str)]) -> Self {
        let mut source = String::new();
        let mut starts = Vec::with_capacity(lines.len());
        for (_, text) in lines {
            starts.push(source.len());
            source.push_str(text);
            source.push('\n');
        }
        Self {
            source,
            starts,
            lines,
        }
    }

    /// Offset and text of the line holding byte `pos`.
    fn line_at(&self, pos: usize) -> (usize, &'a str) {
        let index = self
            .starts
            .partition_point(|&start| start <= pos)
            .saturating_sub(1);
        self.lines.get(index).copied().unwrap_or((0, ""))
    }

    fn unsupported_at(&self, pos: usize) -> LineError {
        let (offset, text) = self.line_at(pos);
        LineError::new(
            offset,
            Malformed::UnsupportedFeedback {
                text: text.trim().to_string(),
            },
        )
    }

    /// Report the first parse error at the line of the token it found.
    fn parse_error(&self, tokens: &[Spanned], errors: &[FeedbackError]) -> LineError {
        let pos = errors
            .first()
            .and_then(|err| err.found())
            .or_else(|| tokens.last())
            .map(|(_, range)| range.start)
            .unwrap_or(0);
        self.unsupported_at(pos)
    }
}

/// A value of the assignment subset.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Str(String),
    List(Vec<Value>),
}

type Bindings = HashMap<String, (usize, Value)>;

/// Resolve `expr` against earlier bindings; `at` locates errors not tied to a name.
fn evaluate(body: &Body<'_>, bindings: &Bindings, expr: &Expr, at: usize) -> Result<Value, LineError> {
    match expr {
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Name(name, pos) => bindings
            .get(name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| body.unsupported_at(*pos)),
        Expr::List(items) => items
            .iter()
            .map(|item| evaluate(body, bindings, item, at))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Expr::Concat(parts) => {
            let mut joined = String::new();
            for part in parts {
                match evaluate(body, bindings, part, at)? {
                    Value::Str(s) => joined.push_str(&s),
                    Value::List(_) => return Err(body.unsupported_at(at)),
                }
            }
            Ok(Value::Str(joined))
        }
    }
}

/// A parsed feedback body.
#[derive(Debug, Clone, Default)]
pub struct FeedbackScript {
    /// `message :=` entries in order.
    declared: Vec<String>,
    /// Name -> (defining line, value).
    bindings: Bindings,
    /// First line of the block, used for errors not tied to a statement.
    start: usize,
}

impl FeedbackScript {
    /// Parse the body lines of an `@sct` block; each line carries its offset.
    pub fn parse(start: usize, lines: &[(usize, String)]) -> Result<Self, LineError> {
        let mut script = FeedbackScript {
            start,
            ..Default::default()
        };
        let mut rest = Vec::new();
        let mut first_declared = None;
        for (offset, line) in lines {
            match declared_message(line) {
                Some(text) => {
                    first_declared.get_or_insert(*offset);
                    script.declared.push(text.to_string());
                }
                None => rest.push((*offset, line.as_str())),
            }
        }

        let body = Body::new(&rest);
        let tokens = lex(&body.source);
        let parsed = statements()
            .parse(tokens.clone())
            .map_err(|errors| body.parse_error(&tokens, &errors))?;

        for statement in parsed {
            let (line, _) = body.line_at(statement.range.start);
            if let Some(offset) = first_declared {
                return Err(LineError::new(offset.min(line), Malformed::MixedFeedbackFormats));
            }
            let value = evaluate(&body, &script.bindings, &statement.value, statement.range.start)?;
            script.bindings.insert(statement.name, (line, value));
        }
        Ok(script)
    }

    /// Resolve the per-answer feedback messages.
    ///
    /// `check_calls` are the `Ex()` lines of the block, searched for a `msgs=`
    /// argument when the body does not bind `msgs` itself.
    pub fn messages(&self, check_calls: &[(usize, String)]) -> Result<Vec<String>, LineError> {
        if !self.declared.is_empty() {
            return Ok(self.declared.clone());
        }
        if let Some((line, value)) = self.bindings.get(MESSAGES_NAME) {
            return string_list(*line, value);
        }
        for (offset, call) in check_calls {
            let Some(found) = MSGS_ARGUMENT.find(call) else {
                continue;
            };
            let remainder = [(*offset, &call[found.end()..])];
            let body = Body::new(&remainder);
            let tokens = lex(&body.source);
            let argument = expr()
                .parse(tokens.clone())
                .map_err(|errors| body.parse_error(&tokens, &errors))?;
            let value = evaluate(&body, &self.bindings, &argument, 0)?;
            return string_list(*offset, &value);
        }
        Err(LineError::new(self.start, Malformed::MissingFeedback))
    }
}

fn declared_message(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("message")?;
    rest.trim_start().strip_prefix(":=").map(str::trim)
}

fn string_list(line: usize, value: &Value) -> Result<Vec<String>, LineError> {
    let not_strings = || {
        LineError::new(
            line,
            Malformed::UnsupportedFeedback {
                text: format!("{} must be a list of strings", MESSAGES_NAME),
            },
        )
    };
    match value {
        Value::List(items) => items
            .iter()
            .map(|item| match item {
                Value::Str(s) => Ok(s.clone()),
                Value::List(_) => Err(not_strings()),
            })
            .collect(),
        Value::Str(_) => Err(not_strings()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decamp::error::ErrorKind;

    fn body(source: &str) -> Vec<(usize, String)> {
        source
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 10, l.to_string()))
            .collect()
    }

    fn messages(source: &str) -> Result<Vec<String>, LineError> {
        FeedbackScript::parse(9, &body(source))?.messages(&[])
    }

    fn unsupported_line(err: LineError) -> usize {
        assert!(
            matches!(
                err.kind,
                ErrorKind::Malformed(Malformed::UnsupportedFeedback { .. })
            ),
            "unexpected {:?}",
            err.kind
        );
        err.line
    }

    #[test]
    fn test_literal_list() {
        let msgs = messages(r#"msgs = ["wrong1", "right", 'wrong2']"#).unwrap();
        assert_eq!(msgs, vec!["wrong1", "right", "wrong2"]);
    }

    #[test]
    fn test_names_and_multiline_list() {
        let msgs = messages(
            "# feedback\nmsg1 = \"Not quite.\"\nmsg2 = 'Yes!' # right one\n\nmsgs = [\n    msg1,\n    msg2,\n]\n",
        )
        .unwrap();
        assert_eq!(msgs, vec!["Not quite.", "Yes!"]);
    }

    #[test]
    fn test_concatenation_and_escapes() {
        let msgs = messages(r#"msgs = ["It\'s " + "close", "line\none" "!"]"#).unwrap();
        assert_eq!(msgs, vec!["It's close", "line\none!"]);
    }

    #[test]
    fn test_declarative_entries() {
        let msgs = messages("message := Try again.\n\nmessage:=Well done!\n").unwrap();
        assert_eq!(msgs, vec!["Try again.", "Well done!"]);
    }

    #[test]
    fn test_mixed_formats_rejected() {
        let err = messages("message := One\nmsgs = ['x']\n").unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::Malformed(Malformed::MixedFeedbackFormats)
        ));
    }

    #[test]
    fn test_msgs_argument_of_check_call() {
        let script = FeedbackScript::parse(0, &body("m1 = 'no'\nm2 = 'yes'\n")).unwrap();
        let calls = vec![(
            20,
            "Ex().has_chosen(correct=2, msgs=[m1, m2])".to_string(),
        )];
        assert_eq!(script.messages(&calls).unwrap(), vec!["no", "yes"]);
    }

    #[test]
    fn test_missing_feedback() {
        let err = messages("only = 'one'\n").unwrap_err();
        assert_eq!(err.line, 9);
        assert!(matches!(
            err.kind,
            ErrorKind::Malformed(Malformed::MissingFeedback)
        ));
    }

    #[test]
    fn test_code_is_rejected_with_line() {
        let err = messages("msg1 = 'a'\nimport os\n").unwrap_err();
        assert_eq!(unsupported_line(err), 11);

        let err = messages("msgs = [open('x').read()]\n").unwrap_err();
        assert_eq!(unsupported_line(err), 10);
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = messages("msgs = [undefined]\n").unwrap_err();
        assert_eq!(unsupported_line(err), 10);
    }

    #[test]
    fn test_msgs_must_be_string_list() {
        let err = messages("msgs = 'single'\n").unwrap_err();
        assert_eq!(unsupported_line(err), 10);
    }

    #[test]
    fn test_bindings_record_defining_line() {
        let script = FeedbackScript::parse(0, &body("a = 'x'\nb = [a, a]\n")).unwrap();
        assert_eq!(script.bindings.get("a"), Some(&(10, Value::Str("x".into()))));
        assert_eq!(
            script.bindings.get("b"),
            Some(&(
                11,
                Value::List(vec![Value::Str("x".into()), Value::Str("x".into())])
            ))
        );
    }

    #[test]
    fn test_lexer_tokens() {
        let tokens: Vec<Tok> = lex("msgs = [m1, # note\n 'a\\'b' + \"c\"]\n?")
            .into_iter()
            .map(|(tok, _)| tok)
            .collect();
        assert_eq!(
            tokens,
            vec![
                Tok::Name("msgs".into()),
                Tok::Assign,
                Tok::LBracket,
                Tok::Name("m1".into()),
                Tok::Comma,
                Tok::Str("a'b".into()),
                Tok::Plus,
                Tok::Str("c".into()),
                Tok::RBracket,
                Tok::Newline,
                Tok::Unsupported,
            ]
        );
    }

    #[test]
    fn test_list_concatenation_is_rejected() {
        let err = messages("a = ['x']\nmsgs = [a + 'y']\n").unwrap_err();
        assert_eq!(unsupported_line(err), 11);
    }
}
