//! Line stream helpers
//!
//! Every transducer works on `&[String]` with the line terminators removed and
//! hands back the unconsumed suffix as a sub-slice. The predicates here are the
//! marker classifications shared by the chapter, exercise and slide grammars.

/// Split source text into a line stream (handles `\n` and `\r\n`).
pub fn split_lines(source: &str) -> Vec<String> {
    source.lines().map(str::to_string).collect()
}

/// Frontmatter delimiter of a chapter file (`--` prefix).
pub fn is_frontmatter_delimiter(line: &str) -> bool {
    line.starts_with("--")
}

/// Exercise and slide delimiter (`---` prefix).
pub fn is_delimiter(line: &str) -> bool {
    line.starts_with("---")
}

/// Text after a `##` heading marker, trimmed.
pub fn heading_text(line: &str) -> Option<&str> {
    line.strip_prefix("##").map(str::trim)
}

/// Opening fence of a yaml metadata block.
pub fn is_yaml_fence(line: &str) -> bool {
    line.trim_start().starts_with("```yaml")
}

/// Any fence line, used to close metadata and script blocks.
pub fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Fence opened with the doubled-brace variant (```` ```{{ ````).
pub fn is_braced_fence(line: &str) -> bool {
    line.trim_start().starts_with("```{{")
}

/// Backtick metadata marker such as `` `@script` ``, returned without the backticks.
pub fn marker(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("`@")?;
    Some(rest.split('`').next().unwrap_or(rest))
}

/// True when the line is the given backtick marker.
pub fn is_marker(line: &str, name: &str) -> bool {
    marker(line) == Some(name)
}
