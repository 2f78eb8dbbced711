//! Property-based tests for chapter frontmatter extraction
//!
//! For any chapter index the navigation links are `n - 1` and `n + 1`, and the
//! lines after the closing delimiter come back untouched.

use decamp::decamp::{extract_frontmatter, Frontmatter};
use proptest::prelude::*;

/// Field values as authors write them: no leading dashes, no line breaks
fn field_value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 ,.'()?!-]{0,30}"
}

/// Body lines that never look like a frontmatter delimiter
fn body_line_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "## [A-Za-z ]{1,20}",
        "[A-Za-z`@][A-Za-z0-9 `@]{0,30}",
        Just("---".to_string()),
    ]
}

proptest! {
    #[test]
    fn links_follow_chapter_index(
        n in 1usize..10_000,
        title in field_value_strategy(),
        description in field_value_strategy(),
        body in prop::collection::vec(body_line_strategy(), 0..20),
    ) {
        let mut lines = vec![
            "---".to_string(),
            format!("title: {}", title),
            "key: 4f2a".to_string(),
            format!("description: {}", description),
            "---".to_string(),
        ];
        lines.extend(body.iter().cloned());

        let (frontmatter, rest) = extract_frontmatter(n, &lines).unwrap();
        let rendered = frontmatter.render();

        let prev = format!("prev: /chapter{}\n", n - 1);
        let next = format!("next: /chapter{}\n", n + 1);
        let id = format!("id: {}\n", n);
        prop_assert!(rendered.contains(&prev));
        prop_assert!(rendered.contains(&next));
        prop_assert!(rendered.contains(&id));
        prop_assert_eq!(frontmatter.title.as_deref(), Some(title.trim()));
        prop_assert_eq!(frontmatter.description.as_deref(), Some(description.trim()));
        prop_assert_eq!(rest, &body[..]);
    }

    #[test]
    fn rendering_is_eight_lines(n in 1usize..10_000) {
        let rendered = Frontmatter::new(n).render();
        prop_assert_eq!(rendered.lines().count(), 8);
        prop_assert!(rendered.starts_with("---\ntitle: None\ndescription: None\n"));
        let tail = format!("type: chapter\nid: {}\n---\n", n);
        prop_assert!(rendered.ends_with(&tail));
    }
}
