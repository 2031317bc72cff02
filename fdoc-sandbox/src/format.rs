//! Presenting captured values.
//!
//! Values are pretty-printed as JSON and either written to a fixture file
//! or inserted as a doc comment after the snippet. Doc comments can be
//! found and removed again.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::ops::Range;

static DOC_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*\*.*?\*/").expect("doc comment pattern"));

/// A single value prints as itself, anything else as the whole list.
pub fn format_values(values: &[Value]) -> String {
    let rendered = match values {
        [single] => serde_json::to_string_pretty(single),
        _ => serde_json::to_string_pretty(values),
    };
    rendered.unwrap_or_else(|_| "[]".to_string())
}

/// Wraps formatted values in a doc comment, ready to insert after the
/// snippet.
pub fn comment_block(formatted: &str) -> String {
    format!("\n/**\n*\n{}\n*/", formatted)
}

/// Byte ranges of every `/** ... */` block in `text`.
pub fn find_doc_comments(text: &str) -> Vec<Range<usize>> {
    DOC_COMMENT.find_iter(text).map(|m| m.range()).collect()
}

/// Removes one comment, together with the line break [`comment_block`]
/// put in front of it.
pub fn remove_comment(text: &str, range: Range<usize>) -> String {
    let start = if text[..range.start].ends_with('\n') {
        range.start - 1
    } else {
        range.start
    };
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..start]);
    out.push_str(&text[range.end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_values() {
        assert_eq!(format_values(&[json!(2)]), "2");
        assert_eq!(format_values(&[json!({ "a": 1 })]), "{\n  \"a\": 1\n}");
        assert_eq!(format_values(&[json!(1), json!("x")]), "[\n  1,\n  \"x\"\n]");
        assert_eq!(format_values(&[]), "[]");
    }

    #[test]
    fn test_comment_round_trip() {
        let snippet = "console.log(1 + 1)";
        let text = format!("{}{}\nnext();", snippet, comment_block(&format_values(&[json!(2)])));
        assert_eq!(text, "console.log(1 + 1)\n/**\n*\n2\n*/\nnext();");

        let comments = find_doc_comments(&text);
        assert_eq!(comments.len(), 1);
        assert_eq!(&text[comments[0].clone()], "/**\n*\n2\n*/");

        assert_eq!(remove_comment(&text, comments[0].clone()), "console.log(1 + 1)\nnext();");
    }

    #[test]
    fn test_finds_every_comment_lazily() {
        let text = "/** a */ code /* plain */ /**\n b\n */";
        let comments = find_doc_comments(text);
        assert_eq!(comments.len(), 2);
        assert_eq!(&text[comments[0].clone()], "/** a */");
        assert_eq!(remove_comment(text, comments[0].clone()), " code /* plain */ /**\n b\n */");
    }
}
