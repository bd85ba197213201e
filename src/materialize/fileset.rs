//! Parsing a model's multi-file draft into a validated [`FileSet`].
//!
//! The draft is untrusted text. It may be wrapped in a code fence, surrounded
//! by prose, or not a file map at all. Decoding runs an ordered list of
//! strategies and the first one that yields JSON wins; the decoded value is
//! then held to the file-map invariants.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use super::SOURCE_EXTENSION;

/// Extensions that mark a key as a file path even without a separator.
pub const PATH_LIKE_EXTENSIONS: &[&str] = &[".py", ".md", ".txt", ".yaml", ".yml", ".json"];

/// Reasons a draft could not be turned into a [`FileSet`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The draft was blank.
    #[error("model returned an empty files draft")]
    EmptyDraft,

    /// No decoding strategy produced JSON.
    #[error("model did not return a valid JSON object for files ({0})")]
    InvalidStructure(String),

    /// The JSON decoded to something other than an object.
    #[error("files JSON must be an object, got {0}")]
    NotAnObject(&'static str),

    /// No key looked like a file path.
    #[error("JSON did not look like a files map (no path-like keys)")]
    NoPathLikeKeys,

    /// A value under a path-like key was not a string.
    #[error("files JSON values must be strings (key {0:?} is not)")]
    NonStringValue(String),
}

/// One way of pulling a JSON value out of fence-stripped draft text.
struct DecodeStrategy {
    name: &'static str,
    decode: fn(&str) -> Result<Value, String>,
}

const STRATEGIES: &[DecodeStrategy] = &[
    DecodeStrategy { name: "direct decode", decode: decode_direct },
    DecodeStrategy { name: "brace extraction", decode: decode_braced },
];

fn decode_direct(text: &str) -> Result<Value, String> {
    serde_json::from_str(text).map_err(|e| e.to_string())
}

/// Decodes the greedy span from the first `{` to the last `}`.
fn decode_braced(text: &str) -> Result<Value, String> {
    let start = text.find('{').ok_or("no '{' found")?;
    let end = text.rfind('}').ok_or("no '}' found")?;
    if end < start {
        return Err("no {...} span found".to_string());
    }
    serde_json::from_str(&text[start..=end]).map_err(|e| e.to_string())
}

/// A validated mapping from project-relative path to file content.
///
/// Every value is normalized to end in exactly one newline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: BTreeMap<String, String>,
}

impl FileSet {
    /// Parses a raw model draft.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] naming the first invariant the draft violates.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let text = strip_fence(raw);
        if text.is_empty() {
            return Err(ParseError::EmptyDraft);
        }

        let mut failures = Vec::new();
        let mut decoded = None;
        for strategy in STRATEGIES {
            match (strategy.decode)(&text) {
                Ok(value) => {
                    decoded = Some(value);
                    break;
                }
                Err(reason) => failures.push(format!("{}: {reason}", strategy.name)),
            }
        }
        let value = decoded.ok_or_else(|| ParseError::InvalidStructure(failures.join("; ")))?;

        Self::from_value(value)
    }

    fn from_value(value: Value) -> Result<Self, ParseError> {
        let object = match value {
            Value::Object(object) => object,
            Value::Array(_) => return Err(ParseError::NotAnObject("an array")),
            Value::String(_) => return Err(ParseError::NotAnObject("a string")),
            Value::Number(_) => return Err(ParseError::NotAnObject("a number")),
            Value::Bool(_) => return Err(ParseError::NotAnObject("a boolean")),
            Value::Null => return Err(ParseError::NotAnObject("null")),
        };

        if !object.keys().any(|k| is_path_like(k)) {
            return Err(ParseError::NoPathLikeKeys);
        }

        let mut files = BTreeMap::new();
        for (path, content) in object {
            let Value::String(content) = content else {
                return Err(ParseError::NonStringValue(path));
            };
            files.insert(path, normalize_content(&content));
        }
        Ok(Self { files })
    }

    /// Number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if there are no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Content of one file, if present.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Iterates `(path, content)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Paths of the Python source files, in path order.
    #[must_use]
    pub fn source_files(&self) -> Vec<&str> {
        let suffix = format!(".{SOURCE_EXTENSION}");
        self.files.keys().filter(|k| k.ends_with(&suffix)).map(String::as_str).collect()
    }
}

impl IntoIterator for FileSet {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

/// Returns `true` if a key looks like a file path rather than a free-text label.
#[must_use]
pub fn is_path_like(key: &str) -> bool {
    key.contains('/') || key.contains('\\') || PATH_LIKE_EXTENSIONS.iter().any(|ext| key.ends_with(ext))
}

/// Trims trailing whitespace and terminates with exactly one newline.
#[must_use]
pub fn normalize_content(content: &str) -> String {
    let mut out = content.trim_end().to_string();
    out.push('\n');
    out
}

/// Removes one surrounding code fence: a leading line and a trailing line
/// that start with three backticks. Not recursive.
#[must_use]
pub fn strip_fence(text: &str) -> String {
    let mut lines: Vec<&str> = text.trim().lines().collect();
    if lines.first().is_some_and(|l| is_fence(l)) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| is_fence(l)) {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

/// Cleans a single-module draft: drops a "Here is the code:" preamble and one
/// fence layer.
#[must_use]
pub fn strip_code_fences(text: &str) -> String {
    const PREAMBLE: &str = "here is the code:";
    let trimmed = text.trim();
    let body = match trimmed.get(..PREAMBLE.len()) {
        Some(head) if head.eq_ignore_ascii_case(PREAMBLE) => &trimmed[PREAMBLE.len()..],
        _ => trimmed,
    };
    strip_fence(body)
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_files_map() {
        let raw = "```json\n{\"app.py\": \"import helper\", \"helper.py\": \"x = 1\\n\\n\"}\n```";
        let files = FileSet::parse(raw).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files.get("app.py"), Some("import helper\n"));
        assert_eq!(files.get("helper.py"), Some("x = 1\n"));
    }

    #[test]
    fn keeps_exactly_the_decoded_keys() {
        let raw = r#"{"proj/a.py": "", "proj/b.py": "b", "README.md": "hi"}"#;
        let files = FileSet::parse(raw).unwrap();

        let keys: Vec<&str> = files.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["README.md", "proj/a.py", "proj/b.py"]);
        assert_eq!(files.get("proj/a.py"), Some("\n"));
        assert_eq!(files.source_files(), vec!["proj/a.py", "proj/b.py"]);
    }

    #[test]
    fn extracts_object_from_surrounding_prose() {
        let raw = "Sure! Here are the files:\n{\"a.py\": \"1\", \"b.py\": \"2\"}\nEnjoy.";
        let files = FileSet::parse(raw).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn strips_only_one_fence_layer() {
        let raw = "```\n```json\n{\"a.py\": \"1\"}\n```\n```";
        assert_eq!(strip_fence(raw), "```json\n{\"a.py\": \"1\"}\n```");
        // The inner fence is still prose around the object; brace extraction recovers it.
        assert!(FileSet::parse(raw).is_ok());
    }

    #[test]
    fn empty_or_fence_only_draft_is_empty() {
        assert_eq!(FileSet::parse("   \n"), Err(ParseError::EmptyDraft));
        assert_eq!(FileSet::parse("```\n```"), Err(ParseError::EmptyDraft));
    }

    #[test]
    fn unparseable_text_reports_every_strategy() {
        let Err(ParseError::InvalidStructure(reason)) = FileSet::parse("def main():\n    pass")
        else {
            panic!("expected InvalidStructure");
        };
        assert!(reason.contains("direct decode"));
        assert!(reason.contains("brace extraction"));
    }

    #[test]
    fn rejects_plain_key_value_answers() {
        let raw = r#"{"summary": "a calculator", "steps": "write code"}"#;
        assert_eq!(FileSet::parse(raw), Err(ParseError::NoPathLikeKeys));
    }

    #[test]
    fn rejects_non_object_values() {
        assert_eq!(FileSet::parse(r#"["a.py"]"#), Err(ParseError::NotAnObject("an array")));
        assert_eq!(FileSet::parse("42"), Err(ParseError::NotAnObject("a number")));
    }

    #[test]
    fn rejects_non_string_contents() {
        let raw = r#"{"a.py": "x", "b.py": 3}"#;
        assert_eq!(FileSet::parse(raw), Err(ParseError::NonStringValue("b.py".into())));
    }

    #[test]
    fn path_likeness() {
        assert!(is_path_like("src/app"));
        assert!(is_path_like("src\\app"));
        assert!(is_path_like("notes.md"));
        assert!(is_path_like("config.yml"));
        assert!(!is_path_like("summary"));
        assert!(!is_path_like("app.rs"));
    }

    #[test]
    fn single_module_cleanup_drops_preamble_and_fence() {
        let raw = "Here is the code:\n```python\nprint('hi')   \n```\n";
        assert_eq!(strip_code_fences(raw), "print('hi')");
        assert_eq!(strip_code_fences("HERE IS THE CODE: x = 1"), "x = 1");
        assert_eq!(strip_code_fences("print(1)"), "print(1)");
    }
}
