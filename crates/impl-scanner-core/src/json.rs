//! JSON formatting for populated instances.

use serde::{Deserialize, Serialize};

/// Default indentation width (two spaces).
pub const DEFAULT_INDENT: usize = 2;

/// Formatting policy for generated JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonOptions {
    /// Indentation width in spaces; `None` writes compact JSON.
    pub indent: Option<usize>,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            indent: Some(DEFAULT_INDENT),
        }
    }
}

impl JsonOptions {
    /// Single-line output with no whitespace.
    pub fn compact() -> Self {
        Self { indent: None }
    }

    /// Indented output with `width` spaces per level.
    pub fn indented(width: usize) -> Self {
        Self {
            indent: Some(width),
        }
    }
}

/// Serialize `value` according to `options`.
pub fn to_string<T: Serialize + ?Sized>(value: &T, options: &JsonOptions) -> serde_json::Result<String> {
    match options.indent {
        None => serde_json::to_string(value),
        Some(width) => {
            let indent = " ".repeat(width);
            let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
            let mut buf = Vec::new();
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
            value.serialize(&mut ser)?;
            // serde_json only emits valid UTF-8
            Ok(String::from_utf8_lossy(&buf).into_owned())
        }
    }
}

/// Join independently serialized documents into one JSON array.
pub fn join_array<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parts: Vec<S> = items.into_iter().collect();
    let body: Vec<&str> = parts.iter().map(|s| s.as_ref()).collect();
    format!("[{}]", body.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        name: &'static str,
        count: u32,
    }

    #[test]
    fn test_compact_output() {
        let json = to_string(&Sample { name: "a", count: 1 }, &JsonOptions::compact()).unwrap();
        assert_eq!(json, r#"{"name":"a","count":1}"#);
    }

    #[test]
    fn test_indented_output() {
        let json = to_string(&Sample { name: "a", count: 1 }, &JsonOptions::indented(4)).unwrap();
        assert_eq!(json, "{\n    \"name\": \"a\",\n    \"count\": 1\n}");
    }

    #[test]
    fn test_default_is_two_space_indent() {
        assert_eq!(JsonOptions::default().indent, Some(2));
    }

    #[test]
    fn test_join_array() {
        assert_eq!(join_array(Vec::<String>::new()), "[]");
        assert_eq!(join_array(["{\"a\":1}", "{\"b\":2}"]), "[{\"a\":1},{\"b\":2}]");
    }
}
