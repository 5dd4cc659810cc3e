// src/collector/format.rs
//! Flattens call arguments into one message string

use crate::collector::entry::Arg;

/// Render each argument and join them with a single space.
pub fn format_args(args: &[Arg]) -> String {
    args.iter().map(format_arg).collect::<Vec<_>>().join(" ")
}

/// Render one argument. Strings pass through, error-like values become
/// `name: message`, everything else is serialized as JSON with a `Debug`
/// fallback when serialization fails.
pub fn format_arg(arg: &Arg) -> String {
    if let Some(text) = arg.as_text() {
        return text.to_string();
    }
    if let Some(err) = arg.as_error() {
        return err.to_string();
    }
    match arg {
        Arg::Json(value) => value.to_string(),
        Arg::Value(value) => match value.to_json() {
            Ok(json) => json.to_string(),
            Err(_) => format!("{value:?}"),
        },
        // Text and Error are handled above.
        Arg::Text(text) => text.clone(),
        Arg::Error(err) => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::entry::ErrorValue;
    use serde::{Serialize, Serializer};
    use serde_json::json;

    #[derive(Debug)]
    struct Node {
        name: &'static str,
    }

    impl Serialize for Node {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("circular reference"))
        }
    }

    #[derive(Debug, Serialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_strings_pass_through_and_join_with_space() {
        let args = crate::args!["hello", String::from("world")];
        assert_eq!(format_args(&args), "hello world");
    }

    #[test]
    fn test_error_formats_as_name_and_message() {
        let args = crate::args!["failed:", ErrorValue::new("Error", "boom")];
        assert_eq!(format_args(&args), "failed: Error: boom");
    }

    #[test]
    fn test_structured_values_serialize_as_json() {
        let args = vec![Arg::value(Point { x: 1, y: 2 }), Arg::from(json!([1, "a"])), Arg::from(true)];
        assert_eq!(format_args(&args), r#"{"x":1,"y":2} [1,"a"] true"#);
    }

    #[derive(Debug, Serialize)]
    struct Rejection {
        name: String,
        message: String,
    }

    #[test]
    fn test_serialized_error_shape_formats_as_name_and_message() {
        let arg = Arg::value(Rejection {
            name: "TimeoutError".into(),
            message: "took too long".into(),
        });
        assert_eq!(format_arg(&arg), "TimeoutError: took too long");
    }

    #[test]
    fn test_json_string_is_not_quoted() {
        assert_eq!(format_arg(&Arg::from(json!("plain"))), "plain");
    }

    #[test]
    fn test_unserializable_value_falls_back_to_debug() {
        let message = format_args(&[Arg::from("node"), Arg::value(Node { name: "root" })]);
        assert!(!message.is_empty());
        assert!(message.contains("Node"));
        assert!(message.contains("root"));
    }

    #[test]
    fn test_empty_args_yield_empty_message() {
        assert_eq!(format_args(&[]), "");
    }
}
