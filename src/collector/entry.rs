// src/collector/entry.rs
//! Log entry, level and argument types shared by the whole pipeline

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Console levels a record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Log,
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    /// Every level, in the order stats are reported.
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Log,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Debug,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Log => "log",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Debug => "debug",
        }
    }

    /// Level used when writing to a `log` backend.
    pub fn to_log_level(self) -> log::Level {
        match self {
            LogLevel::Log | LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
            LogLevel::Debug => log::Level::Debug,
        }
    }

    /// Map a `log` crate level onto the closed console set.
    pub fn from_log_level(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogLevel::Error,
            log::Level::Warn => LogLevel::Warn,
            log::Level::Info => LogLevel::Info,
            log::Level::Debug | log::Level::Trace => LogLevel::Debug,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "log" => Ok(LogLevel::Log),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "debug" => Ok(LogLevel::Debug),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// An error-like value: something with a name and a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorValue {
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorValue {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Build from any std error, naming it after its type.
    pub fn from_error<E: std::error::Error + ?Sized>(error: &E) -> Self {
        let full = std::any::type_name_of_val(error);
        // Strip generic parameters before taking the last path segment.
        let base = full.split('<').next().unwrap_or(full);
        let name = base.rsplit("::").next().unwrap_or(base);
        Self::new(name, error.to_string())
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// A value that can be logged structurally but whose serialization may fail.
pub trait ArgValue: fmt::Debug + Send + Sync {
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;
}

impl<T> ArgValue for T
where
    T: Serialize + fmt::Debug + Send + Sync,
{
    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// One argument passed to a logging call.
#[derive(Debug, Clone)]
pub enum Arg {
    Text(String),
    Error(ErrorValue),
    Json(serde_json::Value),
    Value(Arc<dyn ArgValue>),
}

impl Arg {
    /// Wrap any serializable value.
    pub fn value<T: ArgValue + 'static>(value: T) -> Self {
        Arg::Value(Arc::new(value))
    }

    pub fn error<E: std::error::Error + ?Sized>(error: &E) -> Self {
        Arg::Error(ErrorValue::from_error(error))
    }

    /// Returns the error view of this argument if it looks like one.
    ///
    /// JSON objects, including serialized values, with string `name` and
    /// `message` fields count as well.
    pub fn as_error(&self) -> Option<ErrorValue> {
        match self {
            Arg::Error(err) => Some(err.clone()),
            Arg::Json(value) => error_like(value),
            Arg::Value(value) => value.to_json().ok().as_ref().and_then(error_like),
            Arg::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Arg::Text(s) => Some(s),
            Arg::Json(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Text(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Text(value)
    }
}

impl From<ErrorValue> for Arg {
    fn from(value: ErrorValue) -> Self {
        Arg::Error(value)
    }
}

impl From<serde_json::Value> for Arg {
    fn from(value: serde_json::Value) -> Self {
        Arg::Json(value)
    }
}

macro_rules! json_arg_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Json(serde_json::Value::from(value))
                }
            }
        )*
    };
}

json_arg_from!(bool, i32, i64, u32, u64, usize, f64);

impl Serialize for Arg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Arg::Text(s) => serializer.serialize_str(s),
            Arg::Json(value) => value.serialize(serializer),
            Arg::Error(err) => {
                let len = if err.stack.is_some() { 3 } else { 2 };
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry("name", &err.name)?;
                map.serialize_entry("message", &err.message)?;
                if let Some(stack) = &err.stack {
                    map.serialize_entry("stack", stack)?;
                }
                map.end()
            }
            Arg::Value(value) => match value.to_json() {
                Ok(json) => json.serialize(serializer),
                Err(_) => serializer.serialize_str(&format!("{value:?}")),
            },
        }
    }
}

fn error_like(value: &serde_json::Value) -> Option<ErrorValue> {
    let map = value.as_object()?;
    let name = map.get("name")?.as_str()?;
    let message = map.get("message")?.as_str()?;
    let stack = map.get("stack").and_then(|s| s.as_str()).map(str::to_string);
    Some(ErrorValue {
        name: name.to_string(),
        message: message.to_string(),
        stack,
    })
}

/// Build an argument list from mixed values: `args!["count", 3, err_value]`.
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::Arg>::new() };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($arg)),+]
    };
}

/// One recorded log occurrence. Serializes to the host wire format.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: i64,
    pub level: LogLevel,
    pub message: String,
    pub args: Vec<Arg>,
    pub stack_trace: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: String, args: Vec<Arg>, stack_trace: Option<String>) -> Self {
        Self {
            timestamp: now_millis(),
            level,
            message,
            args,
            stack_trace,
        }
    }
}

/// Milliseconds since the Unix epoch; zero if the clock is before it.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cycle detected"))
        }
    }

    #[test]
    fn test_level_parse_and_display() {
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert!("verbose".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::from_log_level(log::Level::Trace), LogLevel::Debug);
    }

    #[test]
    fn test_json_object_with_name_and_message_is_error_like() {
        let arg = Arg::from(json!({"name": "TypeError", "message": "x is undefined"}));
        let err = arg.as_error().unwrap();
        assert_eq!(err.name, "TypeError");
        assert_eq!(err.message, "x is undefined");

        let not_err = Arg::from(json!({"name": "widget"}));
        assert!(not_err.as_error().is_none());
    }

    #[derive(Debug, Serialize)]
    struct HttpFailure {
        name: &'static str,
        message: &'static str,
        status: u16,
    }

    #[test]
    fn test_serializable_value_with_name_and_message_is_error_like() {
        let arg = Arg::value(HttpFailure {
            name: "HttpError",
            message: "502 from upstream",
            status: 502,
        });
        let err = arg.as_error().unwrap();
        assert_eq!(err.name, "HttpError");
        assert_eq!(err.message, "502 from upstream");
        assert!(Arg::value(vec![1, 2]).as_error().is_none());
    }

    #[test]
    fn test_error_value_from_std_error() {
        let io = std::io::Error::other("disk full");
        let err = ErrorValue::from_error(&io);
        assert_eq!(err.name, "Error");
        assert_eq!(err.message, "disk full");
    }

    #[test]
    fn test_wire_format_field_names() {
        let entry = LogEntry::new(
            LogLevel::Warn,
            "careful 3".to_string(),
            crate::args!["careful", 3, ErrorValue::new("Error", "boom")],
            None,
        );
        let wire = serde_json::to_value(&entry).unwrap();
        assert_eq!(wire["level"], "warn");
        assert_eq!(wire["message"], "careful 3");
        assert_eq!(wire["args"], json!(["careful", 3, {"name": "Error", "message": "boom"}]));
        assert!(wire["stack_trace"].is_null());
        assert!(wire["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_unserializable_value_degrades_to_debug_on_the_wire() {
        let wire = serde_json::to_value(Arg::value(Unserializable)).unwrap();
        assert_eq!(wire, json!("Unserializable"));
    }
}
