// src/collector/hooks.rs
//! Entry points for errors nobody caught: panics, failed tasks, host-reported
//! exceptions and rejections. All of them end up as error-level records.

use crate::collector::Collector;
use crate::collector::entry::{Arg, ErrorValue, LogLevel};
use crate::collector::format::format_arg;
use crate::collector::origin;
use std::any::Any;
use std::future::Future;
use std::panic;
use tokio::task::JoinHandle;

/// Message used when an uncaught error carries nothing readable.
pub const UNCAUGHT_FALLBACK: &str = "Uncaught error";

/// An uncaught exception notification.
#[derive(Debug, Clone, Default)]
pub struct UncaughtError {
    pub message: Option<String>,
    pub error: Option<ErrorValue>,
}

impl UncaughtError {
    pub fn from_error(error: ErrorValue) -> Self {
        Self {
            message: None,
            error: Some(error),
        }
    }
}

impl Collector {
    /// Record an uncaught exception. The notification's own message wins over
    /// the attached error's message.
    pub fn report_uncaught(&self, event: UncaughtError) {
        let message = non_empty(event.message.as_deref())
            .or_else(|| event.error.as_ref().and_then(|e| non_empty(Some(e.message.as_str()))))
            .unwrap_or(UNCAUGHT_FALLBACK)
            .to_string();
        let stack = self
            .stack_filter()
            .normalize_or_raw(event.error.as_ref().and_then(|e| e.stack.as_deref()));
        self.record_with_stack(LogLevel::Error, vec![Arg::Text(message)], stack);
    }

    /// Record an unhandled async failure from its reason value.
    pub fn report_rejection(&self, reason: Arg) {
        let (message, stack) = match reason.as_error() {
            Some(err) => (err.message, self.stack_filter().normalize_or_raw(err.stack.as_deref())),
            None => (format_arg(&reason), None),
        };
        self.record_with_stack(LogLevel::Error, vec![Arg::Text(message)], stack);
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Route every panic into `collector`, then run the previously installed hook.
pub fn install_panic_hook(collector: Collector) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let message = panic_message(info.payload());
        let stack = collector
            .config()
            .capture_backtraces
            .then(|| origin::capture_stack(true))
            .unwrap_or_else(|| origin::capture_stack(false))
            .or_else(|| info.location().map(origin::location_stack));

        let mut error = ErrorValue::new("panic", message);
        error.stack = stack;
        collector.report_uncaught(UncaughtError::from_error(error));
        previous(info);
    }));
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::new()
    }
}

/// Spawn `future` on the current runtime and report an `Err` outcome as an
/// unhandled rejection. The task yields `Some` on success.
pub fn spawn_reporting<F, T, E>(collector: &Collector, future: F) -> JoinHandle<Option<T>>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: std::error::Error + Send + 'static,
{
    let collector = collector.clone();
    tokio::spawn(async move {
        match future.await {
            Ok(value) => Some(value),
            Err(e) => {
                collector.report_rejection(Arg::error(&e));
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::MemoryConsole;
    use crate::transport::ChannelTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn collector() -> Collector {
        let (transport, _rx) = ChannelTransport::pair();
        Collector::builder(transport)
            .console(Arc::new(MemoryConsole::new()))
            .build()
    }

    #[test]
    fn test_uncaught_message_priority() {
        let collector = collector();
        collector.report_uncaught(UncaughtError {
            message: Some("window error".into()),
            error: Some(ErrorValue::new("TypeError", "inner")),
        });
        collector.report_uncaught(UncaughtError::from_error(ErrorValue::new("TypeError", "inner")));
        collector.report_uncaught(UncaughtError {
            message: Some(String::new()),
            error: None,
        });

        let messages: Vec<_> = collector.get_errors().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["window error", "inner", UNCAUGHT_FALLBACK]);
    }

    #[test]
    fn test_uncaught_stack_is_normalized() {
        let collector = collector();
        let error = ErrorValue::new("Error", "boom")
            .with_stack("Error: boom\n    at console_relay::collector::hooks::x\n    at app::run");
        collector.report_uncaught(UncaughtError::from_error(error));

        let entry = &collector.get_errors()[0];
        assert_eq!(entry.stack_trace.as_deref(), Some("Error: boom\n    at app::run"));
    }

    #[test]
    fn test_uncaught_all_internal_stack_keeps_raw() {
        let collector = collector();
        let raw = "Error: boom\n    at console_relay::collector::Collector::record";
        collector.report_uncaught(UncaughtError::from_error(ErrorValue::new("Error", "boom").with_stack(raw)));
        assert_eq!(collector.get_errors()[0].stack_trace.as_deref(), Some(raw));
    }

    #[test]
    fn test_rejection_reasons() {
        let collector = collector();
        collector.report_rejection(Arg::from(ErrorValue::new("Error", "denied").with_stack("Error: denied")));
        collector.report_rejection(Arg::from("timeout"));
        collector.report_rejection(Arg::from(json!({"code": 7})));

        let errors = collector.get_errors();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].message, "denied");
        assert_eq!(errors[0].stack_trace.as_deref(), Some("Error: denied"));
        assert_eq!(errors[1].message, "timeout");
        assert!(errors[1].stack_trace.is_none());
        assert_eq!(errors[2].message, r#"{"code":7}"#);
        assert!(errors[2].stack_trace.is_none());
    }

    #[test]
    fn test_panic_message_downcasts() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "");
    }
}
