// src/collector/origin.rs
//! Stack trace folding, origin extraction and stack normalization
//!
//! A stack is handled as plain text: the first line is a header and each
//! following line is one frame. Rust backtraces print two lines per frame, so
//! they are folded into that shape before anything else looks at them.

use crate::collector::entry::Arg;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::Location;

/// Header line placed on top of every folded stack.
pub const STACK_HEADER: &str = "Backtrace";

/// Prefix of the synthetic argument carrying the origin tag.
pub const ORIGIN_PREFIX: &str = "[origin]";

/// Decides which frames belong to the collector or to runtime/vendor code.
#[derive(Debug, Clone)]
pub struct StackFilter {
    internal: Vec<String>,
    vendor: Vec<String>,
}

impl StackFilter {
    pub fn new(internal: Vec<String>, vendor: Vec<String>) -> Self {
        Self { internal, vendor }
    }

    fn is_internal(&self, frame: &str) -> bool {
        self.internal.iter().any(|m| frame.contains(m.as_str()))
    }

    fn is_vendor(&self, frame: &str) -> bool {
        self.vendor.iter().any(|m| frame.contains(m.as_str()))
    }

    /// First frame below the header that is neither internal nor vendor.
    pub fn extract_origin(&self, stack: &str) -> Option<String> {
        stack
            .lines()
            .skip(1)
            .map(str::trim)
            .filter(|frame| !frame.is_empty())
            .find(|frame| !self.is_internal(frame) && !self.is_vendor(frame))
            .map(str::to_string)
    }

    /// Drop the collector's own frames from a stack.
    ///
    /// Header-only stacks come back unchanged. Returns `None` when every frame
    /// was internal; callers keep the raw stack in that case.
    pub fn normalize_stack(&self, stack: &str) -> Option<String> {
        let mut lines = stack.lines();
        let header = lines.next()?;
        let frames: Vec<&str> = lines.filter(|l| !l.trim().is_empty()).collect();
        if frames.is_empty() {
            return Some(stack.to_string());
        }

        let kept: Vec<&str> = frames.into_iter().filter(|f| !self.is_internal(f)).collect();
        if kept.is_empty() {
            return None;
        }

        let mut out = String::from(header);
        for frame in kept {
            out.push('\n');
            out.push_str(frame);
        }
        Some(out)
    }

    /// Normalized stack, or the raw one when normalization leaves nothing.
    pub fn normalize_or_raw(&self, stack: Option<&str>) -> Option<String> {
        let raw = stack?;
        self.normalize_stack(raw).or_else(|| Some(raw.to_string()))
    }
}

/// Append the `[origin] ...` argument when an origin is known.
pub fn tag_origin(mut args: Vec<Arg>, origin: Option<&str>) -> Vec<Arg> {
    if let Some(origin) = origin {
        args.push(Arg::Text(format!("{ORIGIN_PREFIX} {origin}")));
    }
    args
}

/// Fold `std::backtrace::Backtrace` output into header plus one line per frame.
///
/// ```text
///    0: app::main
///              at ./src/main.rs:10:5
/// ```
/// becomes `    at app::main (./src/main.rs:10:5)`.
pub fn fold_backtrace(text: &str) -> String {
    let mut out = String::from(STACK_HEADER);
    let mut pending: Option<String> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(location) = trimmed.strip_prefix("at ") {
            match pending.take() {
                Some(symbol) => push_frame(&mut out, &format!("{symbol} ({location})")),
                None => push_frame(&mut out, location),
            }
        } else if let Some(symbol) = frame_symbol(trimmed) {
            if let Some(prev) = pending.replace(symbol.to_string()) {
                push_frame(&mut out, &prev);
            }
        }
    }
    if let Some(prev) = pending {
        push_frame(&mut out, &prev);
    }
    out
}

fn push_frame(out: &mut String, frame: &str) {
    out.push_str("\n    at ");
    out.push_str(frame);
}

/// `"12: foo::bar"` -> `"foo::bar"`.
fn frame_symbol(line: &str) -> Option<&str> {
    let (index, symbol) = line.split_once(": ")?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(symbol.trim())
}

/// Stack made of a single call-site frame.
pub fn location_stack(location: &Location<'_>) -> String {
    format!(
        "{STACK_HEADER}\n    at {}:{}:{}",
        location.file(),
        location.line(),
        location.column()
    )
}

/// Capture the current stack in folded form.
///
/// With `force` false this follows `RUST_BACKTRACE`/`RUST_LIB_BACKTRACE` and
/// yields `None` when capture is disabled.
pub fn capture_stack(force: bool) -> Option<String> {
    let bt = if force {
        Backtrace::force_capture()
    } else {
        Backtrace::capture()
    };
    match bt.status() {
        BacktraceStatus::Captured => Some(fold_backtrace(&bt.to_string())),
        _ => None,
    }
}
