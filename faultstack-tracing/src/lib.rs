#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]

//! Forwards faultstack warnings to [`tracing`].
//!
//! Libraries built on faultstack issue warnings through
//! [`faultstack::warning!`]. By default those land on standard error. An
//! application that already has a tracing pipeline installs
//! [`TracingWarningHandler`] once at startup, and from then on every warning
//! becomes a `WARN` event that its subscriber formats, filters and ships like
//! any other log line.
//!
//! # Quick Start
//!
//! ```
//! use tracing_subscriber::{Registry, layer::SubscriberExt};
//!
//! let subscriber = Registry::default().with(tracing_subscriber::fmt::layer());
//! tracing::subscriber::set_global_default(subscriber).expect("failed to set subscriber");
//!
//! faultstack_tracing::install();
//!
//! faultstack::warning!("using the slow path for non-contiguous input");
//! ```
//!
//! With the `fmt` layer the warning above is printed similar to:
//!
//! ```text
//! 2026-10-18T09:12:44.113Z  WARN faultstack::warning: using the slow path for non-contiguous input function="rust_out::main" file="src/main.rs" line=9
//! ```
//!
//! # Event shape
//!
//! | Property  | Value                                |
//! |-----------|--------------------------------------|
//! | level     | `WARN`                               |
//! | target    | `faultstack::warning` ([`TARGET`])   |
//! | message   | the warning text                     |
//! | `function`| [`SourceLocation::function`]         |
//! | `file`    | [`SourceLocation::file`]             |
//! | `line`    | [`SourceLocation::line`]             |
//!
//! Filter on the target to silence or redirect faultstack warnings, e.g.
//! `RUST_LOG=faultstack::warning=off` with an `EnvFilter`.

use faultstack::{
    SourceLocation,
    warning::{self, LeakedWarningHandler, WarningHandler},
};

/// Target of every event emitted by [`TracingWarningHandler`].
pub const TARGET: &str = "faultstack::warning";

/// A [`WarningHandler`] that emits each warning as a `tracing` event.
///
/// ```
/// use faultstack::warning;
/// use faultstack_tracing::TracingWarningHandler;
///
/// warning::set_warning_handler(TracingWarningHandler);
/// # warning::reset_warning_handler();
/// ```
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingWarningHandler;

impl WarningHandler for TracingWarningHandler {
    fn handle(&self, location: &SourceLocation, message: &str) {
        tracing::warn!(
            target: TARGET,
            function = location.function,
            file = location.file,
            line = location.line,
            "{message}"
        );
    }
}

/// Installs [`TracingWarningHandler`] as the process-wide warning handler.
///
/// Returns the handler that was installed before, if it was not the default
/// one.
pub fn install() -> Option<LeakedWarningHandler> {
    warning::set_warning_handler(TracingWarningHandler)
}

#[cfg(test)]
mod tests {
    use std::{
        fmt,
        sync::{Arc, Mutex},
    };

    use tracing::{
        Event, Level, Subscriber,
        field::{Field, Visit},
    };
    use tracing_subscriber::{Layer, Registry, layer::Context, layer::SubscriberExt};

    use super::*;

    #[derive(Debug, Default, PartialEq, Eq)]
    struct RecordedEvent {
        level: Option<Level>,
        target: String,
        fields: Vec<(String, String)>,
    }

    struct FieldVisitor<'a> {
        fields: &'a mut Vec<(String, String)>,
    }

    impl Visit for FieldVisitor<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.fields
                .push((field.name().to_string(), format!("{value:?}")));
        }

        fn record_str(&mut self, field: &Field, value: &str) {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

    #[derive(Clone, Default)]
    struct RecordingLayer {
        events: Arc<Mutex<Vec<RecordedEvent>>>,
    }

    impl<S: Subscriber> Layer<S> for RecordingLayer {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut recorded = RecordedEvent {
                level: Some(*event.metadata().level()),
                target: event.metadata().target().to_string(),
                fields: Vec::new(),
            };
            event.record(&mut FieldVisitor {
                fields: &mut recorded.fields,
            });
            self.events.lock().unwrap().push(recorded);
        }
    }

    // The warning slot is global to the process.
    fn guard() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: Mutex<()> = Mutex::new(());
        LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn field<'a>(event: &'a RecordedEvent, name: &str) -> Option<&'a str> {
        event
            .fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_handler_emits_warn_event() {
        let layer = RecordingLayer::default();
        let subscriber = Registry::default().with(layer.clone());

        tracing::subscriber::with_default(subscriber, || {
            let location = SourceLocation::new("ops::cast", "src/ops.rs", 31);
            TracingWarningHandler.handle(&location, "lossy cast");
        });

        let events = layer.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.level, Some(Level::WARN));
        assert_eq!(event.target, TARGET);
        assert_eq!(field(event, "message"), Some("lossy cast"));
        assert_eq!(field(event, "function"), Some("ops::cast"));
        assert_eq!(field(event, "file"), Some("src/ops.rs"));
        assert_eq!(field(event, "line"), Some("31"));
    }

    #[test]
    fn test_install_routes_warning_macro() {
        let _guard = guard();
        let layer = RecordingLayer::default();
        let subscriber = Registry::default().with(layer.clone());

        let previous = install();
        tracing::subscriber::with_default(subscriber, || {
            faultstack::warning!("dropping {} samples", 3);
        });
        warning::reset_warning_handler();
        if let Some(previous) = previous {
            previous.replace();
        }

        let events = layer.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(field(&events[0], "message"), Some("dropping 3 samples"));
        assert_eq!(field(&events[0], "file"), Some(file!()));
        assert!(
            field(&events[0], "function")
                .unwrap()
                .ends_with("test_install_routes_warning_macro")
        );
    }

    #[test]
    fn test_install_returns_previous_handler() {
        let _guard = guard();
        warning::set_warning_handler(|_: &SourceLocation, _: &str| {});
        assert!(install().is_some());
        let replaced = warning::reset_warning_handler();
        assert!(replaced.is_some());
    }
}
