//! The fault type and its two renderings.
//!
//! A [`Fault`] is raised once at the point where something went wrong and is
//! then annotated by each enclosing frame as it propagates outward. Every
//! annotation is appended to an ordered message stack; the original message
//! always stays first.
//!
//! Two renderings are kept up to date at all times:
//!
//! - the **full message** ([`Fault::full_message`], [`Fault::what`]): the
//!   message stack joined by newlines, followed by the backtrace when one was
//!   captured, and
//! - the **concise message** ([`Fault::concise_message`],
//!   [`Fault::what_without_backtrace`]): the same join without the backtrace,
//!   for surfaces that consider stack traces noise.
//!
//! ```rust
//! use faultstack::Fault;
//!
//! let mut fault = Fault::new("shape mismatch", "");
//! fault.append_message("while broadcasting operand 2");
//!
//! assert_eq!(
//!     fault.concise_message(),
//!     "shape mismatch\nwhile broadcasting operand 2"
//! );
//! assert_eq!(fault.message_stack().len(), 2);
//! ```

use alloc::{
    string::{String, ToString},
    vec,
    vec::Vec,
};
use core::fmt;

use crate::{caller::CallerId, location::SourceLocation};

/// Marker placed between the messages and the backtrace in the full message.
pub const BACKTRACE_SEPARATOR: &str = "\n(most recent call first):\n";

/// The category of a [`Fault`].
///
/// Kinds carry no data of their own. They exist so that a boundary layer can
/// treat some faults differently (for instance, translate an
/// [`Index`](FaultKind::Index) fault into a host-level index error) without
/// parsing message text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// A general failure.
    #[default]
    Generic,
    /// An out-of-bounds index detected lazily, typically deep inside a
    /// computational kernel.
    Index,
}

impl FaultKind {
    /// The name used when describing faults of this kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            FaultKind::Generic => "Fault",
            FaultKind::Index => "IndexFault",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An error carrying a stack of messages and an optional backtrace.
///
/// # Construction
///
/// | Constructor | First message | Backtrace |
/// |---|---|---|
/// | [`new`](Self::new) / [`with_caller`](Self::with_caller) | `message` verbatim | given |
/// | [`at`](Self::at) | `message` verbatim | empty |
/// | [`check_failed`](Self::check_failed) / [`check_failed_with_caller`](Self::check_failed_with_caller) | `message`, or `"<condition> CHECK FAILED at <file>:<line>"` when empty | given |
/// | [`index`](Self::index) / [`index_at`](Self::index_at) | as `new` / `at` | as `new` / `at` |
///
/// Construction never fails.
///
/// # Rendering
///
/// The concise message is the message stack joined by `"\n"`. The full
/// message equals the concise message when the backtrace is empty, and is
/// otherwise the concise message followed by [`BACKTRACE_SEPARATOR`] and the
/// backtrace text verbatim. Both strings are recomputed inside
/// [`append_message`](Self::append_message), so readers never observe a
/// stale rendering.
///
/// [`Display`](fmt::Display) prints the full message; the alternate form
/// (`{:#}`) prints the concise one.
#[derive(Clone)]
pub struct Fault {
    kind: FaultKind,
    messages: Vec<String>,
    backtrace: String,
    caller: CallerId,
    location: Option<SourceLocation>,

    // Derived from `messages` and `backtrace`.
    full: String,
    concise: String,
}

impl Fault {
    /// Creates a fault from a message and a pre-formatted backtrace.
    ///
    /// An empty `backtrace` means that none is available.
    ///
    /// ```rust
    /// use faultstack::Fault;
    ///
    /// let fault = Fault::new("boom", "");
    /// assert_eq!(fault.full_message(), "boom");
    /// assert_eq!(fault.concise_message(), "boom");
    /// ```
    #[must_use]
    pub fn new(message: impl Into<String>, backtrace: impl Into<String>) -> Self {
        Self::with_caller(message, backtrace, CallerId::NONE)
    }

    /// Like [`new`](Self::new), additionally recording the identity of the
    /// raising code.
    #[must_use]
    pub fn with_caller(
        message: impl Into<String>,
        backtrace: impl Into<String>,
        caller: CallerId,
    ) -> Self {
        Self::from_parts(
            FaultKind::Generic,
            message.into(),
            backtrace.into(),
            caller,
            None,
        )
    }

    /// Creates a fault raised at `location`, without a backtrace.
    ///
    /// ```rust
    /// use faultstack::{Fault, SourceLocation};
    ///
    /// let location = SourceLocation::new("ops::reshape", "src/ops.rs", 88);
    /// let fault = Fault::at(location, "cannot reshape [2, 3] into [4]");
    /// assert_eq!(fault.location(), Some(&location));
    /// assert!(fault.backtrace().is_empty());
    /// ```
    #[must_use]
    pub fn at(location: SourceLocation, message: impl Into<String>) -> Self {
        Self::from_parts(
            FaultKind::Generic,
            message.into(),
            String::new(),
            CallerId::NONE,
            Some(location),
        )
    }

    /// Creates a fault for a failed check of `condition` at `file:line`.
    ///
    /// An empty `message` never yields an empty fault: it falls back to
    /// `"<condition> CHECK FAILED at <file>:<line>"`.
    ///
    /// ```rust
    /// use faultstack::Fault;
    ///
    /// let fault = Fault::check_failed("a.cc", 42, "x > 0", "", "");
    /// assert_eq!(fault.concise_message(), "x > 0 CHECK FAILED at a.cc:42");
    ///
    /// let fault = Fault::check_failed("a.cc", 42, "x > 0", "x was -1", "");
    /// assert_eq!(fault.concise_message(), "x was -1");
    /// ```
    #[must_use]
    pub fn check_failed(
        file: &str,
        line: u32,
        condition: &str,
        message: impl Into<String>,
        backtrace: impl Into<String>,
    ) -> Self {
        Self::check_failed_with_caller(file, line, condition, message, backtrace, CallerId::NONE)
    }

    /// Like [`check_failed`](Self::check_failed), additionally recording the
    /// identity of the raising code.
    #[must_use]
    pub fn check_failed_with_caller(
        file: &str,
        line: u32,
        condition: &str,
        message: impl Into<String>,
        backtrace: impl Into<String>,
        caller: CallerId,
    ) -> Self {
        let message = if_empty_then(message.into(), || {
            alloc::format!("{condition} CHECK FAILED at {file}:{line}")
        });
        Self::from_parts(
            FaultKind::Generic,
            message,
            backtrace.into(),
            caller,
            None,
        )
    }

    /// Creates an [`Index`](FaultKind::Index) fault; otherwise identical to
    /// [`new`](Self::new).
    #[must_use]
    pub fn index(message: impl Into<String>, backtrace: impl Into<String>) -> Self {
        Self::new(message, backtrace).into_kind(FaultKind::Index)
    }

    /// Creates an [`Index`](FaultKind::Index) fault; otherwise identical to
    /// [`at`](Self::at).
    #[must_use]
    pub fn index_at(location: SourceLocation, message: impl Into<String>) -> Self {
        Self::at(location, message).into_kind(FaultKind::Index)
    }

    /// Changes the kind of a freshly built fault.
    ///
    /// Meant to be chained directly onto a constructor, before the fault is
    /// raised:
    ///
    /// ```rust
    /// use faultstack::{Fault, FaultKind};
    ///
    /// let fault = Fault::check_failed("gather.rs", 12, "idx < len", "", "")
    ///     .into_kind(FaultKind::Index);
    /// assert_eq!(fault.kind(), FaultKind::Index);
    /// ```
    #[must_use]
    pub fn into_kind(mut self, kind: FaultKind) -> Self {
        self.kind = kind;
        self
    }

    fn from_parts(
        kind: FaultKind,
        message: String,
        backtrace: String,
        caller: CallerId,
        location: Option<SourceLocation>,
    ) -> Self {
        let mut fault = Self {
            kind,
            messages: vec![message],
            backtrace,
            caller,
            location,
            full: String::new(),
            concise: String::new(),
        };
        fault.refresh();
        fault
    }

    /// Appends a message added by an enclosing frame.
    ///
    /// Both renderings are brought up to date before this returns.
    ///
    /// ```rust
    /// use faultstack::Fault;
    ///
    /// let mut fault = Fault::check_failed("a.cc", 42, "x > 0", "", "");
    /// fault.append_message("while processing batch 3");
    ///
    /// assert_eq!(
    ///     fault.message_stack(),
    ///     ["x > 0 CHECK FAILED at a.cc:42", "while processing batch 3"]
    /// );
    /// assert_eq!(
    ///     fault.concise_message(),
    ///     "x > 0 CHECK FAILED at a.cc:42\nwhile processing batch 3"
    /// );
    /// ```
    pub fn append_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
        self.refresh();
    }

    /// Builder form of [`append_message`](Self::append_message).
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.append_message(message);
        self
    }

    fn refresh(&mut self) {
        self.concise = self.messages.join("\n");
        self.full = render_full(&self.concise, &self.backtrace);
    }

    /// The full message, including the backtrace if there is one.
    #[must_use]
    pub fn full_message(&self) -> &str {
        &self.full
    }

    /// The message stack joined by newlines, without the backtrace.
    #[must_use]
    pub fn concise_message(&self) -> &str {
        &self.concise
    }

    /// Same as [`full_message`](Self::full_message).
    ///
    /// The returned text lives as long as the fault itself, wherever the
    /// fault has been moved to.
    #[must_use]
    pub fn what(&self) -> &str {
        &self.full
    }

    /// Same as [`concise_message`](Self::concise_message).
    #[must_use]
    pub fn what_without_backtrace(&self) -> &str {
        &self.concise
    }

    /// The messages in insertion order, the original raise message first.
    ///
    /// Never empty.
    #[must_use]
    pub fn message_stack(&self) -> &[String] {
        &self.messages
    }

    /// The backtrace text given at construction; empty if none.
    #[must_use]
    pub fn backtrace(&self) -> &str {
        &self.backtrace
    }

    /// The identity recorded at construction.
    #[must_use]
    pub fn caller(&self) -> CallerId {
        self.caller
    }

    /// The kind of this fault.
    #[must_use]
    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    /// True if this is an [`Index`](FaultKind::Index) fault.
    #[must_use]
    pub fn is_index(&self) -> bool {
        self.kind == FaultKind::Index
    }

    /// The raise site, for faults built with [`at`](Self::at) or
    /// [`index_at`](Self::index_at).
    #[must_use]
    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }
}

fn render_full(concise: &str, backtrace: &str) -> String {
    if backtrace.is_empty() {
        return concise.to_string();
    }
    let mut full =
        String::with_capacity(concise.len() + BACKTRACE_SEPARATOR.len() + backtrace.len());
    full.push_str(concise);
    full.push_str(BACKTRACE_SEPARATOR);
    full.push_str(backtrace);
    full
}

/// Returns `x` unless it is empty, in which case `y()` is returned.
///
/// This is the fallback policy behind check-style raise sites: an empty user
/// message is replaced by a generated description rather than treated as an
/// error.
///
/// ```rust
/// use faultstack::fault::if_empty_then;
///
/// assert_eq!(if_empty_then(String::new(), || "default".into()), "default");
/// assert_eq!(if_empty_then("given".into(), || "default".into()), "given");
/// ```
#[must_use]
pub fn if_empty_then(x: String, y: impl FnOnce() -> String) -> String {
    if x.is_empty() { y() } else { x }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str(&self.concise)
        } else {
            f.write_str(&self.full)
        }
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Fault");
        d.field("kind", &self.kind);
        d.field("messages", &self.messages);
        if let Some(location) = &self.location {
            d.field("location", &format_args!("{location}"));
        }
        if !self.caller.is_none() {
            d.field("caller", &self.caller);
        }
        if !self.backtrace.is_empty() {
            d.field("backtrace", &"<captured>");
        }
        d.finish()
    }
}

impl core::error::Error for Fault {}
