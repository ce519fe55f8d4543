//! Process-wide dispatch of non-fatal warnings.
//!
//! Library code calls [`warn`] (usually through the
//! [`warning!`](crate::warning!) macro) and never decides where the warning
//! ends up. Exactly one [`WarningHandler`] is active at any time; until one is
//! installed, [`DefaultWarningHandler`] prints to standard error.
//!
//! # Quick Start
//!
//! ```rust
//! use faultstack::{SourceLocation, warning};
//!
//! // Route warnings to your own sink.
//! let previous = warning::set_warning_handler(|location: &SourceLocation, message: &str| {
//!     println!("[lib] {message} ({location})");
//! });
//! assert!(previous.is_none());
//!
//! faultstack::warning!("falling back to the reference kernel");
//!
//! // Restore the stderr handler.
//! warning::reset_warning_handler();
//! ```
//!
//! # Lifecycle
//!
//! Reads are a single atomic load and take no lock, so [`warn`] is cheap to
//! call from many threads at once. Replacing the handler is meant to happen
//! rarely, typically once during startup. Replacement never frees a handler
//! that another thread might still be running: replaced handlers are leaked
//! and handed back as a [`LeakedWarningHandler`]. What is *not* specified is
//! whether a warning issued concurrently with a replacement reaches the old
//! or the new handler; callers that care must serialize replacement against
//! warning emission themselves.
//!
//! # Default output
//!
//! The default handler writes one line per warning to standard error:
//!
//! ```text
//! Warning: <message> (function <function> at <file>:<line>)
//! ```
//!
//! See [`format_warning`]. Without the `std` feature there is no standard
//! error stream and the default handler discards warnings.

use alloc::{boxed::Box, string::String};
use core::{
    fmt,
    ptr::NonNull,
    sync::atomic::{AtomicPtr, Ordering},
};

use crate::location::SourceLocation;

/// Receives every warning issued through [`warn`].
///
/// Implemented for all closures and functions with the signature
/// `Fn(&SourceLocation, &str) + Send + Sync + 'static`.
///
/// Handlers should not panic; [`warn`] does not catch anything, so a panic
/// propagates to the code that issued the warning.
pub trait WarningHandler: Send + Sync + 'static {
    /// Handles one warning.
    fn handle(&self, location: &SourceLocation, message: &str);
}

impl<F> WarningHandler for F
where
    F: Fn(&SourceLocation, &str) + Send + Sync + 'static,
{
    fn handle(&self, location: &SourceLocation, message: &str) {
        self(location, message)
    }
}

/// The handler in effect when no other handler is installed.
///
/// Prints [`format_warning`] followed by a newline to standard error.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultWarningHandler;

impl WarningHandler for DefaultWarningHandler {
    fn handle(&self, location: &SourceLocation, message: &str) {
        print_warning(location, message);
    }
}

/// Formats a warning the way the default handler prints it, without the
/// trailing newline.
///
/// ```rust
/// use faultstack::{SourceLocation, warning::format_warning};
///
/// let location = SourceLocation::new("ops::cast", "src/ops.rs", 31);
/// assert_eq!(
///     format_warning(&location, "lossy cast from f64 to f16"),
///     "Warning: lossy cast from f64 to f16 (function ops::cast at src/ops.rs:31)"
/// );
/// ```
#[must_use]
pub fn format_warning(location: &SourceLocation, message: &str) -> String {
    alloc::format!("Warning: {message} ({location})")
}

/// Writes a warning to standard error in the default format.
///
/// Write errors are ignored; this function never panics because of them.
pub fn print_warning(location: &SourceLocation, message: &str) {
    #[cfg(feature = "std")]
    {
        use std::io::Write;

        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", format_warning(location, message));
    }

    #[cfg(not(feature = "std"))]
    {
        let _ = (location, message);
    }
}

/// Issues a warning through the currently installed handler.
///
/// Returns normally regardless of what the handler does with the warning.
pub fn warn(location: &SourceLocation, message: &str) {
    match HandlerData::fetch() {
        Some(data) => data.handler.handle(location, message),
        None => DefaultWarningHandler.handle(location, message),
    }
}

/// Installs `handler` as the process-wide warning handler.
///
/// Returns the handler that was installed before, if it was not the default
/// one.
///
/// # Memory Management
///
/// The handler is leaked and stays in memory for the lifetime of the
/// program, even after it has been replaced.
pub fn set_warning_handler<H: WarningHandler>(handler: H) -> Option<LeakedWarningHandler> {
    LeakedWarningHandler::leak(handler).replace()
}

/// Reinstates [`DefaultWarningHandler`].
///
/// Returns the handler that was installed before, if any.
pub fn reset_warning_handler() -> Option<LeakedWarningHandler> {
    HANDLER
        .replace(core::ptr::null_mut())
        .map(|data| LeakedWarningHandler { data })
}

struct HandlerData {
    handler: Box<dyn WarningHandler>,
}

/// A handle to a warning handler that has been leaked into static memory.
///
/// Obtained from [`set_warning_handler`], [`reset_warning_handler`],
/// [`LeakedWarningHandler::leak`] or
/// [`LeakedWarningHandler::fetch_current`]. It can be used to reinstall a
/// handler, or to forward warnings to a previously installed handler from a
/// new one.
///
/// ```rust
/// use faultstack::{SourceLocation, warning, warning::LeakedWarningHandler};
///
/// // Installed earlier, e.g. by the embedding application.
/// warning::set_warning_handler(|_: &SourceLocation, _: &str| {});
///
/// // Wrap whatever is installed now.
/// let previous = LeakedWarningHandler::fetch_current();
/// warning::set_warning_handler(move |location: &SourceLocation, message: &str| {
///     let message = message.to_uppercase();
///     match previous {
///         Some(previous) => previous.handle(location, &message),
///         None => warning::print_warning(location, &message),
///     }
/// });
/// # warning::reset_warning_handler();
/// ```
#[derive(Copy, Clone)]
pub struct LeakedWarningHandler {
    /// # Safety
    ///
    /// 1. This pointer points to a valid `HandlerData` that has been leaked
    ///    from a `Box<HandlerData>`.
    /// 2. The `HandlerData` pointed to has been leaked and will remain valid
    ///    for the lifetime of the program, unless reclaimed using
    ///    [`LeakedWarningHandler::reclaim`].
    data: NonNull<HandlerData>,
}

// SAFETY: The pointee is only ever accessed through shared references, and
// `HandlerData` only holds a `Box<dyn WarningHandler>`, which is `Send + Sync`.
unsafe impl Send for LeakedWarningHandler {}
// SAFETY: See the `Send` implementation above.
unsafe impl Sync for LeakedWarningHandler {}

impl fmt::Debug for LeakedWarningHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LeakedWarningHandler")
            .field(&self.data)
            .finish()
    }
}

impl LeakedWarningHandler {
    /// Leaks `handler` without installing it.
    pub fn leak<H: WarningHandler>(handler: H) -> Self {
        let data = Box::new(HandlerData {
            handler: Box::new(handler),
        });
        Self {
            data: NonNull::from(Box::leak(data)),
        }
    }

    /// Fetches the currently installed handler, if one other than the
    /// default is installed.
    pub fn fetch_current() -> Option<Self> {
        Some(Self {
            data: HANDLER.fetch()?,
        })
    }

    /// Installs this handler, returning the previously installed one, if
    /// any.
    pub fn replace(self) -> Option<LeakedWarningHandler> {
        Some(Self {
            data: HANDLER.replace(self.data.as_ptr())?,
        })
    }

    /// Passes a warning to this handler, whether or not it is installed.
    pub fn handle(&self, location: &SourceLocation, message: &str) {
        // SAFETY:
        //
        // - The pointer was obtained from a leaked Box, so it is valid to
        //   convert it into a shared reference.
        // - It remains valid until reclaimed, and reclaiming requires that no
        //   other handle to it is used afterwards.
        let data = unsafe { self.data.as_ref() };
        data.handler.handle(location, message);
    }

    /// Reclaims ownership of the leaked handler.
    ///
    /// **⚠ WARNING: This function is almost impossible to use safely. Do not
    /// call it unless you have global knowledge about the entire execution
    /// state of the program that justifies why it is safe.**
    ///
    /// # Safety
    ///
    /// The caller must ensure that no other references to this handler
    /// exist or will be used afterwards. This includes:
    ///
    /// 1. The handler being currently installed.
    /// 2. This or other threads currently running the handler through
    ///    [`warn`].
    /// 3. This or other threads holding onto another `LeakedWarningHandler`
    ///    pointing to the same handler.
    pub unsafe fn reclaim(self) -> Box<dyn WarningHandler> {
        // SAFETY:
        // - The pointer was obtained from `Box::leak` on a `Box<HandlerData>`.
        // - The caller has promised that no other references exist.
        let data = unsafe { Box::from_raw(self.data.as_ptr()) };
        data.handler
    }
}

struct GlobalHandler {
    /// # Safety
    ///
    /// 1. This pointer is either null, or points to a valid `HandlerData`
    ///    that has been leaked from a `Box`.
    /// 2. A non-null pointer remains valid for the lifetime of the program,
    ///    or until replaced and then reclaimed using
    ///    `LeakedWarningHandler::reclaim`.
    /// 3. All writes use release semantics and all reads that will be
    ///    dereferenced use acquire semantics.
    ptr: AtomicPtr<HandlerData>,
}

impl GlobalHandler {
    const fn new() -> Self {
        Self {
            ptr: AtomicPtr::new(core::ptr::null_mut()),
        }
    }

    fn fetch(&self) -> Option<NonNull<HandlerData>> {
        NonNull::new(self.ptr.load(Ordering::Acquire))
    }

    /// Swaps in `new`, which is either null or a leaked `HandlerData`.
    fn replace(&self, new: *mut HandlerData) -> Option<NonNull<HandlerData>> {
        NonNull::new(self.ptr.swap(new, Ordering::AcqRel))
    }
}

static HANDLER: GlobalHandler = GlobalHandler::new();

impl HandlerData {
    fn fetch() -> Option<&'static HandlerData> {
        let ptr = HANDLER.fetch()?;

        // SAFETY:
        //
        // - The pointer was leaked from a Box, so it is valid to convert it
        //   into a reference.
        // - It remains valid for the lifetime of the program unless reclaimed,
        //   and reclaiming requires that no references like this one exist.
        Some(unsafe { ptr.as_ref() })
    }
}

/// Serializes tests that touch the global handler slot.
#[cfg(test)]
pub(crate) fn test_guard() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, sync::Arc, vec::Vec};
    use std::sync::Mutex;

    use super::*;

    type Log = Arc<Mutex<Vec<(SourceLocation, String)>>>;

    fn recording_handler() -> (Log, impl WarningHandler) {
        let log: Log = Arc::default();
        let sink = Arc::clone(&log);
        let handler = move |location: &SourceLocation, message: &str| {
            sink.lock()
                .unwrap()
                .push((*location, message.to_string()));
        };
        (log, handler)
    }

    #[test]
    fn test_custom_handler_receives_warnings_in_order() {
        let _guard = test_guard();
        let (log, handler) = recording_handler();
        set_warning_handler(handler);

        let first = SourceLocation::new("a", "a.rs", 1);
        let second = SourceLocation::new("b", "b.rs", 2);
        assert!(HandlerData::fetch().is_some());
        warn(&first, "first");
        warn(&second, "second");
        assert!(HandlerData::fetch().is_some());
        reset_warning_handler();

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], (first, "first".to_string()));
        assert_eq!(log[1], (second, "second".to_string()));
    }

    #[test]
    fn test_set_returns_previous() {
        let _guard = test_guard();
        reset_warning_handler();
        assert!(set_warning_handler(|_: &SourceLocation, _: &str| {}).is_none());
        assert!(LeakedWarningHandler::fetch_current().is_some());
        assert!(set_warning_handler(|_: &SourceLocation, _: &str| {}).is_some());
        assert!(reset_warning_handler().is_some());
        assert!(LeakedWarningHandler::fetch_current().is_none());
        assert!(reset_warning_handler().is_none());
    }

    #[test]
    fn test_reinstall_previous_handler() {
        let _guard = test_guard();
        let (log, handler) = recording_handler();
        let location = SourceLocation::new("f", "f.rs", 3);

        set_warning_handler(handler);
        let original = set_warning_handler(|_: &SourceLocation, _: &str| {})
            .expect("recording handler was installed");
        warn(&location, "dropped");
        original.replace();
        warn(&location, "kept");
        reset_warning_handler();

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].1, "kept");
    }

    #[test]
    fn test_forward_to_previous() {
        let _guard = test_guard();
        let (log, handler) = recording_handler();
        let inner = LeakedWarningHandler::leak(handler);
        set_warning_handler(move |location: &SourceLocation, message: &str| {
            inner.handle(location, &alloc::format!("[wrapped] {message}"));
        });

        warn(&SourceLocation::new("g", "g.rs", 4), "careful");
        reset_warning_handler();

        assert_eq!(log.lock().unwrap()[0].1, "[wrapped] careful");
    }

    #[test]
    fn test_reclaim_uninstalled_handler() {
        let (log, handler) = recording_handler();
        let leaked = LeakedWarningHandler::leak(handler);
        // SAFETY: The handler was never installed and this is the only handle.
        let handler = unsafe { leaked.reclaim() };
        handler.handle(&SourceLocation::new("h", "h.rs", 5), "direct");
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_warnings() {
        let _guard = test_guard();
        let (log, handler) = recording_handler();
        set_warning_handler(handler);

        std::thread::scope(|scope| {
            for t in 0..4 {
                scope.spawn(move || {
                    let location = SourceLocation::new("worker", "w.rs", t);
                    for _ in 0..25 {
                        warn(&location, "busy");
                    }
                });
            }
        });
        reset_warning_handler();

        assert_eq!(log.lock().unwrap().len(), 100);
    }

    #[test]
    fn test_format_warning() {
        let location = SourceLocation::new("ops::cast", "src/ops.rs", 31);
        assert_eq!(
            format_warning(&location, "lossy cast"),
            "Warning: lossy cast (function ops::cast at src/ops.rs:31)"
        );
    }

    #[test]
    fn test_leaked_handle_is_send_sync() {
        static_assertions::assert_impl_all!(LeakedWarningHandler: Send, Sync, Copy);
        static_assertions::assert_impl_all!(DefaultWarningHandler: WarningHandler);
    }
}
