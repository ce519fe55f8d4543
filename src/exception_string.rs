//! One-line descriptions of arbitrary errors.
//!
//! Code that only holds a `&dyn Error` (a thread-pool join handle, an FFI
//! boundary, a top-level `main`) often wants a description that names what
//! kind of error it is looking at, not just its message. These helpers
//! prefix the message with a kind name: the [`FaultKind`] name for faults,
//! and a generic marker (or the static type name, where it is known) for
//! everything else.

use alloc::string::String;
use core::error::Error;

use crate::fault::{Fault, FaultKind};

/// Prefix used for errors whose type is not known.
pub const UNKNOWN_ERROR_PREFIX: &str = "Error (type unknown to faultstack)";

/// Describes `error` as `"<kind>: <message>"`.
///
/// Faults use their [`FaultKind::name`] and their full message
/// ([`Fault::what`]); any other error uses [`UNKNOWN_ERROR_PREFIX`] and its
/// `Display` output.
///
/// ```rust
/// use faultstack::{Fault, exception_string::exception_string};
///
/// let fault = Fault::index("index 4 is out of bounds for size 3", "");
/// assert_eq!(
///     exception_string(&fault),
///     "IndexFault: index 4 is out of bounds for size 3"
/// );
///
/// let io = std::io::Error::other("pipe closed");
/// assert_eq!(
///     exception_string(&io),
///     "Error (type unknown to faultstack): pipe closed"
/// );
/// ```
#[must_use]
pub fn exception_string(error: &(dyn Error + 'static)) -> String {
    match error.downcast_ref::<Fault>() {
        Some(fault) => describe_fault(fault),
        None => alloc::format!("{UNKNOWN_ERROR_PREFIX}: {error}"),
    }
}

/// Describes `error` as `"<kind>: <message>"`, using the static type name
/// for errors that are not faults.
///
/// ```rust
/// use faultstack::exception_string::exception_string_of;
///
/// let parse = "x".parse::<u8>().unwrap_err();
/// assert!(exception_string_of(&parse).ends_with("ParseIntError: invalid digit found in string"));
/// ```
#[must_use]
pub fn exception_string_of<E: Error + 'static>(error: &E) -> String {
    let dynamic: &(dyn Error + 'static) = error;
    match dynamic.downcast_ref::<Fault>() {
        Some(fault) => describe_fault(fault),
        None => alloc::format!("{}: {error}", core::any::type_name::<E>()),
    }
}

fn describe_fault(fault: &Fault) -> String {
    let kind: FaultKind = fault.kind();
    alloc::format!("{}: {}", kind.name(), fault.what())
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;

    use super::*;
    use crate::fault::BACKTRACE_SEPARATOR;

    #[derive(Debug, thiserror::Error)]
    #[error("device lost")]
    struct DeviceLost;

    #[test]
    fn test_fault_uses_full_message() {
        let fault = Fault::new("boom", "frame 0");
        assert_eq!(
            exception_string(&fault),
            alloc::format!("Fault: boom{BACKTRACE_SEPARATOR}frame 0")
        );
    }

    #[test]
    fn test_index_fault_name() {
        let fault = Fault::index("bad index", "");
        assert_eq!(exception_string(&fault), "IndexFault: bad index");
        assert_eq!(exception_string_of(&fault), "IndexFault: bad index");
    }

    #[test]
    fn test_boxed_fault_is_recognized() {
        let boxed: Box<dyn Error + Send + Sync> = Box::new(Fault::new("boom", ""));
        assert_eq!(exception_string(&*boxed), "Fault: boom");
    }

    #[test]
    fn test_foreign_error_fallback() {
        assert_eq!(
            exception_string(&DeviceLost),
            "Error (type unknown to faultstack): device lost"
        );
        assert!(exception_string_of(&DeviceLost).ends_with("DeviceLost: device lost"));
    }
}
