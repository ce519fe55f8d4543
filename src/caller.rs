//! Opaque caller identity handles.
//!
//! A [`CallerId`] is stashed in a [`Fault`](crate::Fault) at construction so
//! that whoever catches the fault can compare it against handles they have on
//! hand, for example to find out which operator in a graph raised it. The
//! handle is a correlation key only: it is never dereferenced and implies no
//! ownership.

use core::fmt;

/// Opaque, comparable identity of the code that raised a fault.
///
/// ```rust
/// use faultstack::CallerId;
///
/// struct Operator {
///     name: &'static str,
/// }
///
/// let conv = Operator { name: "conv2d" };
/// let relu = Operator { name: "relu" };
///
/// let id = CallerId::of(&conv);
/// assert_eq!(id, CallerId::of(&conv));
/// assert_ne!(id, CallerId::of(&relu));
/// assert!(CallerId::NONE.is_none());
/// # let _ = (conv.name, relu.name);
/// ```
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct CallerId(u64);

impl CallerId {
    /// No caller recorded.
    pub const NONE: CallerId = CallerId(0);

    /// Creates a handle from a raw value. Zero is the same as
    /// [`NONE`](Self::NONE).
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Creates a handle from the address of `value`.
    ///
    /// Only the address is kept; `value` may be dropped or moved afterwards,
    /// at which point the handle simply stops matching anything useful.
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized>(value: &T) -> Self {
        let address = core::ptr::from_ref(value).cast::<()>().addr();
        Self(address as u64)
    }

    /// The raw value.
    #[inline]
    #[must_use]
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// True if no caller was recorded.
    #[inline]
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "caller:none")
        } else {
            write!(f, "caller:{:#x}", self.0)
        }
    }
}

impl fmt::Debug for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
