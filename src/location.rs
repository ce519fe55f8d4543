//! Source code locations of raise and warning sites.
//!
//! A [`SourceLocation`] names the function, file and line where a fault was
//! raised or a warning was issued. It is a plain value: faults store it, the
//! warning dispatcher hands it to the installed handler, and nothing in this
//! crate ever interprets it beyond formatting.
//!
//! Most code never builds one by hand. The [`source_location!`] macro fills
//! in all three fields at the call site:
//!
//! ```rust
//! use faultstack::source_location;
//!
//! fn load_weights() -> faultstack::SourceLocation {
//!     source_location!()
//! }
//!
//! let location = load_weights();
//! assert!(location.function.ends_with("load_weights"));
//! assert!(location.file.ends_with(".rs"));
//! ```
//!
//! [`source_location!`]: crate::source_location

use core::fmt;

/// Function, file and line of a raise or warning site.
///
/// The [`Display`](fmt::Display) form is
/// `function <function> at <file>:<line>`, which is also the text that the
/// default warning handler prints between parentheses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// The path of the enclosing function.
    pub function: &'static str,
    /// The source file path.
    pub file: &'static str,
    /// The line number inside `file`.
    pub line: u32,
}

impl SourceLocation {
    /// Placeholder used for [`function`](Self::function) when the enclosing
    /// function is not known.
    pub const UNKNOWN_FUNCTION: &'static str = "<unknown>";

    /// Creates a location from its three parts.
    #[must_use]
    pub const fn new(function: &'static str, file: &'static str, line: u32) -> Self {
        Self {
            function,
            file,
            line,
        }
    }

    /// Captures the file and line of the caller.
    ///
    /// Rust has no equivalent of a function-name intrinsic usable from a
    /// plain function, so the function is reported as
    /// [`UNKNOWN_FUNCTION`](Self::UNKNOWN_FUNCTION). Use the
    /// [`source_location!`](crate::source_location) macro when the function
    /// name matters.
    ///
    /// ```rust
    /// use faultstack::SourceLocation;
    ///
    /// let location = SourceLocation::caller();
    /// assert_eq!(location.function, SourceLocation::UNKNOWN_FUNCTION);
    /// assert_eq!(location.line, line!() - 2);
    /// ```
    #[track_caller]
    #[must_use]
    pub fn caller() -> Self {
        let location = core::panic::Location::caller();
        Self {
            function: Self::UNKNOWN_FUNCTION,
            file: location.file(),
            line: location.line(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "function {} at {}:{}",
            self.function, self.file, self.line
        )
    }
}

/// Strips the trailing `::__f` segment (and any `::{{closure}}` segments
/// before it) from the type name produced inside
/// [`source_location!`](crate::source_location).
#[doc(hidden)]
#[must_use]
pub const fn __trim_function_name(name: &'static str) -> &'static str {
    let mut name = strip_suffix(name, "::__f");
    loop {
        let trimmed = strip_suffix(name, "::{{closure}}");
        if trimmed.len() == name.len() {
            return name;
        }
        name = trimmed;
    }
}

const fn strip_suffix(s: &'static str, suffix: &str) -> &'static str {
    let (bytes, suffix_bytes) = (s.as_bytes(), suffix.as_bytes());
    if bytes.len() < suffix_bytes.len() {
        return s;
    }
    let start = bytes.len() - suffix_bytes.len();
    let mut i = 0;
    while i < suffix_bytes.len() {
        if bytes[start + i] != suffix_bytes[i] {
            return s;
        }
        i += 1;
    }
    // Both suffixes start with an ASCII ':', so `start` is a char boundary.
    s.split_at(start).0
}

#[cfg(test)]
mod tests {
    use alloc::format;

    use super::*;

    #[test]
    fn test_display_format() {
        let location = SourceLocation::new("kernels::gather", "src/gather.rs", 17);
        assert_eq!(
            format!("{location}"),
            "function kernels::gather at src/gather.rs:17"
        );
    }

    #[test]
    fn test_caller_uses_call_site() {
        let location = SourceLocation::caller();
        assert_eq!(location.file, file!());
        assert_eq!(location.line, line!() - 2);
        assert_eq!(location.function, SourceLocation::UNKNOWN_FUNCTION);
    }

    #[test]
    fn test_macro_names_enclosing_function() {
        fn resolve_shape() -> SourceLocation {
            crate::source_location!()
        }

        let location = resolve_shape();
        assert!(location.function.ends_with("resolve_shape"));
        assert!(!location.function.ends_with("__f"));
        assert_eq!(location.file, file!());
    }

    #[test]
    fn test_macro_inside_closure() {
        let capture = || crate::source_location!();
        let location = capture();
        assert!(!location.function.contains("{{closure}}"));
        assert!(location.function.ends_with("test_macro_inside_closure"));
    }

    #[test]
    fn test_trim_function_name() {
        assert_eq!(__trim_function_name("a::b::__f"), "a::b");
        assert_eq!(__trim_function_name("a::b::{{closure}}::__f"), "a::b");
        assert_eq!(__trim_function_name("plain"), "plain");
        assert_eq!(__trim_function_name("a::b::__F"), "a::b::__F");
        assert_eq!(
            __trim_function_name("a::{{CLOSURE}}::__f"),
            "a::{{CLOSURE}}"
        );
        assert_eq!(__trim_function_name("__f"), "__f");
    }
}
