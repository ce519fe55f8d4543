/// Captures the [`SourceLocation`] of the macro invocation.
///
/// The function name is the path of the enclosing function, with closure
/// segments removed.
///
/// ```
/// fn normalize() -> faultstack::SourceLocation {
///     faultstack::source_location!()
/// }
///
/// let location = normalize();
/// assert!(location.function.ends_with("normalize"));
/// assert_eq!(location.file, file!());
/// ```
///
/// [`SourceLocation`]: crate::SourceLocation
#[macro_export]
macro_rules! source_location {
    () => {{
        fn __f() {}
        $crate::SourceLocation::new(
            $crate::__private::trim_function_name($crate::__private::type_name_of_val(&__f)),
            $crate::__private::file!(),
            $crate::__private::line!(),
        )
    }};
}

/// Creates a [`Fault`] at the current location.
///
/// The arguments are interpreted like those of [`format!()`]. The fault has
/// no backtrace; its [`location`](crate::Fault::location) is the invocation
/// site.
///
/// ```
/// use faultstack::{FaultKind, fault};
///
/// let rank = 5;
/// let fault = fault!("expected a tensor of rank 2, got rank {rank}");
/// assert_eq!(fault.what(), "expected a tensor of rank 2, got rank 5");
/// assert_eq!(fault.kind(), FaultKind::Generic);
/// ```
///
/// [`Fault`]: crate::Fault
/// [`format!()`]: std::format
#[macro_export]
macro_rules! fault {
    ($($arg:tt)+) => {
        $crate::Fault::at(
            $crate::source_location!(),
            $crate::__private::format!($($arg)+),
        )
    };
}

/// Creates an [`Index`](crate::FaultKind::Index) fault at the current
/// location.
///
/// ```
/// use faultstack::index_fault;
///
/// let (index, len) = (10, 4);
/// let fault = index_fault!("index {index} is out of bounds for size {len}");
/// assert!(fault.is_index());
/// ```
#[macro_export]
macro_rules! index_fault {
    ($($arg:tt)+) => {
        $crate::Fault::index_at(
            $crate::source_location!(),
            $crate::__private::format!($($arg)+),
        )
    };
}

/// Returns early with a fault built by [`fault!`].
///
/// This is equivalent to writing `return Err(fault!(...).into());`
///
/// ```
/// use faultstack::prelude::*;
///
/// fn divide(a: i64, b: i64) -> Result<i64, Fault> {
///     if b == 0 {
///         bail!("cannot divide {a} by zero");
///     }
///     Ok(a / b)
/// }
///
/// assert_eq!(divide(6, 3).unwrap(), 2);
/// assert_eq!(divide(6, 0).unwrap_err().what(), "cannot divide 6 by zero");
/// ```
#[macro_export]
macro_rules! bail {
    ($($arg:tt)+) => {
        return $crate::__private::Err($crate::fault!($($arg)+).into())
    };
}

/// Checks a condition that depends on user input, returning early with a
/// fault if it does not hold.
///
/// Optional trailing arguments are interpreted like those of [`format!()`]
/// and only evaluated on failure. When they are absent or format to an empty
/// string, a default message naming the condition is used.
///
/// ```
/// use faultstack::prelude::*;
///
/// fn set_rate(rate: f64) -> Result<(), Fault> {
///     check!(rate > 0.0, "learning rate must be positive, got {rate}");
///     check!(rate < 1.0);
///     Ok(())
/// }
///
/// assert_eq!(
///     set_rate(-1.0).unwrap_err().what(),
///     "learning rate must be positive, got -1"
/// );
/// assert!(set_rate(2.0).unwrap_err().what().starts_with("Expected rate < 1.0 to be true"));
/// ```
///
/// [`format!()`]: std::format
#[macro_export]
macro_rules! check {
    ($cond:expr $(,)?) => {
        $crate::check!($cond, "")
    };
    ($cond:expr, $($arg:tt)+) => {
        if !($cond) {
            return $crate::__private::Err(
                $crate::__private::check_failure(
                    $crate::source_location!(),
                    $crate::__private::stringify!($cond),
                    $crate::__private::format!($($arg)+),
                )
                .into(),
            );
        }
    };
}

/// Checks an internal invariant, returning early with a fault if it does
/// not hold.
///
/// Unlike [`assert!`], this never aborts or panics: a broken invariant is
/// reported like any other fault. Use [`check!`] for conditions that depend
/// on user input.
///
/// ```
/// use faultstack::prelude::*;
///
/// fn pop_frame(depth: usize) -> Result<usize, Fault> {
///     internal_assert!(depth > 0, "frame stack underflow");
///     Ok(depth - 1)
/// }
///
/// let fault = pop_frame(0).unwrap_err();
/// assert!(fault.what().starts_with("depth > 0 ASSERT FAILED at "));
/// assert!(fault.what().ends_with("please report a bug. frame stack underflow"));
/// ```
#[macro_export]
macro_rules! internal_assert {
    ($cond:expr $(,)?) => {
        $crate::internal_assert!($cond, "")
    };
    ($cond:expr, $($arg:tt)+) => {
        if !($cond) {
            return $crate::__private::Err(
                $crate::__private::assert_failure(
                    $crate::source_location!(),
                    $crate::__private::stringify!($cond),
                    $crate::__private::format!($($arg)+),
                )
                .into(),
            );
        }
    };
}

/// Issues a warning through the installed
/// [`WarningHandler`](crate::warning::WarningHandler).
///
/// The arguments are interpreted like those of [`format!()`].
///
/// ```
/// let dtype = "f16";
/// faultstack::warning!("{dtype} accumulation may lose precision");
/// ```
///
/// [`format!()`]: std::format
#[macro_export]
macro_rules! warning {
    ($($arg:tt)+) => {
        $crate::warning::warn(
            &$crate::source_location!(),
            &$crate::__private::format!($($arg)+),
        )
    };
}
