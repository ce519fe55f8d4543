#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Annotated faults and process-wide warning dispatch for numerical
//! libraries.
//!
//! ## Overview
//!
//! This crate provides two independent pieces that the rest of a library
//! uses everywhere:
//!
//! - **[`Fault`]**: an error raised once at the point of detection, carrying
//!   a message, an optional pre-formatted backtrace and an optional caller
//!   identity. Every enclosing frame may append a line of context as the
//!   fault propagates. The fault always offers a *full* rendering (messages
//!   plus backtrace) and a *concise* one (messages only).
//! - **[`warning`]**: a single swappable handler that receives all non-fatal
//!   warnings, so an embedding application can send them to a log, a UI, or
//!   nowhere, without touching library internals.
//!
//! ## Quick Example
//!
//! ```
//! use faultstack::prelude::*;
//!
//! fn gather(data: &[f32], index: usize) -> Result<f32, Fault> {
//!     match data.get(index) {
//!         Some(value) => Ok(*value),
//!         None => Err(index_fault!("index {index} is out of bounds for size {}", data.len())),
//!     }
//! }
//!
//! fn embed(tokens: &[usize]) -> Result<Vec<f32>, Fault> {
//!     let table = [0.5, 0.25, 0.125];
//!     tokens
//!         .iter()
//!         .map(|&t| gather(&table, t).append_message("while embedding tokens"))
//!         .collect()
//! }
//!
//! let fault = embed(&[0, 7]).unwrap_err();
//! assert!(fault.is_index());
//! assert_eq!(
//!     fault.concise_message(),
//!     "index 7 is out of bounds for size 3\nwhile embedding tokens"
//! );
//! ```
//!
//! ## Core Concepts
//!
//! A fault's **message stack** starts with exactly one entry, the raise
//! message, and grows by one entry per [`Fault::append_message`] call. The
//! stack is never reordered: the original message always comes first and the
//! outermost context last. This is annotation, not recovery: only a boundary
//! layer outside this crate decides whether to recover from, translate, or
//! report a fault.
//!
//! The **backtrace** is opaque text supplied at construction, for instance by
//! the companion `faultstack-backtrace` crate. The **caller** is a
//! [`CallerId`], a comparison key that whoever catches the fault can match
//! against handles they hold.
//!
//! A fault's **kind** ([`FaultKind`]) lets boundary code single out
//! out-of-bounds indexing faults without parsing message text.
//!
//! ## Features
//!
//! - `std` (default): lets the default warning handler write to standard
//!   error. Without it the crate is `no_std` + `alloc`, and the default
//!   handler discards warnings.
//!
//! ## Ecosystem
//!
//! - **`faultstack-backtrace`**: captures and formats stack backtraces into
//!   the text that [`Fault`] constructors accept.
//! - **`faultstack-tracing`**: a [`WarningHandler`](warning::WarningHandler)
//!   that forwards warnings to `tracing`.

extern crate alloc;

#[macro_use]
mod macros;

pub mod caller;
pub mod exception_string;
pub mod fault;
pub mod location;
pub mod prelude;
pub mod warning;

mod result_ext;

pub use self::{
    caller::CallerId,
    fault::{Fault, FaultKind},
    location::SourceLocation,
    result_ext::ResultExt,
};

/// A [`Result`](core::result::Result) type alias where the error is
/// [`Fault`].
///
/// ```
/// fn parse_rank(text: &str) -> faultstack::Result<usize> {
///     text.parse()
///         .map_err(|e| faultstack::fault!("invalid rank {text:?}: {e}"))
/// }
///
/// assert_eq!(parse_rank("3").unwrap(), 3);
/// assert!(parse_rank("three").is_err());
/// ```
pub type Result<T, E = Fault> = core::result::Result<T, E>;

// Not public API. Referenced by macro-generated code and faultstack-backtrace.
#[doc(hidden)]
pub mod __private {
    // Used by faultstack-backtrace to recognize frames from this crate.
    pub const FAULTSTACK_MANIFEST_DIR: &str = env!("CARGO_MANIFEST_DIR");

    #[doc(hidden)]
    pub use alloc::format;
    use alloc::string::String;
    #[doc(hidden)]
    pub use core::{any::type_name_of_val, file, line, result::Result::Err, stringify};

    #[doc(hidden)]
    pub use crate::location::__trim_function_name as trim_function_name;
    use crate::{Fault, SourceLocation, fault::if_empty_then};

    #[doc(hidden)]
    #[cold]
    #[must_use]
    pub fn check_failure(location: SourceLocation, condition: &str, message: String) -> Fault {
        let message = if_empty_then(message, || {
            alloc::format!(
                "Expected {condition} to be true, but got false. \
                 (Could this error message be improved? If so, please report an enhancement request.)"
            )
        });
        Fault::at(location, message)
    }

    #[doc(hidden)]
    #[cold]
    #[must_use]
    pub fn assert_failure(location: SourceLocation, condition: &str, extra: String) -> Fault {
        let SourceLocation { file, line, .. } = location;
        let message = if extra.is_empty() {
            alloc::format!("{condition} ASSERT FAILED at {file}:{line}, please report a bug.")
        } else {
            alloc::format!("{condition} ASSERT FAILED at {file}:{line}, please report a bug. {extra}")
        };
        Fault::at(location, message)
    }
}
