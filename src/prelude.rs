//! Commonly used items for convenient importing.
//!
//! ```rust
//! use faultstack::prelude::*;
//!
//! fn normalize(values: &mut [f32]) -> Result<(), Fault> {
//!     let sum: f32 = values.iter().sum();
//!     check!(sum != 0.0, "cannot normalize a vector that sums to zero");
//!     values.iter_mut().for_each(|v| *v /= sum);
//!     Ok(())
//! }
//!
//! let mut values = [1.0, 3.0];
//! normalize(&mut values).unwrap();
//! assert_eq!(values, [0.25, 0.75]);
//! ```
//!
//! # What's Included
//!
//! - **[`Fault`]** and **[`FaultKind`]**
//! - **[`ResultExt`]**: annotating faults inside a `Result`
//! - **[`SourceLocation`]** and **[`CallerId`]**
//! - the raise-site macros: [`fault!`], [`index_fault!`], [`bail!`],
//!   [`check!`], [`internal_assert!`] and [`warning!`]

pub use crate::{
    CallerId, Fault, FaultKind, ResultExt, SourceLocation, bail, check, fault, index_fault,
    internal_assert, warning,
};
