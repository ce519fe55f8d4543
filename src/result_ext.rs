use alloc::string::String;

use crate::fault::Fault;

mod sealed {
    pub trait Sealed {}
    impl<T> Sealed for core::result::Result<T, crate::Fault> {}
}

/// Extension methods for annotating a [`Fault`] inside a `Result` as it
/// propagates.
///
/// ```rust
/// use faultstack::prelude::*;
///
/// fn read_tile(row: usize) -> Result<Vec<f32>, Fault> {
///     bail!("tile {row} is corrupt");
/// }
///
/// fn read_matrix() -> Result<Vec<f32>, Fault> {
///     let tile = read_tile(3).append_message("while loading matrix 'weights'")?;
///     Ok(tile)
/// }
///
/// let fault = read_matrix().unwrap_err();
/// assert_eq!(
///     fault.message_stack(),
///     ["tile 3 is corrupt", "while loading matrix 'weights'"]
/// );
/// ```
pub trait ResultExt<T>: sealed::Sealed {
    /// Appends `message` to the fault, if there is one.
    #[must_use]
    fn append_message(self, message: impl Into<String>) -> Self;

    /// Appends the message produced by `message` to the fault, if there is
    /// one. The closure only runs on the error path.
    #[must_use]
    fn append_message_lazy<M, F>(self, message: F) -> Self
    where
        F: FnOnce() -> M,
        M: Into<String>;
}

impl<T> ResultExt<T> for core::result::Result<T, Fault> {
    fn append_message(self, message: impl Into<String>) -> Self {
        self.map_err(|fault| fault.with_message(message))
    }

    fn append_message_lazy<M, F>(self, message: F) -> Self
    where
        F: FnOnce() -> M,
        M: Into<String>,
    {
        self.map_err(|fault| fault.with_message(message()))
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;

    #[test]
    fn test_ok_passes_through() {
        let result: crate::Result<u32> = Ok(7);
        let called = Cell::new(false);
        let result = result
            .append_message("unused")
            .append_message_lazy(|| {
                called.set(true);
                "also unused"
            });
        assert_eq!(result.unwrap(), 7);
        assert!(!called.get());
    }

    #[test]
    fn test_err_is_annotated_in_order() {
        let result: crate::Result<()> = Err(Fault::new("disk full", ""));
        let fault = result
            .append_message("while writing checkpoint")
            .append_message_lazy(|| alloc::format!("at step {}", 1200))
            .unwrap_err();
        assert_eq!(
            fault.message_stack(),
            ["disk full", "while writing checkpoint", "at step 1200"]
        );
    }

    #[test]
    fn test_kind_is_preserved() {
        let result: crate::Result<()> = Err(Fault::index("index 9 out of range", ""));
        let fault = result.append_message("in gather").unwrap_err();
        assert!(fault.is_index());
    }
}
