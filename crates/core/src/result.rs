//! Result type definition and tap-style combinators.
//!
//! Lets callers attach logging to a fallible step without breaking the `?` chain.

use crate::error::Error;

/// The standard Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for any Result type.
///
/// Provides tap-style combinators for side effects.
pub trait GenericResultExt<T, E> {
    /// Perform a side effect on Ok value without consuming the Result.
    fn tap_ok<F: FnOnce(&T)>(self, f: F) -> Self;

    /// Perform a side effect on Err value without consuming the Result.
    fn tap_err<F: FnOnce(&E)>(self, f: F) -> Self;
}

impl<T, E> GenericResultExt<T, E> for std::result::Result<T, E> {
    fn tap_ok<F: FnOnce(&T)>(self, f: F) -> Self {
        if let Ok(ref v) = self {
            f(v);
        }
        self
    }

    fn tap_err<F: FnOnce(&E)>(self, f: F) -> Self {
        if let Err(ref e) = self {
            f(e);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tap_err_sees_error_only() {
        let mut seen = Vec::new();
        let ok: std::result::Result<i32, String> = Ok(1);
        let err: std::result::Result<i32, String> = Err("boom".to_string());

        let ok = ok.tap_err(|e| seen.push(e.clone()));
        let err = err.tap_err(|e| seen.push(e.clone()));

        assert_eq!(ok, Ok(1));
        assert_eq!(err, Err("boom".to_string()));
        assert_eq!(seen, vec!["boom".to_string()]);
    }

    #[test]
    fn test_tap_ok_sees_value_only() {
        let mut seen = None;
        let result: Result<u8> = Ok(7);
        let result = result.tap_ok(|v| seen = Some(*v));
        assert!(result.is_ok());
        assert_eq!(seen, Some(7));
    }
}
