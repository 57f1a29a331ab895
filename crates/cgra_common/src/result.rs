//! Common result and error types for the CGRA toolchain.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates an unrecoverable internal error (a bug in the placer),
/// not a user-facing error. User-facing conditions are reported through
/// the diagnostics sink or through the placer's own error enum.
pub type CgraResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in the placer, not a user input problem.
///
/// These errors should never occur during normal operation. If one does occur,
/// it means a caller contract was broken or there is a logic error that
/// should be fixed.
#[derive(Debug, thiserror::Error)]
#[error("internal placer error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("net references a ghost block");
        assert_eq!(
            format!("{err}"),
            "internal placer error: net references a ghost block"
        );
    }

    #[test]
    fn ok_path() {
        let r: CgraResult<i32> = Ok(42);
        assert_eq!(r.ok(), Some(42));
    }

    #[test]
    fn from_string() {
        let err: InternalError = "from string".to_string().into();
        assert_eq!(err.message, "from string");
    }
}
