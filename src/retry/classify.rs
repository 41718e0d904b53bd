//! Classify operation errors into retry categories.

use std::fmt;

/// Retry category of a failed attempt.
///
/// The category decides how long to wait before the next attempt, never
/// whether a retry happens at all: every category is retried until the
/// policy's `max_retries` is used up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The remote side asked us to slow down (HTTP 429). Retried with
    /// exponential backoff.
    RateLimited,
    /// A transient failure such as a 500. Retried immediately.
    Transient,
    /// Anything the classifier could not place. Retried immediately, like
    /// [`ErrorClass::Transient`].
    Other,
}

/// Token whose presence in an error message marks it as rate limited.
pub const RATE_LIMIT_TOKEN: &str = "429";

impl ErrorClass {
    /// Classify an error by its `Display` output.
    ///
    /// An error whose `Display` impl fails is [`ErrorClass::Transient`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tributary::ErrorClass;
    ///
    /// assert_eq!(ErrorClass::of(&"429 Too Many Requests"), ErrorClass::RateLimited);
    /// assert_eq!(ErrorClass::of(&"500 Internal Server Error"), ErrorClass::Transient);
    /// ```
    pub fn of<E: fmt::Display + ?Sized>(error: &E) -> Self {
        let mut message = String::new();
        if fmt::Write::write_fmt(&mut message, format_args!("{}", error)).is_err() {
            return ErrorClass::Transient;
        }
        classify_message(&message)
    }

    /// Returns true if this class waits before retrying.
    pub fn backs_off(&self) -> bool {
        matches!(self, ErrorClass::RateLimited)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorClass::RateLimited => "rate_limited",
            ErrorClass::Transient => "transient",
            ErrorClass::Other => "other",
        };
        f.write_str(name)
    }
}

/// Classify a raw error message.
///
/// An empty or unrecognisable message is [`ErrorClass::Transient`].
pub fn classify_message(message: &str) -> ErrorClass {
    if message.contains(RATE_LIMIT_TOKEN) {
        ErrorClass::RateLimited
    } else {
        ErrorClass::Transient
    }
}
