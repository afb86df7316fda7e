//! Predicates over user input.
//!
//! Guards decide whether a state accepts an answer. They are plain
//! functions of the content, so states can be tested without a controller.

/// Pure predicate that decides whether an answer is accepted.
///
/// # Example
///
/// ```rust
/// use parley::core::Guard;
///
/// let numeric = Guard::new(|content: &str| content.parse::<u32>().is_ok());
///
/// assert!(numeric.check("42"));
/// assert!(!numeric.check("forty-two"));
/// ```
pub struct Guard {
    predicate: Box<dyn Fn(&str) -> bool + Send + Sync>,
}

impl Guard {
    /// Create a guard from a predicate function.
    ///
    /// The predicate must be deterministic and thread-safe.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Box::new(predicate),
        }
    }

    /// Guard that accepts any non-empty answer.
    pub fn non_empty() -> Self {
        Self::new(|content| !content.is_empty())
    }

    /// Check whether the guard accepts `content`.
    pub fn check(&self, content: &str) -> bool {
        (self.predicate)(content)
    }
}

impl std::fmt::Debug for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Guard")
    }
}
