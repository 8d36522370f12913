use std::fmt;

/// Sequence number of a session, incremented every time a batch resets.
pub type Generation = u64;

/// Outcome of a batch, identical for the terminator and every contributor of it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchResult {
    /// Wrapping sum of the batch contributions.
    pub sum: i64,
    /// Correlation token supplied by the terminator, possibly empty.
    pub token: String,
}

impl BatchResult {
    pub fn new(sum: i64, token: impl Into<String>) -> Self {
        Self {
            sum,
            token: token.into(),
        }
    }
}

impl fmt::Display for BatchResult {
    /// Renders the wire form `<sum> <token>`. The separator is written even when the
    /// token is empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.sum, self.token)
    }
}
