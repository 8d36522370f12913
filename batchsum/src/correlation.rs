/// Slot holding the token of the terminator that is releasing the current batch.
///
/// The token is stored when a release starts and cleared when the session resets.
/// Contributors read it only after they have been released, so the value they see
/// always belongs to the batch they were part of.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CorrelationRegister {
    token: String,
}

impl CorrelationRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored token.
    pub fn store(&mut self, token: String) {
        self.token = token;
    }

    /// Returns the stored token, empty when no release is in progress.
    pub fn get(&self) -> &str {
        &self.token
    }

    /// Returns the stored token and leaves the slot empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.token)
    }
}
