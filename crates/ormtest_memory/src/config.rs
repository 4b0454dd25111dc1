//! Session configuration.

/// Configuration for a [`MemorySession`](crate::MemorySession).
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// First integer identity assigned to transient records.
    pub first_key: i64,

    /// Whether deleting an unknown identity is a commit-time error.
    pub strict_delete: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            first_key: 1,
            strict_delete: true,
        }
    }
}

impl MemoryConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the first auto-assigned identity.
    #[must_use]
    pub const fn first_key(mut self, value: i64) -> Self {
        self.first_key = value;
        self
    }

    /// Sets whether deleting an unknown identity errors.
    #[must_use]
    pub const fn strict_delete(mut self, value: bool) -> Self {
        self.strict_delete = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = MemoryConfig::default();
        assert_eq!(config.first_key, 1);
        assert!(config.strict_delete);
    }

    #[test]
    fn builder_pattern() {
        let config = MemoryConfig::new().first_key(100).strict_delete(false);
        assert_eq!(config.first_key, 100);
        assert!(!config.strict_delete);
    }
}
