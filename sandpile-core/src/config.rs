/// Construction parameters for a [`crate::sandpile::Sandpile`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Grid edge length; the pile is `size x size` cells.
    pub size: usize,
    /// Seed for the random cell picker.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self { size: 32, seed: 42 }
    }
}

impl Config {
    /// Checks that the configuration can back a pile.
    ///
    /// ### Returns
    /// `Ok(())` for a usable configuration, or the offending
    /// [`ConfigError`] otherwise.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::ZeroGridSize);
        }
        Ok(())
    }
}

/// Rejected construction parameters.
///
/// Raised at construction time and propagated to the caller; nothing in the
/// core recovers from it internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The grid must contain at least one cell.
    ZeroGridSize,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ZeroGridSize => write!(f, "grid size must be positive"),
        }
    }
}

impl std::error::Error for ConfigError {}
