//! Batch mapping configuration

/// Configuration for [`crate::batch::map_export`]
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Maximum number of records mapped at once
    pub max_concurrency: usize,
    /// Stop dispatching on the first failure and return it
    pub fail_fast: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(4),
            fail_fast: false,
        }
    }
}

impl BatchConfig {
    /// Set the concurrency limit. Zero is treated as one.
    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Enable or disable fail-fast mode
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}
