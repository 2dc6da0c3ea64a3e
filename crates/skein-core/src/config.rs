//! Container configuration parameters.

/// Tuning parameters shared by lists and sorted lists.
///
/// Fixed at construction; a container never changes its configuration
/// afterwards. Deep copies inherit the configuration of their source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerConfig {
    /// How many past invalidation records a container retains for cursor
    /// validation in debug builds.
    ///
    /// A cursor that has not been validated for more than this many
    /// structural mutations is treated as orphaned even if none of the
    /// mutations touched its position. Must be at least 1.
    pub generation_window: usize,

    /// Capacity reserved by the first growth of an empty container.
    ///
    /// Zero means growth is driven purely by the requested size.
    pub initial_capacity: usize,
}

impl ContainerConfig {
    /// Default number of retained invalidation records.
    pub const DEFAULT_GENERATION_WINDOW: usize = 32;

    /// Default first-growth capacity.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 0;

    /// Create a config with default values.
    pub fn new() -> Self {
        Self {
            generation_window: Self::DEFAULT_GENERATION_WINDOW,
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
        }
    }

    /// Set the first-growth capacity.
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Set the invalidation record window, clamped to at least 1.
    pub fn with_generation_window(mut self, generation_window: usize) -> Self {
        self.generation_window = generation_window.max(1);
        self
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self::new()
    }
}
