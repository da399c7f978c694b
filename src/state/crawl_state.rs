/// Scroll bookkeeping for one category listing
///
/// The iteration counter counts item measurements, including the initial one
/// taken right after navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlState {
    /// Number of measurements taken so far
    pub iterations: u32,

    /// Item count of the latest measurement
    pub last_count: usize,
}

impl CrawlState {
    /// Starts tracking a listing from its initial measurement
    pub fn new(initial_count: usize) -> Self {
        Self {
            iterations: 1,
            last_count: initial_count,
        }
    }

    /// Records a new measurement
    ///
    /// # Returns
    ///
    /// * `true` - The count changed, more items may follow
    /// * `false` - The count is stable, the listing is fully loaded
    pub fn observe(&mut self, count: usize) -> bool {
        self.iterations += 1;
        let changed = count != self.last_count;
        self.last_count = count;
        changed
    }

    /// Returns true once the iteration counter exceeds `scroll_cap`
    pub fn exceeds(&self, scroll_cap: u32) -> bool {
        self.iterations > scroll_cap
    }
}
