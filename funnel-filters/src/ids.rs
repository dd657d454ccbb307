//! Monotonic id allocation for steps and attribute rows.

/// First id handed out after a full reset.
pub const BASELINE_ID: u64 = 1;

/// Hands out increasing integer ids.
///
/// One allocator serves both step ids and attribute-row ids of an
/// orchestrator. Nothing it hands out repeats until [`IdAllocator::reset`];
/// the only id used outside it is [`BASELINE_ID`] for the row of a blank step,
/// which the allocator has always moved past.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// Allocate the next id.
    pub fn allocate(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The id the next call to [`allocate`](Self::allocate) returns.
    pub fn peek(&self) -> u64 {
        self.next
    }

    pub fn reset(&mut self, next: u64) {
        self.next = next;
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::starting_at(BASELINE_ID)
    }
}
