use std::fmt;

/// Slots in the inventory grid, and in the chest
pub const MAX_SLOTS: usize = 27;

/// Which container a capacity check ran against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Inventory,
    Chest,
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Inventory => write!(f, "inventory"),
            Container::Chest => write!(f, "chest"),
        }
    }
}

/// A failed capacity check, with the counts it saw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityDenied {
    pub container: Container,
    pub current: usize,
    /// Completions in flight that already reserved a chest slot
    pub pending: usize,
    pub limit: usize,
}

/// Can one more task be added to the inventory?
pub fn check_inventory(active_len: usize) -> Result<(), CapacityDenied> {
    if active_len >= MAX_SLOTS {
        return Err(CapacityDenied {
            container: Container::Inventory,
            current: active_len,
            pending: 0,
            limit: MAX_SLOTS,
        });
    }
    Ok(())
}

/// Can one more completion be started, given the chest size and the
/// completions already reserved against it?
pub fn check_chest(completed_len: usize, pending: usize) -> Result<(), CapacityDenied> {
    if completed_len >= MAX_SLOTS || completed_len + pending + 1 > MAX_SLOTS {
        return Err(CapacityDenied {
            container: Container::Chest,
            current: completed_len,
            pending,
            limit: MAX_SLOTS,
        });
    }
    Ok(())
}

/// Free slots left in the chest once in-flight completions land
pub fn chest_headroom(completed_len: usize, pending: usize) -> usize {
    MAX_SLOTS.saturating_sub(completed_len + pending)
}
