//! Online player roster

use std::sync::Mutex;

use crate::timer::PopulationSource;

/// Mutex-guarded count of players currently online.
///
/// The count is reported by the host, not derived from connections; joins
/// and leaves saturate so a missed event can never wrap the counter.
#[derive(Debug)]
pub struct PlayerRoster {
    online: Mutex<u32>,
}

impl PlayerRoster {
    pub fn new() -> Self {
        Self {
            online: Mutex::new(0),
        }
    }

    /// Run `f` with the count held locked and return its result.
    ///
    /// Callers that emit an event carrying the new count do so inside `f`,
    /// which keeps event order consistent with the counts carried.
    pub fn update<R>(&self, f: impl FnOnce(&mut u32) -> R) -> Result<R, String> {
        let mut online = self
            .online
            .lock()
            .map_err(|e| format!("Failed to lock player roster: {}", e))?;
        Ok(f(&mut online))
    }

    pub fn current(&self) -> u32 {
        match self.online.lock() {
            Ok(online) => *online,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl Default for PlayerRoster {
    fn default() -> Self {
        Self::new()
    }
}

impl PopulationSource for PlayerRoster {
    fn current_count(&self) -> u32 {
        self.current()
    }
}
