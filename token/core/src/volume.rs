// Copyright (c) 2024 Botho Foundation

//! Per-account daily volume limiter.
//!
//! Each account carries a [`VolumeWindow`] keyed by the UTC day index
//! (`timestamp / 86400`). A window from an earlier day counts as empty, so
//! resets happen lazily on the next transfer instead of on a timer.

use crate::{Address, Amount, TokenError};
use std::collections::HashMap;

/// Length of a volume bucket in seconds.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Day bucket for a timestamp.
pub const fn day_index(timestamp: u64) -> u64 {
    timestamp / SECONDS_PER_DAY
}

/// Cumulative volume recorded for one account on one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolumeWindow {
    pub day_index: u64,
    pub cumulative: Amount,
}

/// Volume already used today, treating a stale window as empty.
pub fn effective_cumulative(window: Option<&VolumeWindow>, now: u64) -> Amount {
    match window {
        Some(w) if w.day_index == day_index(now) => w.cumulative,
        _ => 0,
    }
}

/// Tracks day windows and enforces the cap.
///
/// A cap of zero disables the limiter. [`check`](Self::check) never mutates,
/// so the ledger can validate everything before committing with
/// [`commit`](Self::commit).
#[derive(Debug, Clone, Default)]
pub struct VolumeLimiter {
    max_daily_volume: Amount,
    windows: HashMap<Address, VolumeWindow>,
}

impl VolumeLimiter {
    pub fn new(max_daily_volume: Amount) -> Self {
        Self {
            max_daily_volume,
            windows: HashMap::new(),
        }
    }

    pub fn max_daily_volume(&self) -> Amount {
        self.max_daily_volume
    }

    pub fn set_max_daily_volume(&mut self, max_daily_volume: Amount) {
        self.max_daily_volume = max_daily_volume;
    }

    pub fn is_enabled(&self) -> bool {
        self.max_daily_volume > 0
    }

    /// Volume `account` has used on the day containing `now`.
    pub fn daily_volume(&self, account: &Address, now: u64) -> Amount {
        effective_cumulative(self.windows.get(account), now)
    }

    /// Compute the window that would result from moving `amount`, or fail if
    /// it would exceed the cap.
    pub fn check(
        &self,
        account: &Address,
        amount: Amount,
        now: u64,
    ) -> Result<VolumeWindow, TokenError> {
        let attempted = self
            .daily_volume(account, now)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;

        if attempted > self.max_daily_volume {
            return Err(TokenError::MaxDailyVolumeExceeded {
                account: *account,
                attempted,
                limit: self.max_daily_volume,
            });
        }

        Ok(VolumeWindow {
            day_index: day_index(now),
            cumulative: attempted,
        })
    }

    /// Store a window produced by [`check`](Self::check).
    pub fn commit(&mut self, account: Address, window: VolumeWindow) {
        self.windows.insert(account, window);
    }
}
