//! Slot indexing over the clinic's operating window.
//!
//! Slot `i` starts at `window start + i * 30 min`. The window is identical
//! for every doctor and every day; all grid math goes through here.

use chrono::{Duration, NaiveTime, Timelike};
use serde::Serialize;

use appointment_cell::models::SLOT_MINUTES;
use shared_config::AppConfig;

use crate::models::ScheduleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingWindow {
    start: NaiveTime,
    slot_count: usize,
}

/// Row label for the time column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotLabel {
    pub index: usize,
    pub time: String,
    pub is_half_hour: bool,
}

fn is_aligned(time: NaiveTime) -> bool {
    time.minute() as i64 % SLOT_MINUTES == 0 && time.second() == 0 && time.nanosecond() == 0
}

impl OperatingWindow {
    /// `last_slot` is the label of the final slot, not the closing time:
    /// 08:00..20:00 has 25 slots.
    pub fn new(start: NaiveTime, last_slot: NaiveTime) -> Result<Self, ScheduleError> {
        if !is_aligned(start) || !is_aligned(last_slot) {
            return Err(ScheduleError::InvalidWindow(format!(
                "{}..{} is not aligned to half-hour slots",
                start, last_slot
            )));
        }
        if last_slot < start {
            return Err(ScheduleError::InvalidWindow(format!(
                "last slot {} is before opening {}",
                last_slot, start
            )));
        }

        let minutes = (last_slot - start).num_minutes();
        Ok(Self {
            start,
            slot_count: (minutes / SLOT_MINUTES) as usize + 1,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ScheduleError> {
        Self::new(config.clinic_open_time, config.clinic_last_slot)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn last_slot(&self) -> NaiveTime {
        self.start + Duration::minutes(SLOT_MINUTES * (self.slot_count as i64 - 1))
    }

    /// Whether `time` falls inside `[start, last_slot + 30 min)`, aligned or not.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if time < self.start {
            return false;
        }
        (time - self.start).num_minutes() < SLOT_MINUTES * self.slot_count as i64
    }

    /// Slot index of an aligned in-window time; `None` otherwise.
    pub fn index_of(&self, time: NaiveTime) -> Option<usize> {
        if !self.contains(time) || !is_aligned(time) {
            return None;
        }
        let offset = (time - self.start).num_minutes();
        Some((offset / SLOT_MINUTES) as usize)
    }

    pub fn time_at(&self, index: usize) -> Option<NaiveTime> {
        if index >= self.slot_count {
            return None;
        }
        Some(self.start + Duration::minutes(SLOT_MINUTES * index as i64))
    }

    /// First slot whose time is at or after `time`.
    pub fn first_index_at_or_after(&self, time: NaiveTime) -> Option<usize> {
        (0..self.slot_count).find(|&i| self.time_at(i).is_some_and(|t| t >= time))
    }

    pub fn labels(&self) -> Vec<SlotLabel> {
        (0..self.slot_count)
            .filter_map(|index| {
                self.time_at(index).map(|time| SlotLabel {
                    index,
                    time: time.format("%H:%M").to_string(),
                    is_half_hour: time.minute() == 30,
                })
            })
            .collect()
    }
}
