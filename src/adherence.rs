//! Intake analytics: how far off schedule doses are actually taken, and
//! whether the drift is consistent enough to suggest changing the schedule.

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::Medicine;

/// How many recent intakes the drift check averages over.
pub const ADHERENCE_WINDOW: usize = 3;

/// Average drift beyond this many minutes triggers a hint.
pub const DRIFT_THRESHOLD_MIN: i64 = 30;

/// One confirmed intake with its drift from the scheduled slot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeRecord {
    pub slot: String,
    pub taken_at: NaiveDateTime,
    pub offset_minutes: i64,
}

/// Minutes between the scheduled slot time and the actual intake on that
/// day. Positive means taken late.
pub fn offset_minutes(slot_time: NaiveTime, taken_at: NaiveDateTime) -> i64 {
    (taken_at - taken_at.date().and_time(slot_time)).num_minutes()
}

/// Schedule-drift suggestion surfaced on the medication card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdherenceHint {
    ConsistentlyLate,
    ConsistentlyEarly,
}

impl AdherenceHint {
    pub fn message(&self) -> &'static str {
        match self {
            Self::ConsistentlyLate => {
                "You consistently take this ~30 minutes late. Change schedule?"
            }
            Self::ConsistentlyEarly => {
                "You consistently take this ~30 minutes early. Change schedule?"
            }
        }
    }
}

/// Drift check over the most recent intakes.
///
/// `history` is chronological; with fewer than [`ADHERENCE_WINDOW`] records
/// there is nothing trustworthy to say and the answer is `None`.
pub fn check_adherence(history: &[IntakeRecord]) -> Option<AdherenceHint> {
    if history.len() < ADHERENCE_WINDOW {
        return None;
    }

    let recent = &history[history.len() - ADHERENCE_WINDOW..];
    let avg = recent.iter().map(|r| r.offset_minutes).sum::<i64>() / ADHERENCE_WINDOW as i64;

    if avg > DRIFT_THRESHOLD_MIN {
        Some(AdherenceHint::ConsistentlyLate)
    } else if avg < -DRIFT_THRESHOLD_MIN {
        Some(AdherenceHint::ConsistentlyEarly)
    } else {
        None
    }
}

/// Taken vs expected dose counts for one medication on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    pub expected: usize,
    pub taken: usize,
}

pub fn daily_summary(med: &Medicine, taken_slots: &[String]) -> DailySummary {
    let taken = med
        .time_slots
        .iter()
        .filter(|slot| taken_slots.iter().any(|t| t == *slot))
        .count();

    DailySummary {
        expected: med.time_slots.len(),
        taken,
    }
}
