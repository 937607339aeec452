//! Reminder plan computation.
//!
//! Turns a medication's display slots ("8:00 AM") into the daily reminder set
//! the platform notification layer schedules: a main reminder at the slot
//! time, a late follow-up 30 minutes after, and on demand a 10-minute snooze.
//! This module only computes times and payloads; delivering them is the
//! platform collaborator's job.

use std::sync::LazyLock;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Medicine, ReminderKind};

/// Minutes after the slot before the missed-dose follow-up fires.
pub const LATE_DELAY_MIN: i64 = 30;

/// Minutes a snoozed reminder is pushed back.
pub const SNOOZE_DELAY_MIN: i64 = 10;

static SLOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s?(AM|PM)$").unwrap());

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("unrecognized time slot: {0}")]
    InvalidSlot(String),
}

/// Parse a 12-hour display slot ("8:00 AM", "12:30 pm") into a wall-clock
/// time. 12 AM is midnight, 12 PM is noon.
pub fn parse_slot(slot: &str) -> Result<NaiveTime, ScheduleError> {
    let invalid = || ScheduleError::InvalidSlot(slot.to_string());

    let caps = SLOT_RE.captures(slot.trim()).ok_or_else(invalid)?;
    let hours: u32 = caps[1].parse().map_err(|_| invalid())?;
    let minutes: u32 = caps[2].parse().map_err(|_| invalid())?;
    if hours == 0 || hours > 12 {
        return Err(invalid());
    }

    let hours24 = match (hours, caps[3].to_ascii_uppercase().as_str()) {
        (12, "AM") => 0,
        (12, "PM") => 12,
        (h, "PM") => h + 12,
        (h, _) => h,
    };

    NaiveTime::from_hms_opt(hours24, minutes, 0).ok_or_else(invalid)
}

/// One reminder the notification layer should schedule.
#[derive(Debug, Clone, Serialize)]
pub struct Reminder {
    /// Stable identifier, `{medicine_id}_{slot}_{KIND}` — lets the platform
    /// cancel or replace reminders per medication without bookkeeping.
    pub identifier: String,
    pub kind: ReminderKind,
    pub medicine_id: Uuid,
    pub slot: String,
    pub time: NaiveTime,
    pub title: String,
    pub body: String,
    pub repeats: bool,
}

/// Compute the full daily reminder set for a medication.
///
/// Slots that do not parse are skipped with a warning rather than failing
/// the whole plan; the remaining slots still get their reminders.
pub fn reminder_plan(med: &Medicine) -> Vec<Reminder> {
    let mut plan = Vec::with_capacity(med.time_slots.len() * 2);

    for slot in &med.time_slots {
        let time = match parse_slot(slot) {
            Ok(time) => time,
            Err(_) => {
                tracing::warn!(slot = %slot, medicine = %med.name, "skipping invalid time slot");
                continue;
            }
        };

        plan.push(Reminder {
            identifier: format!("{}_{}_MAIN", med.id, slot),
            kind: ReminderKind::Main,
            medicine_id: med.id,
            slot: slot.clone(),
            time,
            title: format!("Time for {}", med.name),
            body: format!("Dose: {}. Tap to confirm.", med.dosage),
            repeats: true,
        });

        // Follow-up half an hour later; wraps across midnight.
        plan.push(Reminder {
            identifier: format!("{}_{}_LATE", med.id, slot),
            kind: ReminderKind::Late,
            medicine_id: med.id,
            slot: slot.clone(),
            time: time + Duration::minutes(LATE_DELAY_MIN),
            title: format!("Missed dose: {}", med.name),
            body: format!("You missed your {slot} dose. Please take it now."),
            repeats: true,
        });
    }

    plan
}

/// A one-shot copy of a reminder pushed back [`SNOOZE_DELAY_MIN`] minutes
/// from `now`.
pub fn snooze(reminder: &Reminder, now: NaiveTime) -> Reminder {
    Reminder {
        identifier: format!("{}_SNOOZE", reminder.identifier),
        kind: ReminderKind::Snooze,
        medicine_id: reminder.medicine_id,
        slot: reminder.slot.clone(),
        time: now + Duration::minutes(SNOOZE_DELAY_MIN),
        title: format!("Snoozed: {}", reminder.title),
        body: reminder.body.clone(),
        repeats: false,
    }
}

/// When a daily slot next fires: today if the time is still ahead of `now`,
/// otherwise tomorrow.
pub fn next_occurrence(slot_time: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    if now.time() < slot_time {
        now.date().and_time(slot_time)
    } else {
        (now.date() + Duration::days(1)).and_time(slot_time)
    }
}
