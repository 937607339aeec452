//! Dose log repository: one row per confirmed intake, unique per
//! medicine/slot/day. Recording a dose decrements stock; undoing restores it.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::adherence::{self, IntakeRecord};
use crate::db::DatabaseError;
use crate::models::Medicine;
use crate::schedule;

use super::medicine::adjust_stock;
use super::DATETIME_FMT;

/// Record a dose as taken at `now`.
///
/// The slot must be one of the medication's configured slots; the offset from
/// the scheduled time is stored for adherence analysis. Taking the same slot
/// twice on one day is a constraint violation, not a second row.
pub fn record_dose(
    conn: &Connection,
    med: &Medicine,
    slot: &str,
    now: NaiveDateTime,
) -> Result<IntakeRecord, DatabaseError> {
    if !med.time_slots.iter().any(|s| s == slot) {
        return Err(DatabaseError::ConstraintViolation(format!(
            "{slot} is not a configured slot of {}",
            med.name
        )));
    }

    let slot_time = schedule::parse_slot(slot).map_err(|e| DatabaseError::InvalidField {
        field: "slot".into(),
        reason: e.to_string(),
    })?;
    let offset_minutes = adherence::offset_minutes(slot_time, now);

    conn.execute(
        "INSERT INTO dose_log (id, medicine_id, slot, taken_date, taken_at, offset_minutes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            Uuid::new_v4().to_string(),
            med.id.to_string(),
            slot,
            now.date().to_string(),
            now.format(DATETIME_FMT).to_string(),
            offset_minutes,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(format!(
                "dose for slot {slot} already recorded today"
            ))
        }
        other => other.into(),
    })?;

    adjust_stock(conn, &med.id, -1)?;

    tracing::info!(
        medicine_id = %med.id,
        slot = %slot,
        offset_minutes,
        "dose recorded"
    );

    Ok(IntakeRecord {
        slot: slot.to_string(),
        taken_at: now,
        offset_minutes,
    })
}

/// Undo a recorded dose for a slot on a day. Returns whether a row was
/// actually removed; stock is only restored when one was.
pub fn undo_dose(
    conn: &Connection,
    med_id: &Uuid,
    slot: &str,
    date: NaiveDate,
) -> Result<bool, DatabaseError> {
    let rows = conn.execute(
        "DELETE FROM dose_log WHERE medicine_id = ?1 AND slot = ?2 AND taken_date = ?3",
        params![med_id.to_string(), slot, date.to_string()],
    )?;

    if rows == 0 {
        return Ok(false);
    }

    adjust_stock(conn, med_id, 1)?;
    Ok(true)
}

/// Slots already confirmed for a medication on a day, in intake order.
pub fn doses_taken_on(
    conn: &Connection,
    med_id: &Uuid,
    date: NaiveDate,
) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT slot FROM dose_log
         WHERE medicine_id = ?1 AND taken_date = ?2
         ORDER BY taken_at",
    )?;
    let rows = stmt.query_map(params![med_id.to_string(), date.to_string()], |row| {
        row.get::<_, String>(0)
    })?;

    let mut slots = Vec::new();
    for slot in rows {
        slots.push(slot?);
    }
    Ok(slots)
}

/// Whether a specific slot was confirmed on a day.
pub fn is_dose_taken(
    conn: &Connection,
    med_id: &Uuid,
    slot: &str,
    date: NaiveDate,
) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM dose_log
         WHERE medicine_id = ?1 AND slot = ?2 AND taken_date = ?3",
        params![med_id.to_string(), slot, date.to_string()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// The most recent `limit` intakes for a medication, oldest first.
pub fn fetch_intake_history(
    conn: &Connection,
    med_id: &Uuid,
    limit: u32,
) -> Result<Vec<IntakeRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT slot, taken_at, offset_minutes FROM dose_log
         WHERE medicine_id = ?1
         ORDER BY taken_at DESC
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![med_id.to_string(), limit], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
        ))
    })?;

    let mut history = Vec::new();
    for row in rows {
        let (slot, taken_at, offset_minutes) = row?;
        let taken_at = NaiveDateTime::parse_from_str(&taken_at, DATETIME_FMT).map_err(|e| {
            DatabaseError::InvalidField {
                field: "taken_at".into(),
                reason: e.to_string(),
            }
        })?;
        history.push(IntakeRecord {
            slot,
            taken_at,
            offset_minutes,
        });
    }

    history.reverse();
    Ok(history)
}
