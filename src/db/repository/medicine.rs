//! Medication list repository: CRUD over the `medicines` table.

use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Medicine, StockUnit};

use super::DATETIME_FMT;

const MEDICINE_COLUMNS: &str =
    "id, name, dosage, frequency, time_slots, stock, stock_unit, color, created_at";

/// Raw row image before field-level parsing.
struct RawMedicine {
    id: String,
    name: String,
    dosage: String,
    frequency: String,
    time_slots: String,
    stock: i64,
    stock_unit: String,
    color: Option<String>,
    created_at: String,
}

impl TryFrom<RawMedicine> for Medicine {
    type Error = DatabaseError;

    fn try_from(raw: RawMedicine) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&raw.id).map_err(|e| DatabaseError::InvalidField {
            field: "id".into(),
            reason: e.to_string(),
        })?;
        let time_slots: Vec<String> =
            serde_json::from_str(&raw.time_slots).map_err(|e| DatabaseError::InvalidField {
                field: "time_slots".into(),
                reason: e.to_string(),
            })?;
        let stock_unit = StockUnit::from_str(&raw.stock_unit)?;
        let created_at = NaiveDateTime::parse_from_str(&raw.created_at, DATETIME_FMT).map_err(
            |e| DatabaseError::InvalidField {
                field: "created_at".into(),
                reason: e.to_string(),
            },
        )?;

        Ok(Medicine {
            id,
            name: raw.name,
            dosage: raw.dosage,
            frequency: raw.frequency,
            time_slots,
            stock: raw.stock,
            stock_unit,
            color: raw.color,
            created_at,
        })
    }
}

fn raw_from_row(row: &rusqlite::Row<'_>) -> Result<RawMedicine, rusqlite::Error> {
    Ok(RawMedicine {
        id: row.get(0)?,
        name: row.get(1)?,
        dosage: row.get(2)?,
        frequency: row.get(3)?,
        time_slots: row.get(4)?,
        stock: row.get(5)?,
        stock_unit: row.get(6)?,
        color: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Insert a new medication.
pub fn insert_medicine(conn: &Connection, med: &Medicine) -> Result<(), DatabaseError> {
    let slots = serde_json::to_string(&med.time_slots).map_err(|e| DatabaseError::InvalidField {
        field: "time_slots".into(),
        reason: e.to_string(),
    })?;

    conn.execute(
        "INSERT INTO medicines (id, name, dosage, frequency, time_slots, stock, stock_unit, color, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            med.id.to_string(),
            med.name,
            med.dosage,
            med.frequency,
            slots,
            med.stock,
            med.stock_unit.as_str(),
            med.color,
            med.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;

    tracing::info!(medicine_id = %med.id, name = %med.name, "medication added");
    Ok(())
}

/// Fetch the whole medication list, oldest first.
pub fn fetch_medicines(conn: &Connection) -> Result<Vec<Medicine>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEDICINE_COLUMNS} FROM medicines ORDER BY created_at, name"
    ))?;
    let rows = stmt.query_map([], raw_from_row)?;

    let mut medicines = Vec::new();
    for raw in rows {
        medicines.push(raw?.try_into()?);
    }
    Ok(medicines)
}

/// Fetch a single medication by id.
pub fn fetch_medicine(conn: &Connection, id: &Uuid) -> Result<Option<Medicine>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = ?1"),
            params![id.to_string()],
            raw_from_row,
        )
        .optional()?;

    raw.map(Medicine::try_from).transpose()
}

/// Case-insensitive name lookup (for the CLI and voice flows).
pub fn find_medicine_by_name(
    conn: &Connection,
    name: &str,
) -> Result<Option<Medicine>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE LOWER(name) = LOWER(?1)"),
            params![name],
            raw_from_row,
        )
        .optional()?;

    raw.map(Medicine::try_from).transpose()
}

/// Update every editable field of a medication.
pub fn update_medicine(conn: &Connection, med: &Medicine) -> Result<(), DatabaseError> {
    let slots = serde_json::to_string(&med.time_slots).map_err(|e| DatabaseError::InvalidField {
        field: "time_slots".into(),
        reason: e.to_string(),
    })?;

    let rows = conn.execute(
        "UPDATE medicines
         SET name = ?2, dosage = ?3, frequency = ?4, time_slots = ?5,
             stock = ?6, stock_unit = ?7, color = ?8
         WHERE id = ?1",
        params![
            med.id.to_string(),
            med.name,
            med.dosage,
            med.frequency,
            slots,
            med.stock,
            med.stock_unit.as_str(),
            med.color,
        ],
    )?;

    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "medicine".into(),
            id: med.id.to_string(),
        });
    }
    Ok(())
}

/// Delete a medication; its dose log rows go with it.
pub fn delete_medicine(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "DELETE FROM medicines WHERE id = ?1",
        params![id.to_string()],
    )?;

    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "medicine".into(),
            id: id.to_string(),
        });
    }

    tracing::info!(medicine_id = %id, "medication removed");
    Ok(())
}

/// Adjust remaining stock by `delta` (negative when a dose is taken).
pub fn adjust_stock(conn: &Connection, id: &Uuid, delta: i64) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE medicines SET stock = stock + ?1 WHERE id = ?2",
        params![delta, id.to_string()],
    )?;

    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "medicine".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn sample_medicine() -> Medicine {
        Medicine::new(
            "Panadol",
            "500mg",
            "Twice a day",
            vec!["8:00 AM".into(), "8:00 PM".into()],
            20,
            StockUnit::Tablets,
            chrono::NaiveDate::from_ymd_opt(2025, 6, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        )
    }

    #[test]
    fn insert_and_fetch_round_trip() {
        let conn = open_memory_database().unwrap();
        let med = sample_medicine();
        insert_medicine(&conn, &med).unwrap();

        let fetched = fetch_medicine(&conn, &med.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Panadol");
        assert_eq!(fetched.time_slots, vec!["8:00 AM", "8:00 PM"]);
        assert_eq!(fetched.stock, 20);
        assert_eq!(fetched.stock_unit, StockUnit::Tablets);
        assert_eq!(fetched.created_at, med.created_at);
    }

    #[test]
    fn find_by_name_is_case_insensitive() {
        let conn = open_memory_database().unwrap();
        let med = sample_medicine();
        insert_medicine(&conn, &med).unwrap();

        let found = find_medicine_by_name(&conn, "PANADOL").unwrap().unwrap();
        assert_eq!(found.id, med.id);
        assert!(find_medicine_by_name(&conn, "nothing").unwrap().is_none());
    }

    #[test]
    fn update_rewrites_fields() {
        let conn = open_memory_database().unwrap();
        let mut med = sample_medicine();
        insert_medicine(&conn, &med).unwrap();

        med.dosage = "1000mg".into();
        med.time_slots = vec!["9:00 AM".into()];
        update_medicine(&conn, &med).unwrap();

        let fetched = fetch_medicine(&conn, &med.id).unwrap().unwrap();
        assert_eq!(fetched.dosage, "1000mg");
        assert_eq!(fetched.time_slots, vec!["9:00 AM"]);
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let conn = open_memory_database().unwrap();
        let med = sample_medicine();
        let err = update_medicine(&conn, &med).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn delete_removes_medicine() {
        let conn = open_memory_database().unwrap();
        let med = sample_medicine();
        insert_medicine(&conn, &med).unwrap();

        delete_medicine(&conn, &med.id).unwrap();
        assert!(fetch_medicine(&conn, &med.id).unwrap().is_none());
        assert!(matches!(
            delete_medicine(&conn, &med.id),
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn adjust_stock_moves_count() {
        let conn = open_memory_database().unwrap();
        let med = sample_medicine();
        insert_medicine(&conn, &med).unwrap();

        adjust_stock(&conn, &med.id, -1).unwrap();
        adjust_stock(&conn, &med.id, -1).unwrap();
        adjust_stock(&conn, &med.id, 1).unwrap();

        let fetched = fetch_medicine(&conn, &med.id).unwrap().unwrap();
        assert_eq!(fetched.stock, 19);
    }

    #[test]
    fn fetch_medicines_ordered_by_creation() {
        let conn = open_memory_database().unwrap();
        let older = sample_medicine();
        let mut newer = sample_medicine();
        newer.name = "Augmentin".into();
        newer.created_at += chrono::Duration::days(1);

        insert_medicine(&conn, &newer).unwrap();
        insert_medicine(&conn, &older).unwrap();

        let all = fetch_medicines(&conn).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Panadol");
        assert_eq!(all[1].name, "Augmentin");
    }
}
