use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::StockUnit;

/// A medication the user is taking.
///
/// `time_slots` holds the display form the reminder flow works with,
/// e.g. `"8:00 AM"` — see [`crate::schedule::parse_slot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub id: Uuid,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub time_slots: Vec<String>,
    pub stock: i64,
    pub stock_unit: StockUnit,
    pub color: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Medicine {
    pub fn new(
        name: impl Into<String>,
        dosage: impl Into<String>,
        frequency: impl Into<String>,
        time_slots: Vec<String>,
        stock: i64,
        stock_unit: StockUnit,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            dosage: dosage.into(),
            frequency: frequency.into(),
            time_slots,
            stock,
            stock_unit,
            color: None,
            created_at,
        }
    }
}
