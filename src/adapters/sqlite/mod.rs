//! SQLite adapter: Implementation of Storage.
//!
//! Provides local persistence for calculations. Inputs are stored as
//! normalized (canonical unit labels, lower-case enum names) so that rows
//! can be decoded without going back through the form parsers' aliases.
//!
//! The connection sits behind a `Mutex`; a poisoned lock is reported as
//! `StorageError::LockPoisoned` rather than retried.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use crate::domain::{
    Calculation, CkdStage, CreatinineUnit, EgfrResult, Equation, Ethnicity, Gender, Measurement,
    Subject, UserMode,
};
use crate::ports::{CalculationPage, Storage};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

/// A stored column holding a value no current enum variant maps to.
#[derive(Debug, thiserror::Error)]
#[error("unrecognized {column} value {value:?}")]
struct UnknownValue {
    column: &'static str,
    value: String,
}

const SELECT_COLUMNS: &str = r"
    SELECT id, patient_ref, mode, age, height_cm, gender, ethnicity,
           creatinine_value, creatinine_unit, rate, stage, equation,
           recommendation, created_at
    FROM calculations
";

/// SQLite storage adapter.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) a database file.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS calculations (
                id TEXT PRIMARY KEY,
                patient_ref TEXT,
                mode TEXT NOT NULL,
                age REAL NOT NULL,
                height_cm REAL,
                gender TEXT NOT NULL,
                ethnicity TEXT,
                creatinine_value REAL NOT NULL,
                creatinine_unit TEXT NOT NULL,
                rate REAL NOT NULL,
                stage INTEGER NOT NULL CHECK (stage BETWEEN 1 AND 5),
                equation TEXT NOT NULL,
                recommendation TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_calculations_created
                ON calculations(created_at DESC);
            ",
        )?;
        Ok(())
    }

    fn unknown(idx: usize, ty: Type, column: &'static str, value: impl Into<String>) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            ty,
            Box::new(UnknownValue {
                column,
                value: value.into(),
            }),
        )
    }

    fn parse_mode(s: &str) -> Option<UserMode> {
        match s {
            "patient" => Some(UserMode::Patient),
            "clinician" => Some(UserMode::Clinician),
            _ => None,
        }
    }

    fn parse_equation(s: &str) -> Option<Equation> {
        match s {
            "mdrd" => Some(Equation::Mdrd),
            "bedside_schwartz" => Some(Equation::BedsideSchwartz),
            _ => None,
        }
    }

    fn row_to_calculation(row: &Row<'_>) -> rusqlite::Result<Calculation> {
        let mode_str: String = row.get(2)?;
        let mode = Self::parse_mode(&mode_str)
            .ok_or_else(|| Self::unknown(2, Type::Text, "mode", mode_str.as_str()))?;

        let gender_str: String = row.get(5)?;
        let gender = gender_str
            .parse::<Gender>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

        let ethnicity: Option<Ethnicity> = row
            .get::<_, Option<String>>(6)?
            .map(|s| s.parse::<Ethnicity>())
            .transpose()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

        let unit_str: String = row.get(8)?;
        let unit = unit_str
            .parse::<CreatinineUnit>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;
        let creatinine = Measurement::new(row.get(7)?, unit)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Real, Box::new(e)))?;

        let stage_num: i64 = row.get(10)?;
        let stage = u8::try_from(stage_num)
            .ok()
            .and_then(|n| CkdStage::try_from(n).ok())
            .ok_or_else(|| Self::unknown(10, Type::Integer, "stage", stage_num.to_string()))?;

        let equation_str: String = row.get(11)?;
        let equation = Self::parse_equation(&equation_str)
            .ok_or_else(|| Self::unknown(11, Type::Text, "equation", equation_str.as_str()))?;

        let created_at_str: String = row.get(13)?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(13, Type::Text, Box::new(e)))?;

        Ok(Calculation {
            id: row.get(0)?,
            patient_ref: row.get(1)?,
            mode,
            subject: Subject {
                age: row.get(3)?,
                height_cm: row.get(4)?,
                gender,
                ethnicity,
            },
            creatinine,
            result: EgfrResult {
                rate: row.get(9)?,
                stage,
                recommendation: row.get(12)?,
                equation,
            },
            created_at,
        })
    }
}

impl Storage for SqliteStorage {
    type Error = StorageError;

    fn save_calculation(&self, calculation: &Calculation) -> Result<(), Self::Error> {
        let conn = self.conn()?;
        conn.execute(
            r"
            INSERT INTO calculations (
                id, patient_ref, mode, age, height_cm, gender, ethnicity,
                creatinine_value, creatinine_unit, rate, stage, equation,
                recommendation, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ",
            params![
                calculation.id,
                calculation.patient_ref,
                calculation.mode.as_str(),
                calculation.subject.age,
                calculation.subject.height_cm,
                calculation.subject.gender.to_string(),
                calculation.subject.ethnicity.map(|e| e.to_string()),
                calculation.creatinine.value,
                calculation.creatinine.unit.label(),
                calculation.result.rate,
                i64::from(calculation.result.stage.number()),
                calculation.result.equation.as_str(),
                calculation.result.recommendation,
                calculation.created_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!("Saved calculation {} to storage", calculation.id);
        Ok(())
    }

    fn load_recent_calculations(&self, limit: usize) -> Result<Vec<Calculation>, Self::Error> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC LIMIT ?1"
        ))?;

        let calculations = stmt
            .query_map(params![limit as i64], Self::row_to_calculation)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(calculations)
    }

    fn load_calculations_paginated(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<CalculationPage, Self::Error> {
        let conn = self.conn()?;

        let total_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM calculations", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC LIMIT ?1 OFFSET ?2"
        ))?;
        let items = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_calculation)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CalculationPage::new(
            items,
            total_count as usize,
            offset,
            limit,
        ))
    }

    fn count_calculations(&self) -> Result<usize, Self::Error> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM calculations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn delete_calculation(&self, id: &str) -> Result<(), Self::Error> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM calculations WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn clear_all(&self) -> Result<(), Self::Error> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM calculations", [])?;
        tracing::warn!("Cleared all calculations from storage");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::EgfrEngine;
    use crate::domain::normalize;

    fn calculation(age: f64, creatinine: &str) -> Calculation {
        let subject = Subject::adult(age, Gender::Female, Ethnicity::Black);
        let measurement = normalize(creatinine, "µmol/L").expect("Should normalize");
        let result = EgfrEngine::default()
            .calculate(&subject, &measurement)
            .expect("Should calculate");
        Calculation::new(subject, measurement, result, UserMode::Clinician)
    }

    #[test]
    fn test_calculation_crud() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        assert_eq!(storage.count_calculations().expect("Should count"), 0);

        let calc = calculation(52.0, "110").with_patient_ref(Some("chart-7".to_string()));
        let id = calc.id.clone();
        storage.save_calculation(&calc).expect("Should save");
        assert_eq!(storage.count_calculations().expect("Should count"), 1);

        let loaded = storage.load_recent_calculations(10).expect("Should load");
        assert_eq!(loaded.len(), 1);
        let back = &loaded[0];
        assert_eq!(back.id, id);
        assert_eq!(back.patient_ref.as_deref(), Some("chart-7"));
        assert_eq!(back.mode, UserMode::Clinician);
        assert_eq!(back.subject.ethnicity, Some(Ethnicity::Black));
        assert_eq!(back.creatinine.unit, CreatinineUnit::MicromolPerL);
        assert_eq!(back.result.stage, calc.result.stage);
        assert_eq!(back.result.equation, Equation::Mdrd);
        assert!((back.result.rate - calc.result.rate).abs() < f64::EPSILON);

        storage.delete_calculation(&id).expect("Should delete");
        assert_eq!(storage.count_calculations().expect("Should count"), 0);
    }

    #[test]
    fn test_pediatric_row_round_trip() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let subject = Subject::pediatric(10.0, 120.0, Gender::Male);
        let measurement = normalize("0.5", "mg/dL").expect("Should normalize");
        let result = EgfrEngine::default()
            .calculate(&subject, &measurement)
            .expect("Should calculate");
        let calc = Calculation::new(subject, measurement, result, UserMode::Patient);
        storage.save_calculation(&calc).expect("Should save");

        let back = storage
            .load_recent_calculations(1)
            .expect("Should load")
            .pop()
            .expect("Should exist");
        assert_eq!(back.subject.height_cm, Some(120.0));
        assert_eq!(back.subject.ethnicity, None);
        assert_eq!(back.result.equation, Equation::BedsideSchwartz);
        assert_eq!(back.result.stage, CkdStage::G1);
    }

    #[test]
    fn test_pagination() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        for i in 0..5 {
            storage
                .save_calculation(&calculation(30.0 + f64::from(i), "90"))
                .expect("Should save");
        }

        let page = storage
            .load_calculations_paginated(0, 2)
            .expect("Should load page");
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_count, 5);
        assert!(page.has_more);
        assert_eq!(page.next_offset(), Some(2));

        let last = storage
            .load_calculations_paginated(4, 2)
            .expect("Should load page");
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_more);
    }

    #[test]
    fn test_clear_all() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        storage
            .save_calculation(&calculation(60.0, "150"))
            .expect("Should save");
        storage.clear_all().expect("Should clear");
        assert_eq!(storage.count_calculations().expect("Should count"), 0);
    }

    #[test]
    fn test_file_backed_database_persists() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("calc.db");
        let calc = calculation(45.0, "100");
        {
            let storage = SqliteStorage::new(&path).expect("Should open");
            storage.save_calculation(&calc).expect("Should save");
        }
        let reopened = SqliteStorage::new(&path).expect("Should reopen");
        assert_eq!(reopened.count_calculations().expect("Should count"), 1);
    }
}
