use rust_decimal::Decimal;
use sqlx::{Row, TypeInfo, ValueRef};

use fiscal_core::RepositoryError;

/// Reads a decimal column stored as TEXT, INTEGER or REAL. NULL reads as zero.
pub fn get_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    let type_name = value_ref.type_info().name().to_string();

    match type_name.as_str() {
        "TEXT" => {
            let raw: String = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get TEXT from '{}': {}", column, e))
            })?;
            raw.trim().parse::<Decimal>().map_err(|e| {
                RepositoryError::Database(format!(
                    "Invalid decimal '{}' in column '{}': {}",
                    raw, column, e
                ))
            })
        }
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to get INTEGER from '{}': {}",
                    column, e
                ))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            Decimal::try_from(val).map_err(|e| {
                RepositoryError::Database(format!("Failed to convert {} to Decimal: {}", val, e))
            })
        }
        "NULL" => Ok(Decimal::ZERO),
        other => Err(RepositoryError::Database(format!(
            "Unexpected type '{}' for column '{}'",
            other, column
        ))),
    }
}

/// Like [`get_decimal`], with NULL read as `None`.
pub fn get_optional_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Option<Decimal>, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    if value_ref.is_null() {
        return Ok(None);
    }

    get_decimal(row, column).map(Some)
}

/// Canonical TEXT form written to the database.
pub fn decimal_to_text(value: Decimal) -> String {
    value.normalize().to_string()
}
