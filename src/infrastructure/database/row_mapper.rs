use crate::domain::value_objects::SyncPayload;
use serde_json::{Map, Number, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// Converts a row into a payload by storage class, skipping `excluded` columns.
pub fn row_to_payload(row: &SqliteRow, excluded: &[&str]) -> Result<SyncPayload, sqlx::Error> {
    let mut map = Map::new();

    for column in row.columns() {
        let name = column.name();
        if excluded.contains(&name) {
            continue;
        }
        let index = column.ordinal();

        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let kind = raw.type_info().name().to_ascii_uppercase();
            match kind.as_str() {
                "INTEGER" | "BOOLEAN" | "INT8" | "BIGINT" => {
                    Value::from(row.try_get::<i64, _>(index)?)
                }
                "REAL" | "FLOAT" | "DOUBLE" => Number::from_f64(row.try_get::<f64, _>(index)?)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                "BLOB" => Value::Null,
                _ => Value::String(row.try_get::<String, _>(index)?),
            }
        };

        map.insert(name.to_string(), value);
    }

    Ok(SyncPayload::from(map))
}
