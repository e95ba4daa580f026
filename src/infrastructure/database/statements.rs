//! SQL text and bind lists for the registry's write procedures.
//!
//! Identifiers only ever come from the static `TableSpec`s; values are always
//! bound.

use crate::domain::registry::{TableSpec, WriteProcedure};
use crate::domain::value_objects::{LocalId, OwnerId, SyncPayload};
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<Value>,
}

impl Statement {
    pub fn query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        self.binds
            .iter()
            .fold(sqlx::query(&self.sql), |query, value| bind_json(query, value))
    }
}

pub fn bind_json<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(flag) => query.bind(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(int) => query.bind(int),
            None => query.bind(number.as_f64()),
        },
        Value::String(text) => query.bind(text.clone()),
        other => query.bind(other.to_string()),
    }
}

/// Payload columns in table order, plus insert defaults the payload omits.
fn insert_values(table: &TableSpec, payload: &SyncPayload) -> (Vec<&'static str>, Vec<Value>) {
    let mut columns = Vec::new();
    let mut values = Vec::new();

    for column in table.columns {
        if let Some(value) = payload.get(column) {
            columns.push(*column);
            values.push(value.clone());
        } else if let Some((_, default)) = table
            .insert_defaults
            .iter()
            .find(|(name, _)| name == column)
        {
            columns.push(*column);
            values.push(Value::String((*default).to_string()));
        }
    }

    (columns, values)
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Local insert; the store assigns the id.
pub fn local_insert(table: &TableSpec, owner_id: Option<OwnerId>, payload: &SyncPayload) -> Statement {
    let (mut columns, mut binds) = insert_values(table, payload);
    if let (Some(owner_column), Some(owner_id)) = (table.owner_column, owner_id) {
        columns.insert(0, owner_column);
        binds.insert(0, Value::from(owner_id.value()));
    }

    let sql = if columns.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", table.table)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.table,
            columns.join(", "),
            placeholders(columns.len())
        )
    };

    Statement { sql, binds }
}

/// Remote insert keyed by the local id. Replaying it overwrites the same row.
pub fn remote_upsert(
    table: &TableSpec,
    local_id: LocalId,
    owner_id: OwnerId,
    payload: &SyncPayload,
) -> Statement {
    let (values_columns, values) = insert_values(table, payload);

    let mut columns = vec![table.id_column];
    let mut binds = vec![Value::from(local_id.value())];
    if let Some(owner_column) = table.owner_column {
        columns.push(owner_column);
        binds.push(Value::from(owner_id.value()));
    }
    columns.extend(values_columns.iter().copied());
    binds.extend(values);

    let conflict = if values_columns.is_empty() {
        "DO NOTHING".to_string()
    } else {
        let assignments: Vec<String> = values_columns
            .iter()
            .map(|column| format!("{column} = excluded.{column}"))
            .collect();
        format!("DO UPDATE SET {}", assignments.join(", "))
    };

    Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) {}",
            table.table,
            columns.join(", "),
            placeholders(columns.len()),
            table.id_column,
            conflict
        ),
        binds,
    }
}

fn key_predicate(
    table: &TableSpec,
    local_id: LocalId,
    owner_id: Option<OwnerId>,
    binds: &mut Vec<Value>,
) -> String {
    binds.push(Value::from(local_id.value()));
    let mut predicate = format!("{} = ?", table.id_column);
    if let (Some(owner_column), Some(owner_id)) = (table.owner_column, owner_id) {
        binds.push(Value::from(owner_id.value()));
        predicate.push_str(&format!(" AND {owner_column} = ?"));
    }
    predicate
}

/// Statement for every procedure except `InsertRow`, which has distinct local
/// and remote shapes. Returns `None` for `InsertRow`.
pub fn keyed_write(
    table: &TableSpec,
    procedure: WriteProcedure,
    local_id: LocalId,
    owner_id: Option<OwnerId>,
    payload: &SyncPayload,
) -> Option<Statement> {
    let mut binds = Vec::new();

    let sql = match procedure {
        WriteProcedure::InsertRow => return None,
        WriteProcedure::UpdateColumns(allowed) => {
            let assignments: Vec<String> = allowed
                .iter()
                .filter_map(|column| {
                    payload.get(column).map(|value| {
                        binds.push(value.clone());
                        format!("{column} = ?")
                    })
                })
                .collect();
            if assignments.is_empty() {
                return None;
            }
            let predicate = key_predicate(table, local_id, owner_id, &mut binds);
            format!(
                "UPDATE {} SET {} WHERE {}",
                table.table,
                assignments.join(", "),
                predicate
            )
        }
        WriteProcedure::SetFlag { column, value } => {
            binds.push(Value::String(value.to_string()));
            let predicate = key_predicate(table, local_id, owner_id, &mut binds);
            format!("UPDATE {} SET {column} = ? WHERE {predicate}", table.table)
        }
        WriteProcedure::DeleteRow => {
            let predicate = key_predicate(table, local_id, owner_id, &mut binds);
            format!("DELETE FROM {} WHERE {predicate}", table.table)
        }
    };

    Some(Statement { sql, binds })
}

pub fn select_row(table: &TableSpec) -> String {
    format!(
        "SELECT * FROM {} WHERE {} = ?",
        table.table, table.id_column
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::registry::DomainRegistry;
    use crate::domain::value_objects::{SyncDomain, SyncOperation};
    use serde_json::json;

    fn table(domain: SyncDomain) -> TableSpec {
        DomainRegistry::standard().spec(domain).unwrap().table.clone()
    }

    #[test]
    fn local_insert_applies_defaults_and_owner() {
        let account = table(SyncDomain::Account);
        let payload = SyncPayload::new(json!({"nickname": "main"})).unwrap();

        let stmt = local_insert(&account, Some(OwnerId::new(4).unwrap()), &payload);

        assert_eq!(
            stmt.sql,
            "INSERT INTO account (user_id, nickname, balance, is_active) VALUES (?, ?, ?, ?)"
        );
        assert_eq!(stmt.binds, vec![json!(4), json!("main"), json!("0"), json!("Y")]);
    }

    #[test]
    fn remote_upsert_is_keyed_by_local_id() {
        let note = table(SyncDomain::Note);
        let payload = SyncPayload::new(json!({"title": "t"})).unwrap();

        let stmt = remote_upsert(
            &note,
            LocalId::new(9).unwrap(),
            OwnerId::new(2).unwrap(),
            &payload,
        );

        assert_eq!(
            stmt.sql,
            "INSERT INTO note (note_id, user_id, title) VALUES (?, ?, ?) \
             ON CONFLICT(note_id) DO UPDATE SET title = excluded.title"
        );
        assert_eq!(stmt.binds, vec![json!(9), json!(2), json!("t")]);
    }

    #[test]
    fn update_only_sets_supplied_columns() {
        let registry = DomainRegistry::standard();
        let (spec, procedure) = registry
            .lookup(SyncDomain::Note, SyncOperation::Update)
            .unwrap();
        let payload = SyncPayload::new(json!({"description": "d"})).unwrap();

        let stmt = keyed_write(
            &spec.table,
            procedure,
            LocalId::new(3).unwrap(),
            Some(OwnerId::new(1).unwrap()),
            &payload,
        )
        .unwrap();

        assert_eq!(
            stmt.sql,
            "UPDATE note SET description = ? WHERE note_id = ? AND user_id = ?"
        );
        assert_eq!(stmt.binds, vec![json!("d"), json!(3), json!(1)]);
    }

    #[test]
    fn user_rows_are_keyed_without_owner_predicate() {
        let registry = DomainRegistry::standard();
        let (spec, procedure) = registry
            .lookup(SyncDomain::User, SyncOperation::SoftDelete)
            .unwrap();

        let stmt = keyed_write(
            &spec.table,
            procedure,
            LocalId::new(8).unwrap(),
            Some(OwnerId::new(8).unwrap()),
            &SyncPayload::empty(),
        )
        .unwrap();

        assert_eq!(stmt.sql, "UPDATE user_info SET is_deleted = ? WHERE user_id = ?");
        assert_eq!(stmt.binds, vec![json!("Y"), json!(8)]);
    }
}
