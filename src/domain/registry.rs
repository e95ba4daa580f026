//! Static mapping from `(domain, operation)` to the write procedure both stores
//! interpret. Adding an entity kind means adding one `DomainSpec`, not new
//! control flow.

use std::collections::BTreeMap;

use super::value_objects::{SyncDomain, SyncOperation, SyncPayload};

/// Shape of the table a domain lives in, identical on both stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub table: &'static str,
    pub id_column: &'static str,
    /// `None` when the row owns itself (users).
    pub owner_column: Option<&'static str>,
    /// Writable columns, excluding id and owner.
    pub columns: &'static [&'static str],
    /// Literal values applied on insert when the payload omits the column.
    pub insert_defaults: &'static [(&'static str, &'static str)],
}

impl TableSpec {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteProcedure {
    /// Local: insert and let the store assign the id. Remote: upsert by id.
    InsertRow,
    UpdateColumns(&'static [&'static str]),
    SetFlag {
        column: &'static str,
        value: &'static str,
    },
    DeleteRow,
}

impl WriteProcedure {
    fn writable_columns(&self, table: &TableSpec) -> &'static [&'static str] {
        match self {
            WriteProcedure::InsertRow => table.columns,
            WriteProcedure::UpdateColumns(columns) => *columns,
            WriteProcedure::SetFlag { .. } | WriteProcedure::DeleteRow => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSpec {
    pub operation: SyncOperation,
    pub procedure: WriteProcedure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSpec {
    pub domain: SyncDomain,
    pub table: TableSpec,
    pub operations: &'static [OperationSpec],
}

impl DomainSpec {
    pub fn procedure(&self, operation: SyncOperation) -> Option<WriteProcedure> {
        self.operations
            .iter()
            .find(|spec| spec.operation == operation)
            .map(|spec| spec.procedure)
    }

    /// Checks the submitted fields against what `procedure` may write and
    /// returns the payload that gets stored and replayed.
    pub fn prepare_payload(
        &self,
        procedure: WriteProcedure,
        fields: SyncPayload,
    ) -> Result<SyncPayload, String> {
        let allowed = procedure.writable_columns(&self.table);

        if let Some(unknown) = fields.keys().find(|key| !allowed.contains(key)) {
            return Err(format!(
                "Field '{unknown}' is not writable by this {} operation",
                self.domain
            ));
        }

        match procedure {
            WriteProcedure::UpdateColumns(_) if fields.is_empty() => Err(format!(
                "Update of {} requires at least one field",
                self.domain
            )),
            WriteProcedure::SetFlag { column, value } => {
                let mut payload = SyncPayload::empty();
                payload.insert(column, serde_json::Value::String(value.to_string()));
                Ok(payload)
            }
            WriteProcedure::DeleteRow => Ok(SyncPayload::empty()),
            _ => Ok(fields),
        }
    }
}

const ACCOUNT_OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        operation: SyncOperation::Insert,
        procedure: WriteProcedure::InsertRow,
    },
    OperationSpec {
        operation: SyncOperation::Update,
        procedure: WriteProcedure::UpdateColumns(&[
            "acc_type_id",
            "nickname",
            "reference",
            "institution",
            "balance",
        ]),
    },
    OperationSpec {
        operation: SyncOperation::SoftDelete,
        procedure: WriteProcedure::SetFlag {
            column: "is_active",
            value: "N",
        },
    },
];

const BUDGET_OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        operation: SyncOperation::Insert,
        procedure: WriteProcedure::InsertRow,
    },
    OperationSpec {
        operation: SyncOperation::Update,
        procedure: WriteProcedure::UpdateColumns(&[
            "category_id",
            "start_date",
            "end_date",
            "warning_limit",
            "maximum_limit",
            "description",
        ]),
    },
    OperationSpec {
        operation: SyncOperation::Delete,
        procedure: WriteProcedure::DeleteRow,
    },
];

const NOTE_OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        operation: SyncOperation::Insert,
        procedure: WriteProcedure::InsertRow,
    },
    OperationSpec {
        operation: SyncOperation::Update,
        procedure: WriteProcedure::UpdateColumns(&["title", "description", "action_date"]),
    },
    OperationSpec {
        operation: SyncOperation::Delete,
        procedure: WriteProcedure::DeleteRow,
    },
];

const TRANSACTION_OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        operation: SyncOperation::Insert,
        procedure: WriteProcedure::InsertRow,
    },
    OperationSpec {
        operation: SyncOperation::Update,
        procedure: WriteProcedure::UpdateColumns(&[
            "account_id",
            "category_id",
            "amount",
            "transaction_type",
            "description",
        ]),
    },
    OperationSpec {
        operation: SyncOperation::SoftDelete,
        procedure: WriteProcedure::SetFlag {
            column: "is_deleted",
            value: "Y",
        },
    },
];

const SAVING_GOAL_OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        operation: SyncOperation::Insert,
        procedure: WriteProcedure::InsertRow,
    },
    OperationSpec {
        operation: SyncOperation::Update,
        procedure: WriteProcedure::UpdateColumns(&[
            "account_id",
            "goal_name",
            "target_amount",
            "current_amount",
            "start_date",
            "end_date",
        ]),
    },
    OperationSpec {
        operation: SyncOperation::SoftDelete,
        procedure: WriteProcedure::SetFlag {
            column: "is_active",
            value: "N",
        },
    },
];

const SAVING_TRANSACTION_OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        operation: SyncOperation::Insert,
        procedure: WriteProcedure::InsertRow,
    },
    OperationSpec {
        operation: SyncOperation::Update,
        procedure: WriteProcedure::UpdateColumns(&[
            "goal_id",
            "account_id",
            "amount",
            "description",
        ]),
    },
    OperationSpec {
        operation: SyncOperation::SoftDelete,
        procedure: WriteProcedure::SetFlag {
            column: "is_deleted",
            value: "Y",
        },
    },
];

const USER_OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        operation: SyncOperation::Insert,
        procedure: WriteProcedure::InsertRow,
    },
    OperationSpec {
        operation: SyncOperation::Update,
        procedure: WriteProcedure::UpdateColumns(&[
            "first_name",
            "last_name",
            "occupation",
            "house_no",
            "street_name",
            "city",
            "phone",
        ]),
    },
    OperationSpec {
        operation: SyncOperation::UpdateEmail,
        procedure: WriteProcedure::UpdateColumns(&["email"]),
    },
    OperationSpec {
        operation: SyncOperation::UpdatePassword,
        procedure: WriteProcedure::UpdateColumns(&["password"]),
    },
    OperationSpec {
        operation: SyncOperation::SoftDelete,
        procedure: WriteProcedure::SetFlag {
            column: "is_deleted",
            value: "Y",
        },
    },
];

fn standard_specs() -> Vec<DomainSpec> {
    vec![
        DomainSpec {
            domain: SyncDomain::Account,
            table: TableSpec {
                table: "account",
                id_column: "account_id",
                owner_column: Some("user_id"),
                columns: &[
                    "acc_type_id",
                    "nickname",
                    "reference",
                    "institution",
                    "balance",
                    "is_active",
                ],
                insert_defaults: &[("is_active", "Y"), ("balance", "0")],
            },
            operations: ACCOUNT_OPERATIONS,
        },
        DomainSpec {
            domain: SyncDomain::Budget,
            table: TableSpec {
                table: "budget",
                id_column: "budget_id",
                owner_column: Some("user_id"),
                columns: &[
                    "category_id",
                    "start_date",
                    "end_date",
                    "warning_limit",
                    "maximum_limit",
                    "description",
                ],
                insert_defaults: &[],
            },
            operations: BUDGET_OPERATIONS,
        },
        DomainSpec {
            domain: SyncDomain::Note,
            table: TableSpec {
                table: "note",
                id_column: "note_id",
                owner_column: Some("user_id"),
                columns: &["title", "description", "action_date"],
                insert_defaults: &[],
            },
            operations: NOTE_OPERATIONS,
        },
        DomainSpec {
            domain: SyncDomain::Transaction,
            table: TableSpec {
                table: "transaction_info",
                id_column: "transaction_id",
                owner_column: Some("user_id"),
                columns: &[
                    "account_id",
                    "category_id",
                    "amount",
                    "transaction_type",
                    "description",
                    "is_deleted",
                ],
                insert_defaults: &[("is_deleted", "N")],
            },
            operations: TRANSACTION_OPERATIONS,
        },
        DomainSpec {
            domain: SyncDomain::SavingGoal,
            table: TableSpec {
                table: "saving_goal",
                id_column: "goal_id",
                owner_column: Some("user_id"),
                columns: &[
                    "account_id",
                    "goal_name",
                    "target_amount",
                    "current_amount",
                    "start_date",
                    "end_date",
                    "is_active",
                ],
                insert_defaults: &[("is_active", "Y"), ("current_amount", "0")],
            },
            operations: SAVING_GOAL_OPERATIONS,
        },
        DomainSpec {
            domain: SyncDomain::SavingTransaction,
            table: TableSpec {
                table: "saving_transaction",
                id_column: "sav_tran_id",
                owner_column: Some("user_id"),
                columns: &[
                    "goal_id",
                    "account_id",
                    "amount",
                    "description",
                    "is_deleted",
                ],
                insert_defaults: &[("is_deleted", "N")],
            },
            operations: SAVING_TRANSACTION_OPERATIONS,
        },
        DomainSpec {
            domain: SyncDomain::User,
            table: TableSpec {
                table: "user_info",
                id_column: "user_id",
                owner_column: None,
                columns: &[
                    "first_name",
                    "last_name",
                    "email",
                    "password",
                    "occupation",
                    "house_no",
                    "street_name",
                    "city",
                    "phone",
                    "is_deleted",
                ],
                insert_defaults: &[("is_deleted", "N")],
            },
            operations: USER_OPERATIONS,
        },
    ]
}

#[derive(Debug, Clone, Default)]
pub struct DomainRegistry {
    specs: BTreeMap<SyncDomain, DomainSpec>,
}

impl DomainRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// All seven finance domains.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for spec in standard_specs() {
            registry.register(spec);
        }
        registry
    }

    /// Replaces any existing entry for the same domain.
    pub fn register(&mut self, spec: DomainSpec) {
        self.specs.insert(spec.domain, spec);
    }

    pub fn spec(&self, domain: SyncDomain) -> Option<&DomainSpec> {
        self.specs.get(&domain)
    }

    pub fn lookup(
        &self,
        domain: SyncDomain,
        operation: SyncOperation,
    ) -> Option<(&DomainSpec, WriteProcedure)> {
        let spec = self.specs.get(&domain)?;
        spec.procedure(operation).map(|procedure| (spec, procedure))
    }

    pub fn domains(&self) -> impl Iterator<Item = SyncDomain> + '_ {
        self.specs.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn standard_registry_covers_every_domain() {
        let registry = DomainRegistry::standard();
        let domains: Vec<_> = registry.domains().collect();
        assert_eq!(domains.len(), SyncDomain::ALL.len());
        for domain in SyncDomain::ALL {
            assert!(registry.lookup(domain, SyncOperation::Insert).is_some());
            assert!(registry.lookup(domain, SyncOperation::Update).is_some());
        }
    }

    #[test]
    fn user_specific_operations_are_only_registered_for_users() {
        let registry = DomainRegistry::standard();
        assert!(registry
            .lookup(SyncDomain::User, SyncOperation::UpdateEmail)
            .is_some());
        assert!(registry
            .lookup(SyncDomain::Account, SyncOperation::UpdatePassword)
            .is_none());
        assert!(registry
            .lookup(SyncDomain::Note, SyncOperation::SoftDelete)
            .is_none());
    }

    #[test]
    fn prepare_payload_rejects_columns_outside_the_procedure() {
        let registry = DomainRegistry::standard();
        let (spec, procedure) = registry
            .lookup(SyncDomain::User, SyncOperation::UpdateEmail)
            .unwrap();
        let fields = SyncPayload::new(json!({"email": "a@b.c", "password": "x"})).unwrap();
        assert!(spec.prepare_payload(procedure, fields).is_err());
    }

    #[test]
    fn prepare_payload_replaces_soft_delete_fields_with_flag() {
        let registry = DomainRegistry::standard();
        let (spec, procedure) = registry
            .lookup(SyncDomain::Transaction, SyncOperation::SoftDelete)
            .unwrap();
        let payload = spec.prepare_payload(procedure, SyncPayload::empty()).unwrap();
        assert_eq!(payload.get("is_deleted"), Some(&json!("Y")));
    }

    #[test]
    fn empty_update_is_rejected() {
        let registry = DomainRegistry::standard();
        let (spec, procedure) = registry
            .lookup(SyncDomain::Note, SyncOperation::Update)
            .unwrap();
        assert!(spec.prepare_payload(procedure, SyncPayload::empty()).is_err());
    }
}
