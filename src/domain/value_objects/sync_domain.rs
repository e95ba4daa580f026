use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Entity kind with its own queue and reconciliation cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDomain {
    Account,
    Budget,
    Note,
    Transaction,
    SavingGoal,
    SavingTransaction,
    User,
}

impl SyncDomain {
    pub const ALL: [SyncDomain; 7] = [
        SyncDomain::User,
        SyncDomain::Note,
        SyncDomain::Account,
        SyncDomain::Budget,
        SyncDomain::Transaction,
        SyncDomain::SavingGoal,
        SyncDomain::SavingTransaction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncDomain::Account => "account",
            SyncDomain::Budget => "budget",
            SyncDomain::Note => "note",
            SyncDomain::Transaction => "transaction",
            SyncDomain::SavingGoal => "saving_goal",
            SyncDomain::SavingTransaction => "saving_transaction",
            SyncDomain::User => "user",
        }
    }
}

impl fmt::Display for SyncDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncDomain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SyncDomain::ALL
            .into_iter()
            .find(|domain| domain.as_str() == s)
            .ok_or_else(|| format!("Unknown sync domain: {s}"))
    }
}
