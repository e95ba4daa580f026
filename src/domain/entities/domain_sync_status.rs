use serde::{Deserialize, Serialize};

use super::ReconcileReport;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DomainSyncStatus {
    pub is_syncing: bool,
    pub pending: u32,
    pub last_run_at: Option<i64>,
    pub last_success_at: Option<i64>,
    pub total_synced: u64,
    pub total_failed: u64,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

impl DomainSyncStatus {
    pub fn record_run(&mut self, report: &ReconcileReport, finished_at: i64) {
        self.is_syncing = false;
        self.pending = report.remaining;
        self.last_run_at = Some(finished_at);
        self.total_synced += u64::from(report.synced);
        self.total_failed += u64::from(report.failed);

        if report.is_clean() {
            self.last_success_at = Some(finished_at);
            self.consecutive_failures = 0;
            self.last_error = None;
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
            if report.last_error.is_some() {
                self.last_error = report.last_error.clone();
            }
        }
    }

    pub fn record_error(&mut self, message: String, finished_at: i64) {
        self.is_syncing = false;
        self.last_run_at = Some(finished_at);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(message);
    }
}
