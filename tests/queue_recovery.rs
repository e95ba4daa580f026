mod common;

use common::{
    count_rows, harness_with, open_queue, owner, payload, test_config, QueueKind, REMOTE_TIMEOUT,
};
use melony_sync::{DomainMutation, SyncDomain, SyncOperation};
use serde_json::{json, Value};
use std::time::Duration;

async fn queued_note_survives_restart(kind: QueueKind) {
    let h = harness_with(kind, test_config()).await;
    h.remote.set_online(false);

    let outcome = h
        .engine
        .apply(DomainMutation::insert(
            SyncDomain::Note,
            owner(),
            payload(json!({"title": "before crash"})),
        ))
        .await
        .expect("apply");
    assert!(outcome.is_queued());

    let reopened = open_queue(&h.dir, kind).await;
    let pending = reopened.load(SyncDomain::Note).await.expect("load");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].local_id, outcome.local_id());
    assert_eq!(pending[0].operation, SyncOperation::Insert);
    assert_eq!(pending[0].payload.get("title"), Some(&json!("before crash")));
}

#[tokio::test]
async fn sqlite_queue_survives_restart() {
    queued_note_survives_restart(QueueKind::Sqlite).await;
}

#[tokio::test]
async fn json_queue_survives_restart() {
    queued_note_survives_restart(QueueKind::JsonFile).await;
}

#[tokio::test]
async fn json_queue_file_is_a_readable_array_per_domain() {
    let h = harness_with(QueueKind::JsonFile, test_config()).await;
    h.remote.set_online(false);

    for amount in [1000, 250] {
        h.engine
            .apply(DomainMutation::insert(
                SyncDomain::Account,
                owner(),
                payload(json!({ "balance": amount })),
            ))
            .await
            .expect("apply");
    }

    let path = h.dir.path().join("pending").join("pending_account_sync.json");
    let body = std::fs::read_to_string(&path).expect("queue file");
    assert!(body.contains('\n'), "queue file should be pretty-printed");

    let parsed: Value = serde_json::from_str(&body).expect("json");
    let entries = parsed.as_array().expect("array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["domain"], json!("account"));
    assert_eq!(entries[0]["operation"], json!("insert"));
    assert_eq!(entries[0]["payload"]["balance"].as_f64(), Some(1000.0));
    assert!(!h.dir.path().join("pending").join("pending_note_sync.json").exists());

    h.remote.set_online(true);
    let report = h.engine.reconcile(SyncDomain::Account).await.expect("cycle");
    assert_eq!(report.synced, 2);

    let parsed: Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("queue file")).expect("json");
    assert_eq!(parsed, json!([]));
}

#[tokio::test]
async fn failed_cycle_leaves_the_queue_untouched_on_disk() {
    let h = harness_with(QueueKind::JsonFile, test_config()).await;
    h.remote.set_online(false);

    h.engine
        .apply(DomainMutation::insert(
            SyncDomain::Budget,
            owner(),
            payload(json!({"description": "rent"})),
        ))
        .await
        .expect("apply");

    let path = h.dir.path().join("pending").join("pending_budget_sync.json");
    let before = std::fs::read_to_string(&path).expect("queue file");

    let report = h.engine.reconcile(SyncDomain::Budget).await.expect("cycle");
    assert!(report.aborted);

    let after = std::fs::read_to_string(&path).expect("queue file");
    assert_eq!(before, after);
}

async fn append_during_a_cycle_outlives_its_removal(kind: QueueKind) {
    let h = harness_with(kind, test_config()).await;

    let rejected = h
        .engine
        .apply(DomainMutation::insert(SyncDomain::Note, owner(), payload(json!({"title": "r"}))))
        .await
        .expect("online insert")
        .local_id();

    h.remote.set_online(false);
    let mut drained = Vec::new();
    for title in ["a", "b", "c"] {
        let outcome = h
            .engine
            .apply(DomainMutation::insert(SyncDomain::Note, owner(), payload(json!({ "title": title }))))
            .await
            .expect("offline insert");
        drained.push(outcome.local_id());
    }

    let step = REMOTE_TIMEOUT / 2;
    h.remote.set_online(true);
    h.remote.set_delay(step);
    h.remote.reject(rejected);

    let (report, late) = tokio::join!(h.engine.reconcile(SyncDomain::Note), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        h.engine
            .apply(DomainMutation::update(
                SyncDomain::Note,
                rejected,
                owner(),
                payload(json!({"title": "r2"})),
            ))
            .await
    });

    let report = report.expect("cycle");
    assert_eq!(report.pending_before, 3);
    assert_eq!(report.synced, 3);
    assert!(late.expect("late update").is_queued());

    let left = h.queue.load(SyncDomain::Note).await.expect("load");
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].local_id, rejected);
    assert_eq!(left[0].operation, SyncOperation::Update);
    for id in drained {
        assert_eq!(count_rows(&h.remote_pool, "note", "note_id", id).await, 1);
    }
}

#[tokio::test]
async fn sqlite_append_during_a_cycle_is_kept() {
    append_during_a_cycle_outlives_its_removal(QueueKind::Sqlite).await;
}

#[tokio::test]
async fn json_append_during_a_cycle_is_kept() {
    append_during_a_cycle_outlives_its_removal(QueueKind::JsonFile).await;
}
