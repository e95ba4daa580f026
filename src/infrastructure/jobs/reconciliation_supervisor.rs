use crate::application::services::ReconciliationService;
use crate::domain::entities::ReconcileReport;
use crate::domain::value_objects::SyncDomain;
use crate::shared::error::SyncError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy)]
pub struct SupervisorOptions {
    pub interval: Duration,
    pub run_on_startup: bool,
}

/// Owns one periodic reconciliation task per domain.
///
/// Ticks that arrive while a run is still in progress are delayed, never
/// stacked. `shutdown` lets an in-flight cycle finish before returning.
pub struct ReconciliationSupervisor {
    service: Arc<ReconciliationService>,
    options: SupervisorOptions,
    shutdown_tx: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ReconciliationSupervisor {
    pub fn new(service: Arc<ReconciliationService>, options: SupervisorOptions) -> Arc<Self> {
        let (shutdown_tx, _) = watch::channel(false);
        Arc::new(Self {
            service,
            options,
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
        })
    }

    pub async fn start<I>(self: &Arc<Self>, domains: I)
    where
        I: IntoIterator<Item = SyncDomain>,
    {
        let mut handles = self.handles.lock().await;
        for domain in domains {
            let shutdown_rx = self.shutdown_tx.subscribe();
            let service = Arc::clone(&self.service);
            let options = self.options;
            handles.push(tokio::spawn(run_domain_loop(
                service,
                domain,
                options,
                shutdown_rx,
            )));
        }
        info!(
            target: "sync::scheduler",
            tasks = handles.len(),
            interval_secs = self.options.interval.as_secs(),
            run_on_startup = self.options.run_on_startup,
            "reconciliation tasks started"
        );
    }

    /// Runs one cycle now, waiting behind any scheduled run for the same domain.
    pub async fn trigger(&self, domain: SyncDomain) -> Result<ReconcileReport, SyncError> {
        debug!(target: "sync::scheduler", domain = %domain, "manual reconciliation requested");
        self.service.reconcile(domain).await
    }

    pub fn service(&self) -> &Arc<ReconciliationService> {
        &self.service
    }

    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let handles: Vec<_> = self.handles.lock().await.drain(..).collect();
        for result in futures::future::join_all(handles).await {
            if let Err(err) = result {
                error!(target: "sync::scheduler", error = %err, "reconciliation task ended abnormally");
            }
        }
        info!(target: "sync::scheduler", "reconciliation tasks stopped");
    }
}

async fn run_domain_loop(
    service: Arc<ReconciliationService>,
    domain: SyncDomain,
    options: SupervisorOptions,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let period = options.interval.max(Duration::from_millis(1));
    let start = if options.run_on_startup {
        tokio::time::Instant::now()
    } else {
        tokio::time::Instant::now() + period
    };
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        // Outside the select so shutdown waits for the cycle to drain.
        if let Err(err) = service.reconcile(domain).await {
            error!(
                target: "sync::scheduler",
                domain = %domain,
                error = %err,
                "scheduled reconciliation failed"
            );
        }
    }

    debug!(target: "sync::scheduler", domain = %domain, "reconciliation task exiting");
}
