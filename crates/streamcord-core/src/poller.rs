// ── Poll scheduler ──
//
// One cycle at a time: gather from the media server, build the desired
// resource set, reconcile. A failed cycle is followed by the short
// backoff instead of the regular interval. Cancellation is observed only
// between cycles, so a running cycle always finishes its operations.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{DisplayOptions, PollConfig};
use crate::desired::{CycleInputs, build_desired};
use crate::error::CoreError;
use crate::model::ServerSnapshot;
use crate::reconcile::{ChatDirectory, CycleReport, ReconcileTargets, Reconciler};
use crate::source::MediaServer;

/// Drives the gather → build → reconcile cycle.
pub struct Poller {
    source: Arc<dyn MediaServer>,
    directory: Arc<dyn ChatDirectory>,
    reconciler: Reconciler,
    display: DisplayOptions,
    poll: PollConfig,
}

impl Poller {
    pub fn new(
        source: Arc<dyn MediaServer>,
        directory: Arc<dyn ChatDirectory>,
        targets: ReconcileTargets,
        display: DisplayOptions,
        poll: PollConfig,
    ) -> Self {
        Self {
            source,
            directory,
            reconciler: Reconciler::new(targets),
            display,
            poll,
        }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Everything one cycle needs from the media server.
    ///
    /// Session and library failures abort the cycle. A failed recently
    /// added query only leaves that message untouched.
    pub async fn gather(&self) -> Result<CycleInputs, CoreError> {
        gather_inputs(self.source.as_ref(), &self.display, &self.poll).await
    }

    /// Run exactly one cycle.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CoreError> {
        let inputs = self.gather().await?;
        let desired = build_desired(&inputs, &self.display);
        debug!(
            sessions = inputs.snapshot.sessions().len(),
            libraries = inputs.libraries.len(),
            resources = desired.len(),
            "built desired state"
        );
        self.reconciler
            .reconcile(self.directory.as_ref(), &desired)
            .await
    }

    /// Run cycles until `cancel` fires.
    pub async fn run(&mut self, cancel: CancellationToken) {
        info!(
            server = %self.source.kind(),
            interval_secs = self.poll.interval.as_secs_f32(),
            "poll loop starting"
        );

        while !cancel.is_cancelled() {
            let delay = match self.run_cycle().await {
                Ok(_) => self.poll.interval,
                Err(e) => {
                    let backoff = self.poll.backoff();
                    warn!(error = %e, retry_in_ms = backoff.as_millis(), "cycle failed");
                    backoff
                }
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }

        info!("poll loop stopped");
    }
}

/// Fetch sessions, libraries and recently added items for one cycle.
pub async fn gather_inputs(
    source: &dyn MediaServer,
    display: &DisplayOptions,
    poll: &PollConfig,
) -> Result<CycleInputs, CoreError> {
    let sessions = source.fetch_sessions().await?;

    let libraries = if display.show_library_counts {
        source.fetch_libraries().await?
    } else {
        Vec::new()
    };

    let recently_added = match source.fetch_recently_added(poll.recently_added_limit).await {
        Ok(items) => Some(items),
        Err(e) => {
            warn!(error = %e, "recently added query failed, leaving message as is");
            None
        }
    };

    Ok(CycleInputs {
        snapshot: ServerSnapshot::from_sessions(sessions),
        libraries,
        recently_added,
    })
}
