use std::{sync::Arc, time::Duration};

use tokio::{sync::Mutex, time};
use tokio_util::sync::CancellationToken;

use super::{ReportSession, SessionError};
use crate::{
    log_debug, log_info, log_warn,
    models::{ReportDraft, ReportPatch},
    storage::KeyValueStore,
};

const ENABLE_LOGS: bool = true;

/// Edits waiting to be saved, tied to the report they were made on.
struct PendingEdits {
    generation: u64,
    target: Option<String>,
    patch: ReportPatch,
}

/// Debounced auto-save for the active report.
///
/// Every edit lands on the active report immediately and is folded into a
/// pending buffer. The buffer is persisted once no edit has arrived for the
/// idle period; a newer edit cancels the scheduled flush and starts the
/// countdown again. The flush keeps the report's status as it is.
///
/// If the session has moved to another report by the time the buffer is
/// written, the edits go to the stored report they were made on, or are
/// dropped when that report was deleted or never saved.
pub struct AutoSaver<S> {
    session: Arc<Mutex<ReportSession<S>>>,
    pending: Arc<Mutex<Option<PendingEdits>>>,
    scheduled: Mutex<Option<CancellationToken>>,
    idle: Duration,
}

impl<S: KeyValueStore + 'static> AutoSaver<S> {
    pub fn new(session: Arc<Mutex<ReportSession<S>>>, idle: Duration) -> Self {
        Self {
            session,
            pending: Arc::new(Mutex::new(None)),
            scheduled: Mutex::new(None),
            idle,
        }
    }

    pub fn session(&self) -> Arc<Mutex<ReportSession<S>>> {
        self.session.clone()
    }

    pub fn idle(&self) -> Duration {
        self.idle
    }

    pub async fn has_pending(&self) -> bool {
        self.pending.lock().await.is_some()
    }

    /// Applies `patch` to the active report and (re)schedules a flush.
    pub async fn edit(&self, patch: ReportPatch) -> Result<(), SessionError> {
        {
            let mut session = self.session.lock().await;
            session.apply_edit(patch.clone())?;
            let generation = session.generation();

            let mut pending = self.pending.lock().await;
            if pending.as_ref().is_some_and(|buffer| buffer.generation != generation) {
                if let Some(stale) = pending.take() {
                    write_buffer(&mut session, stale);
                }
            }
            match pending.as_mut() {
                Some(buffer) => buffer.patch.merge(patch),
                None => {
                    *pending = Some(PendingEdits {
                        generation,
                        target: session.active().and_then(|report| report.id.clone()),
                        patch,
                    })
                }
            }
        }

        self.schedule_flush().await;
        Ok(())
    }

    /// Persists the pending buffer right away. Returns the stored report, or
    /// `None` when nothing was left to save.
    pub async fn flush_now(&self) -> Option<ReportDraft> {
        self.cancel_scheduled().await;
        flush_pending(&self.session, &self.pending).await
    }

    /// Drops buffered edits without saving them. The in-memory report keeps
    /// the edits; only the scheduled save is abandoned.
    pub async fn discard(&self) {
        self.cancel_scheduled().await;
        if self.pending.lock().await.take().is_some() {
            log_debug!("Discarded pending auto-save edits");
        }
    }

    async fn schedule_flush(&self) {
        let mut scheduled = self.scheduled.lock().await;
        if let Some(previous) = scheduled.take() {
            previous.cancel();
        }

        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let session = self.session.clone();
        let pending = self.pending.clone();
        let idle = self.idle;

        // Cancellation only wins while the timer runs; a flush that has
        // started always finishes.
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = time::sleep(idle) => {
                    flush_pending(&session, &pending).await;
                }
            }
        });

        *scheduled = Some(cancel_token);
    }

    async fn cancel_scheduled(&self) {
        if let Some(token) = self.scheduled.lock().await.take() {
            token.cancel();
        }
    }
}

async fn flush_pending<S: KeyValueStore>(
    session: &Mutex<ReportSession<S>>,
    pending: &Mutex<Option<PendingEdits>>,
) -> Option<ReportDraft> {
    let mut session = session.lock().await;
    let buffer = pending.lock().await.take()?;
    write_buffer(&mut session, buffer)
}

fn write_buffer<S: KeyValueStore>(
    session: &mut ReportSession<S>,
    buffer: PendingEdits,
) -> Option<ReportDraft> {
    let saved = if buffer.generation == session.generation() && session.active().is_some() {
        session.save_keeping_status(buffer.patch)
    } else {
        let Some(id) = buffer.target else {
            log_warn!("Dropped auto-save edits for an unsaved report that is no longer open");
            return None;
        };
        match session.save_patch_to(&id, buffer.patch) {
            Some(saved) => saved,
            None => {
                log_warn!("Dropped auto-save edits for report {id}; it no longer exists");
                return None;
            }
        }
    };

    log_info!(
        "Auto-saved report {}",
        saved.id.as_deref().unwrap_or_default()
    );
    Some(saved)
}
