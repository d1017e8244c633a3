use crate::handler::SessionHandler;
use crate::state::SessionState;
use folio_core::{FolioError, FolioResult, SessionEvent, SessionReply, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};

/// Queue depth of one user's worker. A user this far behind is flooding.
const WORKER_QUEUE: usize = 32;

type Envelope = (SessionEvent, oneshot::Sender<FolioResult<SessionReply>>);

/// Routes session events to one single-threaded worker per user.
///
/// Each worker owns its user's [`SessionState`] and drains an mpsc queue, so
/// all events for one user are processed in strict arrival order and
/// non-overlappingly, while distinct users run concurrently. There is no
/// global lock; the map of workers is only held long enough to look up or
/// spawn a sender.
pub struct SessionRouter {
    handler: Arc<SessionHandler>,
    workers: Mutex<HashMap<UserId, mpsc::Sender<Envelope>>>,
}

impl SessionRouter {
    /// Creates a router delegating event application to `handler`.
    pub fn new(handler: Arc<SessionHandler>) -> Self {
        Self {
            handler,
            workers: Mutex::new(HashMap::new()),
        }
    }

    /// Enqueues an event on the user's worker and returns a receiver for
    /// the reply.
    ///
    /// Enqueueing from a single intake loop preserves arrival order even
    /// when the replies themselves are awaited from spawned tasks.
    pub async fn submit(
        &self,
        user: UserId,
        event: SessionEvent,
    ) -> FolioResult<oneshot::Receiver<FolioResult<SessionReply>>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let sender = self.worker_sender(user).await;
        sender
            .send((event, reply_tx))
            .await
            .map_err(|_| FolioError::Channel(format!("session worker for {user} is gone")))?;
        Ok(reply_rx)
    }

    /// Enqueues an event and awaits its reply.
    pub async fn dispatch(&self, user: UserId, event: SessionEvent) -> FolioResult<SessionReply> {
        let reply_rx = self.submit(user, event).await?;
        reply_rx
            .await
            .map_err(|_| FolioError::Channel(format!("session worker for {user} dropped reply")))?
    }

    async fn worker_sender(&self, user: UserId) -> mpsc::Sender<Envelope> {
        let mut workers = self.workers.lock().await;
        if let Some(sender) = workers.get(&user) {
            if !sender.is_closed() {
                return sender.clone();
            }
        }

        let (tx, rx) = mpsc::channel(WORKER_QUEUE);
        let handler = Arc::clone(&self.handler);
        tokio::spawn(run_worker(user, handler, rx));
        workers.insert(user, tx.clone());
        tracing::debug!(%user, "session worker spawned");
        tx
    }
}

/// One user's event loop. Owns the session state for its lifetime.
async fn run_worker(
    user: UserId,
    handler: Arc<SessionHandler>,
    mut rx: mpsc::Receiver<Envelope>,
) {
    let mut state = SessionState::Idle;
    while let Some((event, reply_tx)) = rx.recv().await {
        let result = handler.handle(user, &mut state, event).await;
        if let Err(e) = &result {
            tracing::error!(%user, error = %e, "session event failed");
        }
        // The submitter may have given up; losing the reply is harmless.
        let _ = reply_tx.send(result);
    }
    tracing::debug!(%user, "session worker stopped");
}
