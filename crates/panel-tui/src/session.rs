//! View sessions: the lifetime of one view instance.
//!
//! Every view init begins a session.  The session owns a cancellation token;
//! all requests and polling loops the view starts are bound to it, and
//! beginning a new session for the same view (or tearing the view down)
//! cancels the old token.  Results of a cancelled request are dropped here,
//! results that arrive anyway are tagged with the session id so the app can
//! discard messages from sessions that are no longer live.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use panel_proto::client::{with_cancel, ApiError};

use crate::router::ViewName;
use crate::views::ViewEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId {
    pub view: ViewName,
    pub generation: u64,
}

/// An event produced by work bound to a session.
#[derive(Debug)]
pub struct SessionMessage {
    pub session: SessionId,
    pub event: ViewEvent,
}

#[derive(Default)]
pub struct SessionRegistry {
    live: HashMap<ViewName, (u64, CancellationToken)>,
    next_generation: u64,
}

impl SessionRegistry {
    /// Start a new session for `view`, cancelling the previous one.
    pub fn begin(&mut self, view: ViewName) -> (SessionId, CancellationToken) {
        self.invalidate(view);
        self.next_generation += 1;
        let token = CancellationToken::new();
        self.live
            .insert(view, (self.next_generation, token.clone()));
        debug!("session {}#{} begun", view.as_str(), self.next_generation);
        (
            SessionId {
                view,
                generation: self.next_generation,
            },
            token,
        )
    }

    /// Cancel the live session of `view`, if any.
    pub fn invalidate(&mut self, view: ViewName) {
        if let Some((generation, token)) = self.live.remove(&view) {
            token.cancel();
            debug!("session {}#{} cancelled", view.as_str(), generation);
        }
    }

    pub fn is_live(&self, id: &SessionId) -> bool {
        self.live
            .get(&id.view)
            .is_some_and(|(generation, _)| *generation == id.generation)
    }

    pub fn cancel_all(&mut self) {
        for (_, (_, token)) in self.live.drain() {
            token.cancel();
        }
    }
}

/// Handle a view uses to start work bound to its session.
#[derive(Clone)]
pub struct SessionTasks {
    id: SessionId,
    token: CancellationToken,
    tx: mpsc::UnboundedSender<SessionMessage>,
}

impl SessionTasks {
    pub fn new(
        id: SessionId,
        token: CancellationToken,
        tx: mpsc::UnboundedSender<SessionMessage>,
    ) -> Self {
        Self { id, token, tx }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// A token cancelled with the session, or earlier by its holder.
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    pub fn send(&self, event: ViewEvent) {
        let _ = self.tx.send(SessionMessage {
            session: self.id,
            event,
        });
    }

    /// Run a request bound to the session and deliver `map(result)`.
    pub fn spawn<T, F, M>(&self, fut: F, map: M) -> JoinHandle<()>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
        M: FnOnce(Result<T, ApiError>) -> ViewEvent + Send + 'static,
    {
        self.spawn_with(self.token.clone(), fut, map)
    }

    /// Like [`spawn`](Self::spawn) with a narrower token, e.g. one slot that
    /// cancels its previous request whenever a new one starts.
    pub fn spawn_with<T, F, M>(&self, token: CancellationToken, fut: F, map: M) -> JoinHandle<()>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
        M: FnOnce(Result<T, ApiError>) -> ViewEvent + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move {
            match with_cancel(&token, fut).await {
                Err(ApiError::Cancelled) => {
                    trace!("request of {}#{} cancelled", this.id.view.as_str(), this.id.generation);
                }
                res => this.send(map(res)),
            }
        })
    }

    /// Call `tick` every `period` (first call immediately) and deliver its
    /// event, until the session ends.  Missed ticks are skipped.
    pub fn spawn_polling<F, Fut>(&self, period: Duration, mut tick: F) -> JoinHandle<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ViewEvent> + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = this.token.cancelled() => break,
                    _ = interval.tick() => {}
                }
                tokio::select! {
                    biased;
                    _ = this.token.cancelled() => break,
                    event = tick() => this.send(event),
                }
            }
            trace!("polling loop of {}#{} stopped", this.id.view.as_str(), this.id.generation);
        })
    }
}

/// One in-flight request per slot; starting a new one cancels the previous.
#[derive(Default)]
pub struct RequestSlot {
    token: Option<CancellationToken>,
}

impl RequestSlot {
    pub fn replace(&mut self, tasks: &SessionTasks) -> CancellationToken {
        self.cancel();
        let token = tasks.child_token();
        self.token = Some(token.clone());
        token
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::player::PlayerEvent;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn tasks(
        registry: &mut SessionRegistry,
        tx: &mpsc::UnboundedSender<SessionMessage>,
    ) -> SessionTasks {
        let (id, token) = registry.begin(ViewName::Player);
        SessionTasks::new(id, token, tx.clone())
    }

    #[test]
    fn test_begin_invalidates_previous_session() {
        let mut registry = SessionRegistry::default();
        let (first, first_token) = registry.begin(ViewName::Player);
        let (second, _) = registry.begin(ViewName::Player);
        assert!(first_token.is_cancelled());
        assert!(!registry.is_live(&first));
        assert!(registry.is_live(&second));

        let (history, _) = registry.begin(ViewName::History);
        assert!(registry.is_live(&second));
        registry.invalidate(ViewName::History);
        assert!(!registry.is_live(&history));
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_one_polling_loop_survives_reinit() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut registry = SessionRegistry::default();
        let ticks = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let session = tasks(&mut registry, &tx);
            let ticks = ticks.clone();
            handles.push(session.spawn_polling(Duration::from_secs(5), move || {
                let ticks = ticks.clone();
                async move {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    ViewEvent::Player(PlayerEvent::Refresh)
                }
            }));
        }

        tokio::time::sleep(Duration::from_secs(21)).await;
        let finished = handles.iter().filter(|h| h.is_finished()).count();
        assert_eq!(finished, 2);

        let mut live = 0;
        while let Ok(msg) = rx.try_recv() {
            if registry.is_live(&msg.session) {
                live += 1;
            }
        }
        // Immediate tick plus one every 5 s over 21 s.
        assert_eq!(live, 5);
    }

    #[tokio::test]
    async fn test_cancelled_request_delivers_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut registry = SessionRegistry::default();
        let session = tasks(&mut registry, &tx);

        let handle = session.spawn(
            std::future::pending::<Result<(), ApiError>>(),
            |_| ViewEvent::Player(PlayerEvent::Refresh),
        );
        registry.invalidate(ViewName::Player);
        handle.await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_request_slot_cancels_previous() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut registry = SessionRegistry::default();
        let session = tasks(&mut registry, &tx);
        let mut slot = RequestSlot::default();

        let first = session.spawn_with(
            slot.replace(&session),
            std::future::pending::<Result<(), ApiError>>(),
            |_| ViewEvent::Player(PlayerEvent::Refresh),
        );
        let second = session.spawn_with(
            slot.replace(&session),
            async { Ok(()) },
            |_| ViewEvent::Player(PlayerEvent::Refresh),
        );
        first.await.unwrap();
        second.await.unwrap();
        assert_eq!(rx.try_recv().map(|m| m.session), Ok(session.id()));
        assert!(rx.try_recv().is_err());
    }
}
