pub mod bot_panel;
pub mod console_panel;
pub mod guild_picker;
pub mod help_overlay;

use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use panel_proto::client::{with_cancel, ApiError};

use crate::action::OverlayId;

use bot_panel::BotEvent;
use console_panel::ConsoleEvent;
use guild_picker::GuildPickerEvent;

#[derive(Debug)]
pub enum OverlayEvent {
    Guilds(GuildPickerEvent),
    Bot(BotEvent),
    Console(ConsoleEvent),
}

impl OverlayEvent {
    pub fn target(&self) -> OverlayId {
        match self {
            Self::Guilds(_) => OverlayId::Guilds,
            Self::Bot(_) => OverlayId::Bot,
            Self::Console(_) => OverlayId::Console,
        }
    }
}

/// Requests of one overlay, cancelled together when it closes.
pub struct OverlayScope {
    name: &'static str,
    tx: mpsc::UnboundedSender<OverlayEvent>,
    token: CancellationToken,
}

impl OverlayScope {
    pub fn new(name: &'static str, tx: mpsc::UnboundedSender<OverlayEvent>) -> Self {
        let token = CancellationToken::new();
        token.cancel();
        Self { name, tx, token }
    }

    /// Start a fresh scope, cancelling whatever the previous one ran.
    pub fn open(&mut self) {
        self.token.cancel();
        self.token = CancellationToken::new();
    }

    pub fn close(&mut self) {
        self.token.cancel();
    }

    pub fn spawn<T, F, M>(&self, fut: F, map: M) -> JoinHandle<()>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
        M: FnOnce(Result<T, ApiError>) -> OverlayEvent + Send + 'static,
    {
        self.spawn_with(self.token.clone(), fut, map)
    }

    /// Like [`spawn`](Self::spawn), but only `token` ends the request.
    pub fn spawn_with<T, F, M>(&self, token: CancellationToken, fut: F, map: M) -> JoinHandle<()>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
        M: FnOnce(Result<T, ApiError>) -> OverlayEvent + Send + 'static,
    {
        let tx = self.tx.clone();
        let name = self.name;
        tokio::spawn(async move {
            match with_cancel(&token, fut).await {
                Err(ApiError::Cancelled) => trace!("{} request cancelled", name),
                res => {
                    let _ = tx.send(map(res));
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closed_scope_drops_results() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scope = OverlayScope::new("test", tx);

        // A scope starts closed.
        scope
            .spawn(async { Ok(1u8) }, |_| {
                OverlayEvent::Console(ConsoleEvent::Saved(Ok(Default::default())))
            })
            .await
            .unwrap();
        assert!(rx.try_recv().is_err());

        scope.open();
        scope
            .spawn(async { Ok(1u8) }, |_| {
                OverlayEvent::Console(ConsoleEvent::Saved(Ok(Default::default())))
            })
            .await
            .unwrap();
        assert_eq!(rx.try_recv().unwrap().target(), OverlayId::Console);

        scope.close();
        scope
            .spawn(async { Ok(1u8) }, |_| {
                OverlayEvent::Console(ConsoleEvent::Saved(Ok(Default::default())))
            })
            .await
            .unwrap();
        assert!(rx.try_recv().is_err());
    }
}
