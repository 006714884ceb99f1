//! Component loader: fetch named markup fragments and inject them into slots.
//!
//! Fragments come from a [`FragmentSource`]: the templates compiled into the
//! binary, a directory of `.html` files, or the bot's web server.  A fetch
//! that fails on the transport is retried once after [`RETRY_DELAY`]; a
//! missing fragment or an HTTP error status is not.
//!
//! Loading is split in two because the surface is owned by the app's event
//! loop: [`ComponentLoader::fetch`] runs on a task, the result travels back
//! to the loop, which calls [`ComponentLoader::inject`], yields once so
//! pending events are handled, runs the load's after-hook and then
//! [`announces`](ComponentLoader::announce) the component.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use panel_proto::config::{TemplateSourceKind, TemplatesConfig};

use crate::markup::Markup;
use crate::router::ViewName;
use crate::surface::{Surface, SurfaceError, Target};

pub const RETRY_DELAY: Duration = Duration::from_millis(500);

const EMBEDDED: &[(&str, &str)] = &[
    ("player", include_str!("../templates/player.html")),
    ("history", include_str!("../templates/history.html")),
    ("channels", include_str!("../templates/channels.html")),
    ("player-keys", include_str!("../templates/player-keys.html")),
    ("history-keys", include_str!("../templates/history-keys.html")),
    ("channels-keys", include_str!("../templates/channels-keys.html")),
    ("composer", include_str!("../templates/composer.html")),
];

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),
    #[error("{0}")]
    Transport(String),
}

impl FetchError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum LoadError {
    #[error("target {0} not found")]
    NotFound(String),
    #[error("component {name} answered HTTP {status}")]
    Status { name: String, status: u16 },
    #[error("could not fetch component {name}: {message}")]
    Transport { name: String, message: String },
}

impl LoadError {
    fn from_fetch(name: &str, err: FetchError) -> Self {
        match err {
            FetchError::Status(status) => Self::Status {
                name: name.to_string(),
                status,
            },
            FetchError::Transport(message) => Self::Transport {
                name: name.to_string(),
                message,
            },
        }
    }
}

impl From<SurfaceError> for LoadError {
    fn from(err: SurfaceError) -> Self {
        match err {
            SurfaceError::NotFound(target) => Self::NotFound(target),
        }
    }
}

pub trait FragmentSource: Send + Sync {
    fn fetch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<String, FetchError>>;
}

/// Templates compiled into the binary.
pub struct EmbeddedSource;

impl FragmentSource for EmbeddedSource {
    fn fetch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
        let found = EMBEDDED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, html)| html.to_string())
            .ok_or(FetchError::Status(404));
        async move { found }.boxed()
    }
}

/// `<dir>/<name>.html`, read on every load.
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl FragmentSource for DirectorySource {
    fn fetch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
        let path = self.dir.join(format!("{name}.html"));
        async move {
            tokio::fs::read_to_string(&path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FetchError::Status(404)
                } else {
                    FetchError::Transport(format!("{}: {}", path.display(), e))
                }
            })
        }
        .boxed()
    }
}

/// `GET <base_url>/<name>.html`
pub struct RemoteSource {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteSource {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl FragmentSource for RemoteSource {
    fn fetch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
        let url = format!("{}/{}.html", self.base_url, name);
        async move {
            let response = self
                .http
                .get(&url)
                .send()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }
            response
                .text()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))
        }
        .boxed()
    }
}

pub fn source_from_config(config: &TemplatesConfig) -> Arc<dyn FragmentSource> {
    match config.source {
        TemplateSourceKind::Embedded => Arc::new(EmbeddedSource),
        TemplateSourceKind::Directory => Arc::new(DirectorySource::new(config.dir.clone())),
        TemplateSourceKind::Remote => {
            Arc::new(RemoteSource::new(reqwest::Client::new(), &config.base_url))
        }
    }
}

/// A fetched fragment, not yet injected.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub name: String,
    pub markup: Markup,
}

/// Broadcast after a fragment has been injected.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentReady {
    pub name: String,
    pub target: String,
}

/// Load `name` into `target`; once injected, the view `after` gets its
/// after-load hook called with the component name.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub name: String,
    pub target: Target,
    pub after: Option<ViewName>,
}

impl LoadRequest {
    pub fn new(name: &str, target: &str) -> Self {
        Self {
            name: name.to_string(),
            target: Target::parse(target),
            after: None,
        }
    }

    pub fn then(mut self, view: ViewName) -> Self {
        self.after = Some(view);
        self
    }
}

#[derive(Clone)]
pub struct ComponentLoader {
    source: Arc<dyn FragmentSource>,
    ready_tx: broadcast::Sender<ComponentReady>,
    retry_delay: Duration,
}

impl ComponentLoader {
    pub fn new(source: Arc<dyn FragmentSource>) -> Self {
        let (ready_tx, _) = broadcast::channel(64);
        Self {
            source,
            ready_tx,
            retry_delay: RETRY_DELAY,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ComponentReady> {
        self.ready_tx.subscribe()
    }

    pub async fn fetch(&self, name: &str) -> Result<Fragment, LoadError> {
        let html = match self.source.fetch(name).await {
            Ok(html) => html,
            Err(e) if e.is_transient() => {
                warn!("fetching component {} failed ({}), retrying", name, e);
                tokio::time::sleep(self.retry_delay).await;
                self.source
                    .fetch(name)
                    .await
                    .map_err(|e| LoadError::from_fetch(name, e))?
            }
            Err(e) => return Err(LoadError::from_fetch(name, e)),
        };
        Ok(Fragment {
            name: name.to_string(),
            markup: Markup::trusted(html),
        })
    }

    /// Inject `fragment` into `target`.  Returns the slot id.
    pub fn inject(
        &self,
        surface: &mut Surface,
        target: &Target,
        fragment: Fragment,
    ) -> Result<String, LoadError> {
        let id = surface.inject(target, fragment.markup)?;
        debug!("component {} injected into #{}", fragment.name, id);
        Ok(id)
    }

    /// Announce a component whose after-hook has run.
    pub fn announce(&self, name: &str, target: &str) {
        let _ = self.ready_tx.send(ComponentReady {
            name: name.to_string(),
            target: target.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails with `first_error` on the first call, then serves `html`.
    struct FlakySource {
        calls: AtomicUsize,
        first_error: FetchError,
    }

    impl FragmentSource for FlakySource {
        fn fetch<'a>(&'a self, _name: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let res = if n == 0 {
                Err(self.first_error.clone())
            } else {
                Ok("<div id=\"late\"></div>".to_string())
            };
            async move { res }.boxed()
        }
    }

    fn flaky(first_error: FetchError) -> Arc<FlakySource> {
        Arc::new(FlakySource {
            calls: AtomicUsize::new(0),
            first_error,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_is_retried_once() {
        let source = flaky(FetchError::Transport("connection reset".into()));
        let loader = ComponentLoader::new(source.clone());
        let fragment = loader.fetch("player").await.unwrap();
        assert_eq!(fragment.markup.as_str(), "<div id=\"late\"></div>");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_status_failure_is_not_retried() {
        let source = flaky(FetchError::Status(404));
        let loader = ComponentLoader::new(source.clone());
        let err = loader.fetch("missing").await.unwrap_err();
        assert_eq!(
            err,
            LoadError::Status {
                name: "missing".into(),
                status: 404
            }
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_embedded_templates_resolve() {
        let loader = ComponentLoader::new(Arc::new(EmbeddedSource));
        for name in ["player", "history", "channels", "player-keys"] {
            assert!(loader.fetch(name).await.is_ok(), "{name}");
        }
        assert!(matches!(
            loader.fetch("nope").await,
            Err(LoadError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_directory_source_missing_file_is_404() {
        let dir = std::env::temp_dir().join("botpanel-loader-test-missing");
        let source = DirectorySource::new(dir);
        assert_eq!(source.fetch("none").await, Err(FetchError::Status(404)));
    }

    #[tokio::test]
    async fn test_inject_then_announce_and_reject_unknown_target() {
        let loader = ComponentLoader::new(Arc::new(EmbeddedSource));
        let mut ready = loader.subscribe();
        let mut surface = Surface::new();

        let fragment = loader.fetch("player").await.unwrap();
        let id = loader
            .inject(&mut surface, &Target::parse("#main"), fragment)
            .unwrap();
        assert_eq!(id, "main");
        assert!(surface.contains("queue"));
        assert!(ready.try_recv().is_err());
        loader.announce("player", &id);
        assert_eq!(
            ready.try_recv().unwrap(),
            ComponentReady {
                name: "player".into(),
                target: "main".into()
            }
        );

        let fragment = loader.fetch("player-keys").await.unwrap();
        let err = loader
            .inject(&mut surface, &Target::parse("#sidebar"), fragment)
            .unwrap_err();
        assert_eq!(err, LoadError::NotFound("#sidebar".into()));
        assert!(ready.try_recv().is_err());
    }
}
