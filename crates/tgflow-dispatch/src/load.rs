use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::info;

use tgflow_core::InboundMessage;
use tgflow_sessions::SessionStore;

use crate::engine::{Dispatcher, DispatcherBuilder};
use crate::types::DispatchOutcome;

type Loader<B> = Box<dyn Fn(&mut DispatcherBuilder<B>) + Send + Sync>;

/// A dispatcher whose handlers are registered on first use.
///
/// The loader runs exactly once, even when several tasks race on the first
/// message; the losers block until registration has finished.
pub struct LazyDispatcher<B> {
    sessions: Arc<SessionStore>,
    loader: Loader<B>,
    cell: OnceLock<Arc<Dispatcher<B>>>,
}

impl<B: Send + Sync + 'static> LazyDispatcher<B> {
    pub fn new(
        sessions: Arc<SessionStore>,
        loader: impl Fn(&mut DispatcherBuilder<B>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            sessions,
            loader: Box::new(loader),
            cell: OnceLock::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn get(&self) -> Arc<Dispatcher<B>> {
        let dispatcher = self.cell.get_or_init(|| {
            let mut builder = DispatcherBuilder::new(Arc::clone(&self.sessions));
            (self.loader)(&mut builder);
            info!("handlers loaded on first use");
            Arc::new(builder.build())
        });
        Arc::clone(dispatcher)
    }

    pub async fn dispatch(&self, bot: B, message: InboundMessage) -> DispatchOutcome {
        self.get().dispatch(bot, message).await
    }
}

impl<B> fmt::Debug for LazyDispatcher<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyDispatcher")
            .field("loaded", &self.cell.get().is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InteractionContext;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tgflow_core::Sender;

    fn lazy(loads: &Arc<AtomicUsize>) -> LazyDispatcher<()> {
        let loads = Arc::clone(loads);
        LazyDispatcher::new(Arc::new(SessionStore::default()), move |builder| {
            loads.fetch_add(1, Ordering::SeqCst);
            builder.command("start", "Start", |_ctx: InteractionContext<()>| async {
                anyhow::Ok(())
            });
        })
    }

    #[test]
    fn loader_runs_once_under_concurrent_first_use() {
        let loads = Arc::new(AtomicUsize::new(0));
        let dispatcher = lazy(&loads);
        assert!(!dispatcher.is_loaded());

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    assert_eq!(dispatcher.get().commands().len(), 1);
                });
            }
        });

        assert!(dispatcher.is_loaded());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn first_dispatch_triggers_load() {
        let loads = Arc::new(AtomicUsize::new(0));
        let dispatcher = lazy(&loads);

        let message = InboundMessage::private_text(Sender::new(1, "A"), "/start");
        assert!(dispatcher.dispatch((), message.clone()).await.is_handled());
        assert!(dispatcher.dispatch((), message).await.is_handled());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
