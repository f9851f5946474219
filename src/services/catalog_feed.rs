//! Async driver of the incremental catalog.
//!
//! [`CatalogFeed`] plans fetches on a [`CatalogStateMachine`], runs them through a
//! [`GamesApi`] without holding the lock, and applies the outcome only if its ticket is
//! still the pending one. Every change is published to `watch` subscribers.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::{Mutex, mpsc, watch};
use tokio_stream::wrappers::{UnboundedReceiverStream, WatchStream};
use tracing::{debug, warn};

use crate::{
    services::games_client::GamesApi,
    state::catalog_machine::{CatalogFailure, CatalogSnapshot, CatalogStateMachine, FetchTicket},
};

/// Event raised when the visible end of the list is close to the last loaded game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearEnd;

/// UI-agnostic "near end of list" detector.
///
/// Front-ends report which item is the last one visible; when it is within `margin`
/// items of the end of the loaded list a [`NearEnd`] event is emitted.
#[derive(Debug, Clone)]
pub struct NearEndSignal {
    margin: usize,
    enabled: bool,
    tx: mpsc::UnboundedSender<NearEnd>,
}

impl NearEndSignal {
    /// Create a detector and the stream of events it emits.
    pub fn channel(margin: usize) -> (Self, UnboundedReceiverStream<NearEnd>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signal = Self {
            margin,
            enabled: true,
            tx,
        };
        (signal, UnboundedReceiverStream::new(rx))
    }

    /// Stop or resume emitting events.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Report the index of the last visible item out of `loaded` items.
    ///
    /// Returns whether an event was emitted.
    pub fn observe(&self, last_visible: usize, loaded: usize) -> bool {
        if !self.enabled || loaded == 0 {
            return false;
        }

        let remaining = loaded.saturating_sub(last_visible.saturating_add(1));
        if remaining > self.margin {
            return false;
        }

        self.tx.send(NearEnd).is_ok()
    }
}

/// Incremental catalog bound to a games API.
pub struct CatalogFeed {
    api: Arc<dyn GamesApi>,
    machine: Mutex<CatalogStateMachine>,
    updates: watch::Sender<CatalogSnapshot>,
}

impl CatalogFeed {
    /// Create an idle feed fetching pages from `api`.
    pub fn new(api: Arc<dyn GamesApi>) -> Self {
        let machine = CatalogStateMachine::new();
        let (updates, _rx) = watch::channel(machine.snapshot());
        Self {
            api,
            machine: Mutex::new(machine),
            updates,
        }
    }

    /// Subscribe to snapshots published after every change.
    pub fn subscribe(&self) -> watch::Receiver<CatalogSnapshot> {
        self.updates.subscribe()
    }

    /// Snapshots as a stream, starting with the current one.
    pub fn updates(&self) -> WatchStream<CatalogSnapshot> {
        WatchStream::new(self.updates.subscribe())
    }

    /// Current state of the catalog.
    pub async fn snapshot(&self) -> CatalogSnapshot {
        self.machine.lock().await.snapshot()
    }

    /// Initial load of the first page for `genre`.
    pub async fn mount(&self, genre: Option<&str>) -> CatalogSnapshot {
        let ticket = self.plan(|sm| Some(sm.mount(genre))).await;
        self.run(ticket).await
    }

    /// Switch the genre filter; no request is made when it did not change.
    pub async fn select_genre(&self, genre: Option<&str>) -> CatalogSnapshot {
        let ticket = self.plan(|sm| sm.select_genre(genre)).await;
        self.run(ticket).await
    }

    /// Load the next page. Single entry point for buttons and near-end signals alike.
    pub async fn load_more(&self) -> CatalogSnapshot {
        let ticket = self.plan(CatalogStateMachine::load_more).await;
        self.run(ticket).await
    }

    /// Re-issue the request that failed last.
    pub async fn retry(&self) -> CatalogSnapshot {
        let ticket = self.plan(CatalogStateMachine::retry).await;
        self.run(ticket).await
    }

    /// Reload the first page of the active filter.
    pub async fn refresh(&self) -> CatalogSnapshot {
        let ticket = self.plan(|sm| Some(sm.refresh())).await;
        self.run(ticket).await
    }

    /// Route every near-end event to [`CatalogFeed::load_more`] until the stream ends.
    ///
    /// Events are handled concurrently so that those arriving while a page is in flight
    /// hit the in-flight guard and are dropped instead of queueing extra loads.
    pub async fn follow<S>(&self, signals: S)
    where
        S: Stream<Item = NearEnd>,
    {
        signals
            .for_each_concurrent(None, |NearEnd| async move {
                self.load_more().await;
            })
            .await;
    }

    async fn plan<F>(&self, planner: F) -> Option<FetchTicket>
    where
        F: FnOnce(&mut CatalogStateMachine) -> Option<FetchTicket>,
    {
        let mut sm = self.machine.lock().await;
        let ticket = planner(&mut sm);
        if ticket.is_some() {
            self.updates.send_replace(sm.snapshot());
        }
        ticket
    }

    async fn run(&self, ticket: Option<FetchTicket>) -> CatalogSnapshot {
        let Some(ticket) = ticket else {
            return self.snapshot().await;
        };

        let outcome = self
            .api
            .fetch_page(&ticket.query)
            .await
            .map_err(|err| {
                warn!(
                    generation = ticket.generation,
                    genre = ?ticket.query.genre(),
                    page = ticket.query.page(),
                    error = %err,
                    "failed to fetch games"
                );
                CatalogFailure::from(err)
            });

        let mut sm = self.machine.lock().await;
        match sm.apply(&ticket, outcome) {
            Ok(phase) => debug!(
                generation = ticket.generation,
                page = ticket.query.page(),
                ?phase,
                "applied catalog response"
            ),
            Err(err) => debug!(error = %err, "discarding superseded catalog response"),
        }

        let snapshot = sm.snapshot();
        self.updates.send_replace(snapshot.clone());
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::{FutureExt, future::BoxFuture};
    use tokio::sync::oneshot;

    use super::*;
    use crate::{
        config::ClientConfig,
        dao::models::{Game, fixtures::game},
        routes::test_server,
        services::games_client::{ClientError, GamesClient},
        state::{
            catalog_machine::CatalogPhase,
            query::{GamesQuery, GamesResult, PAGE_SIZE, resolve},
        },
    };

    type Reply = oneshot::Sender<Result<GamesResult, ClientError>>;

    /// API whose responses are released by the test, one request at a time.
    struct ManualApi {
        requests: mpsc::UnboundedSender<(GamesQuery, Reply)>,
    }

    impl ManualApi {
        fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<(GamesQuery, Reply)>) {
            let (requests, rx) = mpsc::unbounded_channel();
            (Arc::new(Self { requests }), rx)
        }
    }

    impl GamesApi for ManualApi {
        fn fetch_page(
            &self,
            query: &GamesQuery,
        ) -> BoxFuture<'static, Result<GamesResult, ClientError>> {
            let (tx, rx) = oneshot::channel();
            let _ = self.requests.send((query.clone(), tx));
            async move {
                rx.await.unwrap_or_else(|_| {
                    Err(ClientError::Network {
                        message: "reply dropped".into(),
                    })
                })
            }
            .boxed()
        }
    }

    fn catalog() -> Vec<Game> {
        let mut games: Vec<Game> = (1..=30)
            .map(|i| game(&format!("a{i}"), "Action", 1999))
            .collect();
        games.extend((1..=3).map(|i| game(&format!("r{i}"), "RPG", 2999)));
        games
    }

    fn page(query: &GamesQuery) -> Result<GamesResult, ClientError> {
        Ok(resolve(&catalog(), query, PAGE_SIZE))
    }

    fn ids(snapshot: &CatalogSnapshot) -> Vec<&str> {
        snapshot.games.iter().map(|g| g.id.as_str()).collect()
    }

    async fn answer(requests: &mut mpsc::UnboundedReceiver<(GamesQuery, Reply)>) -> GamesQuery {
        let (query, reply) = requests.recv().await.unwrap();
        reply.send(page(&query)).unwrap();
        query
    }

    #[tokio::test]
    async fn mount_and_load_more_accumulate() {
        let (api, mut requests) = ManualApi::new();
        let feed = Arc::new(CatalogFeed::new(api));

        let task = tokio::spawn({
            let feed = feed.clone();
            async move { feed.mount(None).await }
        });
        let query = answer(&mut requests).await;
        assert_eq!(query, GamesQuery::all());
        let snapshot = task.await.unwrap();
        assert_eq!(snapshot.games.len(), 12);
        assert!(snapshot.has_more());

        let task = tokio::spawn({
            let feed = feed.clone();
            async move { feed.load_more().await }
        });
        assert_eq!(answer(&mut requests).await.page(), 2);
        let snapshot = task.await.unwrap();
        assert_eq!(snapshot.games.len(), 24);
        assert_eq!(snapshot.current_page, 2);
        assert_eq!(snapshot.phase, CatalogPhase::Ready);
    }

    #[tokio::test]
    async fn stale_page_after_genre_change_is_discarded() {
        let (api, mut requests) = ManualApi::new();
        let feed = Arc::new(CatalogFeed::new(api));

        let task = tokio::spawn({
            let feed = feed.clone();
            async move { feed.mount(Some("Action")).await }
        });
        answer(&mut requests).await;
        task.await.unwrap();

        let more = tokio::spawn({
            let feed = feed.clone();
            async move { feed.load_more().await }
        });
        let (page_two, page_two_reply) = requests.recv().await.unwrap();
        assert_eq!(page_two.page(), 2);

        let switch = tokio::spawn({
            let feed = feed.clone();
            async move { feed.select_genre(Some("RPG")).await }
        });
        let (rpg, rpg_reply) = requests.recv().await.unwrap();
        assert_eq!(rpg.genre(), Some("RPG"));
        assert_eq!(feed.snapshot().await.phase, CatalogPhase::LoadingInitial);

        // The abandoned page arrives first and must not leak into the RPG list.
        page_two_reply.send(page(&page_two)).unwrap();
        let after_stale = more.await.unwrap();
        assert!(after_stale.games.is_empty());
        assert_eq!(after_stale.phase, CatalogPhase::LoadingInitial);

        rpg_reply.send(page(&rpg)).unwrap();
        let snapshot = switch.await.unwrap();
        assert_eq!(ids(&snapshot), ["r1", "r2", "r3"]);
        assert!(!snapshot.has_more());
    }

    #[tokio::test]
    async fn stale_page_arriving_last_is_discarded() {
        let (api, mut requests) = ManualApi::new();
        let feed = Arc::new(CatalogFeed::new(api));

        let task = tokio::spawn({
            let feed = feed.clone();
            async move { feed.mount(Some("Action")).await }
        });
        answer(&mut requests).await;
        task.await.unwrap();

        let more = tokio::spawn({
            let feed = feed.clone();
            async move { feed.load_more().await }
        });
        let (page_two, page_two_reply) = requests.recv().await.unwrap();

        let switch = tokio::spawn({
            let feed = feed.clone();
            async move { feed.select_genre(Some("RPG")).await }
        });
        answer(&mut requests).await;
        switch.await.unwrap();

        page_two_reply.send(page(&page_two)).unwrap();
        let snapshot = more.await.unwrap();
        assert_eq!(ids(&snapshot), ["r1", "r2", "r3"]);
        assert_eq!(snapshot.genre.as_deref(), Some("RPG"));
    }

    #[tokio::test]
    async fn failure_keeps_items_and_retry_reissues_the_same_page() {
        let (api, mut requests) = ManualApi::new();
        let feed = Arc::new(CatalogFeed::new(api));

        let task = tokio::spawn({
            let feed = feed.clone();
            async move { feed.mount(None).await }
        });
        answer(&mut requests).await;
        task.await.unwrap();

        let more = tokio::spawn({
            let feed = feed.clone();
            async move { feed.load_more().await }
        });
        let (query, reply) = requests.recv().await.unwrap();
        reply
            .send(Err(ClientError::Fetch {
                status: 503,
                status_text: "Service Unavailable".into(),
            }))
            .unwrap();
        let snapshot = more.await.unwrap();
        assert_eq!(snapshot.phase, CatalogPhase::Error);
        assert_eq!(snapshot.games.len(), 12);
        assert_eq!(snapshot.current_page, 1);
        assert_eq!(
            snapshot.error.unwrap().message,
            "Failed to fetch games: 503 Service Unavailable"
        );

        let retry = tokio::spawn({
            let feed = feed.clone();
            async move { feed.retry().await }
        });
        assert_eq!(answer(&mut requests).await, query);
        let snapshot = retry.await.unwrap();
        assert_eq!(snapshot.games.len(), 24);
        assert_eq!(snapshot.error, None);
    }

    #[tokio::test]
    async fn near_end_signals_share_the_in_flight_guard() {
        let (api, mut requests) = ManualApi::new();
        let feed = Arc::new(CatalogFeed::new(api));

        let task = tokio::spawn({
            let feed = feed.clone();
            async move { feed.mount(None).await }
        });
        answer(&mut requests).await;
        task.await.unwrap();

        let (signal, stream) = NearEndSignal::channel(2);
        let follower = tokio::spawn({
            let feed = feed.clone();
            async move { feed.follow(stream).await }
        });

        assert!(!signal.observe(3, 12));
        assert!(signal.observe(10, 12));
        let (query, reply) = requests.recv().await.unwrap();
        assert_eq!(query.page(), 2);

        // A scroll event and a button press while page 2 is in flight are both ignored.
        assert!(signal.observe(11, 12));
        let snapshot = feed.load_more().await;
        assert_eq!(snapshot.phase, CatalogPhase::LoadingMore);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(requests.try_recv().is_err());

        reply.send(page(&query)).unwrap();
        let mut updates = feed.subscribe();
        updates
            .wait_for(|snapshot| snapshot.phase == CatalogPhase::Ready)
            .await
            .unwrap();
        assert_eq!(feed.snapshot().await.games.len(), 24);

        drop(signal);
        follower.await.unwrap();
    }

    #[test]
    fn disabled_signal_stays_quiet() {
        let (mut signal, _stream) = NearEndSignal::channel(5);
        signal.set_enabled(false);
        assert!(!signal.observe(9, 10));
        assert!(!NearEndSignal::channel(5).0.observe(0, 0));
    }

    #[tokio::test]
    async fn updates_stream_starts_with_current_snapshot() {
        let (api, _requests) = ManualApi::new();
        let feed = CatalogFeed::new(api);
        let first = feed.updates().next().await.unwrap();
        assert_eq!(first.phase, CatalogPhase::Idle);
    }

    #[tokio::test]
    async fn drives_the_real_client_end_to_end() {
        let base = test_server::spawn_catalog(catalog()).await;
        let client = GamesClient::new(ClientConfig::new(base)).unwrap();
        let feed = CatalogFeed::new(Arc::new(client));

        let snapshot = feed.mount(Some("action")).await;
        assert_eq!(snapshot.games.len(), 12);
        assert_eq!(snapshot.available_filters, ["Action", "RPG"]);

        feed.load_more().await;
        let snapshot = feed.load_more().await;
        assert_eq!(snapshot.games.len(), 30);
        assert!(!snapshot.has_more());

        let unchanged = feed.load_more().await;
        assert_eq!(unchanged, snapshot);

        let snapshot = feed.select_genre(None).await;
        assert_eq!(snapshot.games.len(), 12);
        assert_eq!(snapshot.total_pages, 3);

        let snapshot = feed.refresh().await;
        assert_eq!(snapshot.current_page, 1);
        assert_eq!(snapshot.games.len(), 12);
    }
}
