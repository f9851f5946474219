use indexmap::IndexMap;
use thiserror::Error;

use crate::{
    dao::models::Game,
    state::query::{GamesQuery, GamesResult},
};

/// Phases the incremental catalog can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogPhase {
    /// Nothing has been requested yet.
    Idle,
    /// First page of the current filter is being fetched; the list is empty.
    LoadingInitial,
    /// A further page is being fetched; the accumulated list stays visible.
    LoadingMore,
    /// Last request succeeded.
    Ready,
    /// Last request failed; accumulated items are kept and the failure is exposed.
    Error,
}

/// Failure reported to the catalog when a fetch did not produce a page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CatalogFailure {
    /// Human readable description suitable for display.
    pub message: String,
}

impl CatalogFailure {
    /// Wrap a display message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A fetch the state machine expects to be answered.
///
/// Only the response to the currently pending ticket is accepted; anything else was
/// superseded by a filter change or refresh and is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    /// Filter generation the ticket belongs to. Bumped on every reset.
    pub generation: u64,
    /// Query to send to the games service.
    pub query: GamesQuery,
}

/// Errors returned when a response cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// No fetch is currently pending.
    #[error("no fetch is pending")]
    NoPending,
    /// The response answers a ticket other than the pending one.
    #[error(
        "stale response for generation {} page {} (expected generation {} page {})",
        .got.generation,
        .got.query.page(),
        .expected.generation,
        .expected.query.page()
    )]
    Stale {
        /// Ticket currently pending.
        expected: FetchTicket,
        /// Ticket the response was issued for.
        got: FetchTicket,
    },
}

/// Observable view of the incremental catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSnapshot {
    /// Current phase.
    pub phase: CatalogPhase,
    /// Accumulated games, de-duplicated by id, in arrival order.
    pub games: Vec<Game>,
    /// Active genre filter.
    pub genre: Option<String>,
    /// Last page successfully loaded for the active filter.
    pub current_page: u32,
    /// Total pages reported by the last successful response.
    pub total_pages: u32,
    /// Genres offered by the filter UI.
    pub available_filters: Vec<String>,
    /// Failure of the last request, if it failed.
    pub error: Option<CatalogFailure>,
    /// Filter generation the snapshot belongs to.
    pub generation: u64,
}

impl CatalogSnapshot {
    /// Whether a request is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(
            self.phase,
            CatalogPhase::LoadingInitial | CatalogPhase::LoadingMore
        )
    }

    /// Whether more pages can be requested.
    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// State machine accumulating catalog pages across "load more" requests.
///
/// Callers plan a fetch (`mount`, `select_genre`, `load_more`, `retry`, `refresh`),
/// run it, then hand the outcome back through [`CatalogStateMachine::apply`]
/// together with the ticket it was planned with.
#[derive(Debug, Clone)]
pub struct CatalogStateMachine {
    phase: CatalogPhase,
    mounted: bool,
    genre: Option<String>,
    items: IndexMap<String, Game>,
    current_page: u32,
    total_pages: u32,
    available_filters: Vec<String>,
    error: Option<CatalogFailure>,
    generation: u64,
    pending: Option<FetchTicket>,
    failed: Option<FetchTicket>,
}

impl Default for CatalogStateMachine {
    fn default() -> Self {
        Self {
            phase: CatalogPhase::Idle,
            mounted: false,
            genre: None,
            items: IndexMap::new(),
            current_page: 1,
            total_pages: 0,
            available_filters: Vec::new(),
            error: None,
            generation: 0,
            pending: None,
            failed: None,
        }
    }
}

impl CatalogStateMachine {
    /// Create an idle, empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> CatalogPhase {
        self.phase
    }

    /// Active genre filter.
    pub fn genre(&self) -> Option<&str> {
        self.genre.as_deref()
    }

    /// Ticket awaiting a response, if any.
    pub fn pending(&self) -> Option<&FetchTicket> {
        self.pending.as_ref()
    }

    /// Current filter generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Accumulated games in display order.
    pub fn games(&self) -> impl Iterator<Item = &Game> {
        self.items.values()
    }

    /// Whether more pages can be requested.
    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Create a snapshot of the current state.
    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            phase: self.phase,
            games: self.items.values().cloned().collect(),
            genre: self.genre.clone(),
            current_page: self.current_page,
            total_pages: self.total_pages,
            available_filters: self.available_filters.clone(),
            error: self.error.clone(),
            generation: self.generation,
        }
    }

    /// Initial load for `genre`, discarding anything accumulated before.
    pub fn mount(&mut self, genre: Option<&str>) -> FetchTicket {
        self.mounted = true;
        self.reset(GamesQuery::all().with_genre(genre))
    }

    /// Switch the genre filter.
    ///
    /// Returns `None` when the filter did not change. A change supersedes any request
    /// in flight, including a pending "load more".
    pub fn select_genre(&mut self, genre: Option<&str>) -> Option<FetchTicket> {
        if !self.mounted {
            return Some(self.mount(genre));
        }

        let current = GamesQuery::all().with_genre(self.genre.as_deref());
        if current.same_genre(genre) {
            return None;
        }

        Some(self.reset(GamesQuery::all().with_genre(genre)))
    }

    /// Reload the first page of the active filter in a fresh generation.
    pub fn refresh(&mut self) -> FetchTicket {
        self.mounted = true;
        self.reset(GamesQuery::all().with_genre(self.genre.clone()))
    }

    /// Request the page after the last loaded one.
    ///
    /// Returns `None` while a request is in flight or when every page has been loaded.
    /// The page pointer only advances once the response is applied.
    pub fn load_more(&mut self) -> Option<FetchTicket> {
        if self.pending.is_some() || !self.mounted || !self.has_more() {
            return None;
        }

        let query = GamesQuery::all()
            .with_genre(self.genre.as_deref())
            .with_page(i64::from(self.current_page) + 1);

        self.phase = CatalogPhase::LoadingMore;
        self.error = None;
        Some(self.issue(query))
    }

    /// Re-issue the request that failed last, in the same generation.
    pub fn retry(&mut self) -> Option<FetchTicket> {
        if self.phase != CatalogPhase::Error || self.pending.is_some() {
            return None;
        }
        let failed = self.failed.take()?;

        self.phase = if failed.query.page() <= 1 {
            CatalogPhase::LoadingInitial
        } else {
            CatalogPhase::LoadingMore
        };
        self.error = None;
        Some(self.issue(failed.query))
    }

    /// Apply the outcome of the fetch planned with `ticket`, returning the next phase.
    pub fn apply(
        &mut self,
        ticket: &FetchTicket,
        outcome: Result<GamesResult, CatalogFailure>,
    ) -> Result<CatalogPhase, ApplyError> {
        let pending = self.pending.take().ok_or(ApplyError::NoPending)?;

        if pending != *ticket {
            let expected = pending.clone();
            self.pending = Some(pending);
            return Err(ApplyError::Stale {
                expected,
                got: ticket.clone(),
            });
        }

        match outcome {
            Ok(result) => {
                if pending.query.page() <= 1 {
                    self.items.clear();
                }
                for game in result.games {
                    self.items.entry(game.id.clone()).or_insert(game);
                }
                self.current_page = pending.query.page();
                self.total_pages = result.total_pages;
                self.available_filters = result.available_filters;
                self.error = None;
                self.failed = None;
                self.phase = CatalogPhase::Ready;
            }
            Err(failure) => {
                self.error = Some(failure);
                self.failed = Some(pending);
                self.phase = CatalogPhase::Error;
            }
        }

        Ok(self.phase)
    }

    fn reset(&mut self, query: GamesQuery) -> FetchTicket {
        self.generation += 1;
        self.genre = query.genre().map(str::to_string);
        self.items.clear();
        self.current_page = 1;
        self.total_pages = 0;
        self.error = None;
        self.failed = None;
        self.pending = None;
        self.phase = CatalogPhase::LoadingInitial;
        self.issue(query.with_page(1))
    }

    fn issue(&mut self, query: GamesQuery) -> FetchTicket {
        let ticket = FetchTicket {
            generation: self.generation,
            query,
        };
        self.pending = Some(ticket.clone());
        ticket
    }
}
