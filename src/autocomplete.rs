use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::Result;

use crate::model::SearchResult;
use crate::service::PlayerService;
use crate::source::is_searchable;

pub trait PlayerSearch: Send + Sync {
    fn search_players(&self, query: &str) -> Result<Vec<SearchResult>>;
}

impl PlayerSearch for PlayerService {
    fn search_players(&self, query: &str) -> Result<Vec<SearchResult>> {
        PlayerService::search_players(self, query)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightMove {
    Up,
    Down,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutocompleteState {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub is_searching: bool,
    pub highlight: Option<usize>,
}

impl AutocompleteState {
    /// Update the live query. Returns the tag to look up, or `None` when the
    /// query is too short to search (results are emptied right away).
    pub fn set_query(&mut self, text: &str) -> Option<String> {
        self.query = text.to_string();
        self.highlight = None;
        if !is_searchable(text) {
            self.results.clear();
            self.is_searching = false;
            return None;
        }
        self.is_searching = true;
        Some(text.to_string())
    }

    /// Apply a finished lookup. Returns `false` when the lookup is stale.
    pub fn apply_results(&mut self, tag: &str, outcome: Result<Vec<SearchResult>>) -> bool {
        if self.query != tag {
            return false;
        }
        self.results = match outcome {
            Ok(results) => results,
            Err(err) => {
                log::debug!("search for {tag:?} failed: {err:#}");
                Vec::new()
            }
        };
        self.is_searching = false;
        if self.highlight.is_some_and(|i| i >= self.results.len()) {
            self.highlight = None;
        }
        true
    }

    pub fn move_highlight(&mut self, direction: HighlightMove) {
        let len = self.results.len();
        if len == 0 {
            return;
        }
        self.highlight = Some(match (direction, self.highlight) {
            (HighlightMove::Down, Some(i)) if i + 1 < len => i + 1,
            (HighlightMove::Down, _) => 0,
            (HighlightMove::Up, Some(i)) if i > 0 => i - 1,
            (HighlightMove::Up, _) => len - 1,
        });
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn selected(&self) -> Option<&SearchResult> {
        self.highlight.and_then(|i| self.results.get(i))
    }

    /// First suggestion for the live query; `None` while its lookup is
    /// still running.
    pub fn settled_top_result(&self) -> Option<&SearchResult> {
        if self.is_searching {
            return None;
        }
        self.results.first()
    }
}

pub struct Autocomplete {
    state: Arc<Mutex<AutocompleteState>>,
    searcher: Arc<dyn PlayerSearch>,
    debounce: Duration,
    pending: Option<Sender<()>>,
    on_update: Option<Sender<()>>,
}

impl Autocomplete {
    pub fn new(searcher: Arc<dyn PlayerSearch>, debounce: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(AutocompleteState::default())),
            searcher,
            debounce,
            pending: None,
            on_update: None,
        }
    }

    /// Ping `tx` whenever a lookup result is applied.
    pub fn notify(mut self, tx: Sender<()>) -> Self {
        self.on_update = Some(tx);
        self
    }

    pub fn snapshot(&self) -> AutocompleteState {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn search(&mut self, text: &str) {
        self.cancel_pending();
        let tag = match self.state.lock() {
            Ok(mut state) => state.set_query(text),
            Err(_) => return,
        };
        let Some(tag) = tag else {
            return;
        };

        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();
        self.pending = Some(cancel_tx);

        let state = Arc::clone(&self.state);
        let searcher = Arc::clone(&self.searcher);
        let on_update = self.on_update.clone();
        let debounce = self.debounce;
        thread::spawn(move || {
            // Dropping the sender (a newer keystroke) cancels the timer.
            match cancel_rx.recv_timeout(debounce) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
            }
            let outcome = searcher.search_players(&tag);
            let applied = state
                .lock()
                .map(|mut s| s.apply_results(&tag, outcome))
                .unwrap_or(false);
            if applied && let Some(tx) = on_update {
                let _ = tx.send(());
            }
        });
    }

    pub fn move_highlight(&mut self, direction: HighlightMove) {
        if let Ok(mut state) = self.state.lock() {
            state.move_highlight(direction);
        }
    }

    pub fn clear(&mut self) {
        self.cancel_pending();
        if let Ok(mut state) = self.state.lock() {
            state.clear();
        }
    }

    pub fn selected(&self) -> Option<SearchResult> {
        self.state.lock().ok().and_then(|s| s.selected().cloned())
    }

    pub fn settled_top_result(&self) -> Option<SearchResult> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.settled_top_result().cloned())
    }

    fn cancel_pending(&mut self) {
        self.pending = None;
    }
}
