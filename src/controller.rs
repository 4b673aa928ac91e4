use crate::pokemon::{PageResponse, PokedexListEntry, pokedex_number_from_url};
use crate::repository::PokemonRepository;
use crate::resource::Resource;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Mutable list state. Only the controller writes to it.
#[derive(Debug, Default, Clone)]
pub struct PaginatedListState {
    pub items: Vec<PokedexListEntry>,
    /// Full list captured when a search session starts.
    pub cached_all_items: Vec<PokedexListEntry>,
    pub current_offset: u32,
    pub end_reached: bool,
    pub is_loading: bool,
    pub is_searching: bool,
    /// Empty when the last page load succeeded.
    pub load_error: String,
    active_query: String,
}

impl PaginatedListState {
    fn snapshot(&self) -> ListSnapshot {
        ListSnapshot {
            items: self.items.clone(),
            current_offset: self.current_offset,
            end_reached: self.end_reached,
            is_loading: self.is_loading,
            is_searching: self.is_searching,
            load_error: self.load_error.clone(),
        }
    }

    fn apply_filter(&mut self) {
        let query = self.active_query.to_lowercase();
        self.items = self
            .cached_all_items
            .iter()
            .filter(|entry| entry.name.to_lowercase().contains(&query))
            .cloned()
            .collect();
    }
}

/// What a presentation layer renders. Published on every state change.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ListSnapshot {
    pub items: Vec<PokedexListEntry>,
    pub current_offset: u32,
    pub end_reached: bool,
    pub is_loading: bool,
    pub is_searching: bool,
    pub load_error: String,
}

impl ListSnapshot {
    /// Rows in a two-column grid; the last row holds one entry when the count is odd.
    pub fn row_count(&self) -> usize {
        self.items.len().div_ceil(2)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[PokedexListEntry]> {
        self.items.chunks(2)
    }

    /// True when rendering `row_index` should trigger the next page load.
    pub fn should_load_more(&self, row_index: usize) -> bool {
        row_index + 1 >= self.row_count()
            && !self.end_reached
            && !self.is_loading
            && !self.is_searching
    }
}

/// Owns the paginated Pokédex list: sequential page loads and in-memory search.
///
/// State lives behind a mutex that is never held across an `.await`, so any
/// number of tasks can share the controller. Observers receive a fresh
/// [`ListSnapshot`] through [`subscribe`](Self::subscribe) after every change.
pub struct PokemonListController {
    repository: PokemonRepository,
    page_size: u32,
    sprite_url: String,
    state: Mutex<PaginatedListState>,
    updates: watch::Sender<ListSnapshot>,
}

impl PokemonListController {
    pub fn new(repository: PokemonRepository, page_size: u32, sprite_url: impl Into<String>) -> Self {
        let (updates, _) = watch::channel(ListSnapshot::default());
        Self {
            repository,
            page_size: page_size.max(1),
            sprite_url: sprite_url.into(),
            state: Mutex::new(PaginatedListState::default()),
            updates,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> ListSnapshot {
        self.lock_state().snapshot()
    }

    pub fn state(&self) -> PaginatedListState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, PaginatedListState> {
        self.state.lock().unwrap_or_else(|e: PoisonError<_>| {
            tracing::warn!("List state lock was poisoned, recovering");
            e.into_inner()
        })
    }

    fn publish(&self, state: &PaginatedListState) {
        self.updates.send_replace(state.snapshot());
    }

    /// Fetches the next page. Returns `false` without touching the network
    /// when a load is in flight, a search is active, or the end was reached.
    pub async fn load_next_page(&self) -> bool {
        let offset = {
            let mut state = self.lock_state();
            if state.is_loading || state.is_searching || state.end_reached {
                tracing::debug!(
                    is_loading = state.is_loading,
                    is_searching = state.is_searching,
                    end_reached = state.end_reached,
                    "Skipping page load"
                );
                return false;
            }
            state.is_loading = true;
            self.publish(&state);
            state.current_offset
        };

        tracing::debug!("Loading page offset={} limit={}", offset, self.page_size);
        let result = self.repository.get_pokemon_list(self.page_size, offset).await;

        let mut state = self.lock_state();
        match result {
            Resource::Success { data } => self.append_page(&mut state, offset, data),
            Resource::Error { message } => {
                tracing::warn!("Page load at offset {} failed: {}", offset, message);
                state.load_error = message;
            }
            Resource::Loading => {}
        }
        state.is_loading = false;
        self.publish(&state);
        true
    }

    fn append_page(&self, state: &mut PaginatedListState, offset: u32, page: PageResponse) {
        let received = page.results.len();
        let entries: Vec<PokedexListEntry> = page
            .results
            .iter()
            .enumerate()
            .map(|(i, result)| {
                let number = offset + i as u32 + 1;
                if let Some(listed) = pokedex_number_from_url(&result.url) {
                    if listed != number {
                        tracing::warn!(
                            "Pokédex number {} assigned to {} but API lists id {}",
                            number,
                            result.name,
                            listed
                        );
                    }
                }
                PokedexListEntry::new(&result.name, &self.sprite_url, number)
            })
            .collect();

        if state.is_searching {
            // A search began while this page was in flight: grow the full list
            // and refresh the visible matches.
            state.cached_all_items.extend(entries);
            state.apply_filter();
        } else {
            state.items.extend(entries);
        }

        state.current_offset = offset + self.page_size;
        if received < self.page_size as usize {
            state.end_reached = true;
        }
        state.load_error.clear();

        tracing::debug!(
            "Appended {} entries, next offset {}, end reached: {}",
            received,
            state.current_offset,
            state.end_reached
        );
    }

    /// Case-insensitive substring filter over the names. Never hits the network.
    pub fn search(&self, query: &str) {
        let mut state = self.lock_state();

        if query.is_empty() {
            if state.is_searching {
                state.items = std::mem::take(&mut state.cached_all_items);
                state.is_searching = false;
                state.active_query.clear();
                tracing::debug!("Search cleared, restored {} entries", state.items.len());
            }
        } else {
            if !state.is_searching {
                state.cached_all_items = state.items.clone();
                state.is_searching = true;
            }
            state.active_query = query.to_string();
            state.apply_filter();
            tracing::debug!(
                "Search {:?} matched {} of {} entries",
                query,
                state.items.len(),
                state.cached_all_items.len()
            );
        }

        self.publish(&state);
    }
}
