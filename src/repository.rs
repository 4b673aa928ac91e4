use crate::api::PokeApi;
use crate::pokemon::{PageResponse, PokemonDetail};
use crate::resource::Resource;
use std::sync::Arc;

/// Message surfaced for every failure. The underlying error is only logged.
pub const GENERIC_ERROR: &str = "An unknown error occurred.";

/// Turns `PokeApi` results into `Resource`s. Never caches, never retries.
#[derive(Clone)]
pub struct PokemonRepository {
    api: Arc<dyn PokeApi>,
}

impl PokemonRepository {
    pub fn new(api: Arc<dyn PokeApi>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &Arc<dyn PokeApi> {
        &self.api
    }

    pub async fn get_pokemon_list(&self, limit: u32, offset: u32) -> Resource<PageResponse> {
        match self.api.fetch_page(limit, offset).await {
            Ok(page) => Resource::success(page),
            Err(e) => {
                tracing::error!(limit, offset, "Failed to load Pokémon list: {}", e);
                Resource::error(GENERIC_ERROR)
            }
        }
    }

    pub async fn get_pokemon_info(&self, name: &str) -> Resource<PokemonDetail> {
        match self.api.fetch_detail(name).await {
            Ok(detail) => Resource::success(detail),
            Err(e) => {
                tracing::error!(name, "Failed to load Pokémon info: {}", e);
                Resource::error(GENERIC_ERROR)
            }
        }
    }
}
