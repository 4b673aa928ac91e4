//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use crate::api::{ApiError, PokeApi};
use crate::pokemon::{NamedAPIResource, PageResponse, PokemonDetail, StatValue, TypeName};
use async_trait::async_trait;
use image::RgbaImage;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Scripted `PokeApi`: page responses are served in order, calls are recorded.
#[derive(Default)]
pub struct MockPokeApi {
    pages: Mutex<VecDeque<Result<PageResponse, ApiError>>>,
    details: Vec<PokemonDetail>,
    sprite: Option<RgbaImage>,
    page_calls: Mutex<Vec<(u32, u32)>>,
    detail_calls: Mutex<Vec<String>>,
    sprite_calls: Mutex<usize>,
    gate: Option<Gate>,
}

struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl MockPokeApi {
    pub fn new(pages: Vec<Result<PageResponse, ApiError>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            ..Default::default()
        }
    }

    pub fn with_detail(mut self, detail: PokemonDetail) -> Self {
        self.details.push(detail);
        self
    }

    pub fn with_sprite(mut self, sprite: RgbaImage) -> Self {
        self.sprite = Some(sprite);
        self
    }

    /// Holds every page fetch until `release` is notified. `entered` fires when a fetch starts.
    pub fn with_gate(mut self, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.gate = Some(Gate { entered, release });
        self
    }

    pub fn page_calls(&self) -> Vec<(u32, u32)> {
        self.page_calls.lock().unwrap().clone()
    }

    pub fn detail_calls(&self) -> Vec<String> {
        self.detail_calls.lock().unwrap().clone()
    }

    pub fn sprite_calls(&self) -> usize {
        *self.sprite_calls.lock().unwrap()
    }
}

#[async_trait]
impl PokeApi for MockPokeApi {
    async fn fetch_page(&self, limit: u32, offset: u32) -> Result<PageResponse, ApiError> {
        self.page_calls.lock().unwrap().push((limit, offset));

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::NetworkError("no scripted page".into())))
    }

    async fn fetch_detail(&self, name: &str) -> Result<PokemonDetail, ApiError> {
        self.detail_calls.lock().unwrap().push(name.to_string());
        self.details
            .iter()
            .find(|d| d.name == name)
            .cloned()
            .ok_or_else(|| ApiError::NotFoundError(name.to_string()))
    }

    async fn fetch_sprite(&self, url: &str) -> Result<RgbaImage, ApiError> {
        *self.sprite_calls.lock().unwrap() += 1;
        self.sprite
            .clone()
            .ok_or_else(|| ApiError::NotFoundError(url.to_string()))
    }
}

/// A page of `len` results numbered from `offset + 1`.
pub fn page_of(offset: u32, len: u32) -> PageResponse {
    let names: Vec<String> = (1..=len).map(|i| format!("pokemon-{}", offset + i)).collect();
    page_named(offset, &names.iter().map(String::as_str).collect::<Vec<_>>())
}

pub fn page_named(offset: u32, names: &[&str]) -> PageResponse {
    PageResponse {
        count: 1302,
        next: None,
        previous: None,
        results: names
            .iter()
            .enumerate()
            .map(|(i, name)| NamedAPIResource {
                name: name.to_string(),
                url: format!("https://pokeapi.co/api/v2/pokemon/{}/", offset + i as u32 + 1),
            })
            .collect(),
    }
}

pub fn detail(name: &str) -> PokemonDetail {
    PokemonDetail {
        name: name.to_string(),
        height: 4,
        weight: 60,
        stats: vec![StatValue {
            stat_name: "hp".to_string(),
            base_value: 35,
        }],
        types: vec![TypeName {
            type_name: "electric".to_string(),
        }],
    }
}
