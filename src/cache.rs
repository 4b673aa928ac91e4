use crate::api::{ApiError, PokeApi};
use crate::config::ColorCacheConfig;
use crate::palette::{DominantColorExtractor, Rgb};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

// Statistics for cache monitoring
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ColorCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
}

impl ColorCacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

#[derive(Debug, Default)]
struct ColorStore {
    colors: HashMap<u32, Rgb>,
    // Insertion order, oldest first.
    order: VecDeque<u32>,
    stats: ColorCacheStats,
}

/// Dominant colors keyed by Pokédex number, so a sprite is analysed once.
///
/// Extraction is deterministic, so entries never expire. When full, the
/// oldest inserted entry is dropped.
pub struct ColorCache {
    store: Mutex<ColorStore>,
    // One async lock per entry being extracted, so concurrent misses share one download.
    in_flight: Mutex<HashMap<u32, Arc<tokio::sync::Mutex<()>>>>,
    max_entries: usize,
}

impl ColorCache {
    pub fn new(config: &ColorCacheConfig) -> Self {
        tracing::info!(
            "Initializing dominant color cache with max_entries: {}",
            config.max_entries
        );
        Self {
            store: Mutex::new(ColorStore::default()),
            in_flight: Mutex::new(HashMap::new()),
            max_entries: config.max_entries.max(1) as usize,
        }
    }

    pub fn get(&self, pokedex_number: u32) -> Option<Rgb> {
        match self.store.lock() {
            Ok(mut store) => {
                let result = store.colors.get(&pokedex_number).copied();
                if result.is_some() {
                    tracing::debug!("Color cache hit for #{}", pokedex_number);
                    store.stats.hits += 1;
                } else {
                    tracing::debug!("Color cache miss for #{}", pokedex_number);
                    store.stats.misses += 1;
                }
                result
            }
            Err(e) => {
                tracing::error!("Failed to acquire color cache lock for #{}: {}", pokedex_number, e);
                None
            }
        }
    }

    pub fn insert(&self, pokedex_number: u32, color: Rgb) {
        match self.store.lock() {
            Ok(mut store) => {
                if store.colors.insert(pokedex_number, color).is_none() {
                    store.order.push_back(pokedex_number);
                }
                store.stats.inserts += 1;

                while store.order.len() > self.max_entries {
                    if let Some(oldest) = store.order.pop_front() {
                        store.colors.remove(&oldest);
                        store.stats.evictions += 1;
                        tracing::debug!("Evicted cached color for #{}", oldest);
                    }
                }
            }
            Err(e) => {
                tracing::error!("Failed to acquire color cache lock for #{}: {}", pokedex_number, e);
            }
        }
    }

    /// Cached color without touching the hit/miss counters.
    fn peek(&self, pokedex_number: u32) -> Option<Rgb> {
        match self.store.lock() {
            Ok(store) => store.colors.get(&pokedex_number).copied(),
            Err(_) => None,
        }
    }

    fn entry_lock(&self, pokedex_number: u32) -> Arc<tokio::sync::Mutex<()>> {
        match self.in_flight.lock() {
            Ok(mut in_flight) => in_flight.entry(pokedex_number).or_default().clone(),
            Err(e) => {
                tracing::error!("Failed to acquire in-flight lock for #{}: {}", pokedex_number, e);
                Arc::default()
            }
        }
    }

    fn release_entry_lock(&self, pokedex_number: u32) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.remove(&pokedex_number);
        }
    }

    /// Cached color for an entry, or download its sprite and extract one off-thread.
    ///
    /// Concurrent callers for the same entry wait for the first one; failures are not cached.
    pub async fn get_or_extract(
        &self,
        pokedex_number: u32,
        image_url: &str,
        api: &dyn PokeApi,
        extractor: DominantColorExtractor,
    ) -> Result<Rgb, ApiError> {
        if let Some(color) = self.get(pokedex_number) {
            return Ok(color);
        }

        let entry_lock = self.entry_lock(pokedex_number);
        let _guard = entry_lock.lock().await;
        if let Some(color) = self.peek(pokedex_number) {
            tracing::debug!("Color for #{} extracted by a concurrent request", pokedex_number);
            return Ok(color);
        }

        let result = self.extract(pokedex_number, image_url, api, extractor).await;
        self.release_entry_lock(pokedex_number);
        result
    }

    async fn extract(
        &self,
        pokedex_number: u32,
        image_url: &str,
        api: &dyn PokeApi,
        extractor: DominantColorExtractor,
    ) -> Result<Rgb, ApiError> {
        let sprite = api.fetch_sprite(image_url).await?;
        let color = extractor.extract_in_background(sprite).await.map_err(|e| {
            tracing::error!("Dominant color task for #{} failed: {}", pokedex_number, e);
            ApiError::ImageError(e.to_string())
        })?;
        tracing::debug!("Dominant color for #{} is {}", pokedex_number, color);

        self.insert(pokedex_number, color);
        Ok(color)
    }

    pub fn len(&self) -> usize {
        match self.store.lock() {
            Ok(store) => store.colors.len(),
            Err(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> ColorCacheStats {
        match self.store.lock() {
            Ok(store) => store.stats.clone(),
            Err(_) => ColorCacheStats::default(),
        }
    }
}
