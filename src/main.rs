use axum::{
    Json, Router, debug_handler,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use pokedex::{
    ColorCache, Config, DominantColorExtractor, HttpPokeApi, ListSnapshot, PokeApi,
    PokemonDetail, PokemonListController, PokemonRepository, Resource, Rgb, sprite_url,
    telemetry,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

struct AppState {
    controller: PokemonListController,
    repository: PokemonRepository,
    colors: ColorCache,
    extractor: DominantColorExtractor,
    sprite_url: String,
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

#[derive(Serialize)]
struct DominantColor {
    pokedex_number: u32,
    hex: String,
    rgb: Rgb,
}

#[tokio::main]
async fn main() {
    let config = telemetry::with_bootstrap_logging(std::io::stderr, Config::load);
    telemetry::init_tracing(config.as_ref().map(|c| c.server.log_json).unwrap_or(false));

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let api: Arc<dyn PokeApi> = Arc::new(HttpPokeApi::new(config.pokemon.api_url.clone()));
    let repository = PokemonRepository::new(api);
    let state = AppState {
        controller: PokemonListController::new(
            repository.clone(),
            config.pokemon.page_size,
            config.pokemon.sprite_url.clone(),
        ),
        repository,
        colors: ColorCache::new(&config.colors),
        extractor: DominantColorExtractor::default(),
        sprite_url: config.pokemon.sprite_url.clone(),
    };

    let app_state = Arc::new(state);

    // Prime the first page so the list is not empty on the first request.
    app_state.controller.load_next_page().await;

    let app = Router::new()
        .route("/pokedex", get(get_pokedex_handler))
        .route("/pokedex/next", post(load_next_page_handler))
        .route("/pokedex/search", get(search_handler))
        .route("/pokedex/{number}/color", get(get_color_handler))
        .route("/pokemon/{name}", get(get_pokemon_handler))
        .with_state(app_state);

    let listener = match tokio::net::TcpListener::bind(&config.server.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", config.server.bind, e);
            std::process::exit(1);
        }
    };

    match listener.local_addr() {
        Ok(addr) => tracing::info!("listening on {}", addr),
        Err(e) => tracing::warn!("listening on unknown address: {}", e),
    }

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

#[debug_handler]
async fn get_pokedex_handler(State(app_state): State<Arc<AppState>>) -> Json<ListSnapshot> {
    Json(app_state.controller.snapshot())
}

#[debug_handler]
async fn load_next_page_handler(State(app_state): State<Arc<AppState>>) -> Json<ListSnapshot> {
    if !app_state.controller.load_next_page().await {
        tracing::debug!("Next page request ignored");
    }
    Json(app_state.controller.snapshot())
}

#[debug_handler]
async fn search_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<ListSnapshot> {
    app_state.controller.search(&params.q);
    Json(app_state.controller.snapshot())
}

#[debug_handler]
async fn get_pokemon_handler(
    State(app_state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> (StatusCode, Json<Resource<PokemonDetail>>) {
    let resource = app_state.repository.get_pokemon_info(&name).await;
    let status = match resource {
        Resource::Success { .. } => StatusCode::OK,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, Json(resource))
}

#[debug_handler]
async fn get_color_handler(
    State(app_state): State<Arc<AppState>>,
    Path(number): Path<u32>,
) -> (StatusCode, Json<Resource<DominantColor>>) {
    let image_url = app_state
        .controller
        .snapshot()
        .items
        .into_iter()
        .find(|entry| entry.pokedex_number == number)
        .map(|entry| entry.image_url)
        .unwrap_or_else(|| sprite_url(&app_state.sprite_url, number));

    let api = app_state.repository.api();
    match app_state
        .colors
        .get_or_extract(number, &image_url, api.as_ref(), app_state.extractor)
        .await
    {
        Ok(rgb) => (
            StatusCode::OK,
            Json(Resource::success(DominantColor {
                pokedex_number: number,
                hex: rgb.to_string(),
                rgb,
            })),
        ),
        Err(e) => {
            tracing::error!("Failed to extract dominant color for #{}: {}", number, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(Resource::error(pokedex::GENERIC_ERROR)),
            )
        }
    }
}
