pub mod api;
pub mod cache;
pub mod config;
pub mod controller;
pub mod palette;
pub mod pokemon;
pub mod repository;
pub mod resource;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use api::*;
pub use cache::*;
pub use config::*;
pub use controller::*;
pub use palette::*;
pub use pokemon::*;
pub use repository::*;
pub use resource::*;
