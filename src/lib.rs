//! # Parametrization
//!
//! A feature-toggle service: named boolean switches kept in a record store
//! and served through a read-through cache.
//!
//! ## Core Features
//!
//! - **Pluggable Storage**: in-memory store for tests and local runs, PostgreSQL for production
//! - **Read-Through Cache**: redis shared across instances, or moka inside one process
//! - **HTTP API**: axum routes under `/api/parametrizations`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use parametrization::{Config, ServiceBuilder, model::ToggleRecord};
//!
//! let config = Config::load_from_str("[cache]\nbackend = \"local\"\n")?;
//! let service = ServiceBuilder::new().config(config).build()?;
//!
//! service.save(&ToggleRecord::new("CHECKOUT_V2", "Enable Checkout V2", true))?;
//! let toggle = service.get_by_key("CHECKOUT_V2")?;
//! ```

pub mod api;
mod builder;
pub mod cache;
mod config;
mod error;
pub mod model;
mod seed;
mod service;
pub mod store;

use std::sync::{Arc, RwLock};

pub use builder::ServiceBuilder;
pub use config::{CacheBackendType, CacheConfig, Config, LocalCacheConfig, LogFormat, LoggingConfig, PostgresConfig, RedisConfig, SeedConfig, ServerConfig, StoreConfig, StoreType};
pub use error::ParamError;
pub use seed::load_defaults;
pub use service::ParametrizationService;

/// Result type alias for parametrization operations.
pub type Result<T> = std::result::Result<T, ParamError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;
