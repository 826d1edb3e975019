//! UnicalRent booking client
//!
//! Client-side booking engine for the university vehicle rental service:
//! availability resolution, interval validation, pricing, the payment-gated
//! submission flow and cancellation, on top of a typed client for the
//! rental REST API.

use std::sync::Arc;

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use api::{ApiClient, RentalApi};
use auth::{FileTokenStore, MemoryTokenStore, TokenStore};
use tokio::task::JoinHandle;

/// One signed-in user's session: owns the API client, the event bus and
/// every service built on them.
#[derive(Clone)]
pub struct Session {
    pub config: Arc<AppConfig>,
    pub api: Arc<dyn RentalApi>,
    pub services: services::Services,
    tokens: Arc<dyn TokenStore>,
}

impl Session {
    /// Build a session talking to the configured API
    pub fn connect(config: AppConfig) -> AppResult<Self> {
        let tokens: Arc<dyn TokenStore> = match &config.auth.token_file {
            Some(path) => Arc::new(FileTokenStore::new(path)),
            None => Arc::new(MemoryTokenStore::default()),
        };
        if let Some(token) = &config.auth.token {
            tokens.set(token)?;
        }

        let client = ApiClient::new(&config.api, tokens.clone())?;
        tracing::info!("Session ready for {}", config.api.base_url);
        Ok(Self::with_api(config, Arc::new(client), tokens))
    }

    /// Build a session over any API implementation
    pub fn with_api(config: AppConfig, api: Arc<dyn RentalApi>, tokens: Arc<dyn TokenStore>) -> Self {
        let services = services::Services::new(api.clone(), &config);
        Self {
            config: Arc::new(config),
            api,
            services,
            tokens,
        }
    }

    /// Re-fetch availability whenever another part of the session changes bookings
    pub fn watch_availability(&self) -> JoinHandle<()> {
        self.services
            .availability
            .clone()
            .spawn_listener(&self.services.events)
    }

    pub fn is_signed_in(&self) -> bool {
        self.tokens.get().is_some()
    }

    pub fn logout(&self) -> AppResult<()> {
        self.tokens.clear()?;
        tracing::info!("Signed out");
        Ok(())
    }
}
