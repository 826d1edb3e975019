//! HTTP plumbing shared by all endpoints

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::RentalApi;
use crate::{
    auth::{is_token_current, TokenStore},
    config::ApiConfig,
    error::{ApiErrorPayload, AppError, AppResult},
    models::{availability::AvailabilityResponse, Booking, CreditCard, NewCreditCard, Vehicle},
};

/// Client for the rental API rooted at `base_url` (e.g. `http://host:8080/api`)
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, tokens: Arc<dyn TokenStore>) -> AppResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| AppError::InvalidInput(format!("Invalid API URL {}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::InvalidInput(format!(
                "API URL cannot be used as a base: {}",
                config.base_url
            )));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
            tokens,
        })
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Absolute URL of an API path such as `veicoli/3/disponibilita`
    pub fn endpoint(&self, path: &str) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("API base URL has no path".to_string()))?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    pub(crate) fn get(&self, path: &str) -> AppResult<RequestBuilder> {
        Ok(self.http.get(self.endpoint(path)?))
    }

    pub(crate) fn post(&self, path: &str) -> AppResult<RequestBuilder> {
        Ok(self.http.post(self.endpoint(path)?))
    }

    pub(crate) fn put(&self, path: &str) -> AppResult<RequestBuilder> {
        Ok(self.http.put(self.endpoint(path)?))
    }

    pub(crate) fn delete(&self, path: &str) -> AppResult<RequestBuilder> {
        Ok(self.http.delete(self.endpoint(path)?))
    }

    /// Attach the bearer token when one is stored and not expired
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.tokens.get() {
            Some(token) if is_token_current(&token, Utc::now()) => request.bearer_auth(token),
            Some(_) => {
                tracing::debug!("Stored token expired, sending request without it");
                request
            }
            None => request,
        }
    }

    pub(crate) async fn send(&self, request: RequestBuilder) -> AppResult<Response> {
        let response = self.authorize(request).send().await?;
        tracing::debug!("{} {}", response.status(), response.url());
        self.check(response).await
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check(&self, response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED => {
                if let Err(e) = self.tokens.clear() {
                    tracing::error!("Failed to clear rejected token: {}", e);
                }
                tracing::warn!("API rejected the bearer token, session cleared");
                Err(AppError::Unauthorized)
            }
            StatusCode::FORBIDDEN => Err(AppError::Forbidden),
            StatusCode::NOT_FOUND => Err(AppError::NotFound(response.url().path().to_string())),
            _ => {
                let body = response.text().await.unwrap_or_default();
                let payload = serde_json::from_str::<ApiErrorPayload>(&body).ok();
                tracing::debug!("API error {}: {}", status, body);
                Err(AppError::Api { status, payload })
            }
        }
    }
}

#[async_trait]
impl RentalApi for ApiClient {
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        self.fetch_vehicles().await
    }

    async fn get_vehicle(&self, id: i64) -> AppResult<Vehicle> {
        self.fetch_vehicle(id).await
    }

    async fn get_availability(&self, vehicle_id: i64) -> AppResult<AvailabilityResponse> {
        self.fetch_availability(vehicle_id).await
    }

    async fn create_booking(
        &self,
        vehicle_id: i64,
        start: String,
        end: String,
    ) -> AppResult<Option<Booking>> {
        self.post_booking(vehicle_id, &start, &end).await
    }

    async fn cancel_booking(&self, id: i64) -> AppResult<()> {
        self.put_cancellation(id).await
    }

    async fn my_bookings(&self) -> AppResult<Vec<Booking>> {
        self.fetch_my_bookings().await
    }

    async fn all_bookings(&self) -> AppResult<Vec<Booking>> {
        self.fetch_all_bookings().await
    }

    async fn has_valid_card(&self) -> AppResult<bool> {
        self.fetch_card_validity().await
    }

    async fn list_cards(&self) -> AppResult<Vec<CreditCard>> {
        self.fetch_cards().await
    }

    async fn add_card(&self, card: NewCreditCard) -> AppResult<CreditCard> {
        self.post_card(&card).await
    }

    async fn remove_card(&self, id: i64) -> AppResult<()> {
        self.delete_card(id).await
    }

    async fn set_primary_card(&self, id: i64) -> AppResult<CreditCard> {
        self.put_primary_card(id).await
    }
}
