//! Vehicle catalog endpoints

use super::ApiClient;
use crate::{
    error::AppResult,
    models::{availability::AvailabilityResponse, Vehicle},
};

impl ApiClient {
    /// Active vehicles
    pub async fn fetch_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        self.send_json(self.get("veicoli")?).await
    }

    pub async fn fetch_vehicle(&self, id: i64) -> AppResult<Vehicle> {
        self.send_json(self.get(&format!("veicoli/{}", id))?).await
    }

    pub async fn fetch_availability(&self, vehicle_id: i64) -> AppResult<AvailabilityResponse> {
        self.send_json(self.get(&format!("veicoli/{}/disponibilita", vehicle_id))?)
            .await
    }
}
