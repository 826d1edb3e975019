//! Payment method endpoints

use super::ApiClient;
use crate::{
    error::AppResult,
    models::{CreditCard, NewCreditCard},
};

impl ApiClient {
    pub async fn fetch_card_validity(&self) -> AppResult<bool> {
        self.send_json(self.get("carte-credito/valida")?).await
    }

    pub async fn fetch_cards(&self) -> AppResult<Vec<CreditCard>> {
        self.send_json(self.get("carte-credito")?).await
    }

    pub async fn post_card(&self, card: &NewCreditCard) -> AppResult<CreditCard> {
        self.send_json(self.post("carte-credito")?.json(card)).await
    }

    pub async fn delete_card(&self, id: i64) -> AppResult<()> {
        self.send(self.delete(&format!("carte-credito/{}", id))?).await?;
        Ok(())
    }

    pub async fn put_primary_card(&self, id: i64) -> AppResult<CreditCard> {
        self.send_json(self.put(&format!("carte-credito/{}/principale", id))?)
            .await
    }
}
