use async_trait::async_trait;

use crate::domain::draft::Suggestion;
use crate::error::AppResult;

#[async_trait]
pub trait ClassifierService: Send + Sync {
    async fn classify(&self, description: &str) -> AppResult<Suggestion>;
}
