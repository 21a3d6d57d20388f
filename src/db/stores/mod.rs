use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::DatabaseError;
use super::models::{Contact, ContactPatch, Opportunity, OpportunityPatch};

#[async_trait]
pub trait OpportunityStore: Send + Sync {
    async fn list_opportunities(&self) -> Result<Vec<Opportunity>, DatabaseError>;
    async fn get_opportunity(&self, id: &str) -> Result<Option<Opportunity>, DatabaseError>;
    async fn create_opportunity(&self, opportunity: &Opportunity) -> Result<(), DatabaseError>;
    /// Applies the fields present in `patch` and sets `updated_at`. Matching
    /// no row is not an error.
    async fn update_opportunity(
        &self,
        id: &str,
        patch: &OpportunityPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError>;
    async fn delete_opportunity(&self, id: &str) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn list_contacts(&self) -> Result<Vec<Contact>, DatabaseError>;
    async fn get_contact(&self, id: &str) -> Result<Option<Contact>, DatabaseError>;
    async fn create_contact(&self, contact: &Contact) -> Result<(), DatabaseError>;
    async fn update_contact(
        &self,
        id: &str,
        patch: &ContactPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError>;
    async fn delete_contact(&self, id: &str) -> Result<(), DatabaseError>;
}
