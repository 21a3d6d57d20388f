pub use self::error::DatabaseError;
pub use self::manager::DatabaseManager;
pub use self::models::{
    Contact, ContactFrequency, ContactPatch, DeleteRequest, NewContact, NewOpportunity, Opportunity,
    OpportunityPatch, Stage,
};
pub use self::stores::{ContactStore, OpportunityStore};

pub mod error;
pub mod manager;
pub mod models;
pub mod stores;

#[cfg(feature = "sqlite")]
pub mod schema;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "remote")]
pub mod remote;
