use crate::config::{DatabaseConfig as ConfigDatabaseConfig, DbType as ConfigDbType};
use crate::db::{ContactStore, DatabaseError, OpportunityStore};
use std::sync::Arc;

#[cfg(feature = "sqlite")]
use crate::db::sqlite::{self, Pool, SqliteContactStore, SqliteOpportunityStore};
#[cfg(feature = "sqlite")]
use diesel::RunQueryDsl;

#[cfg(feature = "remote")]
use crate::db::remote::{RemoteContactStore, RemoteDatabase, RemoteOpportunityStore};

pub(crate) const SCHEMA_STATEMENTS: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS opportunities (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        company TEXT NOT NULL,
        value REAL NOT NULL,
        stage TEXT NOT NULL,
        probability INTEGER NOT NULL DEFAULT 50,
        contact_name TEXT,
        contact_title TEXT,
        contact_id TEXT,
        expected_close_date TEXT,
        description TEXT,
        last_activity TEXT,
        days_in_stage INTEGER DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS contacts (
        id TEXT PRIMARY KEY,
        full_name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        mobile_phone TEXT,
        work_phone TEXT,
        fax TEXT,
        company TEXT,
        job_title TEXT,
        birthday TEXT,
        location TEXT,
        linkedin_url TEXT,
        whatsapp TEXT,
        contact_frequency TEXT,
        last_contacted_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
];

#[derive(Clone)]
pub struct DatabaseManager {
    #[cfg(feature = "sqlite")]
    sqlite_pool: Option<Pool>,
    #[cfg(feature = "remote")]
    remote: Option<Arc<RemoteDatabase>>,
    opportunity_store: Arc<dyn OpportunityStore>,
    contact_store: Arc<dyn ContactStore>,
    db_type: DbType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbType {
    Sqlite,
    Remote,
}

impl DbType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbType::Sqlite => "sqlite",
            DbType::Remote => "libsql",
        }
    }
}

impl From<ConfigDbType> for DbType {
    fn from(value: ConfigDbType) -> Self {
        match value {
            ConfigDbType::Sqlite => DbType::Sqlite,
            ConfigDbType::Remote => DbType::Remote,
        }
    }
}

impl DatabaseManager {
    pub async fn new(config: &ConfigDatabaseConfig) -> Result<Self, DatabaseError> {
        let db_type = DbType::from(config.db_type());

        match db_type {
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let path = config.sqlite_path().ok_or_else(|| {
                    DatabaseError::Connection("sqlite path is not configured".to_string())
                })?;
                let pool = sqlite::build_pool(&path, config.max_connections())?;

                let opportunity_store = Arc::new(SqliteOpportunityStore::new(pool.clone()));
                let contact_store = Arc::new(SqliteContactStore::new(pool.clone()));

                Ok(Self {
                    sqlite_pool: Some(pool),
                    #[cfg(feature = "remote")]
                    remote: None,
                    opportunity_store,
                    contact_store,
                    db_type,
                })
            }
            #[cfg(feature = "remote")]
            DbType::Remote => {
                let url = config.remote_url().ok_or_else(|| {
                    DatabaseError::Connection("remote database url is not configured".to_string())
                })?;
                let remote =
                    Arc::new(RemoteDatabase::open(&url, config.auth_token.as_deref()).await?);

                let opportunity_store = Arc::new(RemoteOpportunityStore::new(remote.clone()));
                let contact_store = Arc::new(RemoteContactStore::new(remote.clone()));

                Ok(Self {
                    #[cfg(feature = "sqlite")]
                    sqlite_pool: None,
                    remote: Some(remote),
                    opportunity_store,
                    contact_store,
                    db_type,
                })
            }
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Connection(
                "SQLite feature not enabled".to_string(),
            )),
            #[cfg(not(feature = "remote"))]
            DbType::Remote => Err(DatabaseError::Connection(
                "remote libSQL feature not enabled".to_string(),
            )),
        }
    }

    /// Creates both tables if they do not exist yet. Safe to run on every start.
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        match self.db_type {
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let pool = self.sqlite_pool.as_ref().ok_or_else(|| {
                    DatabaseError::Migration("sqlite pool is not initialized".to_string())
                })?;
                Self::migrate_sqlite(pool).await
            }
            #[cfg(feature = "remote")]
            DbType::Remote => {
                let remote = self.remote.as_ref().ok_or_else(|| {
                    DatabaseError::Migration("remote client is not initialized".to_string())
                })?;
                remote.execute_statements(&SCHEMA_STATEMENTS).await
            }
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Migration(
                "SQLite feature not enabled".to_string(),
            )),
            #[cfg(not(feature = "remote"))]
            DbType::Remote => Err(DatabaseError::Migration(
                "remote libSQL feature not enabled".to_string(),
            )),
        }
    }

    #[cfg(feature = "sqlite")]
    async fn migrate_sqlite(pool: &Pool) -> Result<(), DatabaseError> {
        sqlite::with_connection(pool, |conn| {
            for statement in SCHEMA_STATEMENTS {
                diesel::sql_query(statement)
                    .execute(conn)
                    .map_err(|e| DatabaseError::Migration(e.to_string()))?;
            }
            Ok(())
        })
        .await
    }

    pub fn opportunity_store(&self) -> Arc<dyn OpportunityStore> {
        self.opportunity_store.clone()
    }

    pub fn contact_store(&self) -> Arc<dyn ContactStore> {
        self.contact_store.clone()
    }

    pub fn db_type(&self) -> DbType {
        self.db_type
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use chrono::{Duration, Utc};
    use serde_json::json;
    use tempfile::TempDir;

    use super::DatabaseManager;
    use crate::config::DatabaseConfig;
    use crate::db::{
        ContactFrequency, ContactPatch, NewContact, NewOpportunity, OpportunityPatch, Stage,
    };
    use crate::utils::timestamp_now;

    fn sqlite_config(dir: &TempDir) -> DatabaseConfig {
        DatabaseConfig {
            url: None,
            filename: Some(dir.path().join("pipelines.db").to_string_lossy().to_string()),
            auth_token: None,
            max_connections: Some(2),
        }
    }

    async fn open(dir: &TempDir) -> DatabaseManager {
        let manager = DatabaseManager::new(&sqlite_config(dir)).await.expect("db manager");
        manager.migrate().await.expect("migrate");
        manager
    }

    fn new_opportunity() -> NewOpportunity {
        serde_json::from_value(json!({
            "title": "Platform rollout",
            "company": "Acme",
            "value": 48000.5,
            "stage": "Discovery",
            "contactName": "Wile E. Coyote",
        }))
        .expect("valid payload")
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let dir = tempfile::tempdir().expect("temp dir");
        let manager = open(&dir).await;
        manager.migrate().await.expect("second migrate");
        assert!(manager.opportunity_store().list_opportunities().await.unwrap().is_empty());
        assert!(manager.contact_store().list_contacts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sqlite_opportunity_roundtrip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let manager = open(&dir).await;
        let store = manager.opportunity_store();

        let created_at = timestamp_now();
        let opportunity = new_opportunity().into_opportunity(created_at);
        store.create_opportunity(&opportunity).await.expect("insert");

        let fetched = store
            .get_opportunity(&opportunity.id)
            .await
            .expect("query")
            .expect("row exists");
        assert_eq!(fetched.title, "Platform rollout");
        assert_eq!(fetched.stage, Stage::Discovery);
        assert_eq!(fetched.probability, 50);
        assert_eq!(fetched.days_in_stage, Some(0));
        assert_eq!(fetched.contact_name.as_deref(), Some("Wile E. Coyote"));

        let patch: OpportunityPatch = serde_json::from_value(json!({
            "id": opportunity.id,
            "stage": "Negotiation",
            "probability": 80,
            "contactName": null,
            "createdAt": "1999-01-01T00:00:00Z",
        }))
        .unwrap();
        let updated_at = created_at + Duration::seconds(5);
        store
            .update_opportunity(&opportunity.id, &patch, updated_at)
            .await
            .expect("update");

        let after = store.get_opportunity(&opportunity.id).await.unwrap().unwrap();
        assert_eq!(after.stage, Stage::Negotiation);
        assert_eq!(after.probability, 80);
        assert_eq!(after.contact_name, None);
        assert_eq!(after.title, "Platform rollout");
        assert_eq!(after.created_at, fetched.created_at);
        assert!(after.updated_at > fetched.updated_at);

        store.delete_opportunity(&opportunity.id).await.expect("delete");
        assert!(store.get_opportunity(&opportunity.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_rows_succeed() {
        let dir = tempfile::tempdir().expect("temp dir");
        let manager = open(&dir).await;

        let patch = OpportunityPatch {
            title: Some("Ghost".to_string()),
            ..OpportunityPatch::default()
        };
        manager
            .opportunity_store()
            .update_opportunity("missing", &patch, Utc::now())
            .await
            .expect("update of missing row is not an error");
        manager
            .contact_store()
            .delete_contact("missing")
            .await
            .expect("delete of missing row is not an error");
        assert!(manager.opportunity_store().list_opportunities().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sqlite_contact_roundtrip_survives_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        let manager = open(&dir).await;

        let contact: NewContact = serde_json::from_value(json!({
            "id": "contact-1",
            "fullName": "Ada Lovelace",
            "email": "ada@example.org",
            "contactFrequency": "every full moon",
        }))
        .unwrap();
        let contact = contact.into_contact(timestamp_now());
        manager.contact_store().create_contact(&contact).await.expect("insert");

        let patch: ContactPatch = serde_json::from_value(json!({
            "id": "contact-1",
            "email": null,
            "contactFrequency": "weekly",
        }))
        .unwrap();
        manager
            .contact_store()
            .update_contact("contact-1", &patch, Utc::now())
            .await
            .expect("update");

        let reopened = open(&dir).await;
        let persisted = reopened
            .contact_store()
            .get_contact("contact-1")
            .await
            .expect("query after reopen")
            .expect("row exists after reopen");
        assert_eq!(persisted.full_name, "Ada Lovelace");
        assert_eq!(persisted.email, None);
        assert_eq!(persisted.contact_frequency, Some(ContactFrequency::Weekly));
        assert_eq!(persisted.created_at, contact.created_at);
    }

    #[tokio::test]
    async fn duplicate_contact_id_is_a_query_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let manager = open(&dir).await;

        let contact: NewContact =
            serde_json::from_value(json!({ "id": "dup", "fullName": "First" })).unwrap();
        let contact = contact.into_contact(Utc::now());
        let store = manager.contact_store();
        store.create_contact(&contact).await.expect("first insert");
        assert!(store.create_contact(&contact).await.is_err());
    }

    #[tokio::test]
    async fn unknown_stage_is_stored_verbatim() {
        let dir = tempfile::tempdir().expect("temp dir");
        let manager = open(&dir).await;

        let mut opportunity = new_opportunity().into_opportunity(Utc::now());
        opportunity.stage = Stage::Unknown("Closed Won".to_string());
        manager
            .opportunity_store()
            .create_opportunity(&opportunity)
            .await
            .expect("insert");

        let listed = manager.opportunity_store().list_opportunities().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].stage.as_str(), "Closed Won");
    }
}
