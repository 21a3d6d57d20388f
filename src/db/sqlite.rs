use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::sqlite::SqliteConnection;

use crate::db::schema::{contacts, opportunities};

use super::{
    DatabaseError,
    models::{
        datetime_to_string, string_to_datetime, Contact, ContactFrequency, ContactPatch,
        Opportunity, OpportunityPatch, Stage,
    },
};

pub type Pool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

const BUSY_TIMEOUT_MS: u32 = 5_000;

#[derive(Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        diesel::sql_query(format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}"))
            .execute(conn)
            .map(|_| ())
            .map_err(r2d2::Error::QueryError)
    }
}

pub fn build_pool(path: &str, max_connections: u32) -> Result<Pool, DatabaseError> {
    let manager = ConnectionManager::<SqliteConnection>::new(path);
    r2d2::Pool::builder()
        .max_size(max_connections)
        .min_idle(Some(1))
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)
        .map_err(|e| DatabaseError::Connection(e.to_string()))
}

/// Runs `op` on a pooled connection off the async runtime.
pub(crate) async fn with_connection<T, F>(pool: &Pool, op: F) -> Result<T, DatabaseError>
where
    T: Send + 'static,
    F: FnOnce(&mut SqliteConnection) -> Result<T, DatabaseError> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        op(&mut *conn)
    })
    .await
    .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = opportunities)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct DbOpportunity {
    id: String,
    title: String,
    company: String,
    value: f64,
    stage: String,
    probability: i32,
    contact_name: Option<String>,
    contact_title: Option<String>,
    contact_id: Option<String>,
    expected_close_date: Option<String>,
    description: Option<String>,
    last_activity: Option<String>,
    days_in_stage: Option<i32>,
    created_at: String,
    updated_at: String,
}

impl DbOpportunity {
    fn from_opportunity(opportunity: &Opportunity) -> Self {
        Self {
            id: opportunity.id.clone(),
            title: opportunity.title.clone(),
            company: opportunity.company.clone(),
            value: opportunity.value,
            stage: opportunity.stage.as_str().to_string(),
            probability: opportunity.probability,
            contact_name: opportunity.contact_name.clone(),
            contact_title: opportunity.contact_title.clone(),
            contact_id: opportunity.contact_id.clone(),
            expected_close_date: opportunity.expected_close_date.clone(),
            description: opportunity.description.clone(),
            last_activity: opportunity.last_activity.as_ref().map(datetime_to_string),
            days_in_stage: opportunity.days_in_stage,
            created_at: datetime_to_string(&opportunity.created_at),
            updated_at: datetime_to_string(&opportunity.updated_at),
        }
    }

    fn into_opportunity(self) -> Result<Opportunity, DatabaseError> {
        Ok(Opportunity {
            id: self.id,
            title: self.title,
            company: self.company,
            value: self.value,
            stage: Stage::from(self.stage),
            probability: self.probability,
            contact_name: self.contact_name,
            contact_title: self.contact_title,
            contact_id: self.contact_id,
            expected_close_date: self.expected_close_date,
            description: self.description,
            last_activity: self
                .last_activity
                .as_deref()
                .map(string_to_datetime)
                .transpose()?,
            days_in_stage: self.days_in_stage,
            created_at: string_to_datetime(&self.created_at)?,
            updated_at: string_to_datetime(&self.updated_at)?,
        })
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = opportunities)]
struct UpdateOpportunity<'a> {
    title: Option<&'a str>,
    company: Option<&'a str>,
    value: Option<f64>,
    stage: Option<&'a str>,
    probability: Option<i32>,
    contact_name: Option<Option<&'a str>>,
    contact_title: Option<Option<&'a str>>,
    contact_id: Option<Option<&'a str>>,
    expected_close_date: Option<Option<&'a str>>,
    description: Option<Option<&'a str>>,
    last_activity: Option<Option<String>>,
    days_in_stage: Option<Option<i32>>,
    updated_at: String,
}

impl<'a> UpdateOpportunity<'a> {
    fn from_patch(patch: &'a OpportunityPatch, updated_at: &DateTime<Utc>) -> Self {
        Self {
            title: patch.title.as_deref(),
            company: patch.company.as_deref(),
            value: patch.value,
            stage: patch.stage.as_ref().map(Stage::as_str),
            probability: patch.probability,
            contact_name: patch.contact_name.as_ref().map(Option::as_deref),
            contact_title: patch.contact_title.as_ref().map(Option::as_deref),
            contact_id: patch.contact_id.as_ref().map(Option::as_deref),
            expected_close_date: patch.expected_close_date.as_ref().map(Option::as_deref),
            description: patch.description.as_ref().map(Option::as_deref),
            last_activity: patch
                .last_activity
                .map(|value| value.as_ref().map(datetime_to_string)),
            days_in_stage: patch.days_in_stage,
            updated_at: datetime_to_string(updated_at),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = contacts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct DbContact {
    id: String,
    full_name: String,
    email: Option<String>,
    phone: Option<String>,
    mobile_phone: Option<String>,
    work_phone: Option<String>,
    fax: Option<String>,
    company: Option<String>,
    job_title: Option<String>,
    birthday: Option<String>,
    location: Option<String>,
    linkedin_url: Option<String>,
    whatsapp: Option<String>,
    contact_frequency: Option<String>,
    last_contacted_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl DbContact {
    fn from_contact(contact: &Contact) -> Self {
        Self {
            id: contact.id.clone(),
            full_name: contact.full_name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            mobile_phone: contact.mobile_phone.clone(),
            work_phone: contact.work_phone.clone(),
            fax: contact.fax.clone(),
            company: contact.company.clone(),
            job_title: contact.job_title.clone(),
            birthday: contact.birthday.clone(),
            location: contact.location.clone(),
            linkedin_url: contact.linkedin_url.clone(),
            whatsapp: contact.whatsapp.clone(),
            contact_frequency: contact
                .contact_frequency
                .as_ref()
                .map(|f| f.as_str().to_string()),
            last_contacted_at: contact.last_contacted_at.clone(),
            created_at: datetime_to_string(&contact.created_at),
            updated_at: datetime_to_string(&contact.updated_at),
        }
    }

    fn into_contact(self) -> Result<Contact, DatabaseError> {
        Ok(Contact {
            id: self.id,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            mobile_phone: self.mobile_phone,
            work_phone: self.work_phone,
            fax: self.fax,
            company: self.company,
            job_title: self.job_title,
            birthday: self.birthday,
            location: self.location,
            linkedin_url: self.linkedin_url,
            whatsapp: self.whatsapp,
            contact_frequency: self.contact_frequency.map(ContactFrequency::from),
            last_contacted_at: self.last_contacted_at,
            created_at: string_to_datetime(&self.created_at)?,
            updated_at: string_to_datetime(&self.updated_at)?,
        })
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = contacts)]
struct UpdateContact<'a> {
    full_name: Option<&'a str>,
    email: Option<Option<&'a str>>,
    phone: Option<Option<&'a str>>,
    mobile_phone: Option<Option<&'a str>>,
    work_phone: Option<Option<&'a str>>,
    fax: Option<Option<&'a str>>,
    company: Option<Option<&'a str>>,
    job_title: Option<Option<&'a str>>,
    birthday: Option<Option<&'a str>>,
    location: Option<Option<&'a str>>,
    linkedin_url: Option<Option<&'a str>>,
    whatsapp: Option<Option<&'a str>>,
    contact_frequency: Option<Option<&'a str>>,
    last_contacted_at: Option<Option<&'a str>>,
    updated_at: String,
}

impl<'a> UpdateContact<'a> {
    fn from_patch(patch: &'a ContactPatch, updated_at: &DateTime<Utc>) -> Self {
        Self {
            full_name: patch.full_name.as_deref(),
            email: patch.email.as_ref().map(Option::as_deref),
            phone: patch.phone.as_ref().map(Option::as_deref),
            mobile_phone: patch.mobile_phone.as_ref().map(Option::as_deref),
            work_phone: patch.work_phone.as_ref().map(Option::as_deref),
            fax: patch.fax.as_ref().map(Option::as_deref),
            company: patch.company.as_ref().map(Option::as_deref),
            job_title: patch.job_title.as_ref().map(Option::as_deref),
            birthday: patch.birthday.as_ref().map(Option::as_deref),
            location: patch.location.as_ref().map(Option::as_deref),
            linkedin_url: patch.linkedin_url.as_ref().map(Option::as_deref),
            whatsapp: patch.whatsapp.as_ref().map(Option::as_deref),
            contact_frequency: patch
                .contact_frequency
                .as_ref()
                .map(|value| value.as_ref().map(ContactFrequency::as_str)),
            last_contacted_at: patch.last_contacted_at.as_ref().map(Option::as_deref),
            updated_at: datetime_to_string(updated_at),
        }
    }
}

pub struct SqliteOpportunityStore {
    pool: Pool,
}

impl SqliteOpportunityStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::OpportunityStore for SqliteOpportunityStore {
    async fn list_opportunities(&self) -> Result<Vec<Opportunity>, DatabaseError> {
        with_connection(&self.pool, |conn| {
            let rows = opportunities::table
                .select(DbOpportunity::as_select())
                .load::<DbOpportunity>(conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;
            rows.into_iter().map(DbOpportunity::into_opportunity).collect()
        })
        .await
    }

    async fn get_opportunity(&self, id: &str) -> Result<Option<Opportunity>, DatabaseError> {
        let id = id.to_string();
        with_connection(&self.pool, move |conn| {
            opportunities::table
                .find(id)
                .select(DbOpportunity::as_select())
                .first::<DbOpportunity>(conn)
                .optional()
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .map(DbOpportunity::into_opportunity)
                .transpose()
        })
        .await
    }

    async fn create_opportunity(&self, opportunity: &Opportunity) -> Result<(), DatabaseError> {
        let row = DbOpportunity::from_opportunity(opportunity);
        with_connection(&self.pool, move |conn| {
            diesel::insert_into(opportunities::table)
                .values(&row)
                .execute(conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }

    async fn update_opportunity(
        &self,
        id: &str,
        patch: &OpportunityPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let id = id.to_string();
        let patch = patch.clone();
        with_connection(&self.pool, move |conn| {
            let changes = UpdateOpportunity::from_patch(&patch, &updated_at);
            diesel::update(opportunities::table.find(id))
                .set(changes)
                .execute(conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }

    async fn delete_opportunity(&self, id: &str) -> Result<(), DatabaseError> {
        let id = id.to_string();
        with_connection(&self.pool, move |conn| {
            diesel::delete(opportunities::table.find(id))
                .execute(conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }
}

pub struct SqliteContactStore {
    pool: Pool,
}

impl SqliteContactStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::ContactStore for SqliteContactStore {
    async fn list_contacts(&self) -> Result<Vec<Contact>, DatabaseError> {
        with_connection(&self.pool, |conn| {
            let rows = contacts::table
                .select(DbContact::as_select())
                .load::<DbContact>(conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;
            rows.into_iter().map(DbContact::into_contact).collect()
        })
        .await
    }

    async fn get_contact(&self, id: &str) -> Result<Option<Contact>, DatabaseError> {
        let id = id.to_string();
        with_connection(&self.pool, move |conn| {
            contacts::table
                .find(id)
                .select(DbContact::as_select())
                .first::<DbContact>(conn)
                .optional()
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .map(DbContact::into_contact)
                .transpose()
        })
        .await
    }

    async fn create_contact(&self, contact: &Contact) -> Result<(), DatabaseError> {
        let row = DbContact::from_contact(contact);
        with_connection(&self.pool, move |conn| {
            diesel::insert_into(contacts::table)
                .values(&row)
                .execute(conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }

    async fn update_contact(
        &self,
        id: &str,
        patch: &ContactPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let id = id.to_string();
        let patch = patch.clone();
        with_connection(&self.pool, move |conn| {
            let changes = UpdateContact::from_patch(&patch, &updated_at);
            diesel::update(contacts::table.find(id))
                .set(changes)
                .execute(conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }

    async fn delete_contact(&self, id: &str) -> Result<(), DatabaseError> {
        let id = id.to_string();
        with_connection(&self.pool, move |conn| {
            diesel::delete(contacts::table.find(id))
                .execute(conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }
}
