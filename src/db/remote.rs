use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::params::Params;
use libsql::{Builder, Connection, Database, Value};

use super::{
    DatabaseError,
    models::{
        datetime_to_string, string_to_datetime, Contact, ContactFrequency, ContactPatch,
        Opportunity, OpportunityPatch, Stage,
    },
};

const OPPORTUNITY_COLUMNS: &str = "id, title, company, value, stage, probability, contact_name, \
     contact_title, contact_id, expected_close_date, description, last_activity, days_in_stage, \
     created_at, updated_at";

const CONTACT_COLUMNS: &str = "id, full_name, email, phone, mobile_phone, work_phone, fax, \
     company, job_title, birthday, location, linkedin_url, whatsapp, contact_frequency, \
     last_contacted_at, created_at, updated_at";

/// Positional-parameter SQL execution. Rows come back as plain column values
/// in select order.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<(), DatabaseError>;
    async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Vec<Value>>, DatabaseError>;
}

/// Client for a libSQL server (Turso or a self-hosted sqld).
pub struct RemoteDatabase {
    db: Database,
}

impl RemoteDatabase {
    pub async fn open(url: &str, auth_token: Option<&str>) -> Result<Self, DatabaseError> {
        let db = Builder::new_remote(url.to_string(), auth_token.unwrap_or_default().to_string())
            .build()
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        Ok(Self { db })
    }

    fn connect(&self) -> Result<Connection, DatabaseError> {
        self.db
            .connect()
            .map_err(|e| DatabaseError::Connection(e.to_string()))
    }

    pub async fn execute_statements(&self, statements: &[&str]) -> Result<(), DatabaseError> {
        let conn = self.connect()?;
        for statement in statements {
            conn.execute(statement, ())
                .await
                .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl SqlExecutor for RemoteDatabase {
    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<(), DatabaseError> {
        self.connect()?
            .execute(sql, Params::Positional(params))
            .await
            .map(|_| ())
            .map_err(|e| DatabaseError::Query(e.to_string()))
    }

    async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Vec<Value>>, DatabaseError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(sql, Params::Positional(params))
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;
        let width = rows.column_count();

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?
        {
            let values = (0..width)
                .map(|idx| {
                    row.get_value(idx)
                        .map_err(|e| DatabaseError::Query(format!("column {idx}: {e}")))
                })
                .collect::<Result<Vec<_>, _>>()?;
            results.push(values);
        }
        Ok(results)
    }
}

fn column(row: &[Value], idx: usize) -> Result<&Value, DatabaseError> {
    row.get(idx)
        .ok_or_else(|| DatabaseError::Query(format!("column {idx}: missing from row")))
}

fn text(row: &[Value], idx: usize) -> Result<String, DatabaseError> {
    optional_text(row, idx)?
        .ok_or_else(|| DatabaseError::Query(format!("column {idx}: unexpected NULL")))
}

fn optional_text(row: &[Value], idx: usize) -> Result<Option<String>, DatabaseError> {
    match column(row, idx)? {
        Value::Null => Ok(None),
        Value::Text(value) => Ok(Some(value.clone())),
        other => Err(DatabaseError::Query(format!(
            "column {idx}: expected text, got {other:?}"
        ))),
    }
}

fn real(row: &[Value], idx: usize) -> Result<f64, DatabaseError> {
    match column(row, idx)? {
        Value::Real(value) => Ok(*value),
        Value::Integer(value) => Ok(*value as f64),
        other => Err(DatabaseError::Query(format!(
            "column {idx}: expected real, got {other:?}"
        ))),
    }
}

fn optional_integer(row: &[Value], idx: usize) -> Result<Option<i32>, DatabaseError> {
    match column(row, idx)? {
        Value::Null => Ok(None),
        Value::Integer(value) => i32::try_from(*value)
            .map(Some)
            .map_err(|_| DatabaseError::Query(format!("column {idx}: {value} out of range"))),
        other => Err(DatabaseError::Query(format!(
            "column {idx}: expected integer, got {other:?}"
        ))),
    }
}

fn integer(row: &[Value], idx: usize) -> Result<i32, DatabaseError> {
    optional_integer(row, idx)?
        .ok_or_else(|| DatabaseError::Query(format!("column {idx}: unexpected NULL")))
}

fn text_value(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn nullable_text(value: Option<&str>) -> Value {
    value.map(text_value).unwrap_or(Value::Null)
}

fn nullable_integer(value: Option<i32>) -> Value {
    value.map(|v| Value::Integer(v.into())).unwrap_or(Value::Null)
}

fn decode_opportunity(row: &[Value]) -> Result<Opportunity, DatabaseError> {
    Ok(Opportunity {
        id: text(row, 0)?,
        title: text(row, 1)?,
        company: text(row, 2)?,
        value: real(row, 3)?,
        stage: Stage::from(text(row, 4)?),
        probability: integer(row, 5)?,
        contact_name: optional_text(row, 6)?,
        contact_title: optional_text(row, 7)?,
        contact_id: optional_text(row, 8)?,
        expected_close_date: optional_text(row, 9)?,
        description: optional_text(row, 10)?,
        last_activity: optional_text(row, 11)?
            .as_deref()
            .map(string_to_datetime)
            .transpose()?,
        days_in_stage: optional_integer(row, 12)?,
        created_at: string_to_datetime(&text(row, 13)?)?,
        updated_at: string_to_datetime(&text(row, 14)?)?,
    })
}

fn opportunity_values(opportunity: &Opportunity) -> Vec<Value> {
    vec![
        text_value(&opportunity.id),
        text_value(&opportunity.title),
        text_value(&opportunity.company),
        Value::Real(opportunity.value),
        text_value(opportunity.stage.as_str()),
        Value::Integer(opportunity.probability.into()),
        nullable_text(opportunity.contact_name.as_deref()),
        nullable_text(opportunity.contact_title.as_deref()),
        nullable_text(opportunity.contact_id.as_deref()),
        nullable_text(opportunity.expected_close_date.as_deref()),
        nullable_text(opportunity.description.as_deref()),
        nullable_text(
            opportunity
                .last_activity
                .as_ref()
                .map(datetime_to_string)
                .as_deref(),
        ),
        nullable_integer(opportunity.days_in_stage),
        text_value(&datetime_to_string(&opportunity.created_at)),
        text_value(&datetime_to_string(&opportunity.updated_at)),
    ]
}

fn opportunity_assignments(patch: &OpportunityPatch) -> Vec<(&'static str, Value)> {
    let mut sets = Vec::new();
    if let Some(title) = &patch.title {
        sets.push(("title", text_value(title)));
    }
    if let Some(company) = &patch.company {
        sets.push(("company", text_value(company)));
    }
    if let Some(value) = patch.value {
        sets.push(("value", Value::Real(value)));
    }
    if let Some(stage) = &patch.stage {
        sets.push(("stage", text_value(stage.as_str())));
    }
    if let Some(probability) = patch.probability {
        sets.push(("probability", Value::Integer(probability.into())));
    }
    let nullable = [
        ("contact_name", &patch.contact_name),
        ("contact_title", &patch.contact_title),
        ("contact_id", &patch.contact_id),
        ("expected_close_date", &patch.expected_close_date),
        ("description", &patch.description),
    ];
    for (name, field) in nullable {
        if let Some(value) = field {
            sets.push((name, nullable_text(value.as_deref())));
        }
    }
    if let Some(last_activity) = patch.last_activity {
        let value = last_activity.as_ref().map(datetime_to_string);
        sets.push(("last_activity", nullable_text(value.as_deref())));
    }
    if let Some(days_in_stage) = patch.days_in_stage {
        sets.push(("days_in_stage", nullable_integer(days_in_stage)));
    }
    sets
}

fn decode_contact(row: &[Value]) -> Result<Contact, DatabaseError> {
    Ok(Contact {
        id: text(row, 0)?,
        full_name: text(row, 1)?,
        email: optional_text(row, 2)?,
        phone: optional_text(row, 3)?,
        mobile_phone: optional_text(row, 4)?,
        work_phone: optional_text(row, 5)?,
        fax: optional_text(row, 6)?,
        company: optional_text(row, 7)?,
        job_title: optional_text(row, 8)?,
        birthday: optional_text(row, 9)?,
        location: optional_text(row, 10)?,
        linkedin_url: optional_text(row, 11)?,
        whatsapp: optional_text(row, 12)?,
        contact_frequency: optional_text(row, 13)?.map(ContactFrequency::from),
        last_contacted_at: optional_text(row, 14)?,
        created_at: string_to_datetime(&text(row, 15)?)?,
        updated_at: string_to_datetime(&text(row, 16)?)?,
    })
}

fn contact_values(contact: &Contact) -> Vec<Value> {
    vec![
        text_value(&contact.id),
        text_value(&contact.full_name),
        nullable_text(contact.email.as_deref()),
        nullable_text(contact.phone.as_deref()),
        nullable_text(contact.mobile_phone.as_deref()),
        nullable_text(contact.work_phone.as_deref()),
        nullable_text(contact.fax.as_deref()),
        nullable_text(contact.company.as_deref()),
        nullable_text(contact.job_title.as_deref()),
        nullable_text(contact.birthday.as_deref()),
        nullable_text(contact.location.as_deref()),
        nullable_text(contact.linkedin_url.as_deref()),
        nullable_text(contact.whatsapp.as_deref()),
        nullable_text(contact.contact_frequency.as_ref().map(ContactFrequency::as_str)),
        nullable_text(contact.last_contacted_at.as_deref()),
        text_value(&datetime_to_string(&contact.created_at)),
        text_value(&datetime_to_string(&contact.updated_at)),
    ]
}

fn contact_assignments(patch: &ContactPatch) -> Vec<(&'static str, Value)> {
    let mut sets = Vec::new();
    if let Some(full_name) = &patch.full_name {
        sets.push(("full_name", text_value(full_name)));
    }
    let nullable = [
        ("email", &patch.email),
        ("phone", &patch.phone),
        ("mobile_phone", &patch.mobile_phone),
        ("work_phone", &patch.work_phone),
        ("fax", &patch.fax),
        ("company", &patch.company),
        ("job_title", &patch.job_title),
        ("birthday", &patch.birthday),
        ("location", &patch.location),
        ("linkedin_url", &patch.linkedin_url),
        ("whatsapp", &patch.whatsapp),
        ("last_contacted_at", &patch.last_contacted_at),
    ];
    for (name, field) in nullable {
        if let Some(value) = field {
            sets.push((name, nullable_text(value.as_deref())));
        }
    }
    if let Some(frequency) = &patch.contact_frequency {
        sets.push((
            "contact_frequency",
            nullable_text(frequency.as_ref().map(ContactFrequency::as_str)),
        ));
    }
    sets
}

fn insert_statement(table: &str, columns: &str) -> String {
    let placeholders = vec!["?"; columns.split(',').count()].join(", ");
    format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})")
}

/// Builds `UPDATE ... SET` for the given assignments plus `updated_at`, and
/// the positional values in bind order (the id last).
fn update_statement(
    table: &str,
    assignments: Vec<(&'static str, Value)>,
    updated_at: &DateTime<Utc>,
    id: &str,
) -> (String, Vec<Value>) {
    let mut columns = Vec::with_capacity(assignments.len() + 1);
    let mut values = Vec::with_capacity(assignments.len() + 2);
    for (name, value) in assignments {
        columns.push(format!("{name} = ?"));
        values.push(value);
    }
    columns.push("updated_at = ?".to_string());
    values.push(text_value(&datetime_to_string(updated_at)));
    values.push(text_value(id));

    let sql = format!("UPDATE {table} SET {} WHERE id = ?", columns.join(", "));
    (sql, values)
}

pub struct RemoteOpportunityStore {
    db: Arc<dyn SqlExecutor>,
}

impl RemoteOpportunityStore {
    pub fn new(db: Arc<dyn SqlExecutor>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl super::OpportunityStore for RemoteOpportunityStore {
    async fn list_opportunities(&self) -> Result<Vec<Opportunity>, DatabaseError> {
        let sql = format!("SELECT {OPPORTUNITY_COLUMNS} FROM opportunities");
        let rows = self.db.query(&sql, Vec::new()).await?;
        rows.iter().map(|row| decode_opportunity(row)).collect()
    }

    async fn get_opportunity(&self, id: &str) -> Result<Option<Opportunity>, DatabaseError> {
        let sql = format!("SELECT {OPPORTUNITY_COLUMNS} FROM opportunities WHERE id = ? LIMIT 1");
        let rows = self.db.query(&sql, vec![text_value(id)]).await?;
        rows.first().map(|row| decode_opportunity(row)).transpose()
    }

    async fn create_opportunity(&self, opportunity: &Opportunity) -> Result<(), DatabaseError> {
        let sql = insert_statement("opportunities", OPPORTUNITY_COLUMNS);
        self.db.execute(&sql, opportunity_values(opportunity)).await
    }

    async fn update_opportunity(
        &self,
        id: &str,
        patch: &OpportunityPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let (sql, values) =
            update_statement("opportunities", opportunity_assignments(patch), &updated_at, id);
        self.db.execute(&sql, values).await
    }

    async fn delete_opportunity(&self, id: &str) -> Result<(), DatabaseError> {
        self.db
            .execute("DELETE FROM opportunities WHERE id = ?", vec![text_value(id)])
            .await
    }
}

pub struct RemoteContactStore {
    db: Arc<dyn SqlExecutor>,
}

impl RemoteContactStore {
    pub fn new(db: Arc<dyn SqlExecutor>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl super::ContactStore for RemoteContactStore {
    async fn list_contacts(&self) -> Result<Vec<Contact>, DatabaseError> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts");
        let rows = self.db.query(&sql, Vec::new()).await?;
        rows.iter().map(|row| decode_contact(row)).collect()
    }

    async fn get_contact(&self, id: &str) -> Result<Option<Contact>, DatabaseError> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ? LIMIT 1");
        let rows = self.db.query(&sql, vec![text_value(id)]).await?;
        rows.first().map(|row| decode_contact(row)).transpose()
    }

    async fn create_contact(&self, contact: &Contact) -> Result<(), DatabaseError> {
        let sql = insert_statement("contacts", CONTACT_COLUMNS);
        self.db.execute(&sql, contact_values(contact)).await
    }

    async fn update_contact(
        &self,
        id: &str,
        patch: &ContactPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let (sql, values) =
            update_statement("contacts", contact_assignments(patch), &updated_at, id);
        self.db.execute(&sql, values).await
    }

    async fn delete_contact(&self, id: &str) -> Result<(), DatabaseError> {
        self.db
            .execute("DELETE FROM contacts WHERE id = ?", vec![text_value(id)])
            .await
    }
}
