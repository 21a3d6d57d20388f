use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::DatabaseError;
use crate::utils::generate_id;

pub const DEFAULT_PROBABILITY: i32 = 50;

/// Pipeline phase of an opportunity. Values outside the known set are kept
/// verbatim so rows written by older clients still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Stage {
    Discovery,
    Qualification,
    Proposal,
    Negotiation,
    Unknown(String),
}

impl Stage {
    pub fn as_str(&self) -> &str {
        match self {
            Stage::Discovery => "Discovery",
            Stage::Qualification => "Qualification",
            Stage::Proposal => "Proposal",
            Stage::Negotiation => "Negotiation",
            Stage::Unknown(raw) => raw,
        }
    }
}

impl From<String> for Stage {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Discovery" => Stage::Discovery,
            "Qualification" => Stage::Qualification,
            "Proposal" => Stage::Proposal,
            "Negotiation" => Stage::Negotiation,
            _ => Stage::Unknown(value),
        }
    }
}

impl From<Stage> for String {
    fn from(value: Stage) -> Self {
        match value {
            Stage::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often a contact should be reached out to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContactFrequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
    Unknown(String),
}

impl ContactFrequency {
    pub fn as_str(&self) -> &str {
        match self {
            ContactFrequency::Daily => "daily",
            ContactFrequency::Weekly => "weekly",
            ContactFrequency::Biweekly => "biweekly",
            ContactFrequency::Monthly => "monthly",
            ContactFrequency::Quarterly => "quarterly",
            ContactFrequency::Yearly => "yearly",
            ContactFrequency::Unknown(raw) => raw,
        }
    }
}

impl From<String> for ContactFrequency {
    fn from(value: String) -> Self {
        match value.as_str() {
            "daily" => ContactFrequency::Daily,
            "weekly" => ContactFrequency::Weekly,
            "biweekly" => ContactFrequency::Biweekly,
            "monthly" => ContactFrequency::Monthly,
            "quarterly" => ContactFrequency::Quarterly,
            "yearly" => ContactFrequency::Yearly,
            _ => ContactFrequency::Unknown(value),
        }
    }
}

impl From<ContactFrequency> for String {
    fn from(value: ContactFrequency) -> Self {
        match value {
            ContactFrequency::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ContactFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: String,
    pub title: String,
    pub company: String,
    pub value: f64,
    pub stage: Stage,
    pub probability: i32,
    pub contact_name: Option<String>,
    pub contact_title: Option<String>,
    pub contact_id: Option<String>,
    pub expected_close_date: Option<String>,
    pub description: Option<String>,
    pub last_activity: Option<DateTime<Utc>>,
    pub days_in_stage: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/opportunities`. Server-owned fields sent by the client
/// (id, timestamps, daysInStage) are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOpportunity {
    pub title: String,
    pub company: String,
    pub value: f64,
    pub stage: Stage,
    #[serde(default = "default_probability")]
    pub probability: i32,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_title: Option<String>,
    #[serde(default)]
    pub contact_id: Option<String>,
    #[serde(default)]
    pub expected_close_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewOpportunity {
    /// Stamps a fresh id and `now` into every server-owned field.
    pub fn into_opportunity(self, now: DateTime<Utc>) -> Opportunity {
        Opportunity {
            id: generate_id(),
            title: self.title,
            company: self.company,
            value: self.value,
            stage: self.stage,
            probability: self.probability,
            contact_name: self.contact_name,
            contact_title: self.contact_title,
            contact_id: self.contact_id,
            expected_close_date: self.expected_close_date,
            description: self.description,
            last_activity: Some(now),
            days_in_stage: Some(0),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of `PUT /api/opportunities`. `None` leaves a column untouched,
/// `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityPatch {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub stage: Option<Stage>,
    #[serde(default)]
    pub probability: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub contact_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub contact_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub contact_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub expected_close_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub last_activity: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub days_in_stage: Option<Option<i32>>,
}

impl OpportunityPatch {
    pub fn target_id(&self) -> Option<&str> {
        non_empty(self.id.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(rename = "mobile_phone")]
    pub mobile_phone: Option<String>,
    #[serde(rename = "work_phone")]
    pub work_phone: Option<String>,
    pub fax: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub birthday: Option<String>,
    pub location: Option<String>,
    pub linkedin_url: Option<String>,
    pub whatsapp: Option<String>,
    pub contact_frequency: Option<ContactFrequency>,
    pub last_contacted_at: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/contacts`. A non-empty client id is kept.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    #[serde(default)]
    pub id: Option<String>,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, rename = "mobile_phone")]
    pub mobile_phone: Option<String>,
    #[serde(default, rename = "work_phone")]
    pub work_phone: Option<String>,
    #[serde(default)]
    pub fax: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub contact_frequency: Option<ContactFrequency>,
    #[serde(default)]
    pub last_contacted_at: Option<String>,
}

impl NewContact {
    pub fn into_contact(self, now: DateTime<Utc>) -> Contact {
        let id = non_empty(self.id.as_deref())
            .map(ToOwned::to_owned)
            .unwrap_or_else(generate_id);

        Contact {
            id,
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
            contact_frequency: self.contact_frequency,
            last_contacted_at: self.last_contacted_at,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPatch {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, rename = "mobile_phone", deserialize_with = "nullable")]
    pub mobile_phone: Option<Option<String>>,
    #[serde(default, rename = "work_phone", deserialize_with = "nullable")]
    pub work_phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub fax: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub job_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub birthday: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub linkedin_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub whatsapp: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub contact_frequency: Option<Option<ContactFrequency>>,
    #[serde(default, deserialize_with = "nullable")]
    pub last_contacted_at: Option<Option<String>>,
}

impl ContactPatch {
    pub fn target_id(&self) -> Option<&str> {
        non_empty(self.id.as_deref())
    }
}

/// Body of `DELETE /api/{resource}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub id: Option<String>,
}

impl DeleteRequest {
    pub fn target_id(&self) -> Option<&str> {
        non_empty(self.id.as_deref())
    }
}

fn default_probability() -> i32 {
    DEFAULT_PROBABILITY
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

// Distinguishes an explicit `null` (Some(None)) from an absent key (None).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn datetime_to_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn string_to_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Query(format!("invalid datetime format: {}", e)))
}
