//! Plain-text listings printed by the `report` subcommand.

use chrono::{DateTime, Utc};

use crate::cli::Resource;
use crate::db::{Contact, DatabaseError, DatabaseManager, Opportunity};
use crate::utils::formatting::{format_date, format_relative_time, parse_date};

pub async fn print_report(db: &DatabaseManager, resource: Resource) -> Result<(), DatabaseError> {
    let now = Utc::now();
    match resource {
        Resource::Opportunities => {
            for opportunity in db.opportunity_store().list_opportunities().await? {
                println!("{}", opportunity_line(&opportunity, &now));
            }
        }
        Resource::Contacts => {
            for contact in db.contact_store().list_contacts().await? {
                println!("{}", contact_line(&contact, &now));
            }
        }
    }
    Ok(())
}

pub fn opportunity_line(opportunity: &Opportunity, now: &DateTime<Utc>) -> String {
    let close = opportunity
        .expected_close_date
        .as_deref()
        .map(display_date)
        .unwrap_or_else(|| "-".to_string());
    let activity = opportunity
        .last_activity
        .as_ref()
        .map(|at| format_relative_time(at, now))
        .unwrap_or_else(|| "never".to_string());

    format!(
        "{}  {} ({})  {:.2}  {} {}%  close {}  active {}",
        opportunity.id,
        opportunity.title,
        opportunity.company,
        opportunity.value,
        opportunity.stage,
        opportunity.probability,
        close,
        activity,
    )
}

pub fn contact_line(contact: &Contact, now: &DateTime<Utc>) -> String {
    let company = contact.company.as_deref().unwrap_or("-");
    let frequency = contact
        .contact_frequency
        .as_ref()
        .map(|f| f.as_str())
        .unwrap_or("-");
    let last_contacted = contact
        .last_contacted_at
        .as_deref()
        .and_then(|raw| parse_date(raw).ok())
        .map(|at| format_relative_time(&at, now))
        .unwrap_or_else(|| "never".to_string());

    format!(
        "{}  {} ({})  every {}  contacted {}  added {}",
        contact.id,
        contact.full_name,
        company,
        frequency,
        last_contacted,
        format_date(&contact.created_at),
    )
}

// Unparseable dates are shown as stored.
fn display_date(raw: &str) -> String {
    parse_date(raw)
        .map(|date| format_date(&date))
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{contact_line, opportunity_line};
    use crate::db::{ContactFrequency, NewContact, NewOpportunity, Stage};

    fn opportunity() -> NewOpportunity {
        NewOpportunity {
            title: "Platform deal".to_string(),
            company: "Initech".to_string(),
            value: 12500.0,
            stage: Stage::Proposal,
            probability: 60,
            contact_name: None,
            contact_title: None,
            contact_id: None,
            expected_close_date: Some("2024-03-15".to_string()),
            description: None,
        }
    }

    #[test]
    fn opportunity_line_formats_dates() {
        let created = Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap();
        let now = created + Duration::days(3);
        let line = opportunity_line(&opportunity().into_opportunity(created), &now);

        assert!(line.contains("Platform deal (Initech)"));
        assert!(line.contains("12500.00"));
        assert!(line.contains("Proposal 60%"));
        assert!(line.contains("close Mar 15, 2024"));
        assert!(line.ends_with("active 3 days ago"));
    }

    #[test]
    fn opportunity_line_keeps_unparseable_close_dates() {
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap();
        let mut new = opportunity();
        new.expected_close_date = Some("end of quarter".to_string());
        let line = opportunity_line(&new.into_opportunity(now), &now);

        assert!(line.contains("close end of quarter"));
        assert!(line.ends_with("active Today"));
    }

    #[test]
    fn contact_line_without_history() {
        let created = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        let contact = NewContact {
            id: Some("c-1".to_string()),
            full_name: "Ada Lovelace".to_string(),
            email: None,
            phone: None,
            mobile_phone: None,
            work_phone: None,
            fax: None,
            company: None,
            job_title: None,
            birthday: None,
            location: None,
            linkedin_url: None,
            whatsapp: None,
            contact_frequency: Some(ContactFrequency::Quarterly),
            last_contacted_at: Some("2024-01-01".to_string()),
        }
        .into_contact(created);

        let line = contact_line(&contact, &created);
        assert_eq!(
            line,
            "c-1  Ada Lovelace (-)  every quarterly  contacted 1 month ago  added Feb 1, 2024"
        );
    }
}
