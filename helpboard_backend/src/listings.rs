use crate::database::models::{offer_status, request_status, HelpOfferRecord, HelpRequestRecord};
use crate::database::repositories::{HelpOfferRepository, HelpRequestRepository};
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Insert and browse operations over the two record collections. The status
/// lifecycle is driven through `set_*_status` by whoever moderates the board;
/// records are otherwise immutable once created.
#[derive(Clone)]
pub struct ListingService {
    database: Database,
}

impl ListingService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn create_request(&self, input: CreateHelpRequestInput) -> Result<HelpRequestRecord> {
        if input.title.trim().is_empty() {
            anyhow::bail!("request title may not be empty");
        }
        if input.description.trim().is_empty() {
            anyhow::bail!("request description may not be empty");
        }
        if input.contact_name.trim().is_empty() {
            anyhow::bail!("request contact name may not be empty");
        }

        let record = HelpRequestRecord {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            description: input.description,
            help_types: input.help_types,
            budget: none_if_blank(input.budget),
            contact_name: input.contact_name,
            contact_phone: split_phone_numbers(&input.contact_phone),
            contact_method: none_if_blank(input.contact_method),
            location_address: none_if_blank(input.location_address),
            status: request_status::OPEN.into(),
            created_at: now_utc_iso(),
        };

        self.database
            .with_repositories(|repos| repos.help_requests().create(&record))?;
        tracing::info!(id = %record.id, "help request created");
        Ok(record)
    }

    pub fn create_offer(&self, input: CreateHelpOfferInput) -> Result<HelpOfferRecord> {
        if input.name.trim().is_empty() {
            anyhow::bail!("offer name may not be empty");
        }
        if input.description.trim().is_empty() {
            anyhow::bail!("offer description may not be empty");
        }
        if input.contact_info.trim().is_empty() {
            anyhow::bail!("offer contact info may not be empty");
        }

        let record = HelpOfferRecord {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            description: input.description,
            services_offered: input.services_offered,
            capacity: none_if_blank(input.capacity),
            contact_info: input.contact_info,
            contact_method: none_if_blank(input.contact_method),
            availability: none_if_blank(input.availability),
            location_area: none_if_blank(input.location_area),
            skills: none_if_blank(input.skills),
            status: offer_status::AVAILABLE.into(),
            created_at: now_utc_iso(),
        };

        self.database
            .with_repositories(|repos| repos.help_offers().create(&record))?;
        tracing::info!(id = %record.id, "help offer created");
        Ok(record)
    }

    pub fn get_request(&self, id: &str) -> Result<Option<HelpRequestRecord>> {
        self.database
            .with_repositories(|repos| repos.help_requests().get(id))
    }

    pub fn get_offer(&self, id: &str) -> Result<Option<HelpOfferRecord>> {
        self.database
            .with_repositories(|repos| repos.help_offers().get(id))
    }

    pub fn list_requests(&self, limit: usize) -> Result<Vec<HelpRequestRecord>> {
        self.database
            .with_repositories(|repos| repos.help_requests().list_recent(limit))
    }

    pub fn list_offers(&self, limit: usize) -> Result<Vec<HelpOfferRecord>> {
        self.database
            .with_repositories(|repos| repos.help_offers().list_recent(limit))
    }

    /// Returns false when the request does not exist. The status value must be
    /// one of the request lifecycle values.
    pub fn set_request_status(&self, id: &str, status: &str) -> Result<bool> {
        if !request_status::ALL.contains(&status) {
            anyhow::bail!("invalid request status '{status}'");
        }
        let updated = self
            .database
            .with_repositories(|repos| repos.help_requests().update_status(id, status))?;
        if updated {
            tracing::info!(id, status, "help request status changed");
        }
        Ok(updated)
    }

    pub fn set_offer_status(&self, id: &str, status: &str) -> Result<bool> {
        if !offer_status::ALL.contains(&status) {
            anyhow::bail!("invalid offer status '{status}'");
        }
        let updated = self
            .database
            .with_repositories(|repos| repos.help_offers().update_status(id, status))?;
        if updated {
            tracing::info!(id, status, "help offer status changed");
        }
        Ok(updated)
    }
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}

/// The request form collects phone numbers as one comma-separated field.
fn split_phone_numbers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHelpRequestInput {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub help_types: Vec<String>,
    #[serde(default)]
    pub budget: Option<String>,
    pub contact_name: String,
    /// Comma-separated, matching the submission form field.
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub contact_method: Option<String>,
    #[serde(default)]
    pub location_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHelpOfferInput {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub services_offered: Vec<String>,
    #[serde(default)]
    pub capacity: Option<String>,
    pub contact_info: String,
    #[serde(default)]
    pub contact_method: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub location_area: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup_service() -> ListingService {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        ListingService::new(db)
    }

    fn request_input() -> CreateHelpRequestInput {
        CreateHelpRequestInput {
            title: "Roof repair".into(),
            description: "Storm tore the roof off the kitchen".into(),
            help_types: vec!["repair".into()],
            budget: Some("".into()),
            contact_name: "Nok".into(),
            contact_phone: "081-222-2222, 02-333-3333".into(),
            contact_method: Some("line".into()),
            location_address: None,
        }
    }

    #[test]
    fn create_request_assigns_id_status_and_splits_phones() {
        let service = setup_service();
        let record = service.create_request(request_input()).expect("create");

        assert_eq!(record.status, request_status::OPEN);
        assert!(!record.id.is_empty());
        assert_eq!(record.contact_phone, vec!["081-222-2222", "02-333-3333"]);
        // blank optional fields are stored as NULL, not empty strings
        assert_eq!(record.budget, None);

        let fetched = service.get_request(&record.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Roof repair");
    }

    #[test]
    fn create_request_rejects_missing_required_fields() {
        let service = setup_service();
        let mut input = request_input();
        input.contact_name = "  ".into();
        assert!(service.create_request(input).is_err());
    }

    #[test]
    fn create_offer_defaults_to_available() {
        let service = setup_service();
        let record = service
            .create_offer(CreateHelpOfferInput {
                name: "Pim".into(),
                description: "Volunteer cook, can feed 50".into(),
                services_offered: vec!["cooking".into()],
                capacity: Some("50 meals/day".into()),
                contact_info: "pim@example.com".into(),
                contact_method: None,
                availability: Some("evenings".into()),
                location_area: Some("district 4".into()),
                skills: None,
            })
            .expect("create offer");

        assert_eq!(record.status, offer_status::AVAILABLE);
        let listed = service.list_offers(10).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Pim");
    }

    #[test]
    fn set_status_enforces_lifecycle_values() {
        let service = setup_service();
        let record = service.create_request(request_input()).unwrap();

        assert!(service
            .set_request_status(&record.id, request_status::FULFILLED)
            .unwrap());
        assert!(service
            .set_request_status(&record.id, "abandoned")
            .is_err());
        assert!(!service
            .set_request_status("missing", request_status::CLOSED)
            .unwrap());

        let fetched = service.get_request(&record.id).unwrap().unwrap();
        assert_eq!(fetched.status, request_status::FULFILLED);
    }
}
