use serde::{Deserialize, Serialize};

/// Lifecycle values for `help_requests.status`. Transitions are driven by
/// whoever moderates the board, never by the stats aggregator.
pub mod request_status {
    pub const OPEN: &str = "open";
    pub const CLOSED: &str = "closed";
    pub const FULFILLED: &str = "fulfilled";

    pub const ALL: &[&str] = &[OPEN, CLOSED, FULFILLED];
}

/// Lifecycle values for `help_offers.status`.
pub mod offer_status {
    pub const AVAILABLE: &str = "available";
    pub const UNAVAILABLE: &str = "unavailable";

    pub const ALL: &[&str] = &[AVAILABLE, UNAVAILABLE];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpRequestRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Help-category tags, stored as a JSON array in the database.
    pub help_types: Vec<String>,
    pub budget: Option<String>,
    pub contact_name: String,
    /// Phone numbers in the order the requester listed them. May be empty.
    pub contact_phone: Vec<String>,
    pub contact_method: Option<String>,
    pub location_address: Option<String>,
    pub status: String, // 'open', 'closed' or 'fulfilled'
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpOfferRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Service-category tags, stored as a JSON array in the database.
    pub services_offered: Vec<String>,
    pub capacity: Option<String>,
    pub contact_info: String,
    pub contact_method: Option<String>,
    pub availability: Option<String>,
    pub location_area: Option<String>,
    pub skills: Option<String>,
    pub status: String, // 'available' or 'unavailable'
    pub created_at: String,
}
