use super::models::{HelpOfferRecord, HelpRequestRecord};
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub trait HelpRequestRepository {
    fn create(&self, record: &HelpRequestRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<HelpRequestRecord>>;
    fn list_recent(&self, limit: usize) -> Result<Vec<HelpRequestRecord>>;
    fn count_by_status(&self, status: &str) -> Result<u64>;
    /// Returns false when no record with the given id exists.
    fn update_status(&self, id: &str, status: &str) -> Result<bool>;
}

pub trait HelpOfferRepository {
    fn create(&self, record: &HelpOfferRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<HelpOfferRecord>>;
    fn list_recent(&self, limit: usize) -> Result<Vec<HelpOfferRecord>>;
    fn count_by_status(&self, status: &str) -> Result<u64>;
    fn update_status(&self, id: &str, status: &str) -> Result<bool>;
}

pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn help_requests(&self) -> impl HelpRequestRepository + '_ {
        SqliteHelpRequestRepository { conn: self.conn }
    }

    pub fn help_offers(&self) -> impl HelpOfferRepository + '_ {
        SqliteHelpOfferRepository { conn: self.conn }
    }
}

/// Tag and phone lists are stored as JSON arrays in TEXT columns.
fn encode_list(values: &[String]) -> Result<String> {
    Ok(serde_json::to_string(values)?)
}

fn decode_list(raw: String) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(&raw).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
    })
}

/// SQLite treats a negative LIMIT as "no limit", so huge usize values must
/// clamp instead of wrapping negative.
fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

struct SqliteHelpRequestRepository<'conn> {
    conn: &'conn Connection,
}

fn request_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HelpRequestRecord> {
    Ok(HelpRequestRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        help_types: decode_list(row.get(3)?)?,
        budget: row.get(4)?,
        contact_name: row.get(5)?,
        contact_phone: decode_list(row.get(6)?)?,
        contact_method: row.get(7)?,
        location_address: row.get(8)?,
        status: row.get(9)?,
        created_at: row.get(10)?,
    })
}

const REQUEST_COLUMNS: &str = "id, title, description, help_types, budget, contact_name, \
     contact_phone, contact_method, location_address, status, created_at";

impl<'conn> HelpRequestRepository for SqliteHelpRequestRepository<'conn> {
    fn create(&self, record: &HelpRequestRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO help_requests (id, title, description, help_types, budget, contact_name,
                contact_phone, contact_method, location_address, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                record.id,
                record.title,
                record.description,
                encode_list(&record.help_types)?,
                record.budget,
                record.contact_name,
                encode_list(&record.contact_phone)?,
                record.contact_method,
                record.location_address,
                record.status,
                record.created_at
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<HelpRequestRecord>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {REQUEST_COLUMNS} FROM help_requests WHERE id = ?1"),
                params![id],
                request_from_row,
            )
            .optional()?;
        Ok(row)
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<HelpRequestRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM help_requests
            ORDER BY datetime(created_at) DESC
            LIMIT ?1
            "#
        ))?;
        let rows = stmt.query_map(params![limit_param(limit)], request_from_row)?;
        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        Ok(requests)
    }

    fn count_by_status(&self, status: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM help_requests WHERE status = ?1",
            params![status],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn update_status(&self, id: &str, status: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE help_requests SET status = ?2 WHERE id = ?1",
            params![id, status],
        )?;
        Ok(changed > 0)
    }
}

struct SqliteHelpOfferRepository<'conn> {
    conn: &'conn Connection,
}

fn offer_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HelpOfferRecord> {
    Ok(HelpOfferRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        services_offered: decode_list(row.get(3)?)?,
        capacity: row.get(4)?,
        contact_info: row.get(5)?,
        contact_method: row.get(6)?,
        availability: row.get(7)?,
        location_area: row.get(8)?,
        skills: row.get(9)?,
        status: row.get(10)?,
        created_at: row.get(11)?,
    })
}

const OFFER_COLUMNS: &str = "id, name, description, services_offered, capacity, contact_info, \
     contact_method, availability, location_area, skills, status, created_at";

impl<'conn> HelpOfferRepository for SqliteHelpOfferRepository<'conn> {
    fn create(&self, record: &HelpOfferRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO help_offers (id, name, description, services_offered, capacity,
                contact_info, contact_method, availability, location_area, skills, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                record.id,
                record.name,
                record.description,
                encode_list(&record.services_offered)?,
                record.capacity,
                record.contact_info,
                record.contact_method,
                record.availability,
                record.location_area,
                record.skills,
                record.status,
                record.created_at
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<HelpOfferRecord>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {OFFER_COLUMNS} FROM help_offers WHERE id = ?1"),
                params![id],
                offer_from_row,
            )
            .optional()?;
        Ok(row)
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<HelpOfferRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {OFFER_COLUMNS}
            FROM help_offers
            ORDER BY datetime(created_at) DESC
            LIMIT ?1
            "#
        ))?;
        let rows = stmt.query_map(params![limit_param(limit)], offer_from_row)?;
        let mut offers = Vec::new();
        for row in rows {
            offers.push(row?);
        }
        Ok(offers)
    }

    fn count_by_status(&self, status: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM help_offers WHERE status = ?1",
            params![status],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn update_status(&self, id: &str, status: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE help_offers SET status = ?2 WHERE id = ?1",
            params![id, status],
        )?;
        Ok(changed > 0)
    }
}
