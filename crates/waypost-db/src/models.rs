//! Row types that map one-to-one onto SQLite rows, kept apart from the
//! waypost-types API models so the DB layer stays independent. Conversions
//! live here so corrupt-field handling is in one place.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use waypost_types::models::{Assignment, Link, Role, User};

/// Full user row including the password hash. Only the login path and the
/// bootstrap check should ever see this.
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
}

/// User row with the credential column excluded.
#[derive(Debug)]
pub struct UserPublicRow {
    pub id: String,
    pub username: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug)]
pub struct LinkRow {
    pub id: String,
    pub title: String,
    pub url: String,
    pub category: String,
    pub description: String,
    pub created_at: String,
}

#[derive(Debug)]
pub struct AssignmentRow {
    pub id: String,
    pub user_id: String,
    pub link_id: String,
    pub assigned_at: String,
}

pub struct AssignmentWithLinkRow {
    pub assignment: AssignmentRow,
    pub link: LinkRow,
}

pub struct AssignmentWithUserRow {
    pub assignment: AssignmentRow,
    pub user: UserPublicRow,
}

pub struct AssignmentDetailRow {
    pub assignment: AssignmentRow,
    pub user: UserPublicRow,
    pub link: LinkRow,
}

fn parse_id(raw: &str, table: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", table, raw, e);
        Uuid::default()
    })
}

fn parse_timestamp(raw: &str, table: &str, id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without
            // timezone. Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {} '{}': {}", raw, table, id, e);
            DateTime::default()
        })
}

impl UserPublicRow {
    pub fn into_user(self) -> User {
        User {
            id: parse_id(&self.id, "user"),
            role: Role::parse(&self.role),
            created_at: parse_timestamp(&self.created_at, "user", &self.id),
            username: self.username,
        }
    }
}

impl UserRow {
    pub fn into_public(self) -> UserPublicRow {
        UserPublicRow {
            id: self.id,
            username: self.username,
            role: self.role,
            created_at: self.created_at,
        }
    }
}

impl LinkRow {
    pub fn into_link(self) -> Link {
        Link {
            id: parse_id(&self.id, "link"),
            created_at: parse_timestamp(&self.created_at, "link", &self.id),
            title: self.title,
            url: self.url,
            category: self.category,
            description: self.description,
        }
    }
}

impl AssignmentRow {
    pub fn into_assignment(self) -> Assignment {
        Assignment {
            id: parse_id(&self.id, "assignment"),
            user_id: parse_id(&self.user_id, "user"),
            link_id: parse_id(&self.link_id, "link"),
            assigned_at: parse_timestamp(&self.assigned_at, "assignment", &self.id),
        }
    }
}
