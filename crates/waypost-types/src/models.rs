use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. Any value other than `admin` is a plain `user`; role
/// strings from untrusted input are coerced, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn parse(s: &str) -> Self {
        if s == "admin" { Role::Admin } else { Role::User }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// A user as exposed over the API; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub category: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub link_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}

/// Links partitioned by category label. Insertion order is the contract:
/// the first category encountered iterates (and serializes) first.
pub type GroupedLinks = IndexMap<String, Vec<Link>>;

// -- Joined views over the assignment ledger --

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentWithLink {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub link: Link,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentWithUser {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentDetail {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub user: User,
    pub link: Link,
}
