use crate::models::{
    AssignmentDetailRow, AssignmentRow, AssignmentWithLinkRow, AssignmentWithUserRow, LinkRow,
    UserPublicRow, UserRow,
};
use crate::{Database, DbError, DbResult};
use rusqlite::Connection;

impl Database {
    // -- Users --

    /// Inserts a user. The UNIQUE constraint on `username` is the arbiter of
    /// duplicates; its violation surfaces as `DuplicateUsername`.
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        role: &str,
    ) -> DbResult<UserPublicRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password, role) VALUES (?1, ?2, ?3, ?4)",
                (id, username, password_hash, role),
            )
            .map_err(|e| map_constraint(e, DbError::DuplicateUsername))?;

            query_user_public_by_id(conn, id)?.ok_or(DbError::NotFound("user"))
        })
    }

    pub fn list_users(&self) -> DbResult<Vec<UserPublicRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, role, created_at FROM users
                 ORDER BY created_at DESC, rowid DESC",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(UserPublicRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        role: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> DbResult<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, password, role, created_at FROM users WHERE username = ?1",
            )?;

            let row = stmt
                .query_row([username], |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password: row.get(2)?,
                        role: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })
                .optional()?;

            Ok(row)
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> DbResult<Option<UserPublicRow>> {
        self.with_conn(|conn| query_user_public_by_id(conn, id))
    }

    /// The FK cascade removes the user's assignment rows in the same
    /// statement, so a crash cannot orphan the ledger.
    pub fn delete_user(&self, id: &str) -> DbResult<()> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            if deleted == 0 {
                return Err(DbError::NotFound("user"));
            }
            Ok(())
        })
    }

    // -- Links --

    pub fn create_link(
        &self,
        id: &str,
        title: &str,
        url: &str,
        category: &str,
        description: &str,
    ) -> DbResult<LinkRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO links (id, title, url, category, description)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, title, url, category, description),
            )?;

            query_link_by_id(conn, id)?.ok_or(DbError::NotFound("link"))
        })
    }

    /// Catalog in insertion order (rowid breaks same-second timestamp ties),
    /// so first-seen-category grouping downstream is stable.
    pub fn list_links(&self) -> DbResult<Vec<LinkRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, url, category, description, created_at FROM links
                 ORDER BY created_at ASC, rowid ASC",
            )?;

            let rows = stmt
                .query_map([], map_link_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_link(&self, id: &str) -> DbResult<Option<LinkRow>> {
        self.with_conn(|conn| query_link_by_id(conn, id))
    }

    /// Merges the provided fields over the stored row under the write lock.
    pub fn update_link(
        &self,
        id: &str,
        title: Option<String>,
        url: Option<String>,
        category: Option<String>,
        description: Option<String>,
    ) -> DbResult<LinkRow> {
        self.with_conn_mut(|conn| {
            let existing = query_link_by_id(conn, id)?.ok_or(DbError::NotFound("link"))?;

            let merged = LinkRow {
                id: existing.id,
                title: title.unwrap_or(existing.title),
                url: url.unwrap_or(existing.url),
                category: category.unwrap_or(existing.category),
                description: description.unwrap_or(existing.description),
                created_at: existing.created_at,
            };

            conn.execute(
                "UPDATE links SET title = ?1, url = ?2, category = ?3, description = ?4
                 WHERE id = ?5",
                (
                    &merged.title,
                    &merged.url,
                    &merged.category,
                    &merged.description,
                    id,
                ),
            )?;

            Ok(merged)
        })
    }

    pub fn delete_link(&self, id: &str) -> DbResult<()> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM links WHERE id = ?1", [id])?;
            if deleted == 0 {
                return Err(DbError::NotFound("link"));
            }
            Ok(())
        })
    }

    // -- Assignments --

    /// Validates both referents exist (a missing one is `NotFound`), then
    /// inserts. The UNIQUE(user_id, link_id) violation is `AlreadyAssigned`.
    pub fn create_assignment(
        &self,
        id: &str,
        user_id: &str,
        link_id: &str,
    ) -> DbResult<AssignmentRow> {
        self.with_conn_mut(|conn| {
            if query_user_public_by_id(conn, user_id)?.is_none() {
                return Err(DbError::NotFound("user"));
            }
            if query_link_by_id(conn, link_id)?.is_none() {
                return Err(DbError::NotFound("link"));
            }

            conn.execute(
                "INSERT INTO user_link_assignments (id, user_id, link_id) VALUES (?1, ?2, ?3)",
                (id, user_id, link_id),
            )
            .map_err(|e| map_constraint(e, DbError::AlreadyAssigned))?;

            let mut stmt = conn.prepare(
                "SELECT id, user_id, link_id, assigned_at FROM user_link_assignments
                 WHERE id = ?1",
            )?;
            stmt.query_row([id], map_assignment_row)
                .optional()?
                .ok_or(DbError::NotFound("assignment"))
        })
    }

    /// Idempotent: deleting a pair that is not assigned succeeds.
    pub fn delete_assignment(&self, user_id: &str, link_id: &str) -> DbResult<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "DELETE FROM user_link_assignments WHERE user_id = ?1 AND link_id = ?2",
                (user_id, link_id),
            )?;
            Ok(())
        })
    }

    pub fn get_user_assignments(&self, user_id: &str) -> DbResult<Vec<AssignmentWithLinkRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT a.id, a.user_id, a.link_id, a.assigned_at,
                        l.id, l.title, l.url, l.category, l.description, l.created_at
                 FROM user_link_assignments a
                 JOIN links l ON a.link_id = l.id
                 WHERE a.user_id = ?1
                 ORDER BY a.assigned_at ASC, a.rowid ASC",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(AssignmentWithLinkRow {
                        assignment: AssignmentRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            link_id: row.get(2)?,
                            assigned_at: row.get(3)?,
                        },
                        link: LinkRow {
                            id: row.get(4)?,
                            title: row.get(5)?,
                            url: row.get(6)?,
                            category: row.get(7)?,
                            description: row.get(8)?,
                            created_at: row.get(9)?,
                        },
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_link_assignments(&self, link_id: &str) -> DbResult<Vec<AssignmentWithUserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT a.id, a.user_id, a.link_id, a.assigned_at,
                        u.id, u.username, u.role, u.created_at
                 FROM user_link_assignments a
                 JOIN users u ON a.user_id = u.id
                 WHERE a.link_id = ?1
                 ORDER BY a.assigned_at ASC, a.rowid ASC",
            )?;

            let rows = stmt
                .query_map([link_id], |row| {
                    Ok(AssignmentWithUserRow {
                        assignment: AssignmentRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            link_id: row.get(2)?,
                            assigned_at: row.get(3)?,
                        },
                        user: UserPublicRow {
                            id: row.get(4)?,
                            username: row.get(5)?,
                            role: row.get(6)?,
                            created_at: row.get(7)?,
                        },
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Every ledger row joined with both sides in a single query, newest
    /// first. The FKs guarantee both joins always match.
    pub fn get_all_assignments(&self) -> DbResult<Vec<AssignmentDetailRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT a.id, a.user_id, a.link_id, a.assigned_at,
                        u.id, u.username, u.role, u.created_at,
                        l.id, l.title, l.url, l.category, l.description, l.created_at
                 FROM user_link_assignments a
                 JOIN users u ON a.user_id = u.id
                 JOIN links l ON a.link_id = l.id
                 ORDER BY a.assigned_at DESC, a.rowid DESC",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(AssignmentDetailRow {
                        assignment: AssignmentRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            link_id: row.get(2)?,
                            assigned_at: row.get(3)?,
                        },
                        user: UserPublicRow {
                            id: row.get(4)?,
                            username: row.get(5)?,
                            role: row.get(6)?,
                            created_at: row.get(7)?,
                        },
                        link: LinkRow {
                            id: row.get(8)?,
                            title: row.get(9)?,
                            url: row.get(10)?,
                            category: row.get(11)?,
                            description: row.get(12)?,
                            created_at: row.get(13)?,
                        },
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// The links assigned to one user, in catalog insertion order. Zero
    /// assignments is an empty list, not an error.
    pub fn get_user_assigned_links(&self, user_id: &str) -> DbResult<Vec<LinkRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT l.id, l.title, l.url, l.category, l.description, l.created_at
                 FROM user_link_assignments a
                 JOIN links l ON a.link_id = l.id
                 WHERE a.user_id = ?1
                 ORDER BY l.created_at ASC, l.rowid ASC",
            )?;

            let rows = stmt
                .query_map([user_id], map_link_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user_public_by_id(conn: &Connection, id: &str) -> DbResult<Option<UserPublicRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, role, created_at FROM users WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(UserPublicRow {
                id: row.get(0)?,
                username: row.get(1)?,
                role: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_link_by_id(conn: &Connection, id: &str) -> DbResult<Option<LinkRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, url, category, description, created_at FROM links WHERE id = ?1",
    )?;

    let row = stmt.query_row([id], map_link_row).optional()?;

    Ok(row)
}

fn map_link_row(row: &rusqlite::Row<'_>) -> std::result::Result<LinkRow, rusqlite::Error> {
    Ok(LinkRow {
        id: row.get(0)?,
        title: row.get(1)?,
        url: row.get(2)?,
        category: row.get(3)?,
        description: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn map_assignment_row(
    row: &rusqlite::Row<'_>,
) -> std::result::Result<AssignmentRow, rusqlite::Error> {
    Ok(AssignmentRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        link_id: row.get(2)?,
        assigned_at: row.get(3)?,
    })
}

fn map_constraint(e: rusqlite::Error, domain: DbError) -> DbError {
    if DbError::is_constraint_violation(&e) {
        domain
    } else {
        DbError::Sqlite(e)
    }
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> DbResult<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> DbResult<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn add_user(db: &Database, username: &str, role: &str) -> String {
        let id = new_id();
        db.create_user(&id, username, "$argon2id$fake-hash", role)
            .unwrap();
        id
    }

    fn add_link(db: &Database, title: &str, category: &str) -> String {
        let id = new_id();
        db.create_link(&id, title, "https://example.com", category, "")
            .unwrap();
        id
    }

    #[test]
    fn assign_appears_once_and_duplicate_is_rejected() {
        let db = db();
        let user = add_user(&db, "alice", "user");
        let link = add_link(&db, "Wiki", "Tools");

        db.create_assignment(&new_id(), &user, &link).unwrap();

        let assignments = db.get_user_assignments(&user).unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].assignment.link_id, link);
        assert_eq!(assignments[0].link.title, "Wiki");

        let err = db.create_assignment(&new_id(), &user, &link).unwrap_err();
        assert!(matches!(err, DbError::AlreadyAssigned));

        // the failed insert must not add a row
        assert_eq!(db.get_user_assignments(&user).unwrap().len(), 1);
    }

    #[test]
    fn unassign_is_idempotent() {
        let db = db();
        let user = add_user(&db, "alice", "user");
        let link = add_link(&db, "Wiki", "Tools");

        db.create_assignment(&new_id(), &user, &link).unwrap();

        db.delete_assignment(&user, &link).unwrap();
        db.delete_assignment(&user, &link).unwrap();

        assert!(db.get_user_assignments(&user).unwrap().is_empty());
    }

    #[test]
    fn assignment_requires_existing_referents() {
        let db = db();
        let user = add_user(&db, "alice", "user");
        let link = add_link(&db, "Wiki", "Tools");

        let err = db.create_assignment(&new_id(), &new_id(), &link).unwrap_err();
        assert!(matches!(err, DbError::NotFound("user")));

        let err = db.create_assignment(&new_id(), &user, &new_id()).unwrap_err();
        assert!(matches!(err, DbError::NotFound("link")));
    }

    #[test]
    fn deleting_user_cascades_assignments() {
        let db = db();
        let alice = add_user(&db, "alice", "user");
        let bob = add_user(&db, "bob", "user");
        let link = add_link(&db, "Wiki", "Tools");

        db.create_assignment(&new_id(), &alice, &link).unwrap();
        db.create_assignment(&new_id(), &bob, &link).unwrap();

        db.delete_user(&alice).unwrap();

        let all = db.get_all_assignments().unwrap();
        assert_eq!(all.len(), 1);
        assert!(all.iter().all(|a| a.assignment.user_id != alice));
    }

    #[test]
    fn deleting_link_cascades_assignments() {
        let db = db();
        let alice = add_user(&db, "alice", "user");
        let wiki = add_link(&db, "Wiki", "Tools");
        let chat = add_link(&db, "Chat", "Social");

        db.create_assignment(&new_id(), &alice, &wiki).unwrap();
        db.create_assignment(&new_id(), &alice, &chat).unwrap();

        db.delete_link(&wiki).unwrap();

        let all = db.get_all_assignments().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].assignment.link_id, chat);
    }

    #[test]
    fn duplicate_username_is_rejected_without_mutation() {
        let db = db();
        add_user(&db, "alice", "user");

        let err = db
            .create_user(&new_id(), "alice", "other-hash", "admin")
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateUsername));

        assert_eq!(db.list_users().unwrap().len(), 1);
    }

    #[test]
    fn missing_user_lookup_is_none_not_error() {
        let db = db();
        assert!(db.get_user_by_username("ghost").unwrap().is_none());
        assert!(db.get_user_by_id(&new_id()).unwrap().is_none());
    }

    #[test]
    fn list_users_excludes_credentials() {
        let db = db();
        add_user(&db, "alice", "admin");

        let users = db.list_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "alice");
        assert_eq!(users[0].role, "admin");
    }

    #[test]
    fn delete_missing_rows_is_not_found() {
        let db = db();
        assert!(matches!(
            db.delete_user(&new_id()).unwrap_err(),
            DbError::NotFound("user")
        ));
        assert!(matches!(
            db.delete_link(&new_id()).unwrap_err(),
            DbError::NotFound("link")
        ));
    }

    #[test]
    fn update_link_merges_partial_fields() {
        let db = db();
        let id = add_link(&db, "Wiki", "Tools");

        let updated = db
            .update_link(&id, Some("Team Wiki".into()), None, None, None)
            .unwrap();
        assert_eq!(updated.title, "Team Wiki");
        assert_eq!(updated.url, "https://example.com");
        assert_eq!(updated.category, "Tools");

        // and the merge was persisted
        let stored = db.get_link(&id).unwrap().unwrap();
        assert_eq!(stored.title, "Team Wiki");
        assert_eq!(stored.category, "Tools");
    }

    #[test]
    fn update_missing_link_is_not_found() {
        let db = db();
        let err = db
            .update_link(&new_id(), Some("x".into()), None, None, None)
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound("link")));
    }

    #[test]
    fn link_assignments_list_every_assignee() {
        let db = db();
        let alice = add_user(&db, "alice", "user");
        let bob = add_user(&db, "bob", "user");
        let link = add_link(&db, "Wiki", "Tools");

        db.create_assignment(&new_id(), &alice, &link).unwrap();
        db.create_assignment(&new_id(), &bob, &link).unwrap();

        let assignees = db.get_link_assignments(&link).unwrap();
        assert_eq!(assignees.len(), 2);
        let names: Vec<&str> = assignees.iter().map(|a| a.user.username.as_str()).collect();
        assert!(names.contains(&"alice"));
        assert!(names.contains(&"bob"));
    }

    #[test]
    fn assigned_links_empty_without_assignments() {
        let db = db();
        let user = add_user(&db, "alice", "user");
        assert!(db.get_user_assigned_links(&user).unwrap().is_empty());
    }

    #[test]
    fn assigned_links_follow_catalog_order() {
        let db = db();
        let user = add_user(&db, "alice", "user");
        let wiki = add_link(&db, "Wiki", "Tools");
        let chat = add_link(&db, "Chat", "Social");

        // assign in reverse catalog order
        db.create_assignment(&new_id(), &user, &chat).unwrap();
        db.create_assignment(&new_id(), &user, &wiki).unwrap();

        let links = db.get_user_assigned_links(&user).unwrap();
        let titles: Vec<&str> = links.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Wiki", "Chat"]);
    }
}
