use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn require_username(username: &str) -> Result<&str> {
    normalize_username(username)
        .ok_or_else(|| Error::BadRequest("username cannot be empty".to_string()))
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        username: row.get(0)?,
        report_key: ReportKey::from_stored(row.get(1)?),
        email: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
        updated_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn comment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        report_key: ReportKey::from_stored(row.get(1)?),
        track_id: row.get(2)?,
        milestone: row.get(3)?,
        signal_index: row.get(4)?,
        author: row.get(5)?,
        text: row.get(6)?,
        parent_id: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, username: &str, email: Option<&str>) -> Result<String> {
        let username = require_username(username)?;
        let report_key = ReportKey::owned_by(username)
            .ok_or_else(|| Error::BadRequest("username cannot be empty".to_string()))?;
        let email = email.map(str::trim).filter(|e| !e.is_empty());
        let now = format_datetime(&Utc::now());

        let result = self.conn().execute(
            "INSERT INTO users (username, report_key, email, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![username, report_key.as_str(), email, now],
        );

        match result {
            Ok(_) => Ok(username.to_string()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_user(&self, username: &str) -> Result<Option<User>> {
        let Some(username) = normalize_username(username) else {
            return Ok(None);
        };
        let conn = self.conn();
        conn.query_row(
            "SELECT username, report_key, email, created_at, updated_at
             FROM users WHERE username = ?1",
            params![username],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_or_create_user(&self, username: &str, email: Option<&str>) -> Result<String> {
        if let Some(user) = self.get_user(username)? {
            return Ok(user.username);
        }

        match self.create_user(username, email) {
            Ok(created) => Ok(created),
            // Either another connection inserted the same username first, or a
            // different username already owns the same report key.
            Err(Error::AlreadyExists) => match self.get_user(username)? {
                Some(user) => Ok(user.username),
                None => {
                    let key = ReportKey::owned_by(username).map(ReportKey::into_string);
                    Err(Error::ReportKeyTaken(key.unwrap_or_default()))
                }
            },
            Err(e) => Err(e),
        }
    }

    fn get_report_owner(&self, key: &ReportKey) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT username, report_key, email, created_at, updated_at
             FROM users WHERE report_key = ?1",
            params![key.as_str()],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_all_usernames(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT username FROM users ORDER BY username")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Role operations

    fn has_role(&self, username: &str, role: &str) -> Result<bool> {
        let Some(username) = normalize_username(username) else {
            return Ok(false);
        };
        let conn = self.conn();
        let found: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM user_roles r
                JOIN users u ON u.username = r.username
                WHERE r.username = ?1 AND r.role = ?2
             )",
            params![username, role],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    fn add_role(&self, username: &str, role: &str) -> Result<String> {
        let username = self.get_or_create_user(username, None)?;

        self.conn().execute(
            "INSERT OR IGNORE INTO user_roles (username, role, created_at) VALUES (?1, ?2, ?3)",
            params![username, role, format_datetime(&Utc::now())],
        )?;
        Ok(username)
    }

    fn remove_role(&self, username: &str, role: &str) -> Result<bool> {
        let Some(username) = normalize_username(username) else {
            return Ok(false);
        };
        let rows = self.conn().execute(
            "DELETE FROM user_roles WHERE username = ?1 AND role = ?2",
            params![username, role],
        )?;
        Ok(rows > 0)
    }

    fn list_role_members(&self, role: &str) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT u.username FROM users u
             JOIN user_roles r ON u.username = r.username
             WHERE r.role = ?1
             ORDER BY u.username",
        )?;
        let rows = stmt.query_map(params![role], |row| row.get(0))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Report access grant operations

    fn grant(&self, key: &ReportKey, username: &str) -> Result<bool> {
        let Some(user) = self.get_user(username)? else {
            tracing::debug!("Skipping grant on '{}' for unknown user '{}'", key, username);
            return Ok(false);
        };

        // Duplicate grants collapse onto the (report_key, username) primary key.
        self.conn().execute(
            "INSERT OR IGNORE INTO report_access (report_key, username, granted_at)
             VALUES (?1, ?2, ?3)",
            params![key.as_str(), user.username, format_datetime(&Utc::now())],
        )?;
        Ok(true)
    }

    fn revoke(&self, key: &ReportKey, username: &str) -> Result<Revocation> {
        let username = normalize_username(username).unwrap_or_default().to_string();
        let rows = self.conn().execute(
            "DELETE FROM report_access WHERE report_key = ?1 AND username = ?2",
            params![key.as_str(), username],
        )?;

        Ok(Revocation {
            report_key: key.clone(),
            username,
            removed: rows > 0,
            revoked_at: Utc::now(),
        })
    }

    fn has_grant(&self, key: &ReportKey, username: &str) -> Result<bool> {
        let Some(username) = normalize_username(username) else {
            return Ok(false);
        };
        let conn = self.conn();
        let found: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM report_access WHERE report_key = ?1 AND username = ?2
             )",
            params![key.as_str(), username],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    fn list_grants(&self, key: &ReportKey) -> Result<Vec<AccessGrant>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT report_key, username, granted_at
             FROM report_access WHERE report_key = ?1 ORDER BY username",
        )?;

        let rows = stmt.query_map(params![key.as_str()], |row| {
            Ok(AccessGrant {
                report_key: ReportKey::from_stored(row.get(0)?),
                username: row.get(1)?,
                granted_at: parse_datetime(&row.get::<_, String>(2)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_grantees(&self, key: &ReportKey) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT u.username FROM report_access a
             JOIN users u ON u.username = a.username
             WHERE a.report_key = ?1
             ORDER BY u.username",
        )?;
        let rows = stmt.query_map(params![key.as_str()], |row| row.get(0))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_granted_keys_for(&self, username: &str) -> Result<Vec<ReportKey>> {
        let Some(username) = normalize_username(username) else {
            return Ok(Vec::new());
        };
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT report_key FROM report_access WHERE username = ?1 ORDER BY report_key",
        )?;
        let rows = stmt.query_map(params![username], |row| {
            row.get::<_, String>(0).map(ReportKey::from_stored)
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_all_report_keys(&self) -> Result<Vec<ReportKey>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT report_key FROM users
             UNION SELECT report_key FROM comments
             UNION SELECT report_key FROM archived
             ORDER BY 1",
        )?;
        let rows = stmt.query_map([], |row| {
            row.get::<_, String>(0).map(ReportKey::from_stored)
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Comment operations

    fn add_comment(&self, comment: &Comment) -> Result<()> {
        self.conn().execute(
            "INSERT INTO comments (id, report_key, track_id, milestone, signal_index, author, text, parent_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                comment.id,
                comment.report_key.as_str(),
                comment.track_id,
                comment.milestone,
                comment.signal_index,
                comment.author,
                comment.text,
                comment.parent_id,
                format_datetime(&comment.created_at),
            ],
        )?;
        Ok(())
    }

    fn list_comments(
        &self,
        key: &ReportKey,
        track_id: &str,
        milestone: i64,
        signal_index: Option<i64>,
    ) -> Result<Vec<Comment>> {
        let conn = self.conn();
        // `signal_index IS ?4` matches NULL against NULL, so milestone-level
        // queries never pick up signal comments and vice versa.
        let mut stmt = conn.prepare(
            "SELECT id, report_key, track_id, milestone, signal_index, author, text, parent_id, created_at
             FROM comments
             WHERE report_key = ?1 AND track_id = ?2 AND milestone = ?3 AND signal_index IS ?4
             ORDER BY created_at, id",
        )?;

        let rows = stmt.query_map(
            params![key.as_str(), track_id, milestone, signal_index],
            comment_from_row,
        )?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Milestone operations

    fn get_milestones(&self, key: &ReportKey) -> Result<MilestoneMap> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT track_id, milestone FROM report_milestones WHERE report_key = ?1",
        )?;
        let rows = stmt.query_map(params![key.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        rows.collect::<std::result::Result<MilestoneMap, _>>()
            .map_err(Error::from)
    }

    fn set_milestones(
        &self,
        key: &ReportKey,
        levels: &MilestoneMap,
        updated_by: &str,
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let now = format_datetime(&Utc::now());

        for (track_id, milestone) in levels {
            if track_id.trim().is_empty() {
                continue;
            }
            tx.execute(
                "INSERT INTO report_milestones (report_key, track_id, milestone, updated_at, updated_by)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (report_key, track_id) DO UPDATE SET
                    milestone = excluded.milestone,
                    updated_at = excluded.updated_at,
                    updated_by = excluded.updated_by",
                params![key.as_str(), track_id, milestone, now, updated_by],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    // Archived flag operations

    fn get_archived(&self, key: &ReportKey) -> Result<ArchivedMap> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT track_id, milestone, value FROM archived WHERE report_key = ?1",
        )?;
        let rows = stmt.query_map(params![key.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
            ))
        })?;

        let mut out = ArchivedMap::new();
        for row in rows {
            let (track_id, milestone, value) = row?;
            out.entry(track_id).or_default().insert(milestone, value);
        }
        Ok(out)
    }

    fn replace_archived(
        &self,
        key: &ReportKey,
        flags: &ArchivedMap,
        archived_by: &str,
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let now = format_datetime(&Utc::now());

        tx.execute(
            "DELETE FROM archived WHERE report_key = ?1",
            params![key.as_str()],
        )?;

        for (track_id, milestones) in flags {
            for (milestone, value) in milestones {
                tx.execute(
                    "INSERT INTO archived (report_key, track_id, milestone, value, archived_at, archived_by)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![key.as_str(), track_id, milestone, value, now, archived_by],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn set_archived_flag(
        &self,
        key: &ReportKey,
        track_id: &str,
        milestone: &str,
        value: bool,
        archived_by: &str,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT INTO archived (report_key, track_id, milestone, value, archived_at, archived_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (report_key, track_id, milestone) DO UPDATE SET
                value = excluded.value,
                archived_at = excluded.archived_at,
                archived_by = excluded.archived_by",
            params![
                key.as_str(),
                track_id,
                milestone,
                value,
                format_datetime(&Utc::now()),
                archived_by
            ],
        )?;
        Ok(())
    }
}
