use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::{Store, TokenLoad};
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
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests and ephemeral deployments.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

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

fn parse_metadata(s: &str) -> Metadata {
    serde_json::from_str(s).unwrap_or_else(|e| {
        tracing::error!("Invalid metadata JSON in database: '{}' - {}", s, e);
        Metadata::new()
    })
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        image_url: row.get(3)?,
        hashed_password: row.get(4)?,
        max_concurrent_meetings: row.get(5)?,
        data: parse_metadata(&row.get::<_, String>(6)?),
        created_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

fn token_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ApiToken> {
    Ok(ApiToken {
        id: row.get(0)?,
        token: row.get(1)?,
        user_id: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

// Helpers take a bare connection so find_or_create_user can run them inside
// a transaction.

fn query_user(conn: &Connection, id: i64) -> Result<Option<User>> {
    conn.query_row(
        "SELECT id, email, name, image_url, hashed_password, max_concurrent_meetings, data, created_at
         FROM users WHERE id = ?1",
        params![id],
        user_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    conn.query_row(
        "SELECT id, email, name, image_url, hashed_password, max_concurrent_meetings, data, created_at
         FROM users WHERE email = ?1",
        params![email],
        user_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn insert_user(conn: &Connection, new: &NewUser) -> Result<User> {
    let created_at = Utc::now();
    let result = conn.execute(
        "INSERT INTO users (email, name, image_url, hashed_password, max_concurrent_meetings, data, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            new.email,
            new.name,
            new.image_url,
            new.hashed_password,
            new.max_concurrent_meetings,
            serde_json::to_string(&new.data)?,
            format_datetime(&created_at),
        ],
    );

    match result {
        Ok(_) => Ok(User {
            id: conn.last_insert_rowid(),
            email: new.email.clone(),
            name: new.name.clone(),
            image_url: new.image_url.clone(),
            hashed_password: new.hashed_password.clone(),
            max_concurrent_meetings: new.max_concurrent_meetings,
            data: new.data.clone(),
            created_at,
        }),
        Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
        Err(e) => Err(Error::from(e)),
    }
}

fn query_user_tokens(conn: &Connection, user_id: i64) -> Result<Vec<ApiToken>> {
    let mut stmt = conn.prepare(
        "SELECT id, token, user_id, created_at
         FROM api_tokens WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
    )?;

    let rows = stmt.query_map(params![user_id], token_from_row)?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, new: &NewUser) -> Result<User> {
        insert_user(&self.conn(), new)
    }

    fn find_or_create_user(&self, new: &NewUser) -> Result<(User, bool)> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if let Some(user) = query_user_by_email(&tx, &new.email)? {
            tx.commit()?;
            return Ok((user, false));
        }

        match insert_user(&tx, new) {
            Ok(user) => {
                tx.commit()?;
                Ok((user, true))
            }
            // A concurrent writer won the unique-email race; hand back its row.
            Err(Error::AlreadyExists) => {
                let user = query_user_by_email(&tx, &new.email)?.ok_or(Error::NotFound)?;
                tx.commit()?;
                Ok((user, false))
            }
            Err(e) => Err(e),
        }
    }

    fn get_user(&self, id: i64, tokens: TokenLoad) -> Result<Option<UserDetail>> {
        let conn = self.conn();

        let Some(user) = query_user(&conn, id)? else {
            return Ok(None);
        };

        let api_tokens = match tokens {
            TokenLoad::Skip => None,
            TokenLoad::Include => Some(query_user_tokens(&conn, user.id)?),
        };

        Ok(Some(UserDetail { user, api_tokens }))
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        query_user_by_email(&self.conn(), email)
    }

    fn list_users(&self, cursor: i64, limit: i64) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, email, name, image_url, hashed_password, max_concurrent_meetings, data, created_at
             FROM users WHERE id > ?1 ORDER BY id LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![cursor, limit], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_user(&self, user: &User) -> Result<()> {
        // Email is identity and stays out of the SET list.
        let rows = self.conn().execute(
            "UPDATE users SET name = ?1, image_url = ?2, hashed_password = ?3,
             max_concurrent_meetings = ?4, data = ?5 WHERE id = ?6",
            params![
                user.name,
                user.image_url,
                user.hashed_password,
                user.max_concurrent_meetings,
                serde_json::to_string(&user.data)?,
                user.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // Token operations

    fn create_token(&self, new: &NewToken) -> Result<ApiToken> {
        let conn = self.conn();
        let created_at = Utc::now();
        let result = conn.execute(
            "INSERT INTO api_tokens (token, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![new.token, new.user_id, format_datetime(&created_at)],
        );

        match result {
            Ok(_) => Ok(ApiToken {
                id: conn.last_insert_rowid(),
                token: new.token.clone(),
                user_id: new.user_id,
                created_at,
            }),
            Err(e) if is_constraint_violation(&e) => Err(Error::TokenCollision),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_token_by_id(&self, id: i64) -> Result<Option<ApiToken>> {
        self.conn()
            .query_row(
                "SELECT id, token, user_id, created_at FROM api_tokens WHERE id = ?1",
                params![id],
                token_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_token_by_value(&self, token: &str) -> Result<Option<ApiToken>> {
        self.conn()
            .query_row(
                "SELECT id, token, user_id, created_at FROM api_tokens WHERE token = ?1",
                params![token],
                token_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_user_tokens(&self, user_id: i64) -> Result<Vec<ApiToken>> {
        query_user_tokens(&self.conn(), user_id)
    }

    fn delete_token(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM api_tokens WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Meeting operations

    fn create_meeting(&self, new: &NewMeeting) -> Result<Meeting> {
        let conn = self.conn();
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO meetings (user_id, platform, native_meeting_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new.user_id,
                new.platform,
                new.native_meeting_id,
                new.status.as_str(),
                format_datetime(&created_at),
            ],
        )?;

        Ok(Meeting {
            id: conn.last_insert_rowid(),
            user_id: new.user_id,
            platform: new.platform.clone(),
            native_meeting_id: new.native_meeting_id.clone(),
            status: new.status,
            created_at,
        })
    }

    fn count_user_meetings(&self, user_id: i64) -> Result<MeetingCounts> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT status, COUNT(*) FROM meetings WHERE user_id = ?1 GROUP BY status")?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = MeetingCounts::default();
        for row in rows {
            let (status, n) = row?;
            counts.total += n;
            match MeetingStatus::parse(&status) {
                Some(MeetingStatus::Requested) => counts.by_status.requested = n,
                Some(MeetingStatus::Active) => counts.by_status.active = n,
                Some(MeetingStatus::Stopping) => counts.by_status.stopping = n,
                Some(MeetingStatus::Completed) => counts.by_status.completed = n,
                Some(MeetingStatus::Failed) => counts.by_status.failed = n,
                None => tracing::error!("Unknown meeting status in database: '{}'", status),
            }
        }

        Ok(counts)
    }

    fn list_meetings_with_users(&self, cursor: i64, limit: i64) -> Result<Vec<MeetingWithUser>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT m.id, m.user_id, m.platform, m.native_meeting_id, m.status, m.created_at,
                    u.id, u.email, u.name, u.image_url, u.hashed_password,
                    u.max_concurrent_meetings, u.data, u.created_at
             FROM meetings m JOIN users u ON u.id = m.user_id
             WHERE m.id < ?1 ORDER BY m.id DESC LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![cursor, limit], |row| {
            Ok(MeetingWithUser {
                meeting: Meeting {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    platform: row.get(2)?,
                    native_meeting_id: row.get(3)?,
                    status: MeetingStatus::parse(&row.get::<_, String>(4)?).unwrap_or_else(|| {
                        tracing::error!("Unknown meeting status in database");
                        MeetingStatus::Failed
                    }),
                    created_at: parse_datetime(&row.get::<_, String>(5)?),
                },
                user: User {
                    id: row.get(6)?,
                    email: row.get(7)?,
                    name: row.get(8)?,
                    image_url: row.get(9)?,
                    hashed_password: row.get(10)?,
                    max_concurrent_meetings: row.get(11)?,
                    data: parse_metadata(&row.get::<_, String>(12)?),
                    created_at: parse_datetime(&row.get::<_, String>(13)?),
                },
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }
}
