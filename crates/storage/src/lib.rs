use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use medicheck_core::{ChatSession, Reminder, UrgencyTier};
use parking_lot::RwLock;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

pub trait ReminderRepository: Send + Sync {
    /// Active reminders of one user, oldest first.
    async fn list_active_reminders(&self, user_id: &str) -> Result<Vec<Reminder>>;
    async fn insert_reminder(&self, reminder: &Reminder) -> Result<()>;
    /// Soft delete. `false` when no active reminder matched.
    async fn deactivate_reminder(&self, user_id: &str, reminder_id: &str) -> Result<bool>;
}

pub trait HistoryRepository: Send + Sync {
    /// Sessions of one user, most recently updated first.
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>>;
    async fn load_session(&self, user_id: &str, session_id: &str) -> Result<Option<ChatSession>>;
    async fn upsert_session(&self, session: &ChatSession) -> Result<()>;
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    reminders: Arc<RwLock<Vec<Reminder>>>,
    sessions: Arc<RwLock<HashMap<String, ChatSession>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReminderRepository for MemoryStore {
    async fn list_active_reminders(&self, user_id: &str) -> Result<Vec<Reminder>> {
        Ok(self
            .reminders
            .read()
            .iter()
            .filter(|reminder| reminder.user_id == user_id && reminder.is_active)
            .cloned()
            .collect())
    }

    async fn insert_reminder(&self, reminder: &Reminder) -> Result<()> {
        self.reminders.write().push(reminder.clone());
        Ok(())
    }

    async fn deactivate_reminder(&self, user_id: &str, reminder_id: &str) -> Result<bool> {
        let mut guard = self.reminders.write();
        let Some(reminder) = guard.iter_mut().find(|reminder| {
            reminder.id == reminder_id && reminder.user_id == user_id && reminder.is_active
        }) else {
            return Ok(false);
        };

        reminder.is_active = false;
        Ok(true)
    }
}

impl HistoryRepository for MemoryStore {
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>> {
        let mut sessions = self
            .sessions
            .read()
            .values()
            .filter(|session| session.user_id == user_id)
            .cloned()
            .collect::<Vec<_>>();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn load_session(&self, user_id: &str, session_id: &str) -> Result<Option<ChatSession>> {
        Ok(self
            .sessions
            .read()
            .get(session_id)
            .filter(|session| session.user_id == user_id)
            .cloned())
    }

    async fn upsert_session(&self, session: &ChatSession) -> Result<()> {
        self.sessions
            .write()
            .insert(session.id.clone(), session.clone());
        Ok(())
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url {}", database_url))?
            .create_if_missing(true);

        // Every connection to a memory url opens its own empty database.
        let pool = if is_memory_url(database_url) {
            pinned_pool_options().connect_with(options).await
        } else {
            SqlitePool::connect_with(options).await
        }
        .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        Self::with_pool(pool).await
    }

    /// Private in-memory database on a single pinned connection.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reminders (
              id TEXT PRIMARY KEY,
              user_id TEXT NOT NULL,
              medicine_name TEXT NOT NULL,
              dosage TEXT NOT NULL,
              frequency TEXT NOT NULL,
              time TEXT NOT NULL,
              start_date TEXT NOT NULL,
              end_date TEXT,
              notes TEXT,
              is_active INTEGER NOT NULL,
              created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_sessions (
              id TEXT PRIMARY KEY,
              user_id TEXT NOT NULL,
              messages_json TEXT NOT NULL,
              symptom_form_json TEXT,
              risk_level TEXT NOT NULL,
              summary TEXT NOT NULL,
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn pinned_pool_options() -> SqlitePoolOptions {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .with_context(|| format!("corrupt timestamp {}", raw))
}

fn reminder_from_row(row: &SqliteRow) -> Result<Reminder> {
    Ok(Reminder {
        id: row.get("id"),
        user_id: row.get("user_id"),
        medicine_name: row.get("medicine_name"),
        dosage: row.get("dosage"),
        frequency: row.get("frequency"),
        time: row.get("time"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        notes: row.get("notes"),
        is_active: row.get::<i64, _>("is_active") != 0,
        created_at: parse_timestamp(row.get::<String, _>("created_at").as_str())?,
    })
}

fn session_from_row(row: &SqliteRow) -> Result<ChatSession> {
    let messages_json: String = row.get("messages_json");
    let symptom_form_json: Option<String> = row.get("symptom_form_json");

    Ok(ChatSession {
        id: row.get("id"),
        user_id: row.get("user_id"),
        messages: serde_json::from_str(&messages_json).context("corrupt messages_json")?,
        symptom_form: symptom_form_json
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .context("corrupt symptom_form_json")?,
        risk_level: UrgencyTier::parse(row.get::<String, _>("risk_level").as_str())
            .unwrap_or_default(),
        summary: row.get("summary"),
        created_at: parse_timestamp(row.get::<String, _>("created_at").as_str())?,
        updated_at: parse_timestamp(row.get::<String, _>("updated_at").as_str())?,
    })
}

impl ReminderRepository for SqliteStore {
    async fn list_active_reminders(&self, user_id: &str) -> Result<Vec<Reminder>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, medicine_name, dosage, frequency, time, start_date,
                   end_date, notes, is_active, created_at
            FROM reminders
            WHERE user_id = ?1 AND is_active = 1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(reminder_from_row).collect()
    }

    async fn insert_reminder(&self, reminder: &Reminder) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reminders (id, user_id, medicine_name, dosage, frequency, time,
                                   start_date, end_date, notes, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&reminder.id)
        .bind(&reminder.user_id)
        .bind(&reminder.medicine_name)
        .bind(&reminder.dosage)
        .bind(&reminder.frequency)
        .bind(&reminder.time)
        .bind(&reminder.start_date)
        .bind(&reminder.end_date)
        .bind(&reminder.notes)
        .bind(reminder.is_active as i64)
        .bind(reminder.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn deactivate_reminder(&self, user_id: &str, reminder_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE reminders SET is_active = 0 WHERE id = ?1 AND user_id = ?2 AND is_active = 1",
        )
        .bind(reminder_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl HistoryRepository for SqliteStore {
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, messages_json, symptom_form_json, risk_level, summary,
                   created_at, updated_at
            FROM chat_sessions
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut sessions = rows
            .iter()
            .map(session_from_row)
            .collect::<Result<Vec<_>>>()?;
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn load_session(&self, user_id: &str, session_id: &str) -> Result<Option<ChatSession>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, messages_json, symptom_form_json, risk_level, summary,
                   created_at, updated_at
            FROM chat_sessions
            WHERE id = ?1 AND user_id = ?2
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn upsert_session(&self, session: &ChatSession) -> Result<()> {
        let messages_json = serde_json::to_string(&session.messages)?;
        let symptom_form_json = session
            .symptom_form
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO chat_sessions (id, user_id, messages_json, symptom_form_json,
                                       risk_level, summary, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
              user_id=excluded.user_id,
              messages_json=excluded.messages_json,
              symptom_form_json=excluded.symptom_form_json,
              risk_level=excluded.risk_level,
              summary=excluded.summary,
              updated_at=excluded.updated_at
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(messages_json)
        .bind(symptom_form_json)
        .bind(session.risk_level.as_str())
        .bind(&session.summary)
        .bind(session.created_at.to_rfc3339())
        .bind(session.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteStore::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Sqlite(_) => "sqlite",
        }
    }
}

impl ReminderRepository for Store {
    async fn list_active_reminders(&self, user_id: &str) -> Result<Vec<Reminder>> {
        match self {
            Store::Memory(store) => store.list_active_reminders(user_id).await,
            Store::Sqlite(store) => store.list_active_reminders(user_id).await,
        }
    }

    async fn insert_reminder(&self, reminder: &Reminder) -> Result<()> {
        match self {
            Store::Memory(store) => store.insert_reminder(reminder).await,
            Store::Sqlite(store) => store.insert_reminder(reminder).await,
        }
    }

    async fn deactivate_reminder(&self, user_id: &str, reminder_id: &str) -> Result<bool> {
        match self {
            Store::Memory(store) => store.deactivate_reminder(user_id, reminder_id).await,
            Store::Sqlite(store) => store.deactivate_reminder(user_id, reminder_id).await,
        }
    }
}

impl HistoryRepository for Store {
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>> {
        match self {
            Store::Memory(store) => store.list_sessions(user_id).await,
            Store::Sqlite(store) => store.list_sessions(user_id).await,
        }
    }

    async fn load_session(&self, user_id: &str, session_id: &str) -> Result<Option<ChatSession>> {
        match self {
            Store::Memory(store) => store.load_session(user_id, session_id).await,
            Store::Sqlite(store) => store.load_session(user_id, session_id).await,
        }
    }

    async fn upsert_session(&self, session: &ChatSession) -> Result<()> {
        match self {
            Store::Memory(store) => store.upsert_session(session).await,
            Store::Sqlite(store) => store.upsert_session(session).await,
        }
    }
}
