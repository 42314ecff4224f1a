// crates/gift-ledger-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Ledger Store
// Description: Durable gift card event ledger and user account table on SQLite.
// Purpose: Persist append-only events and serve primary-key paged backfills.
// Dependencies: gift-ledger-core, rand, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements [`EventStore`] and [`UserAccountStore`] on `SQLite`.
//! Events are stored one row per event with the kind label and the JSON
//! parameter mapping in separate columns; loads rebuild the typed payload and
//! fail closed when a row does not match its kind.
//!
//! Batched inserts run in a single transaction. Each backfill page update runs
//! in its own transaction so an interrupted migration keeps earlier pages.
//! Security posture: database contents are untrusted on load.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use gift_ledger_core::Amount;
use gift_ledger_core::AppId;
use gift_ledger_core::Currency;
use gift_ledger_core::EventActor;
use gift_ledger_core::EventId;
use gift_ledger_core::EventPayload;
use gift_ledger_core::EventStore;
use gift_ledger_core::GiftCard;
use gift_ledger_core::GiftCardEvent;
use gift_ledger_core::GiftCardEventKind;
use gift_ledger_core::GiftCardId;
use gift_ledger_core::NewGiftCardEvent;
use gift_ledger_core::RowKey;
use gift_ledger_core::StoreError;
use gift_ledger_core::Timestamp;
use gift_ledger_core::UserAccount;
use gift_ledger_core::UserAccountStore;
use gift_ledger_core::UserId;
use gift_ledger_core::core::temporal::format_date;
use gift_ledger_core::core::temporal::parse_date;
use rand::Rng;
use rand::distributions::Alphanumeric;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::params;
use rusqlite::params_from_iter;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the base tables.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Length of a per-user token signing key.
pub const JWT_TOKEN_KEY_LENGTH: usize = 12;
/// Column added to `users` by the token key migration.
pub(crate) const JWT_TOKEN_KEY_COLUMN: &str = "jwt_token_key";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` ledger store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a configuration for `path` with default pragmas.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` ledger store errors.
///
/// # Invariants
/// - Error messages avoid embedding event parameters.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// A foreign key, uniqueness, or check constraint rejected the write.
    #[error("sqlite store constraint violation: {0}")]
    Constraint(String),
    /// Stored row does not decode.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store input.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Constraint(message) => Self::Constraint(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps a `rusqlite` error, separating constraint violations.
pub(crate) fn db_error(err: &rusqlite::Error) -> SqliteStoreError {
    if err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
        SqliteStoreError::Constraint(err.to_string())
    } else {
        SqliteStoreError::Db(err.to_string())
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// User account to insert; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserAccount {
    /// Login email.
    pub email: String,
    /// Whether the account may sign in.
    pub is_active: bool,
    /// Whether the email address has been confirmed.
    pub is_confirmed: bool,
    /// Most recent login, if any.
    pub last_login: Option<Timestamp>,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed gift card ledger store.
///
/// # Invariants
/// - `SQLite` connection access is serialized through a mutex.
/// - Event rows are never updated or deleted by this store.
#[derive(Clone)]
pub struct SqliteLedgerStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteLedgerStore {
    /// Opens an `SQLite` ledger store and creates the base schema.
    ///
    /// Data migrations are not applied here; see [`crate::migrations`].
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns the database path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Runs `f` with exclusive access to the connection.
    pub(crate) fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite mutex poisoned".to_string()))?;
        f(&mut guard)
    }

    /// Verifies the store can execute a simple SQL statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the mutex is poisoned or the query fails.
    pub fn readiness(&self) -> Result<(), SqliteStoreError> {
        self.with_connection(|connection| {
            connection
                .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map(|_| ())
                .map_err(|err| db_error(&err))
        })
    }

    // ------------------------------------------------------------------------
    // Gift cards
    // ------------------------------------------------------------------------

    /// Inserts a gift card row.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the id or code already exists.
    pub fn insert_gift_card(&self, card: &GiftCard) -> Result<(), SqliteStoreError> {
        let expiry = card
            .expiry_date
            .map(format_date)
            .transpose()
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        let id = to_sql_key(card.id.get())?;
        self.with_connection(|connection| {
            connection
                .execute(
                    "INSERT INTO gift_cards (id, code, currency, initial_balance, \
                     current_balance, expiry_date, tag, is_active, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        id,
                        card.code,
                        card.currency.as_str(),
                        card.initial_balance.to_string(),
                        card.current_balance.to_string(),
                        expiry,
                        card.tag,
                        card.is_active,
                        Timestamp::now().as_unix_millis(),
                    ],
                )
                .map(|_| ())
                .map_err(|err| db_error(&err))
        })
    }

    /// Loads a gift card row.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails or the row is corrupt.
    pub fn load_gift_card(&self, id: GiftCardId) -> Result<Option<GiftCard>, SqliteStoreError> {
        let key = to_sql_key(id.get())?;
        let row = self.with_connection(|connection| {
            connection
                .query_row(
                    "SELECT code, currency, initial_balance, current_balance, expiry_date, tag, \
                     is_active FROM gift_cards WHERE id = ?1",
                    params![key],
                    |row| {
                        Ok(GiftCardRow {
                            code: row.get(0)?,
                            currency: row.get(1)?,
                            initial_balance: row.get(2)?,
                            current_balance: row.get(3)?,
                            expiry_date: row.get(4)?,
                            tag: row.get(5)?,
                            is_active: row.get(6)?,
                        })
                    },
                )
                .optional()
                .map_err(|err| db_error(&err))
        })?;
        row.map(|row| row.into_gift_card(id)).transpose()
    }

    // ------------------------------------------------------------------------
    // Apps
    // ------------------------------------------------------------------------

    /// Inserts an app and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the insert fails.
    pub fn insert_app(&self, name: &str, is_active: bool) -> Result<AppId, SqliteStoreError> {
        let raw = self.with_connection(|connection| {
            connection
                .execute("INSERT INTO apps (name, is_active) VALUES (?1, ?2)", params![
                    name, is_active
                ])
                .map_err(|err| db_error(&err))?;
            Ok(connection.last_insert_rowid())
        })?;
        AppId::from_raw(from_sql_key(raw)?)
            .ok_or_else(|| SqliteStoreError::Corrupt("app id must be non-zero".to_string()))
    }

    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    /// Inserts a user account and returns the stored record.
    ///
    /// Once the token key column exists, every new account receives a fresh
    /// random key.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the insert fails.
    pub fn insert_user(&self, user: &NewUserAccount) -> Result<UserAccount, SqliteStoreError> {
        let last_login = user.last_login.map(Timestamp::as_unix_millis);
        let (raw_id, jwt_token_key) = self.with_connection(|connection| {
            let jwt_token_key = if has_column(connection, "users", JWT_TOKEN_KEY_COLUMN)? {
                Some(generate_token_key())
            } else {
                None
            };
            let inserted = match &jwt_token_key {
                Some(key) => connection.execute(
                    "INSERT INTO users (email, is_active, is_confirmed, last_login, \
                     jwt_token_key) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![user.email, user.is_active, user.is_confirmed, last_login, key],
                ),
                None => connection.execute(
                    "INSERT INTO users (email, is_active, is_confirmed, last_login) VALUES (?1, \
                     ?2, ?3, ?4)",
                    params![user.email, user.is_active, user.is_confirmed, last_login],
                ),
            };
            inserted.map_err(|err| db_error(&err))?;
            Ok((connection.last_insert_rowid(), jwt_token_key))
        })?;
        let id = UserId::from_raw(from_sql_key(raw_id)?)
            .ok_or_else(|| SqliteStoreError::Corrupt("user id must be non-zero".to_string()))?;
        Ok(UserAccount {
            id,
            email: user.email.clone(),
            is_active: user.is_active,
            is_confirmed: user.is_confirmed,
            last_login: user.last_login,
            jwt_token_key,
        })
    }

    /// Loads a user account.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn load_user(&self, id: UserId) -> Result<Option<UserAccount>, SqliteStoreError> {
        let key = to_sql_key(id.get())?;
        self.with_connection(|connection| {
            let with_key = has_column(connection, "users", JWT_TOKEN_KEY_COLUMN)?;
            let sql = if with_key {
                "SELECT email, is_active, is_confirmed, last_login, jwt_token_key FROM users \
                 WHERE id = ?1"
            } else {
                "SELECT email, is_active, is_confirmed, last_login, NULL FROM users WHERE id = ?1"
            };
            connection
                .query_row(sql, params![key], |row| {
                    Ok(UserAccount {
                        id,
                        email: row.get(0)?,
                        is_active: row.get(1)?,
                        is_confirmed: row.get(2)?,
                        last_login: row.get::<_, Option<i64>>(3)?.map(Timestamp::from_unix_millis),
                        jwt_token_key: row.get(4)?,
                    })
                })
                .optional()
                .map_err(|err| db_error(&err))
        })
    }
}

// ============================================================================
// SECTION: Event Store
// ============================================================================

impl EventStore for SqliteLedgerStore {
    fn insert(&self, event: NewGiftCardEvent) -> Result<GiftCardEvent, StoreError> {
        let prepared = PreparedEvent::new(&event)?;
        let stored = self.with_connection(|connection| {
            let tx = connection.transaction().map_err(|err| db_error(&err))?;
            let id = insert_event_in_tx(&tx, &prepared)?;
            tx.commit().map_err(|err| db_error(&err))?;
            Ok(id)
        })?;
        Ok(GiftCardEvent::from_new(stored, event, prepared.created_at))
    }

    fn insert_batch(
        &self,
        events: Vec<NewGiftCardEvent>,
    ) -> Result<Vec<GiftCardEvent>, StoreError> {
        let prepared =
            events.iter().map(PreparedEvent::new).collect::<Result<Vec<_>, SqliteStoreError>>()?;
        let ids = self.with_connection(|connection| {
            let tx = connection.transaction().map_err(|err| db_error(&err))?;
            let mut ids = Vec::with_capacity(prepared.len());
            for row in &prepared {
                ids.push(insert_event_in_tx(&tx, row)?);
            }
            tx.commit().map_err(|err| db_error(&err))?;
            Ok(ids)
        })?;
        Ok(events
            .into_iter()
            .zip(ids)
            .zip(prepared)
            .map(|((event, id), row)| GiftCardEvent::from_new(id, event, row.created_at))
            .collect())
    }

    fn events_for_gift_card(
        &self,
        gift_card_id: GiftCardId,
    ) -> Result<Vec<GiftCardEvent>, StoreError> {
        let key = to_sql_key(gift_card_id.get())?;
        let rows = self.with_connection(|connection| {
            let mut statement = connection
                .prepare(
                    "SELECT id, user_id, app_id, kind, parameters, created_at
                     FROM gift_card_events WHERE gift_card_id = ?1 ORDER BY id ASC",
                )
                .map_err(|err| db_error(&err))?;
            let rows = statement
                .query_map(params![key], |row| {
                    Ok(EventRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        app_id: row.get(2)?,
                        kind: row.get(3)?,
                        parameters: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })
                .map_err(|err| db_error(&err))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| db_error(&err))?;
            Ok(rows)
        })?;
        rows.into_iter()
            .map(|row| row.into_event(gift_card_id).map_err(StoreError::from))
            .collect()
    }
}

// ============================================================================
// SECTION: User Account Store
// ============================================================================

impl UserAccountStore for SqliteLedgerStore {
    fn confirmation_candidates_after(
        &self,
        after: RowKey,
        limit: usize,
    ) -> Result<Vec<RowKey>, StoreError> {
        let after = to_sql_key(after)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let keys = self.with_connection(|connection| {
            select_keys(
                connection,
                "SELECT id FROM users
                 WHERE is_confirmed = 0 AND is_active = 1 AND last_login IS NOT NULL AND id > ?1
                 ORDER BY id ASC LIMIT ?2",
                after,
                limit,
            )
        })?;
        Ok(keys)
    }

    fn confirm_users(&self, ids: &[RowKey]) -> Result<usize, StoreError> {
        let keys = ids.iter().map(|id| to_sql_key(*id)).collect::<Result<Vec<_>, _>>()?;
        let changed = self.with_connection(|connection| {
            let tx = connection.transaction().map_err(|err| db_error(&err))?;
            let mut changed = 0;
            for chunk in keys.chunks(MAX_BOUND_KEYS) {
                let sql = format!(
                    "UPDATE users SET is_confirmed = 1 WHERE is_confirmed = 0 AND id IN ({})",
                    placeholders(chunk.len())
                );
                changed += tx
                    .execute(&sql, params_from_iter(chunk.iter()))
                    .map_err(|err| db_error(&err))?;
            }
            tx.commit().map_err(|err| db_error(&err))?;
            Ok(changed)
        })?;
        Ok(changed)
    }
}

// ============================================================================
// SECTION: Paging Helpers
// ============================================================================

/// Runs a `(cursor, limit)` key query and returns the keys in row order.
pub(crate) fn select_keys(
    connection: &Connection,
    sql: &str,
    after: i64,
    limit: i64,
) -> Result<Vec<RowKey>, SqliteStoreError> {
    let mut statement = connection.prepare(sql).map_err(|err| db_error(&err))?;
    let raw = statement
        .query_map(params![after, limit], |row| row.get::<_, i64>(0))
        .map_err(|err| db_error(&err))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| db_error(&err))?;
    raw.into_iter().map(from_sql_key).collect()
}

/// Upper bound on keys bound into one `IN (...)` list.
const MAX_BOUND_KEYS: usize = 10_000;

/// Builds `count` comma-separated positional placeholders.
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Applies `update` to every key inside one transaction and sums rows changed.
pub(crate) fn update_each(
    connection: &mut Connection,
    keys: &[RowKey],
    mut update: impl FnMut(&Transaction<'_>, i64) -> Result<usize, SqliteStoreError>,
) -> Result<usize, SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| db_error(&err))?;
    let mut changed = 0;
    for key in keys {
        changed += update(&tx, to_sql_key(*key)?)?;
    }
    tx.commit().map_err(|err| db_error(&err))?;
    Ok(changed)
}

/// Converts a row key to an `SQLite` integer.
pub(crate) fn to_sql_key(key: u64) -> Result<i64, SqliteStoreError> {
    i64::try_from(key).map_err(|_| SqliteStoreError::Invalid(format!("key out of range: {key}")))
}

/// Converts an `SQLite` integer to a row key.
pub(crate) fn from_sql_key(raw: i64) -> Result<u64, SqliteStoreError> {
    u64::try_from(raw).map_err(|_| SqliteStoreError::Corrupt(format!("negative key: {raw}")))
}

/// Returns a fresh random alphanumeric token key.
pub(crate) fn generate_token_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(JWT_TOKEN_KEY_LENGTH)
        .map(char::from)
        .collect()
}

/// Returns true when `table` has a column named `column`.
pub(crate) fn has_column(
    connection: &Connection,
    table: &str,
    column: &str,
) -> Result<bool, SqliteStoreError> {
    let mut statement = connection
        .prepare(&format!("PRAGMA table_info({table})"))
        .map_err(|err| db_error(&err))?;
    let names = statement
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|err| db_error(&err))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| db_error(&err))?;
    Ok(names.iter().any(|name| name == column))
}

// ============================================================================
// SECTION: Event Rows
// ============================================================================

/// Event columns ready for insertion.
struct PreparedEvent {
    /// Gift card key.
    gift_card_id: i64,
    /// Attributed user key.
    user_id: Option<i64>,
    /// Attributed app key.
    app_id: Option<i64>,
    /// Kind label.
    kind: &'static str,
    /// Parameter mapping as JSON text.
    parameters: String,
    /// Creation time.
    created_at: Timestamp,
}

impl PreparedEvent {
    /// Renders an insert request into column values.
    fn new(event: &NewGiftCardEvent) -> Result<Self, SqliteStoreError> {
        let parameters = event
            .payload
            .parameters()
            .and_then(|value| serde_json::to_string(&value))
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        Ok(Self {
            gift_card_id: to_sql_key(event.gift_card_id.get())?,
            user_id: event.actor.user().map(|id| to_sql_key(id.get())).transpose()?,
            app_id: event.actor.app().map(|id| to_sql_key(id.get())).transpose()?,
            kind: event.kind().as_str(),
            parameters,
            created_at: Timestamp::now(),
        })
    }
}

/// Inserts one prepared event and returns its id.
fn insert_event_in_tx(
    tx: &Transaction<'_>,
    event: &PreparedEvent,
) -> Result<EventId, SqliteStoreError> {
    tx.execute(
        "INSERT INTO gift_card_events (gift_card_id, user_id, app_id, kind, parameters, \
         created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            event.gift_card_id,
            event.user_id,
            event.app_id,
            event.kind,
            event.parameters,
            event.created_at.as_unix_millis(),
        ],
    )
    .map_err(|err| db_error(&err))?;
    EventId::from_raw(from_sql_key(tx.last_insert_rowid())?)
        .ok_or_else(|| SqliteStoreError::Corrupt("event id must be non-zero".to_string()))
}

/// Raw event columns as loaded.
struct EventRow {
    /// Event id.
    id: i64,
    /// Attributed user key.
    user_id: Option<i64>,
    /// Attributed app key.
    app_id: Option<i64>,
    /// Kind label.
    kind: String,
    /// Parameter mapping as JSON text.
    parameters: String,
    /// Creation time (unix ms).
    created_at: i64,
}

impl EventRow {
    /// Decodes the row, failing closed on unknown kinds or mismatched parameters.
    fn into_event(self, gift_card_id: GiftCardId) -> Result<GiftCardEvent, SqliteStoreError> {
        let id = EventId::from_raw(from_sql_key(self.id)?)
            .ok_or_else(|| SqliteStoreError::Corrupt("event id must be non-zero".to_string()))?;
        let kind = GiftCardEventKind::parse(&self.kind).ok_or_else(|| {
            SqliteStoreError::Corrupt(format!("event {id} has unknown kind {}", self.kind))
        })?;
        let parameters: serde_json::Value = serde_json::from_str(&self.parameters)
            .map_err(|err| SqliteStoreError::Corrupt(format!("event {id} parameters: {err}")))?;
        let payload = EventPayload::from_parameters(kind, parameters)
            .map_err(|err| SqliteStoreError::Corrupt(format!("event {id} parameters: {err}")))?;
        let user = self.user_id.map(from_sql_key).transpose()?.and_then(UserId::from_raw);
        let app = self.app_id.map(from_sql_key).transpose()?.and_then(AppId::from_raw);
        Ok(GiftCardEvent {
            id,
            gift_card_id,
            actor: EventActor::from_parts(user, app),
            payload,
            created_at: Timestamp::from_unix_millis(self.created_at),
        })
    }
}

/// Raw gift card columns as loaded.
struct GiftCardRow {
    /// Redeemable code.
    code: String,
    /// Currency code.
    currency: String,
    /// Initial balance as decimal text.
    initial_balance: String,
    /// Current balance as decimal text.
    current_balance: String,
    /// Expiry date as `YYYY-MM-DD`.
    expiry_date: Option<String>,
    /// Tag.
    tag: Option<String>,
    /// Active flag.
    is_active: bool,
}

impl GiftCardRow {
    /// Decodes the row into a snapshot.
    fn into_gift_card(self, id: GiftCardId) -> Result<GiftCard, SqliteStoreError> {
        let corrupt = |err: String| SqliteStoreError::Corrupt(format!("gift card {id}: {err}"));
        Ok(GiftCard {
            id,
            code: self.code,
            currency: Currency::new(self.currency),
            initial_balance: Amount::parse(&self.initial_balance)
                .map_err(|err| corrupt(err.to_string()))?,
            current_balance: Amount::parse(&self.current_balance)
                .map_err(|err| corrupt(err.to_string()))?,
            expiry_date: self
                .expiry_date
                .as_deref()
                .map(parse_date)
                .transpose()
                .map_err(|err| corrupt(err.to_string()))?,
            tag: self.tag,
            is_active: self.is_active,
        })
    }
}

// ============================================================================
// SECTION: Connection Setup
// ============================================================================

/// Ensures the parent directory exists for the store path.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    email TEXT NOT NULL UNIQUE,
                    is_active INTEGER NOT NULL,
                    is_confirmed INTEGER NOT NULL,
                    last_login INTEGER
                );
                CREATE TABLE IF NOT EXISTS apps (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    is_active INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS gift_cards (
                    id INTEGER PRIMARY KEY,
                    code TEXT NOT NULL UNIQUE,
                    currency TEXT NOT NULL,
                    initial_balance TEXT NOT NULL,
                    current_balance TEXT NOT NULL,
                    expiry_date TEXT,
                    tag TEXT,
                    is_active INTEGER NOT NULL,
                    created_at INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS gift_card_events (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    gift_card_id INTEGER NOT NULL
                        REFERENCES gift_cards(id) ON DELETE CASCADE,
                    user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
                    app_id INTEGER REFERENCES apps(id) ON DELETE SET NULL,
                    kind TEXT NOT NULL,
                    parameters TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_gift_card_events_card
                    ON gift_card_events (gift_card_id, id);
                CREATE TABLE IF NOT EXISTS applied_migrations (
                    name TEXT PRIMARY KEY,
                    applied_at INTEGER NOT NULL
                );",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}
