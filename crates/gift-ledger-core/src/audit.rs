// crates/gift-ledger-core/src/audit.rs
// ============================================================================
// Module: Gift Ledger Audit Logging
// Description: Structured audit events for ledger writes and batch migrations.
// Purpose: Emit JSON-line operational logs without hard dependencies.
// Dependencies: crate::core, serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines audit payloads and sinks for ledger activity. Payloads
//! carry kinds, counts, and key ranges only; event parameters (emails, notes,
//! balances) are never written to the audit stream. Deployments route events
//! to stderr, a JSON-lines file, or discard them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;

use crate::core::EventActor;
use crate::core::GiftCardEventKind;
use crate::core::Timestamp;
use crate::interfaces::RowKey;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Audit payload for one ledger write call.
#[derive(Debug, Clone, Serialize)]
pub struct EventWriteAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: i64,
    /// Gift card event kind written.
    pub kind: GiftCardEventKind,
    /// Number of events written by the call.
    pub count: usize,
    /// Whether the call used the batched insert path.
    pub batched: bool,
    /// Stored actor label.
    pub actor: &'static str,
    /// Whether a supplied user was dropped by actor normalization.
    pub user_dropped: bool,
}

/// Inputs required to construct an event write audit event.
pub struct EventWriteAuditParams {
    /// Gift card event kind written.
    pub kind: GiftCardEventKind,
    /// Number of events written by the call.
    pub count: usize,
    /// Whether the call used the batched insert path.
    pub batched: bool,
    /// Stored actor.
    pub actor: EventActor,
    /// Whether a supplied user was dropped by actor normalization.
    pub user_dropped: bool,
}

impl EventWriteAuditEvent {
    /// Creates a new event write audit payload with a consistent timestamp.
    #[must_use]
    pub fn new(params: EventWriteAuditParams) -> Self {
        Self {
            event: "gift_card_events_written",
            timestamp_ms: Timestamp::now().as_unix_millis(),
            kind: params.kind,
            count: params.count,
            batched: params.batched,
            actor: actor_label(params.actor),
            user_dropped: params.user_dropped,
        }
    }
}

/// Audit payload for one processed migration page.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationPageAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: i64,
    /// Migration name.
    pub migration: String,
    /// Zero-based page index.
    pub page: usize,
    /// Number of keys in the page.
    pub rows: usize,
    /// Smallest key in the page.
    pub first_key: RowKey,
    /// Largest key in the page (the next cursor).
    pub last_key: RowKey,
    /// Rows reported changed by the update.
    pub updated: usize,
}

impl MigrationPageAuditEvent {
    /// Creates a new page audit payload with a consistent timestamp.
    #[must_use]
    pub fn new(
        migration: &str,
        page: usize,
        rows: usize,
        keys: (RowKey, RowKey),
        updated: usize,
    ) -> Self {
        Self {
            event: "migration_page",
            timestamp_ms: Timestamp::now().as_unix_millis(),
            migration: migration.to_string(),
            page,
            rows,
            first_key: keys.0,
            last_key: keys.1,
            updated,
        }
    }
}

/// Audit payload for a finished migration.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: i64,
    /// Migration name.
    pub migration: String,
    /// Non-empty pages processed.
    pub pages: usize,
    /// Keys visited.
    pub rows: usize,
    /// Rows reported changed.
    pub updated: usize,
}

impl MigrationAuditEvent {
    /// Creates a new migration audit payload with a consistent timestamp.
    #[must_use]
    pub fn new(migration: &str, pages: usize, rows: usize, updated: usize) -> Self {
        Self {
            event: "migration_complete",
            timestamp_ms: Timestamp::now().as_unix_millis(),
            migration: migration.to_string(),
            pages,
            rows,
            updated,
        }
    }
}

/// Returns the audit label for a stored actor.
const fn actor_label(actor: EventActor) -> &'static str {
    match actor {
        EventActor::None => "none",
        EventActor::User {
            ..
        } => "user",
        EventActor::App {
            ..
        } => "app",
        EventActor::UserViaApp {
            ..
        } => "user_via_app",
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for ledger activity.
pub trait LedgerAuditSink: Send + Sync {
    /// Records a ledger write.
    fn record_event_write(&self, event: &EventWriteAuditEvent);

    /// Records a processed migration page.
    fn record_migration_page(&self, _event: &MigrationPageAuditEvent) {}

    /// Records a finished migration.
    fn record_migration(&self, _event: &MigrationAuditEvent) {}
}

/// Audit sink that discards every event.
pub struct NoopAuditSink;

impl LedgerAuditSink for NoopAuditSink {
    fn record_event_write(&self, _event: &EventWriteAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl StderrAuditSink {
    /// Writes one payload as a JSON line to stderr.
    fn emit<T: Serialize>(payload: &T) {
        if let Ok(line) = serde_json::to_string(payload) {
            let _ = writeln!(io::stderr(), "{line}");
        }
    }
}

impl LedgerAuditSink for StderrAuditSink {
    fn record_event_write(&self, event: &EventWriteAuditEvent) {
        Self::emit(event);
    }

    fn record_migration_page(&self, event: &MigrationPageAuditEvent) {
        Self::emit(event);
    }

    fn record_migration(&self, event: &MigrationAuditEvent) {
        Self::emit(event);
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one payload as a JSON line and flushes.
    fn emit<T: Serialize>(&self, payload: &T) {
        if let Ok(line) = serde_json::to_string(payload)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{line}");
            let _ = file.flush();
        }
    }
}

impl LedgerAuditSink for FileAuditSink {
    fn record_event_write(&self, event: &EventWriteAuditEvent) {
        self.emit(event);
    }

    fn record_migration_page(&self, event: &MigrationPageAuditEvent) {
        self.emit(event);
    }

    fn record_migration(&self, event: &MigrationAuditEvent) {
        self.emit(event);
    }
}
