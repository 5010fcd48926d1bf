//! SQLite-backed implementation of the store collaborator traits.
//!
//! The database is a plain file opened through rusqlite. One row per
//! protocol entry, addressed by `(protocol_id, position)` where
//! `position` is insertion order; deletions close the positional gap so
//! index addressing stays dense.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{ProtocolError, Result};
use crate::fingerprint::Fingerprint;
use crate::model::{
    Client, Entry, EntryDraft, Protocol, ProtocolSnapshot, QueueKind,
};
use crate::signature::{Leg, SignatureImage, SignatureParty};
use crate::tools::ToolCatalog;

use super::traits::{DocumentStore, ProtocolStore};
use super::types::{
    filter_tools, EntryPatch, ReturnUpdate, SignQueueItem, SignatureWrite, StoreMetadata,
};

mod row;

use row::{delivery_code, EntryRow};

/// How many finalized documents the snapshot table keeps.
const SNAPSHOT_CAP: usize = 300;

const ENTRY_COLUMNS: &str = "date, tools_json, packages, delivery, shipping, comment, \
     return_date, return_tools_json, return_packages, return_delivery, return_shipping, \
     transfer_client_sig, transfer_staff_sig, return_client_sig, return_staff_sig, \
     courier_pending, point_pending, courier_planned_date";

/// File-backed SQLite store.
pub struct SqliteStore {
    #[allow(dead_code)]
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new store file. Fails if the file already exists.
    pub fn create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Err(ProtocolError::Storage(
                "Store file already exists".to_string(),
            ));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(
            r#"
            CREATE TABLE meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE clients (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                address TEXT NOT NULL DEFAULT '',
                tax_id TEXT NOT NULL DEFAULT '',
                logistics TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE protocols (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                client_id TEXT NOT NULL,
                month TEXT NOT NULL,
                summarized INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,

                UNIQUE(client_id, month)
            );

            CREATE TABLE protocol_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                protocol_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                date TEXT NOT NULL,
                tools_json TEXT NOT NULL DEFAULT '[]',
                packages INTEGER NOT NULL DEFAULT 0,
                delivery TEXT,
                shipping INTEGER NOT NULL DEFAULT 0,
                comment TEXT NOT NULL DEFAULT '',
                return_date TEXT,
                return_tools_json TEXT,
                return_packages INTEGER,
                return_delivery TEXT,
                return_shipping INTEGER NOT NULL DEFAULT 0,
                transfer_client_sig TEXT,
                transfer_staff_sig TEXT,
                return_client_sig TEXT,
                return_staff_sig TEXT,
                courier_pending INTEGER NOT NULL DEFAULT 0,
                point_pending INTEGER NOT NULL DEFAULT 0,
                courier_planned_date TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,

                UNIQUE(protocol_id, position),
                FOREIGN KEY(protocol_id) REFERENCES protocols(id)
            );

            -- Finalized-entry fingerprints, tracked outside the entries
            -- to tolerate rows that predate finalization
            CREATE TABLE finalized (
                client_id TEXT NOT NULL,
                month TEXT NOT NULL,
                fingerprint TEXT NOT NULL,
                recorded_at TEXT NOT NULL,

                PRIMARY KEY(client_id, month, fingerprint)
            );

            -- In-progress entry form per client x month
            CREATE TABLE drafts (
                client_id TEXT NOT NULL,
                month TEXT NOT NULL,
                draft_json TEXT NOT NULL,
                saved_at TEXT NOT NULL,

                PRIMARY KEY(client_id, month)
            );

            CREATE TABLE tool_names (
                category TEXT NOT NULL CHECK(category IN ('cosmetic', 'medical')),
                position INTEGER NOT NULL,
                name TEXT NOT NULL,

                PRIMARY KEY(category, position)
            );

            CREATE TABLE snapshots (
                id TEXT PRIMARY KEY,
                snapshot_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )?;

        let created_at = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO meta (key, value) VALUES (?, ?)",
            ["format_version", "0.1"],
        )?;
        conn.execute(
            "INSERT INTO meta (key, value) VALUES (?, ?)",
            ["created_at", &created_at],
        )?;

        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    /// Open an existing store file.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ProtocolError::NotFound(format!(
                "Store file not found: {}",
                path.display()
            )));
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    /// Lock the database connection, returning an error if the mutex is
    /// poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ProtocolError::Storage("SQLite connection poisoned".to_string()))
    }

    fn protocol_header(
        conn: &Connection,
        client_id: &str,
        month: &str,
    ) -> Result<Option<(i64, bool)>> {
        let header = conn
            .query_row(
                "SELECT id, summarized FROM protocols WHERE client_id = ? AND month = ?",
                [client_id, month],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)? != 0)),
            )
            .optional()?;
        Ok(header)
    }

    fn ensure_protocol_header(conn: &Connection, client_id: &str, month: &str) -> Result<i64> {
        if let Some((id, _)) = Self::protocol_header(conn, client_id, month)? {
            return Ok(id);
        }
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO protocols (client_id, month, summarized, created_at, updated_at) \
             VALUES (?, ?, 0, ?, ?)",
            params![client_id, month, now, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn touch_protocol(conn: &Connection, protocol_id: i64) -> Result<()> {
        conn.execute(
            "UPDATE protocols SET updated_at = ? WHERE id = ?",
            params![Utc::now().to_rfc3339(), protocol_id],
        )?;
        Ok(())
    }

    fn entry_count(conn: &Connection, protocol_id: i64) -> Result<usize> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM protocol_entries WHERE protocol_id = ?",
            [protocol_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn entry_at(
        conn: &Connection,
        client_id: &str,
        month: &str,
        index: usize,
    ) -> Result<(i64, Entry)> {
        let protocol_id = Self::protocol_header(conn, client_id, month)?
            .map(|(id, _)| id)
            .ok_or_else(|| {
                ProtocolError::NotFound(format!("No protocol for {client_id} {month}"))
            })?;
        let query = format!(
            "SELECT {ENTRY_COLUMNS} FROM protocol_entries \
             WHERE protocol_id = ? AND position = ?"
        );
        let row = conn
            .query_row(&query, params![protocol_id, index as i64], Self::map_row)
            .optional()?
            .ok_or_else(|| ProtocolError::NotFound(format!("Entry {index} not found")))?;
        Ok((protocol_id, Entry::try_from(row)?))
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
        Ok(EntryRow {
            date: row.get(0)?,
            tools_json: row.get(1)?,
            packages: row.get(2)?,
            delivery: row.get(3)?,
            shipping: row.get(4)?,
            comment: row.get(5)?,
            return_date: row.get(6)?,
            return_tools_json: row.get(7)?,
            return_packages: row.get(8)?,
            return_delivery: row.get(9)?,
            return_shipping: row.get(10)?,
            transfer_client_sig: row.get(11)?,
            transfer_staff_sig: row.get(12)?,
            return_client_sig: row.get(13)?,
            return_staff_sig: row.get(14)?,
            courier_pending: row.get(15)?,
            point_pending: row.get(16)?,
            courier_planned_date: row.get(17)?,
        })
    }

    fn write_entry_at(
        conn: &Connection,
        protocol_id: i64,
        index: usize,
        entry: &Entry,
    ) -> Result<()> {
        let tools_json = serde_json::to_string(&filter_tools(&entry.tools))
            .map_err(|e| ProtocolError::Storage(format!("Failed to serialize tools: {e}")))?;
        let return_tools_json = if entry.return_tools.is_empty() {
            None
        } else {
            Some(
                serde_json::to_string(&filter_tools(&entry.return_tools)).map_err(|e| {
                    ProtocolError::Storage(format!("Failed to serialize return tools: {e}"))
                })?,
            )
        };

        let updated = conn.execute(
            "UPDATE protocol_entries SET \
                date = ?1, tools_json = ?2, packages = ?3, delivery = ?4, shipping = ?5, \
                comment = ?6, return_date = ?7, return_tools_json = ?8, return_packages = ?9, \
                return_delivery = ?10, return_shipping = ?11, \
                transfer_client_sig = ?12, transfer_staff_sig = ?13, \
                return_client_sig = ?14, return_staff_sig = ?15, \
                courier_pending = ?16, point_pending = ?17, courier_planned_date = ?18, \
                updated_at = ?19 \
             WHERE protocol_id = ?20 AND position = ?21",
            params![
                entry.date,
                tools_json,
                entry.packages as i64,
                delivery_code(entry.delivery),
                entry.shipping as i64,
                entry.comment,
                entry.return_date.map(|d| d.format("%Y-%m-%d").to_string()),
                return_tools_json,
                entry.return_packages.map(|n| n as i64),
                delivery_code(entry.return_delivery),
                entry.return_shipping as i64,
                entry.signatures.transfer.client.as_ref().map(|s| s.as_str()),
                entry.signatures.transfer.staff.as_ref().map(|s| s.as_str()),
                entry.signatures.return_leg.client.as_ref().map(|s| s.as_str()),
                entry.signatures.return_leg.staff.as_ref().map(|s| s.as_str()),
                entry.queue.courier_pending as i64,
                entry.queue.point_pending as i64,
                entry
                    .queue
                    .courier_planned_date
                    .map(|d| d.format("%Y-%m-%d").to_string()),
                Utc::now().to_rfc3339(),
                protocol_id,
                index as i64,
            ],
        )?;
        if updated == 0 {
            return Err(ProtocolError::NotFound(format!("Entry {index} not found")));
        }
        Self::touch_protocol(conn, protocol_id)
    }

    fn meta_value(conn: &Connection, key: &str) -> Result<Option<String>> {
        let value = conn
            .query_row("SELECT value FROM meta WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_meta_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            [key, value],
        )?;
        Ok(())
    }
}

impl ProtocolStore for SqliteStore {
    fn month_ledger(&self, client_id: &str, month: &str) -> Result<Protocol> {
        let conn = self.lock_conn()?;
        let Some((protocol_id, summarized)) = Self::protocol_header(&conn, client_id, month)?
        else {
            return Ok(Protocol::empty(client_id, month));
        };

        let query = format!(
            "SELECT {ENTRY_COLUMNS} FROM protocol_entries \
             WHERE protocol_id = ? ORDER BY position ASC"
        );
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([protocol_id], Self::map_row)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(Entry::try_from(row?)?);
        }

        let mut protocol = Protocol {
            id: client_id.to_string(),
            month: month.to_string(),
            summarized,
            entries,
            totals: Default::default(),
        };
        protocol.recompute_totals();
        Ok(protocol)
    }

    fn append_entry(&mut self, client_id: &str, month: &str, entry: Entry) -> Result<usize> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let protocol_id = Self::ensure_protocol_header(&tx, client_id, month)?;
        let position = Self::entry_count(&tx, protocol_id)?;

        let now = Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO protocol_entries \
                (protocol_id, position, date, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
            params![protocol_id, position as i64, entry.date, now, now],
        )?;
        Self::write_entry_at(&tx, protocol_id, position, &entry)?;
        tx.commit()?;
        Ok(position)
    }

    fn update_entry(
        &mut self,
        client_id: &str,
        month: &str,
        index: usize,
        patch: &EntryPatch,
    ) -> Result<Entry> {
        let conn = self.lock_conn()?;
        let (protocol_id, mut entry) = Self::entry_at(&conn, client_id, month, index)?;
        patch.apply_to(&mut entry);
        Self::write_entry_at(&conn, protocol_id, index, &entry)?;
        Ok(entry)
    }

    fn delete_entry(&mut self, client_id: &str, month: &str, index: usize) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let (protocol_id, _) = Self::entry_at(&tx, client_id, month, index)?;
        tx.execute(
            "DELETE FROM protocol_entries WHERE protocol_id = ? AND position = ?",
            params![protocol_id, index as i64],
        )?;
        // close the positional gap so index addressing stays dense
        tx.execute(
            "UPDATE protocol_entries SET position = position - 1 \
             WHERE protocol_id = ? AND position > ?",
            params![protocol_id, index as i64],
        )?;
        Self::touch_protocol(&tx, protocol_id)?;
        tx.commit()?;
        Ok(())
    }

    fn set_queue_flag(
        &mut self,
        client_id: &str,
        month: &str,
        index: usize,
        kind: QueueKind,
        pending: bool,
    ) -> Result<Entry> {
        let conn = self.lock_conn()?;
        let (protocol_id, mut entry) = Self::entry_at(&conn, client_id, month, index)?;

        match (kind, pending) {
            (QueueKind::Courier, true) => {
                entry.queue.courier_pending = true;
                entry.queue.point_pending = false;
                if entry.queue.courier_planned_date.is_none() {
                    entry.queue.courier_planned_date = entry
                        .parsed_date()
                        .or_else(|| Some(Utc::now().date_naive()));
                }
            }
            (QueueKind::Point, true) => {
                entry.queue.point_pending = true;
                entry.queue.courier_pending = false;
            }
            (QueueKind::Courier, false) => entry.queue.courier_pending = false,
            (QueueKind::Point, false) => entry.queue.point_pending = false,
        }

        Self::write_entry_at(&conn, protocol_id, index, &entry)?;
        Ok(entry)
    }

    fn write_signatures(
        &mut self,
        client_id: &str,
        month: &str,
        index: usize,
        write: &SignatureWrite,
    ) -> Result<Entry> {
        if write.is_empty() {
            return Err(ProtocolError::InvalidInput(
                "No signatures to save".to_string(),
            ));
        }

        let default_staff = if write.use_default_staff && write.staff.is_none() {
            let image = self.default_staff_signature()?.ok_or_else(|| {
                ProtocolError::InvalidInput(
                    "No default staff signature is configured".to_string(),
                )
            })?;
            Some(image)
        } else {
            None
        };

        let conn = self.lock_conn()?;
        let (protocol_id, mut entry) = Self::entry_at(&conn, client_id, month, index)?;

        let leg = match write.leg {
            Leg::Transfer => &mut entry.signatures.transfer,
            Leg::Return => &mut entry.signatures.return_leg,
        };
        if let Some(client) = &write.client {
            leg.client = Some(client.clone());
        }
        if let Some(staff) = write.staff.as_ref().or(default_staff.as_ref()) {
            leg.staff = Some(staff.clone());
        }

        // A fully signed entry no longer waits in any queue.
        if entry.signatures.is_fully_signed() {
            entry.queue.courier_pending = false;
            entry.queue.point_pending = false;
        }

        Self::write_entry_at(&conn, protocol_id, index, &entry)?;
        Ok(entry)
    }

    fn delete_signature(
        &mut self,
        client_id: &str,
        month: &str,
        index: usize,
        leg: Leg,
        party: SignatureParty,
    ) -> Result<Entry> {
        let conn = self.lock_conn()?;
        let (protocol_id, mut entry) = Self::entry_at(&conn, client_id, month, index)?;
        let slots = match leg {
            Leg::Transfer => &mut entry.signatures.transfer,
            Leg::Return => &mut entry.signatures.return_leg,
        };
        match party {
            SignatureParty::Client => slots.client = None,
            SignatureParty::Staff => slots.staff = None,
        }
        Self::write_entry_at(&conn, protocol_id, index, &entry)?;
        Ok(entry)
    }

    fn record_return(
        &mut self,
        client_id: &str,
        month: &str,
        index: usize,
        update: &ReturnUpdate,
    ) -> Result<Entry> {
        let conn = self.lock_conn()?;
        let (protocol_id, mut entry) = Self::entry_at(&conn, client_id, month, index)?;
        update.apply_to(&mut entry);
        Self::write_entry_at(&conn, protocol_id, index, &entry)?;
        Ok(entry)
    }

    fn set_summarized(&mut self, client_id: &str, month: &str, summarized: bool) -> Result<()> {
        let conn = self.lock_conn()?;
        let protocol_id = Self::ensure_protocol_header(&conn, client_id, month)?;
        conn.execute(
            "UPDATE protocols SET summarized = ?, updated_at = ? WHERE id = ?",
            params![summarized as i64, Utc::now().to_rfc3339(), protocol_id],
        )?;
        Ok(())
    }

    fn sign_queue(&self, kind: QueueKind, month: Option<&str>) -> Result<Vec<SignQueueItem>> {
        let flag_column = match kind {
            QueueKind::Courier => "courier_pending",
            QueueKind::Point => "point_pending",
        };
        let conn = self.lock_conn()?;
        let query = format!(
            "SELECT p.client_id, COALESCE(c.name, p.client_id), p.month, e.position, \
                    e.date, e.packages, e.courier_planned_date \
             FROM protocol_entries e \
             JOIN protocols p ON p.id = e.protocol_id \
             LEFT JOIN clients c ON c.id = p.client_id \
             WHERE e.{flag_column} = 1 AND (?1 IS NULL OR p.month = ?1) \
             ORDER BY p.month DESC, p.client_id ASC, e.position ASC"
        );
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(params![month], |row| {
            Ok(SignQueueItem {
                client_id: row.get(0)?,
                client_name: row.get(1)?,
                month: row.get(2)?,
                index: row.get::<_, i64>(3)? as usize,
                date: row.get(4)?,
                packages: row.get::<_, i64>(5)?.max(0) as u32,
                courier_planned_date: row
                    .get::<_, Option<String>>(6)?
                    .and_then(|s| chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            })
        })?;
        let mut items = Vec::new();
        for item in rows {
            items.push(item?);
        }
        Ok(items)
    }

    fn finalized_fingerprints(&self, client_id: &str, month: &str) -> Result<HashSet<String>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare("SELECT fingerprint FROM finalized WHERE client_id = ? AND month = ?")?;
        let rows = stmt.query_map([client_id, month], |row| row.get::<_, String>(0))?;
        let mut set = HashSet::new();
        for fingerprint in rows {
            set.insert(fingerprint?);
        }
        Ok(set)
    }

    fn record_finalized(
        &mut self,
        client_id: &str,
        month: &str,
        fingerprint: &Fingerprint,
    ) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO finalized (client_id, month, fingerprint, recorded_at) \
             VALUES (?, ?, ?, ?)",
            params![
                client_id,
                month,
                fingerprint.as_str(),
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn forget_finalized(
        &mut self,
        client_id: &str,
        month: &str,
        fingerprint: &Fingerprint,
    ) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "DELETE FROM finalized WHERE client_id = ? AND month = ? AND fingerprint = ?",
            params![client_id, month, fingerprint.as_str()],
        )?;
        Ok(())
    }

    fn save_draft(&mut self, client_id: &str, month: &str, draft: &EntryDraft) -> Result<()> {
        let json = serde_json::to_string(draft)
            .map_err(|e| ProtocolError::Storage(format!("Failed to serialize draft: {e}")))?;
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO drafts (client_id, month, draft_json, saved_at) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(client_id, month) DO UPDATE SET draft_json = ?3, saved_at = ?4",
            params![client_id, month, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn load_draft(&self, client_id: &str, month: &str) -> Result<Option<EntryDraft>> {
        let conn = self.lock_conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT draft_json FROM drafts WHERE client_id = ? AND month = ?",
                [client_id, month],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json).map_err(|e| {
                ProtocolError::Storage(format!("Invalid draft JSON: {e}"))
            })?)),
            None => Ok(None),
        }
    }

    fn clear_draft(&mut self, client_id: &str, month: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "DELETE FROM drafts WHERE client_id = ? AND month = ?",
            [client_id, month],
        )?;
        Ok(())
    }

    fn client(&self, client_id: &str) -> Result<Option<Client>> {
        let conn = self.lock_conn()?;
        let client = conn
            .query_row(
                "SELECT id, name, address, tax_id, logistics FROM clients WHERE id = ?",
                [client_id],
                |row| {
                    Ok(Client {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        address: row.get(2)?,
                        tax_id: row.get(3)?,
                        logistics: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(client)
    }

    fn list_clients(&self) -> Result<Vec<Client>> {
        let conn = self.lock_conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, address, tax_id, logistics FROM clients ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Client {
                id: row.get(0)?,
                name: row.get(1)?,
                address: row.get(2)?,
                tax_id: row.get(3)?,
                logistics: row.get(4)?,
            })
        })?;
        let mut clients = Vec::new();
        for client in rows {
            clients.push(client?);
        }
        Ok(clients)
    }

    fn upsert_client(&mut self, client: &Client) -> Result<()> {
        if client.id.trim().is_empty() {
            return Err(ProtocolError::InvalidInput(
                "Client id must not be empty".to_string(),
            ));
        }
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO clients (id, name, address, tax_id, logistics) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(id) DO UPDATE SET \
                name = ?2, address = ?3, tax_id = ?4, logistics = ?5",
            params![
                client.id,
                client.name,
                client.address,
                client.tax_id,
                client.logistics
            ],
        )?;
        Ok(())
    }

    fn tool_catalog(&self) -> Result<ToolCatalog> {
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare("SELECT category, name FROM tool_names ORDER BY category, position")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut catalog = ToolCatalog::default();
        for row in rows {
            let (category, name) = row?;
            match category.as_str() {
                "cosmetic" => catalog.cosmetic.push(name),
                "medical" => catalog.medical.push(name),
                other => {
                    return Err(ProtocolError::Storage(format!(
                        "Unknown tool category: {other:?}"
                    )))
                }
            }
        }
        Ok(catalog)
    }

    fn save_tool_catalog(&mut self, catalog: &ToolCatalog) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM tool_names", [])?;
        for (category, names) in [("cosmetic", &catalog.cosmetic), ("medical", &catalog.medical)]
        {
            for (position, name) in names.iter().enumerate() {
                tx.execute(
                    "INSERT INTO tool_names (category, position, name) VALUES (?, ?, ?)",
                    params![category, position as i64, name],
                )?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn default_staff_signature(&self) -> Result<Option<SignatureImage>> {
        let conn = self.lock_conn()?;
        match Self::meta_value(&conn, "default_staff_signature")? {
            Some(payload) => Ok(Some(SignatureImage::from_data_url(&payload)?)),
            None => Ok(None),
        }
    }

    fn set_default_staff_signature(&mut self, image: &SignatureImage) -> Result<()> {
        let conn = self.lock_conn()?;
        Self::set_meta_value(&conn, "default_staff_signature", image.as_str())
    }

    fn metadata(&self) -> Result<StoreMetadata> {
        let conn = self.lock_conn()?;
        let format_version = Self::meta_value(&conn, "format_version")?
            .ok_or_else(|| ProtocolError::Storage("Missing format_version".to_string()))?;
        let created_at_raw = Self::meta_value(&conn, "created_at")?
            .ok_or_else(|| ProtocolError::Storage("Missing created_at".to_string()))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_raw)
            .map_err(|e| ProtocolError::Storage(format!("Invalid created_at timestamp: {e}")))?
            .with_timezone(&Utc);
        Ok(StoreMetadata {
            format_version,
            created_at,
        })
    }

    fn check_integrity(&self) -> Result<()> {
        let conn = self.lock_conn()?;

        // Positions must be dense 0..n per protocol.
        let mut stmt = conn.prepare(
            "SELECT protocol_id, COUNT(*), COALESCE(MIN(position), 0), COALESCE(MAX(position), -1) \
             FROM protocol_entries GROUP BY protocol_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;
        for row in rows {
            let (protocol_id, count, min, max) = row?;
            if min != 0 || max != count - 1 {
                return Err(ProtocolError::Storage(format!(
                    "Protocol {protocol_id} has non-contiguous entry positions"
                )));
            }
        }

        // Queue flags are mutually exclusive.
        let conflicted: i64 = conn.query_row(
            "SELECT COUNT(*) FROM protocol_entries \
             WHERE courier_pending = 1 AND point_pending = 1",
            [],
            |row| row.get(0),
        )?;
        if conflicted > 0 {
            return Err(ProtocolError::Storage(format!(
                "{conflicted} entries are pending in both queues"
            )));
        }

        // Entries must belong to an existing protocol.
        let orphaned: i64 = conn.query_row(
            "SELECT COUNT(*) FROM protocol_entries e \
             LEFT JOIN protocols p ON p.id = e.protocol_id WHERE p.id IS NULL",
            [],
            |row| row.get(0),
        )?;
        if orphaned > 0 {
            return Err(ProtocolError::Storage(format!(
                "{orphaned} entries reference a missing protocol"
            )));
        }

        // Tool lists must parse.
        let mut stmt =
            conn.prepare("SELECT id, tools_json, return_tools_json FROM protocol_entries")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;
        for row in rows {
            let (id, tools_json, return_tools_json) = row?;
            if serde_json::from_str::<Vec<crate::model::ToolLine>>(&tools_json).is_err() {
                return Err(ProtocolError::Storage(format!(
                    "Entry row {id} has invalid tools JSON"
                )));
            }
            if let Some(json) = return_tools_json {
                if !json.is_empty()
                    && serde_json::from_str::<Vec<crate::model::ToolLine>>(&json).is_err()
                {
                    return Err(ProtocolError::Storage(format!(
                        "Entry row {id} has invalid return tools JSON"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl DocumentStore for SqliteStore {
    fn save_snapshot(&mut self, snapshot: &ProtocolSnapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)
            .map_err(|e| ProtocolError::Storage(format!("Failed to serialize snapshot: {e}")))?;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO snapshots (id, snapshot_json, created_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(id) DO UPDATE SET snapshot_json = ?2, created_at = ?3",
            params![snapshot.id, json, snapshot.created_at.to_rfc3339()],
        )?;
        // keep the newest documents only
        tx.execute(
            "DELETE FROM snapshots WHERE id NOT IN \
             (SELECT id FROM snapshots ORDER BY created_at DESC, id ASC LIMIT ?)",
            [SNAPSHOT_CAP as i64],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn list_snapshots(&self) -> Result<Vec<ProtocolSnapshot>> {
        let conn = self.lock_conn()?;
        let mut stmt =
            conn.prepare("SELECT snapshot_json FROM snapshots ORDER BY created_at DESC, id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut snapshots = Vec::new();
        for json in rows {
            snapshots.push(
                serde_json::from_str(&json?)
                    .map_err(|e| ProtocolError::Storage(format!("Invalid snapshot JSON: {e}")))?,
            );
        }
        Ok(snapshots)
    }

    fn snapshot(&self, id: &str) -> Result<Option<ProtocolSnapshot>> {
        let conn = self.lock_conn()?;
        let json: Option<String> = conn
            .query_row("SELECT snapshot_json FROM snapshots WHERE id = ?", [id], |row| {
                row.get(0)
            })
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json).map_err(|e| {
                ProtocolError::Storage(format!("Invalid snapshot JSON: {e}"))
            })?)),
            None => Ok(None),
        }
    }
}
