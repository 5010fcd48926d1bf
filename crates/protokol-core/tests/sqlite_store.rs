use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;

use protokol_core::model::{Client, Entry, QueueKind, ServiceType, Signatures, ToolLine};
use protokol_core::signature::{Leg, SignatureImage, SignatureParty};
use protokol_core::storage::{EntryPatch, ReturnUpdate, SignatureWrite};
use protokol_core::tools::ToolCatalog;
use protokol_core::{DocumentStore, ProtocolStore, SqliteStore};

struct TempFile {
    path: PathBuf,
}

impl TempFile {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be available")
            .as_nanos();
        let filename = format!("{}_{}_{}.protokol", prefix, std::process::id(), nanos);
        let path = std::env::temp_dir().join(filename);
        Self { path }
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn new_store(temp: &TempFile) -> SqliteStore {
    SqliteStore::create(&temp.path).expect("create should succeed")
}

fn basic_entry(date: &str, packages: u32) -> Entry {
    Entry {
        date: date.to_string(),
        tools: vec![ToolLine::new("Nożyczki", 2), ToolLine::new("Kleszcze", 1)],
        packages,
        delivery: None,
        shipping: false,
        comment: String::new(),
        return_date: None,
        return_tools: Vec::new(),
        return_packages: None,
        return_delivery: None,
        return_shipping: false,
        signatures: Signatures::default(),
        queue: Default::default(),
    }
}

fn ink(tag: &[u8]) -> SignatureImage {
    SignatureImage::from_png_bytes(tag)
}

#[test]
fn test_create_then_open_round_trip() {
    let temp = TempFile::new("store_round_trip");
    {
        let store = new_store(&temp);
        let metadata = store.metadata().expect("metadata should load");
        assert_eq!(metadata.format_version, "0.1");
    }
    let store = SqliteStore::open(&temp.path).expect("open should succeed");
    store.check_integrity().expect("fresh store is consistent");
}

#[test]
fn test_create_refuses_existing_file() {
    let temp = TempFile::new("store_exists");
    let _store = new_store(&temp);
    assert!(SqliteStore::create(&temp.path).is_err());
}

#[test]
fn test_open_missing_file_fails() {
    let temp = TempFile::new("store_missing");
    assert!(SqliteStore::open(&temp.path).is_err());
}

#[test]
fn test_empty_month_yields_empty_protocol() {
    let temp = TempFile::new("store_empty_month");
    let store = new_store(&temp);
    let protocol = store
        .month_ledger("gabinet-ewa", "2024-03")
        .expect("read should succeed");
    assert_eq!(protocol.id, "gabinet-ewa");
    assert_eq!(protocol.month, "2024-03");
    assert!(protocol.entries.is_empty());
    assert_eq!(protocol.totals.total_packages, 0);
}

#[test]
fn test_append_preserves_insertion_order_and_totals() {
    let temp = TempFile::new("store_append");
    let mut store = new_store(&temp);

    let first = store
        .append_entry("gabinet-ewa", "2024-03", basic_entry("2024-03-10", 2))
        .expect("append should succeed");
    let second = store
        .append_entry("gabinet-ewa", "2024-03", basic_entry("2024-03-02", 5))
        .expect("append should succeed");
    assert_eq!((first, second), (0, 1));

    let protocol = store
        .month_ledger("gabinet-ewa", "2024-03")
        .expect("read should succeed");
    // insertion order, not date order
    assert_eq!(protocol.entries[0].date, "2024-03-10");
    assert_eq!(protocol.entries[1].date, "2024-03-02");
    assert_eq!(protocol.totals.total_packages, 7);
}

#[test]
fn test_delete_closes_positional_gap() {
    let temp = TempFile::new("store_delete");
    let mut store = new_store(&temp);
    for (date, packages) in [("2024-03-01", 1), ("2024-03-02", 2), ("2024-03-03", 3)] {
        store
            .append_entry("c", "2024-03", basic_entry(date, packages))
            .expect("append should succeed");
    }

    store.delete_entry("c", "2024-03", 1).expect("delete should succeed");

    let protocol = store.month_ledger("c", "2024-03").expect("read");
    assert_eq!(protocol.entries.len(), 2);
    assert_eq!(protocol.entries[0].date, "2024-03-01");
    assert_eq!(protocol.entries[1].date, "2024-03-03");
    store.check_integrity().expect("positions stay dense");

    assert!(store.delete_entry("c", "2024-03", 5).is_err());
}

#[test]
fn test_patch_merges_and_filters_blank_tool_rows() {
    let temp = TempFile::new("store_patch");
    let mut store = new_store(&temp);
    store
        .append_entry("c", "2024-03", basic_entry("2024-03-05", 2))
        .expect("append");

    let patch = EntryPatch::default()
        .with_packages(9)
        .with_service(ServiceType::Shipping)
        .with_tools(vec![
            ToolLine::new("  Pęseta  ", 4),
            ToolLine::new("   ", 7),
            ToolLine::new("", 1),
        ]);
    let updated = store
        .update_entry("c", "2024-03", 0, &patch)
        .expect("update should succeed");

    assert_eq!(updated.packages, 9);
    assert_eq!(updated.service(), ServiceType::Shipping);
    assert_eq!(updated.tools, vec![ToolLine::new("Pęseta", 4)]);
    // untouched field survives
    assert_eq!(updated.date, "2024-03-05");

    let reread = store.month_ledger("c", "2024-03").expect("read");
    assert_eq!(reread.entries[0].packages, 9);
}

#[test]
fn test_queue_flags_are_mutually_exclusive() {
    let temp = TempFile::new("store_queue");
    let mut store = new_store(&temp);
    store
        .append_entry("c", "2024-03", basic_entry("2024-03-05", 1))
        .expect("append");

    let entry = store
        .set_queue_flag("c", "2024-03", 0, QueueKind::Courier, true)
        .expect("set courier");
    assert!(entry.queue.courier_pending);
    assert!(!entry.queue.point_pending);
    // courier assignment stamps the planned date from the entry date
    assert_eq!(
        entry.queue.courier_planned_date,
        NaiveDate::from_ymd_opt(2024, 3, 5)
    );

    let entry = store
        .set_queue_flag("c", "2024-03", 0, QueueKind::Point, true)
        .expect("switch to point");
    assert!(!entry.queue.courier_pending);
    assert!(entry.queue.point_pending);

    // idempotent re-application
    let entry = store
        .set_queue_flag("c", "2024-03", 0, QueueKind::Point, true)
        .expect("reapply point");
    assert!(entry.queue.point_pending && !entry.queue.courier_pending);

    let entry = store
        .set_queue_flag("c", "2024-03", 0, QueueKind::Point, false)
        .expect("clear point");
    assert!(!entry.queue.point_pending && !entry.queue.courier_pending);
}

#[test]
fn test_signature_writes_are_additive() {
    let temp = TempFile::new("store_sign");
    let mut store = new_store(&temp);
    store
        .append_entry("c", "2024-03", basic_entry("2024-03-05", 1))
        .expect("append");

    let mut write = SignatureWrite::new(Leg::Transfer);
    write.client = Some(ink(b"client-ink"));
    let entry = store
        .write_signatures("c", "2024-03", 0, &write)
        .expect("first write");
    assert!(entry.signatures.transfer.client.is_some());
    assert!(entry.signatures.transfer.staff.is_none());

    // second write fills the staff slot and must not clear the client one
    let mut write = SignatureWrite::new(Leg::Transfer);
    write.staff = Some(ink(b"staff-ink"));
    let entry = store
        .write_signatures("c", "2024-03", 0, &write)
        .expect("second write");
    assert!(entry.signatures.transfer.client.is_some());
    assert!(entry.signatures.transfer.staff.is_some());

    // an empty write is rejected before touching anything
    assert!(store
        .write_signatures("c", "2024-03", 0, &SignatureWrite::new(Leg::Return))
        .is_err());

    let entry = store
        .delete_signature("c", "2024-03", 0, Leg::Transfer, SignatureParty::Client)
        .expect("delete slot");
    assert!(entry.signatures.transfer.client.is_none());
    assert!(entry.signatures.transfer.staff.is_some());
}

#[test]
fn test_fully_signed_entry_leaves_the_queues() {
    let temp = TempFile::new("store_sign_release");
    let mut store = new_store(&temp);
    store
        .append_entry("c", "2024-03", basic_entry("2024-03-05", 1))
        .expect("append");
    store
        .set_queue_flag("c", "2024-03", 0, QueueKind::Courier, true)
        .expect("queue");

    for leg in [Leg::Transfer, Leg::Return] {
        let mut write = SignatureWrite::new(leg);
        write.client = Some(ink(b"client"));
        write.staff = Some(ink(b"staff"));
        store
            .write_signatures("c", "2024-03", 0, &write)
            .expect("sign leg");
    }

    let protocol = store.month_ledger("c", "2024-03").expect("read");
    let entry = &protocol.entries[0];
    assert!(entry.signatures.is_fully_signed());
    assert!(!entry.queue.courier_pending);
    assert!(!entry.queue.point_pending);
}

#[test]
fn test_default_staff_signature_path() {
    let temp = TempFile::new("store_default_staff");
    let mut store = new_store(&temp);
    store
        .append_entry("c", "2024-03", basic_entry("2024-03-05", 1))
        .expect("append");

    // without a configured default the write is rejected
    let mut write = SignatureWrite::new(Leg::Transfer);
    write.use_default_staff = true;
    assert!(store.write_signatures("c", "2024-03", 0, &write).is_err());

    let default = ink(b"default-staff");
    store
        .set_default_staff_signature(&default)
        .expect("configure default");
    let entry = store
        .write_signatures("c", "2024-03", 0, &write)
        .expect("write with default");
    assert_eq!(entry.signatures.transfer.staff, Some(default));
}

#[test]
fn test_record_return_match_transfer() {
    let temp = TempFile::new("store_return");
    let mut store = new_store(&temp);
    store
        .append_entry("c", "2024-03", basic_entry("2024-03-05", 3))
        .expect("append");

    let update = ReturnUpdate {
        return_date: NaiveDate::from_ymd_opt(2024, 3, 6),
        match_transfer: true,
        ..ReturnUpdate::default()
    };
    let entry = store
        .record_return("c", "2024-03", 0, &update)
        .expect("record return");
    assert_eq!(entry.return_tools, entry.tools);
    assert_eq!(entry.return_packages, Some(3));
    assert_eq!(entry.return_date, NaiveDate::from_ymd_opt(2024, 3, 6));
}

#[test]
fn test_sign_queue_lists_pending_entries_across_clients() {
    let temp = TempFile::new("store_sign_queue");
    let mut store = new_store(&temp);
    store
        .upsert_client(&Client {
            id: "gabinet-ewa".to_string(),
            name: "Gabinet Ewa".to_string(),
            address: String::new(),
            tax_id: String::new(),
            logistics: String::new(),
        })
        .expect("seed client");

    store
        .append_entry("gabinet-ewa", "2024-03", basic_entry("2024-03-05", 1))
        .expect("append");
    store
        .append_entry("salon-anna", "2024-03", basic_entry("2024-03-06", 2))
        .expect("append");
    store
        .set_queue_flag("gabinet-ewa", "2024-03", 0, QueueKind::Courier, true)
        .expect("queue courier");
    store
        .set_queue_flag("salon-anna", "2024-03", 0, QueueKind::Point, true)
        .expect("queue point");

    let courier = store
        .sign_queue(QueueKind::Courier, None)
        .expect("courier queue");
    assert_eq!(courier.len(), 1);
    assert_eq!(courier[0].client_id, "gabinet-ewa");
    assert_eq!(courier[0].client_name, "Gabinet Ewa");

    let point = store
        .sign_queue(QueueKind::Point, Some("2024-03"))
        .expect("point queue");
    assert_eq!(point.len(), 1);
    // unknown directory entries fall back to the id
    assert_eq!(point[0].client_name, "salon-anna");

    let other_month = store
        .sign_queue(QueueKind::Point, Some("2024-04"))
        .expect("filtered queue");
    assert!(other_month.is_empty());
}

#[test]
fn test_finalized_fingerprint_set() {
    let temp = TempFile::new("store_finalized");
    let mut store = new_store(&temp);
    let digest = protokol_core::fingerprint::Fingerprint::from_hex("ab".repeat(32));

    store
        .record_finalized("c", "2024-03", &digest)
        .expect("record");
    // recording twice is idempotent
    store
        .record_finalized("c", "2024-03", &digest)
        .expect("record again");
    let set = store
        .finalized_fingerprints("c", "2024-03")
        .expect("read set");
    assert_eq!(set.len(), 1);
    assert!(set.contains(digest.as_str()));

    store
        .forget_finalized("c", "2024-03", &digest)
        .expect("forget");
    assert!(store
        .finalized_fingerprints("c", "2024-03")
        .expect("read set")
        .is_empty());
}

#[test]
fn test_draft_cache_contract() {
    let temp = TempFile::new("store_drafts");
    let mut store = new_store(&temp);

    assert!(store.load_draft("c", "2024-03").expect("load").is_none());

    let draft = protokol_core::model::EntryDraft {
        date: NaiveDate::from_ymd_opt(2024, 3, 5),
        tools: vec![ToolLine::new("Clamp", 3)],
        packages: 2,
        service: ServiceType::CourierSingle,
        comment: "wip".to_string(),
    };
    store.save_draft("c", "2024-03", &draft).expect("save");
    let loaded = store
        .load_draft("c", "2024-03")
        .expect("load")
        .expect("draft exists");
    assert_eq!(loaded.packages, 2);
    assert_eq!(loaded.tools, draft.tools);

    // keyed per client x month
    assert!(store.load_draft("c", "2024-04").expect("load").is_none());

    store.clear_draft("c", "2024-03").expect("clear");
    assert!(store.load_draft("c", "2024-03").expect("load").is_none());
}

#[test]
fn test_tool_catalog_round_trip() {
    let temp = TempFile::new("store_tools");
    let mut store = new_store(&temp);
    let catalog = ToolCatalog {
        cosmetic: vec!["Cążki".to_string(), "Nożyczki".to_string()],
        medical: vec!["Kleszcze".to_string()],
    };
    store.save_tool_catalog(&catalog).expect("save");
    let loaded = store.tool_catalog().expect("load");
    assert_eq!(loaded.cosmetic, catalog.cosmetic);
    assert_eq!(loaded.medical, catalog.medical);
}

#[test]
fn test_snapshot_upsert_and_cap() {
    let temp = TempFile::new("store_snapshots");
    let mut store = new_store(&temp);

    let mut snapshot = protokol_core::model::ProtocolSnapshot {
        id: "c:2024-03".to_string(),
        snapshot_id: uuid::Uuid::new_v4(),
        client_id: "c".to_string(),
        client_name: "C".to_string(),
        month: "2024-03".to_string(),
        entries: Vec::new(),
        total_transfers: 0,
        total_packages: 0,
        created_at: chrono::Utc::now(),
    };
    store.save_snapshot(&snapshot).expect("save");
    snapshot.total_packages = 7;
    store.save_snapshot(&snapshot).expect("upsert");

    let listed = store.list_snapshots().expect("list");
    assert_eq!(listed.len(), 1, "same id replaces the document");
    assert_eq!(listed[0].total_packages, 7);

    // pruning keeps the newest 300
    for i in 0..320i64 {
        let mut other = snapshot.clone();
        other.id = format!("c:{i}");
        other.created_at = chrono::Utc::now() + chrono::Duration::seconds(i);
        store.save_snapshot(&other).expect("save");
    }
    let listed = store.list_snapshots().expect("list");
    assert_eq!(listed.len(), 300);

    let found = store.snapshot("c:319").expect("get");
    assert!(found.is_some());
}

#[test]
fn test_summarized_flag() {
    let temp = TempFile::new("store_summarized");
    let mut store = new_store(&temp);
    store
        .append_entry("c", "2024-03", basic_entry("2024-03-05", 1))
        .expect("append");

    store
        .set_summarized("c", "2024-03", true)
        .expect("summarize");
    assert!(store.month_ledger("c", "2024-03").expect("read").summarized);
    store
        .set_summarized("c", "2024-03", false)
        .expect("reopen");
    assert!(!store.month_ledger("c", "2024-03").expect("read").summarized);
}
