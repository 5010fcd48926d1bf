//! End-to-end CLI flow against a real store file.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_protokol"))
}

struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be available")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "protokol_{}_{}_{}",
            prefix,
            std::process::id(),
            nanos
        ));
        std::fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn run(store: &Path, args: &[&str]) -> Output {
    Command::new(bin())
        .args(args)
        .env("PROTOKOL_STORE", store)
        .env("TERM", "dumb")
        .output()
        .expect("command should run")
}

fn run_ok(store: &Path, args: &[&str]) -> String {
    let output = run(store, args);
    assert!(
        output.status.success(),
        "command {:?} failed:\nstdout: {}\nstderr: {}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn write_fake_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(b"not-a-real-image-body");
    std::fs::write(&path, bytes).expect("write png");
    path
}

#[test]
fn test_full_protocol_flow() {
    let dir = TempDir::new("flow");
    let store = dir.path.join("protokol.db");
    let staff_sig = write_fake_png(&dir.path, "staff.png");

    run_ok(&store, &["init", store.to_str().expect("path"), "--no-config"]);

    run_ok(
        &store,
        &["clients", "add", "Gabinet Ewa", "--logistics", "punkt"],
    );
    let clients = run_ok(&store, &["clients", "list", "--json"]);
    assert!(clients.contains("\"gabinet-ewa\""));

    run_ok(&store, &["tools", "add", "--category", "medical", "Clamp"]);

    run_ok(
        &store,
        &[
            "entry", "add", "--client", "gabinet-ewa", "--month", "2024-03",
            "--date", "2024-03-05", "--tool", "clamp=3", "--packages", "2",
            "--service", "courier-x1",
        ],
    );

    let listed = run_ok(
        &store,
        &[
            "entry", "list", "--client", "gabinet-ewa", "--month", "2024-03", "--json",
        ],
    );
    let entries: serde_json::Value = serde_json::from_str(&listed).expect("valid JSON");
    let entry = &entries[0];
    // dictionary canonicalized the retyped tool name
    assert_eq!(entry["tools"][0]["name"], "Clamp");
    assert_eq!(entry["delivery"], "odbior");
    // initial queue derived from the client's logistics default
    assert_eq!(entry["queue"]["pointPending"], true);

    // switch the selection to the courier queue
    run_ok(
        &store,
        &[
            "queue", "set", "--client", "gabinet-ewa", "--month", "2024-03",
            "--type", "courier", "0",
        ],
    );
    let listed = run_ok(
        &store,
        &[
            "entry", "list", "--client", "gabinet-ewa", "--month", "2024-03", "--json",
        ],
    );
    let entries: serde_json::Value = serde_json::from_str(&listed).expect("valid JSON");
    assert_eq!(entries[0]["queue"]["courierPending"], true);
    assert_eq!(entries[0]["queue"]["pointPending"], false);

    let queue = run_ok(&store, &["queue", "list", "--type", "courier", "--json"]);
    assert!(queue.contains("gabinet-ewa"));

    // finalize is rejected without a staff signature
    let output = run(
        &store,
        &[
            "finalize", "--client", "gabinet-ewa", "--month", "2024-03",
            "--type", "courier", "0",
        ],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("staff signature"));

    run_ok(
        &store,
        &[
            "sign", "add", "--client", "gabinet-ewa", "--month", "2024-03",
            "--leg", "transfer", "--staff-sig",
            staff_sig.to_str().expect("path"), "0",
        ],
    );

    let snapshot = run_ok(
        &store,
        &[
            "finalize", "--client", "gabinet-ewa", "--month", "2024-03",
            "--type", "courier", "0", "--json",
        ],
    );
    let snapshot: serde_json::Value = serde_json::from_str(&snapshot).expect("valid JSON");
    assert_eq!(snapshot["totalPackages"], 2);
    assert_eq!(snapshot["entries"][0]["rows"][0]["name"], "Clamp");
    assert_eq!(snapshot["entries"][0]["rows"][1]["name"], "Pakiety");
    assert_eq!(snapshot["entries"][0]["rows"][1]["isSummary"], true);
    // Tuesday -> Wednesday default return date
    assert_eq!(snapshot["entries"][0]["returnDate"], "2024-03-06");

    // the same content cannot enter the protocol twice
    let output = run(
        &store,
        &[
            "finalize", "--client", "gabinet-ewa", "--month", "2024-03",
            "--type", "courier", "0",
        ],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("already"));

    let snapshots = run_ok(&store, &["snapshot", "list", "--json"]);
    let snapshots: serde_json::Value = serde_json::from_str(&snapshots).expect("valid JSON");
    assert_eq!(snapshots.as_array().expect("array").len(), 1);

    run_ok(
        &store,
        &[
            "entry", "remove", "--client", "gabinet-ewa", "--month", "2024-03",
            "--yes", "0",
        ],
    );
    let listed = run_ok(
        &store,
        &[
            "entry", "list", "--client", "gabinet-ewa", "--month", "2024-03", "--json",
        ],
    );
    let entries: serde_json::Value = serde_json::from_str(&listed).expect("valid JSON");
    assert_eq!(entries.as_array().expect("array").len(), 0);

    let check = run_ok(&store, &["check"]);
    assert!(check.contains("[OK]"));
}

#[test]
fn test_return_flow_and_weekend_normalization() {
    let dir = TempDir::new("return");
    let store = dir.path.join("protokol.db");
    run_ok(&store, &["init", store.to_str().expect("path"), "--no-config"]);
    run_ok(&store, &["clients", "add", "Salon Anna"]);

    run_ok(
        &store,
        &[
            "entry", "add", "--client", "salon-anna", "--month", "2024-03",
            "--date", "2024-03-08", "--tool", "Nożyczki=2", "--packages", "1",
        ],
    );

    // Saturday is pushed to Monday
    run_ok(
        &store,
        &[
            "return", "set", "--client", "salon-anna", "--month", "2024-03",
            "--date", "2024-03-09", "--match-transfer", "0",
        ],
    );
    let listed = run_ok(
        &store,
        &[
            "entry", "list", "--client", "salon-anna", "--month", "2024-03", "--json",
        ],
    );
    let entries: serde_json::Value = serde_json::from_str(&listed).expect("valid JSON");
    assert_eq!(entries[0]["returnDate"], "2024-03-11");
    assert_eq!(entries[0]["returnTools"][0]["count"], 2);
    assert_eq!(entries[0]["returnPackages"], 1);
}

#[test]
fn test_validation_errors_stay_local() {
    let dir = TempDir::new("validation");
    let store = dir.path.join("protokol.db");
    run_ok(&store, &["init", store.to_str().expect("path"), "--no-config"]);
    run_ok(&store, &["clients", "add", "Salon Anna"]);

    // no tools, no packages
    let output = run(
        &store,
        &[
            "entry", "add", "--client", "salon-anna", "--month", "2024-03",
            "--date", "2024-03-05",
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("packages"));
    assert!(stderr.contains("tool"));

    // date outside the month
    let output = run(
        &store,
        &[
            "entry", "add", "--client", "salon-anna", "--month", "2024-03",
            "--date", "2024-04-01", "--tool", "Clamp=1", "--packages", "1",
        ],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("2024-04"));

    let listed = run_ok(
        &store,
        &[
            "entry", "list", "--client", "salon-anna", "--month", "2024-03", "--json",
        ],
    );
    let entries: serde_json::Value = serde_json::from_str(&listed).expect("valid JSON");
    assert_eq!(entries.as_array().expect("array").len(), 0);
}

#[test]
fn test_pad_signing_flow() {
    let dir = TempDir::new("pad");
    let store = dir.path.join("protokol.db");
    run_ok(&store, &["init", store.to_str().expect("path"), "--no-config"]);
    run_ok(&store, &["clients", "add", "Salon Anna"]);
    run_ok(
        &store,
        &[
            "entry", "add", "--client", "salon-anna", "--month", "2024-03",
            "--date", "2024-03-05", "--tool", "Clamp=1", "--packages", "1",
        ],
    );
    run_ok(
        &store,
        &[
            "queue", "set", "--client", "salon-anna", "--month", "2024-03",
            "--type", "point", "0",
        ],
    );

    // ink only the transfer staff pad
    let strokes = dir.path.join("strokes.json");
    std::fs::write(
        &strokes,
        r#"{"transfer": {"staff": [[[10, 10], [120, 60], [200, 30]]]}}"#,
    )
    .expect("write strokes");
    run_ok(
        &store,
        &[
            "sign", "pad", "--client", "salon-anna", "--month", "2024-03",
            "--strokes", strokes.to_str().expect("path"), "0",
        ],
    );

    let listed = run_ok(
        &store,
        &[
            "entry", "list", "--client", "salon-anna", "--month", "2024-03", "--json",
        ],
    );
    let entries: serde_json::Value = serde_json::from_str(&listed).expect("valid JSON");
    let staff_sig = entries[0]["signatures"]["transfer"]["staff"]
        .as_str()
        .expect("staff signature present");
    assert!(staff_sig.starts_with("data:image/x-portable-bitmap;base64,"));
    assert!(entries[0]["signatures"]["transfer"].get("client").is_none());

    // a pad-signed entry passes the gate
    run_ok(
        &store,
        &[
            "finalize", "--client", "salon-anna", "--month", "2024-03",
            "--type", "point", "0",
        ],
    );

    // an all-empty strokes file is rejected
    let empty = dir.path.join("empty.json");
    std::fs::write(&empty, r#"{}"#).expect("write strokes");
    let output = run(
        &store,
        &[
            "sign", "pad", "--client", "salon-anna", "--month", "2024-03",
            "--strokes", empty.to_str().expect("path"), "0",
        ],
    );
    assert!(!output.status.success());
}

#[test]
fn test_draft_and_duplicate_flow() {
    let dir = TempDir::new("draft");
    let store = dir.path.join("protokol.db");
    run_ok(&store, &["init", store.to_str().expect("path"), "--no-config"]);
    run_ok(&store, &["clients", "add", "Salon Anna"]);

    run_ok(
        &store,
        &[
            "entry", "add", "--client", "salon-anna", "--month", "2024-03",
            "--date", "2024-03-05", "--tool", "Clamp=3", "--packages", "2",
            "--comment", "ostrożnie",
        ],
    );

    run_ok(
        &store,
        &[
            "entry", "duplicate", "--client", "salon-anna", "--month", "2024-03", "0",
        ],
    );
    let draft = run_ok(
        &store,
        &[
            "draft", "show", "--client", "salon-anna", "--month", "2024-03", "--json",
        ],
    );
    let draft: serde_json::Value = serde_json::from_str(&draft).expect("valid JSON");
    assert_eq!(draft["tools"][0]["name"], "Clamp");
    assert_eq!(draft["comment"], "ostrożnie");
    assert!(draft["date"].is_null());

    // materialize the duplicate with its own date; the draft clears
    run_ok(
        &store,
        &[
            "entry", "add", "--client", "salon-anna", "--month", "2024-03",
            "--from-draft", "--date", "2024-03-12",
        ],
    );
    let listed = run_ok(
        &store,
        &[
            "entry", "list", "--client", "salon-anna", "--month", "2024-03", "--json",
        ],
    );
    let entries: serde_json::Value = serde_json::from_str(&listed).expect("valid JSON");
    assert_eq!(entries.as_array().expect("array").len(), 2);

    let draft = run_ok(
        &store,
        &[
            "draft", "show", "--client", "salon-anna", "--month", "2024-03", "--json",
        ],
    );
    assert_eq!(draft.trim(), "null");
}
