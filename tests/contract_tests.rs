//! Behaviour every backend must share, driven through the factory against
//! in-memory servers.

use chrono::{TimeZone, Utc};
use ferry::*;
use ferry_core::remote::memory::{MemoryServer, SharedServer};
use ferry_core::remote::sync::copy_directory_via;
use ferry_ftp::ftp::memory::MemoryFtpDialer;
use ferry_sftp::sftp::memory::MemorySftpDialer;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const USER: &str = "tester";
const PASS: &str = "pa55word";
const BOTH: [Protocol; 2] = [Protocol::Ftp, Protocol::Sftp];

fn server() -> MemoryServer {
    MemoryServer::new().with_account(USER, PASS)
}

fn factory(shared: &SharedServer) -> ConnectionFactory<MemoryFtpDialer, MemorySftpDialer> {
    ConnectionFactory::with_dialers(
        MemoryFtpDialer::new(shared.clone()),
        MemorySftpDialer::new(shared.clone()),
    )
}

fn connect(protocol: Protocol, server: MemoryServer) -> (Box<dyn RemoteConnection>, SharedServer) {
    let shared = server.shared();
    let mut conn = factory(&shared).create(protocol);
    let outcome = conn.connect("files.test", USER, PASS).unwrap();
    assert_eq!(outcome, ConnectOutcome::Authenticated, "{}", protocol);
    (conn, shared)
}

fn paths_under(shared: &SharedServer, prefix: &str) -> BTreeSet<String> {
    shared
        .borrow()
        .tree
        .paths()
        .into_iter()
        .filter(|p| p == prefix || p.starts_with(&format!("{}/", prefix)))
        .collect()
}

// ── Connection scenarios ─────────────────────────────────────────────

#[test]
fn test_empty_root_lists_zero_entries() {
    for protocol in BOTH {
        let (mut conn, _) = connect(protocol, server());
        assert!(conn.list_current_directory().unwrap().is_empty(), "{}", protocol);
        assert_eq!(conn.current_directory().unwrap(), "/", "{}", protocol);
    }
}

#[test]
fn test_invalid_credentials_are_rejected_not_transport_failure() {
    for protocol in BOTH {
        let shared = server().shared();
        let mut conn = factory(&shared).create(protocol);
        let outcome = conn.connect("files.test", USER, "wrong").unwrap();
        assert_eq!(outcome, ConnectOutcome::RejectedCredentials, "{}", protocol);
        assert_eq!(conn.state(), SessionState::Unconnected);
    }
}

#[test]
fn test_unreachable_server_is_transport_failure() {
    for protocol in BOTH {
        let shared = server().shared();
        shared.borrow_mut().set_offline(true);
        let mut conn = factory(&shared).create(protocol);
        let outcome = conn.connect("files.test", USER, PASS).unwrap();
        assert!(matches!(outcome, ConnectOutcome::TransportFailure { .. }), "{}", protocol);
    }
}

#[test]
fn test_state_machine_is_enforced() {
    for protocol in BOTH {
        let shared = server().shared();
        let mut conn = factory(&shared).create(protocol);

        let err = conn.directory_exists("/").unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::NotConnected, "{}", protocol);

        conn.connect("files.test", USER, PASS).unwrap();
        assert_eq!(conn.state(), SessionState::Connected);
        conn.disconnect().unwrap();
        assert_eq!(conn.state(), SessionState::Disconnected);

        assert_eq!(conn.disconnect().unwrap_err().kind, RemoteErrorKind::InvalidState);
        assert_eq!(
            conn.connect("files.test", USER, PASS).unwrap_err().kind,
            RemoteErrorKind::InvalidState
        );
        assert!(conn.list_directory("/").is_err());
    }
}

// ── File round trips ─────────────────────────────────────────────────

#[test]
fn test_upload_then_download_is_byte_identical() {
    let payload: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();

    for protocol in BOTH {
        let mut fixture = server();
        fixture.tree.add_dir_all("/inbox");
        let (mut conn, _) = connect(protocol, fixture);

        let outbound = TempDir::new().unwrap();
        let file = outbound.path().join("blob.bin");
        fs::write(&file, &payload).unwrap();
        assert!(conn.upload_single_file(&file, "/inbox/").unwrap(), "{}", protocol);

        let inbound = TempDir::new().unwrap();
        assert!(conn.download_single_file(inbound.path(), "/inbox/blob.bin").unwrap());
        assert_eq!(fs::read(inbound.path().join("blob.bin")).unwrap(), payload, "{}", protocol);
    }
}

#[test]
fn test_create_directory_is_idempotent() {
    for protocol in BOTH {
        let mut fixture = server();
        fixture.tree.add_file("/docs/keep.txt", b"keep");
        let (mut conn, shared) = connect(protocol, fixture);

        assert!(conn.create_directory("/docs").unwrap(), "{}", protocol);
        assert!(conn.create_directory("/docs/").unwrap(), "{}", protocol);
        assert_eq!(shared.borrow().tree.read("/docs/keep.txt").unwrap(), b"keep");

        assert!(conn.create_directory("/fresh").unwrap());
        assert!(conn.directory_exists("/fresh").unwrap());
        assert!(!conn.create_directory("/no/parent/here").unwrap(), "{}", protocol);
    }
}

#[test]
fn test_deleting_missing_paths_reports_false() {
    for protocol in BOTH {
        let (mut conn, _) = connect(protocol, server());
        assert!(!conn.delete_file("/ghost.txt").unwrap(), "{}", protocol);
        assert!(!conn.delete_directory("/ghost").unwrap(), "{}", protocol);
    }
}

#[test]
fn test_rename_missing_and_fresh_names() {
    for protocol in BOTH {
        let mut fixture = server();
        fixture.tree.add_file("/a.txt", b"a").add_file("/taken.txt", b"t");
        let (mut conn, _) = connect(protocol, fixture);

        assert!(!conn.rename_remote_file("/missing.txt", "/x.txt").unwrap());
        assert!(!conn.rename_remote_file("/a.txt", "/taken.txt").unwrap(), "{}", protocol);

        assert!(conn.rename_remote_file("/a.txt", "/b.txt").unwrap(), "{}", protocol);
        assert!(!conn.file_exists("/a.txt").unwrap());
        assert!(conn.file_exists("/b.txt").unwrap());
    }
}

#[test]
fn test_permission_capability_differs_by_backend() {
    let mut fixture = server();
    fixture.tree.add_file("/x.sh", b"x");
    let (mut ftp, _) = connect(Protocol::Ftp, fixture.clone());
    let (mut sftp, shared) = connect(Protocol::Sftp, fixture);

    assert!(!ftp.supports_permissions());
    assert!(ftp.change_permission("755", "/x.sh").unwrap_err().is_unsupported());

    assert!(sftp.supports_permissions());
    assert!(sftp.change_permission("700", "/x.sh").unwrap());
    assert_eq!(shared.borrow().tree.stat("/x.sh").unwrap().mode, 0o700);
}

// ── Batch transfers ──────────────────────────────────────────────────

#[test]
fn test_batch_upload_reports_every_item() {
    for protocol in BOTH {
        let mut fixture = server();
        fixture.tree.add_dir_all("/in");
        let (mut conn, _) = connect(protocol, fixture);

        let local = TempDir::new().unwrap();
        let good = local.path().join("good.txt");
        fs::write(&good, b"ok").unwrap();
        let paths: Vec<PathBuf> = vec![local.path().join("missing.txt"), good];

        let report = conn.upload_multiple_files(&paths, "/in");
        assert_eq!(report.total(), 2);
        assert!(matches!(report.items[0].outcome, ItemOutcome::Rejected), "{}", protocol);
        assert!(matches!(report.items[1].outcome, ItemOutcome::Transferred), "{}", protocol);
        assert!(conn.file_exists("/in/good.txt").unwrap());
    }
}

#[test]
fn test_batch_download_continues_past_missing_files() {
    for protocol in BOTH {
        let mut fixture = server();
        fixture.tree.add_file("/out/one.txt", b"1").add_file("/out/two.txt", b"2");
        let (mut conn, _) = connect(protocol, fixture);

        let local = TempDir::new().unwrap();
        let remotes = vec![
            "/out/one.txt".to_string(),
            "/out/nope.txt".to_string(),
            "/out/two.txt".to_string(),
        ];
        let report = conn.download_multiple_files(&remotes, local.path());
        assert_eq!(report.succeeded(), 2, "{}", protocol);
        assert_eq!(report.unsuccessful(), vec!["/out/nope.txt"]);
        assert!(local.path().join("two.txt").is_file());
    }
}

// ── Search ───────────────────────────────────────────────────────────

#[test]
fn test_search_counts_matching_files() {
    for protocol in BOTH {
        let mut fixture = server();
        fixture
            .tree
            .add_file("/lib/foo.txt", b"f")
            .add_file("/lib/notes.md", b"n")
            .add_dir_all("/lib/food");
        let (mut conn, _) = connect(protocol, fixture);

        assert_eq!(conn.search_files_with_keyword("/lib", "foo").unwrap(), 1, "{}", protocol);
        assert_eq!(conn.search_files_with_extension("/lib", "txt").unwrap(), 1);
        assert_eq!(conn.search_files_with_extension("/lib", ".md").unwrap(), 1);
        assert_eq!(conn.search_files_with_keyword("", "foo").unwrap(), 0);
        assert_eq!(conn.search_files_with_keyword("/lib", "").unwrap(), 0);
        assert_eq!(conn.search_files_with_keyword("/missing", "foo").unwrap(), 0);
    }
}

// ── Directory sync ───────────────────────────────────────────────────

#[test]
fn test_copy_directory_reproduces_exactly_the_source_files() {
    for protocol in BOTH {
        let mut fixture = server();
        fixture
            .tree
            .add_file("/src/a.txt", b"alpha")
            .add_file("/src/b.txt", b"beta")
            .add_file("/src/nested/c.txt", b"gamma")
            .add_file("/other/unrelated.txt", b"x");
        let (mut conn, shared) = connect(protocol, fixture);

        assert!(conn.copy_directory("/src/", "/dst").unwrap(), "{}", protocol);

        let expected: BTreeSet<String> = [
            "/dst",
            "/dst/a.txt",
            "/dst/b.txt",
            "/dst/nested",
            "/dst/nested/c.txt",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(paths_under(&shared, "/dst"), expected, "{}", protocol);
        assert_eq!(shared.borrow().tree.read("/dst/nested/c.txt").unwrap(), b"gamma");
        assert_eq!(shared.borrow().tree.read("/src/a.txt").unwrap(), b"alpha");
    }
}

#[test]
fn test_copy_of_missing_source_has_no_side_effects() {
    for protocol in BOTH {
        let (mut conn, shared) = connect(protocol, server());
        let staging_parent = TempDir::new().unwrap();

        let copied =
            copy_directory_via(conn.as_mut(), "/missing", "/dst", staging_parent.path()).unwrap();

        assert!(!copied, "{}", protocol);
        assert_eq!(fs::read_dir(staging_parent.path()).unwrap().count(), 0);
        assert!(shared.borrow().tree.paths().is_empty());
        assert!(!conn.copy_directory("/missing", "/dst").unwrap());
    }
}

#[test]
fn test_copy_leaves_no_staging_behind() {
    for protocol in BOTH {
        let mut fixture = server();
        fixture.tree.add_file("/src/f.txt", b"f");
        let (mut conn, _) = connect(protocol, fixture);
        let staging_parent = TempDir::new().unwrap();

        assert!(copy_directory_via(conn.as_mut(), "/src", "/dst", staging_parent.path()).unwrap());
        assert_eq!(fs::read_dir(staging_parent.path()).unwrap().count(), 0, "{}", protocol);
    }
}

#[test]
fn test_download_directory_only_refetches_newer_files() {
    for protocol in BOTH {
        let mut fixture = server();
        fixture
            .tree
            .add_file("/pub/a.txt", b"a")
            .add_file("/pub/deep/b.txt", b"b");
        let (mut conn, shared) = connect(protocol, fixture);
        let local = TempDir::new().unwrap();

        let first = conn.download_directory("/pub", local.path()).unwrap();
        assert_eq!(first.files_transferred, 2, "{}", protocol);
        assert_eq!(first.directories_created, 1);
        assert_eq!(fs::read(local.path().join("deep").join("b.txt")).unwrap(), b"b");

        let second = conn.download_directory("/pub/", local.path()).unwrap();
        assert_eq!(second.files_transferred, 0, "{}", protocol);
        assert_eq!(second.files_skipped, 2);

        let future = Utc.with_ymd_and_hms(2099, 6, 1, 0, 0, 0).unwrap();
        shared.borrow_mut().tree.set_modified("/pub/a.txt", future).unwrap();
        let third = conn.download_directory("/pub", local.path()).unwrap();
        assert_eq!(third.files_transferred, 1, "{}", protocol);
        assert_eq!(third.files_skipped, 1);
    }
}

#[test]
fn test_links_follow_their_targets() {
    for protocol in BOTH {
        let mut fixture = server();
        fixture
            .tree
            .add_file("/data/real.log", b"log")
            .add_dir_all("/data/archive")
            .add_symlink("/data/current.log", "/data/real.log")
            .add_symlink("/data/old", "/data/archive")
            .add_file("/shared/notes.txt", b"notes")
            .add_symlink("/links/notes.txt", "/shared/notes.txt");
        let (mut conn, shared) = connect(protocol, fixture);

        let kinds: Vec<(String, EntryKind)> = conn
            .list_directory("/data")
            .unwrap()
            .into_iter()
            .map(|e| (e.name, e.kind))
            .collect();
        assert!(kinds.contains(&("current.log".to_string(), EntryKind::Symlink)), "{}", protocol);
        assert!(conn.file_exists("/data/current.log").unwrap(), "{}", protocol);
        assert!(!conn.file_exists("/data/old").unwrap(), "{}", protocol);

        let local = TempDir::new().unwrap();
        let summary = conn.download_directory("/data", local.path()).unwrap();
        assert_eq!(summary.files_transferred, 2, "{}", protocol);
        assert_eq!(summary.failed, vec![local.path().join("old")], "{}", protocol);
        assert_eq!(fs::read(local.path().join("current.log")).unwrap(), b"log");

        assert!(conn.copy_directory("/links", "/copied").unwrap(), "{}", protocol);
        let server = shared.borrow();
        assert!(!server.tree.is_link("/copied/notes.txt"), "{}", protocol);
        assert_eq!(server.tree.read("/copied/notes.txt").unwrap(), b"notes");
    }
}

#[test]
fn test_upload_directory_mirrors_and_skips_hidden_entries() {
    for protocol in BOTH {
        let mut fixture = server();
        fixture.tree.add_dir_all("/site");
        let (mut conn, shared) = connect(protocol, fixture);

        let local = TempDir::new().unwrap();
        fs::write(local.path().join("index.html"), b"<html/>").unwrap();
        fs::write(local.path().join(".env"), b"SECRET=1").unwrap();
        fs::create_dir_all(local.path().join("css")).unwrap();
        fs::write(local.path().join("css").join("main.css"), b"body{}").unwrap();
        fs::create_dir_all(local.path().join(".git")).unwrap();
        fs::write(local.path().join(".git").join("HEAD"), b"ref").unwrap();

        let summary = conn.upload_directory(local.path(), "/site").unwrap();
        assert!(summary.is_complete(), "{}", protocol);
        assert_eq!(summary.files_transferred, 2);

        let expected: BTreeSet<String> = [
            "/site",
            "/site/index.html",
            "/site/css",
            "/site/css/main.css",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(paths_under(&shared, "/site"), expected, "{}", protocol);
    }
}

// ── Factory and configuration ────────────────────────────────────────

#[test]
fn test_factory_resolves_protocol_names() {
    let shared = server().shared();
    let factory = factory(&shared);

    assert_eq!(factory.create_named("ftp").unwrap().protocol(), Protocol::Ftp);
    assert_eq!(factory.create_named("SFTP").unwrap().protocol(), Protocol::Sftp);
    let err = factory.create_named("telnet").err().unwrap();
    assert_eq!(err.kind, RemoteErrorKind::InvalidInput);
}

#[test]
fn test_open_from_saved_credentials() {
    let dir = TempDir::new().unwrap();
    let mut store = CredentialStore::load(&dir.path().join("credentials.json")).unwrap();
    let saved = ConnectionConfig::new(Protocol::Sftp, "files.test", USER, PASS);
    assert!(store.append(saved.to_record()).unwrap());

    let record = store.find(USER).unwrap();
    let config = ConnectionConfig::from_record(record).unwrap();

    let shared = server().shared();
    let (conn, outcome) = factory(&shared).open(&config).unwrap();
    assert!(outcome.is_authenticated());
    assert_eq!(conn.protocol(), Protocol::Sftp);
    assert_eq!(conn.state(), SessionState::Connected);
}
