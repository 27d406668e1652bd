//! End-to-end tests of the parse → classify → reconcile → render pipeline,
//! driven through the public library API.

use chrono::{Local, TimeZone};
use std::time::{Duration, Instant};
use tempfile::TempDir;

use gatewatch::classifier::{Classifier, Verdict};
use gatewatch::engine::{Engine, EngineSettings};
use gatewatch::fs_abstraction::RealFileSystem;
use gatewatch::labels::{load_annotator, NoLabels};
use gatewatch::lists::NetworkList;
use gatewatch::render::publish;
use gatewatch::snapshot::parse_snapshot;
use gatewatch::state::TableState;

fn office_engine(max_rows: usize) -> Engine {
    let settings = EngineSettings {
        max_rows,
        ..Default::default()
    };
    Engine::new(
        settings,
        Classifier::new(
            NetworkList::parse("10.8.0.0/24\n2001:db8::/32\n"),
            NetworkList::parse("10.8.0.66\n"),
        ),
        Box::new(NoLabels),
    )
}

fn dump(lines: &[&str]) -> String {
    let mut out = String::from("# table: vpn, type: ip, size:102400, used:0\n");
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[test]
fn test_rows_follow_first_seen_order() {
    let mut engine = office_engine(100);
    let t0 = Instant::now();

    let first = dump(&[
        "0x1: key=10.8.0.3 use=0 exp=0 conn_cnt=1 conn_cur=1",
        "0x2: key=10.8.0.1 use=0 exp=0 conn_cnt=1 conn_cur=1",
    ]);
    engine.reconcile(&parse_snapshot(&first), t0, Local::now());

    let second = dump(&[
        "0x3: key=10.8.0.2 use=0 exp=0 conn_cnt=1 conn_cur=1",
        "0x1: key=10.8.0.3 use=0 exp=0 conn_cnt=9 conn_cur=4",
    ]);
    engine.reconcile(&parse_snapshot(&second), t0 + Duration::from_secs(6), Local::now());

    let order: Vec<_> = engine.allowed().rows().map(|r| r.address.as_str()).collect();
    assert_eq!(order, vec!["10.8.0.3", "10.8.0.1", "10.8.0.2"]);
    assert_eq!(engine.allowed().get("10.8.0.3").unwrap().cumulative_connections, 9);
}

#[test]
fn test_every_address_lands_in_exactly_one_table() {
    let mut engine = office_engine(100);
    let snapshot = dump(&[
        "0x1: key=10.8.0.12 use=0 exp=0 conn_cnt=4 conn_cur=2",
        "0x2: key=10.8.0.66 use=0 exp=0 conn_cnt=4 conn_cur=2",
        "0x3: key=198.51.100.7 use=0 exp=0 conn_cnt=1 conn_cur=1",
        "0x4: key=2001:db8::7 use=0 exp=0 conn_cnt=2 conn_cur=1",
        "0x5: key=not-an-ip use=0 exp=0 conn_cnt=2 conn_cur=1",
    ]);
    let samples = parse_snapshot(&snapshot);
    engine.reconcile(&samples, Instant::now(), Local::now());

    for sample in &samples {
        let in_allowed = engine.allowed().get(&sample.address).is_some();
        let in_blocked = engine.blocked().get(&sample.address).is_some();
        assert!(in_allowed ^ in_blocked, "{} in both or neither", sample.address);
        assert_eq!(
            in_allowed,
            engine.classifier().classify(&sample.address) == Verdict::Allowed
        );
    }
    assert_eq!(engine.allowed().len(), 2);
    assert_eq!(engine.blocked().len(), 3);
}

#[test]
fn test_prefix_sharing_addresses_get_separate_rows() {
    let mut engine = office_engine(100);
    let snapshot = dump(&[
        "0x1: key=10.8.0.1 use=0 exp=0 conn_cnt=1 conn_cur=1",
        "0x2: key=10.8.0.10 use=0 exp=0 conn_cnt=2 conn_cur=2",
        "0x3: key=10.8.0.100 use=0 exp=0 conn_cnt=3 conn_cur=3",
    ]);
    engine.reconcile(&parse_snapshot(&snapshot), Instant::now(), Local::now());

    assert_eq!(engine.allowed().len(), 3);
    assert_eq!(engine.allowed().get("10.8.0.1").unwrap().current_connections, 1);
    assert_eq!(engine.allowed().get("10.8.0.10").unwrap().current_connections, 2);
    assert_eq!(engine.allowed().get("10.8.0.100").unwrap().current_connections, 3);
}

#[test]
fn test_tables_never_exceed_bound() {
    let mut engine = office_engine(100);
    let t0 = Instant::now();

    for round in 0..3u64 {
        let lines: Vec<String> = (0..80)
            .map(|i| {
                format!(
                    "0x{:x}: key=192.0.{}.{} use=0 exp=0 conn_cnt=1 conn_cur=1",
                    i, round, i
                )
            })
            .collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let report = engine.reconcile(
            &parse_snapshot(&dump(&refs)),
            t0 + Duration::from_secs(10 * round),
            Local::now(),
        );
        assert_eq!(report.blocked, 80);
        assert!(engine.blocked().len() <= 100);
    }

    assert_eq!(engine.blocked().len(), 100);
    // Tail truncation keeps the oldest rows
    assert!(engine.blocked().get("192.0.0.0").is_some());
    assert!(engine.blocked().get("192.0.2.79").is_none());
}

#[test]
fn test_page_survives_restart() {
    let dir = TempDir::new().unwrap();
    let page = dir.path().join("active_ips.html");
    let state_file = dir.path().join("tables.json");
    let fs = RealFileSystem;
    let stamp = Local.with_ymd_and_hms(2024, 5, 1, 9, 15, 0).unwrap();

    let mut engine = office_engine(100);
    let snapshot = dump(&[
        "0x1: key=10.8.0.12 use=0 exp=0 conn_cnt=42 conn_cur=7",
        "0x2: key=198.51.100.7 use=0 exp=0 conn_cnt=1 conn_cur=1",
    ]);
    engine.reconcile(&parse_snapshot(&snapshot), Instant::now(), stamp);
    publish(&fs, &page, &engine.render()).unwrap();
    engine.state().save(&fs, &state_file).unwrap();

    let mut restarted = office_engine(100);
    restarted.restore(TableState::load(&fs, &state_file).unwrap());
    let before = std::fs::read_to_string(&page).unwrap();
    assert_eq!(restarted.render(), before);
    assert!(before.contains("2024-05-01 09:15:00"));
    assert!(before.contains("<tr class=\"high\">"));
}

#[test]
fn test_country_labels_from_database() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("countries.json");
    std::fs::write(&db, r#"{"FR": ["198.51.100.0/24"], "de": ["203.0.113.0/24"]}"#).unwrap();

    let annotator = load_annotator(&RealFileSystem, Some(&db));
    let mut engine = Engine::new(
        EngineSettings::default(),
        Classifier::default(),
        annotator,
    );
    let snapshot = dump(&[
        "0x1: key=198.51.100.7 use=0 exp=0 conn_cnt=1 conn_cur=1",
        "0x2: key=192.0.2.1 use=0 exp=0 conn_cnt=1 conn_cur=1",
    ]);
    engine.reconcile(&parse_snapshot(&snapshot), Instant::now(), Local::now());

    assert_eq!(engine.blocked().get("198.51.100.7").unwrap().label, "fr");
    assert_eq!(engine.blocked().get("192.0.2.1").unwrap().label, "");
    assert!(engine.render().contains("flagcdn.com"));
}
