use std::{sync::Arc, time::Duration};

use astap_reports_lib::{
    config::AppConfig,
    document::ReportDocument,
    drafts::{DraftStore, DEFAULT_STORAGE_KEY},
    email::MailHandoff,
    models::{GeneralInfo, MaterialLine, ReportPatch, ReportStatus, Signer},
    session::{ReportSession, SessionError, TestPhase},
    storage::{FileStorage, KeyValueStore, MemoryStorage, SqliteStorage},
    validation::validate_for_export,
    ReportsApp,
};

fn client_patch(client: &str) -> ReportPatch {
    ReportPatch::general_info(GeneralInfo {
        client: client.into(),
        service_date: "2026-10-19".into(),
        technician_name: "Ana Torres".into(),
        ..Default::default()
    })
}

fn full_cycle<S: KeyValueStore>(storage: S) {
    let mut session = ReportSession::new(DraftStore::new(storage));
    assert!(session.active().is_none());

    let fresh = session.start_new();
    assert_eq!(fresh.id, None);
    assert_eq!(fresh.status, ReportStatus::Draft);

    let first = session.save_draft(client_patch("ACME"));
    let id = first.id.clone().expect("id assigned on first save");
    assert_eq!(first.general_info.client, "ACME");
    assert_eq!(first.created_at, first.updated_at);

    std::thread::sleep(Duration::from_millis(2));
    let second = session.save_draft(client_patch("ACME Corp"));
    assert_eq!(second.id.as_deref(), Some(id.as_str()));
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(session.drafts().len(), 1);

    let fetched = session.store().get_by_id(&id).unwrap();
    assert_eq!(fetched, second);

    session.delete_draft(&id);
    assert!(session.active().is_none());
    assert!(session.load_existing(&id).is_none());
    assert!(session.store().load_all().is_empty());
}

#[test]
fn lifecycle_on_memory_storage() {
    full_cycle(MemoryStorage::new());
}

#[test]
fn lifecycle_on_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    full_cycle(FileStorage::new(dir.path()).unwrap());
}

#[test]
fn lifecycle_on_sqlite_storage() {
    let dir = tempfile::tempdir().unwrap();
    full_cycle(SqliteStorage::open(dir.path().join("reports.sqlite3")).unwrap());
}

#[test]
fn corrupt_payload_reads_as_empty_and_is_replaced_on_next_save() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set_item(DEFAULT_STORAGE_KEY, "[{\"id\": 42, oops")
        .unwrap();

    let mut session = ReportSession::new(DraftStore::new(storage.clone()));
    assert!(session.drafts().is_empty());
    assert!(session.active().is_none());

    session.start_new();
    let saved = session.save_draft(client_patch("ACME"));
    assert_eq!(session.store().load_all(), vec![saved]);
}

#[test]
fn overflowing_materials_never_cost_other_drafts() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = ReportSession::new(DraftStore::new(FileStorage::new(dir.path()).unwrap()));
    for client in ["first", "second"] {
        session.start_new();
        session.save_draft(client_patch(client));
    }

    session.start_new();
    let rejected = session.add_material(MaterialLine {
        quantity: 1e200,
        unit_price: 1e200,
        ..Default::default()
    });
    assert!(matches!(rejected, Err(SessionError::InvalidAmount { .. })));

    // a patch can still carry one in; it is stored as zero
    let mut line = MaterialLine {
        id: "m1".into(),
        quantity: 1e200,
        unit_price: 1e200,
        ..Default::default()
    };
    line.recompute_total();
    let saved = session.save_draft(ReportPatch {
        materials_usage: Some(vec![line]),
        ..client_patch("third")
    });
    assert_eq!(saved.materials_total(), 0.0);

    session.start_new();
    session.save_draft(client_patch("fourth"));

    let reopened = ReportSession::new(DraftStore::new(FileStorage::new(dir.path()).unwrap()));
    let clients: Vec<_> = reopened
        .drafts()
        .iter()
        .map(|report| report.general_info.client.as_str())
        .collect();
    assert_eq!(clients, vec!["first", "second", "third", "fourth"]);
}

#[test]
fn wizard_run_to_export_and_mail_link() {
    let mut session = ReportSession::new(DraftStore::new(MemoryStorage::new()));
    session.start_new();
    session.save_draft(client_patch("ACME"));

    session
        .add_test_row(
            TestPhase::After,
            astap_reports_lib::models::TestRow {
                parameter: "Supply air temperature".into(),
                expected_value: "12 C".into(),
                actual_value: "12.4 C".into(),
                status: "ok".into(),
                ..Default::default()
            },
        )
        .unwrap();
    let mut parties = session.active().unwrap().responsible_parties.clone();
    parties.astap.name = "Ana Torres".into();
    parties.client.name = "Jorge Paz".into();
    session
        .apply_edit(ReportPatch {
            responsible_parties: Some(parties),
            ..Default::default()
        })
        .unwrap();

    let pending = session.active().unwrap().clone();
    let missing = validate_for_export(&pending).unwrap_err();
    assert_eq!(
        missing.missing_fields(),
        &["digitalSignatures.astap", "digitalSignatures.client"]
    );

    session
        .set_signature(Signer::Astap, Some("data:image/png;base64,QQ==".into()))
        .unwrap();
    session
        .set_signature(Signer::Client, Some("data:image/png;base64,Qg==".into()))
        .unwrap();
    let completed = session.save_completed(ReportPatch::default());
    assert_eq!(completed.status, ReportStatus::Completed);
    assert_eq!(completed.after_testing.len(), 1);
    validate_for_export(&completed).unwrap();

    let document = ReportDocument::from_report(&completed);
    assert!(document.render_text().contains("Supply air temperature"));
    assert!(document.file_name.ends_with("_2026-10-19.pdf"));

    let mail = MailHandoff::for_report(&completed, "office@acme.example").unwrap();
    assert!(mail
        .mailto_url()
        .starts_with("mailto:office@acme.example?subject=ASTAP%20Service%20Report%20-%20ACME"));
}

#[tokio::test(start_paused = true)]
async fn app_autosaver_persists_after_idle_period() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().to_path_buf();
    let config = AppConfig::from_lookup(move |name| match name {
        "ASTAP_DATA_DIR" => Some(data_dir.display().to_string()),
        "ASTAP_STORAGE" => Some("memory".into()),
        "ASTAP_AUTOSAVE_MS" => Some("200".into()),
        _ => None,
    })
    .unwrap();

    let mut app = ReportsApp::open(config).unwrap();
    app.session_mut().start_new();
    let saver = app.into_autosaver();
    assert_eq!(saver.idle(), Duration::from_millis(200));

    saver.edit(client_patch("typed")).await.unwrap();
    saver.edit(client_patch("typed more")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;

    let session = saver.session();
    let session = session.lock().await;
    let stored = session.store().load_all();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].general_info.client, "typed more");
    assert_eq!(stored[0].status, ReportStatus::Draft);
}
