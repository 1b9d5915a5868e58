//! Integration tests for one-shot ICS import and windowed export.

mod support;

use std::sync::Arc;

use calbridge_core::transfer::service::TransferService;
use support::{ics_feed, FixedClock, InMemoryEventRepository};

fn service(events: Arc<InMemoryEventRepository>) -> TransferService {
    TransferService::new(events, Arc::new(FixedClock::at(1_705_312_800)))
}

#[tokio::test]
async fn import_inserts_new_events() {
    let events = Arc::new(InMemoryEventRepository::new());
    let transfer = service(events.clone());

    let outcome = transfer
        .import_ics("user-1", &ics_feed(&[("a@x", "Standup"), ("b@x", "Review")]))
        .await
        .unwrap();

    assert_eq!(outcome.imported, 2);
    assert_eq!(outcome.skipped, 0);

    let stored = events.all_events();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|e| e.source_subscription_id.is_none()));
    assert!(stored.iter().all(|e| e.external_uid.is_some()));
}

#[tokio::test]
async fn reimport_skips_known_uids() {
    let events = Arc::new(InMemoryEventRepository::new());
    let transfer = service(events.clone());

    transfer.import_ics("user-1", &ics_feed(&[("a@x", "Standup")])).await.unwrap();
    let outcome = transfer
        .import_ics("user-1", &ics_feed(&[("a@x", "Standup"), ("b@x", "Review")]))
        .await
        .unwrap();

    assert_eq!(outcome.imported, 1);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(events.all_events().len(), 2);
}

#[tokio::test]
async fn import_of_unparseable_text_is_a_noop() {
    let events = Arc::new(InMemoryEventRepository::new());
    let transfer = service(events.clone());

    let outcome = transfer.import_ics("user-1", "not an ics document").await.unwrap();

    assert_eq!(outcome.imported, 0);
    assert_eq!(outcome.skipped, 0);
    assert!(events.all_events().is_empty());
}

#[tokio::test]
async fn events_without_uid_get_one_synthesized_and_import() {
    let events = Arc::new(InMemoryEventRepository::new());
    let transfer = service(events.clone());

    let ics = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nSUMMARY:No uid\r\nDTSTART:20240115T090000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
    let outcome = transfer.import_ics("user-1", ics).await.unwrap();

    assert_eq!(outcome.imported, 1);
    let stored = events.all_events();
    assert!(stored[0].external_uid.as_deref().unwrap().starts_with("imported-"));
}

#[tokio::test]
async fn export_includes_private_events() {
    let events = Arc::new(InMemoryEventRepository::new());
    let transfer = service(events.clone());

    transfer.import_ics("user-1", &ics_feed(&[("a@x", "Standup")])).await.unwrap();
    let mut private = events.all_events()[0].clone();
    private.id = "manual-1".into();
    private.external_uid = Some("p@x".into());
    private.title = "Dentist".into();
    private.is_private = true;
    events.seed(private);

    let ics = transfer.export_ics("user-1", None, None).await.unwrap();
    assert!(ics.contains("SUMMARY:Standup"));
    assert!(ics.contains("SUMMARY:Dentist"));
}

#[tokio::test]
async fn export_window_filters_by_event_bounds() {
    let events = Arc::new(InMemoryEventRepository::new());
    let transfer = service(events.clone());

    transfer
        .import_ics("user-1", &ics_feed(&[("a@x", "Morning"), ("b@x", "Later")]))
        .await
        .unwrap();

    let stored = events.all_events();
    let first = stored.iter().find(|e| e.title == "Morning").unwrap();

    let ics = transfer
        .export_ics("user-1", Some((first.start_ms, first.end_ms)), None)
        .await
        .unwrap();
    assert!(ics.contains("SUMMARY:Morning"));
    assert!(!ics.contains("SUMMARY:Later"));
}

#[tokio::test]
async fn export_names_the_calendar_when_asked() {
    let events = Arc::new(InMemoryEventRepository::new());
    let transfer = service(events.clone());

    let ics = transfer
        .export_ics("user-1", None, Some("Work calendar".to_string()))
        .await
        .unwrap();
    assert!(ics.contains("X-WR-CALNAME:Work calendar"));
}

#[tokio::test]
async fn imports_are_scoped_per_owner() {
    let events = Arc::new(InMemoryEventRepository::new());
    let transfer = service(events.clone());

    transfer.import_ics("user-1", &ics_feed(&[("a@x", "Standup")])).await.unwrap();
    let outcome = transfer.import_ics("user-2", &ics_feed(&[("a@x", "Standup")])).await.unwrap();

    // Same UID under a different owner is not a duplicate.
    assert_eq!(outcome.imported, 1);
    assert_eq!(events.all_events().len(), 2);
}
