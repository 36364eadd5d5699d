// Integration tests for the indexing configuration view and the optimistic
// indexing tracker.

mod common;

use chrono::{TimeZone, Utc};
use common::{config, connector, Call, Harness};
use connector_flow::guard::Operation;
use connector_flow::{
    ConnectorKind, ConnectorUpdate, DateRange, IndexOptions, IndexingRequest, NoticeLevel,
    PeriodicInput, ValidationError, ViewState,
};
use serde_json::json;

const SLACK_CONFIGURE: &str =
    "modal=connectors&tab=all&view=configure&connectorId=8&connectorType=SLACK_CONNECTOR";
const DRIVE_CONFIGURE: &str =
    "modal=connectors&tab=all&view=configure&connectorId=9&connectorType=GOOGLE_DRIVE_CONNECTOR";

/// Periodic sync at 360 with no range: update then index, then closed with
/// the modal params gone.
#[tokio::test]
async fn test_start_indexing_with_periodic_sync() {
    let h = Harness::at(
        vec![connector(8, ConnectorKind::SlackConnector, "Slack - Acme")],
        SLACK_CONFIGURE,
    )
    .await;
    h.dialog.sync_from_address().await;
    assert!(matches!(h.dialog.view(), ViewState::IndexingConfig(_)));

    let outcome = h
        .dialog
        .start_indexing(IndexingRequest {
            date_range: DateRange::default(),
            periodic: PeriodicInput::every("360"),
        })
        .await;

    assert!(outcome.is_completed(), "{:?}", outcome);
    assert_eq!(
        h.backend.mutations(),
        vec![
            Call::Update(
                8,
                ConnectorUpdate {
                    periodic_indexing_enabled: Some(true),
                    indexing_frequency_minutes: Some(Some(360)),
                    ..ConnectorUpdate::default()
                }
            ),
            Call::Index(8, IndexOptions::default()),
        ]
    );

    assert_eq!(h.dialog.view(), ViewState::Closed);
    let address = h.address();
    assert_eq!(address.modal, None);
    assert_eq!(address.tab, None);
    assert_eq!(address.view, None);
    assert!(h.dialog.is_indexing(8));
    assert!(!h.dialog.is_busy(Operation::StartIndexing));
}

/// Zero selected items on a folder-selection connector: rejected with no
/// network call, pending mark and busy flag both cleared.
#[tokio::test]
async fn test_start_indexing_empty_selection() {
    let mut h = Harness::at(
        vec![connector(9, ConnectorKind::GoogleDriveConnector, "My Drive")],
        DRIVE_CONFIGURE,
    )
    .await;
    h.dialog.sync_from_address().await;

    let outcome = h.dialog.start_indexing(IndexingRequest::default()).await;

    assert_eq!(
        outcome.error().and_then(|e| e.as_validation()),
        Some(&ValidationError::EmptySelection)
    );
    assert!(h.backend.calls().is_empty());
    assert!(!h.dialog.is_busy(Operation::StartIndexing));
    assert!(!h.dialog.is_indexing(9));
    assert!(matches!(h.dialog.view(), ViewState::IndexingConfig(_)));

    let notices = h.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].message, "Select at least one folder or file to index");
}

/// Folder-selection connectors send their selection as the request body.
#[tokio::test]
async fn test_start_indexing_sends_selection() {
    let mut drive = connector(9, ConnectorKind::GoogleDriveConnector, "My Drive");
    drive.config = config(json!({
        "selected_folders": [{ "id": "root", "name": "Root" }],
        "selected_files": []
    }));
    let h = Harness::at(vec![drive], DRIVE_CONFIGURE).await;
    h.dialog.sync_from_address().await;

    let outcome = h
        .dialog
        .start_indexing(IndexingRequest {
            // Ignored for folder-selection kinds.
            date_range: DateRange::parse("2026-03-01", "2026-02-01").unwrap(),
            periodic: PeriodicInput::every("60"),
        })
        .await;

    assert!(outcome.is_completed(), "{:?}", outcome);
    match h.backend.mutations().last() {
        Some(Call::Index(9, options)) => {
            assert_eq!(options.start_date, None);
            assert_eq!(
                options.body,
                Some(json!({ "folders": [{ "id": "root", "name": "Root" }], "files": [] }))
            );
        }
        other => panic!("expected index call, got {:?}", other),
    }
}

/// A failed index call rolls back the pending mark; the view stays put.
#[tokio::test]
async fn test_start_indexing_transport_failure() {
    let mut h = Harness::at(
        vec![connector(8, ConnectorKind::SlackConnector, "Slack - Acme")],
        SLACK_CONFIGURE,
    )
    .await;
    h.dialog.sync_from_address().await;
    h.backend.fail_on("index");

    let outcome = h.dialog.start_indexing(IndexingRequest::default()).await;

    assert!(outcome.error().is_some());
    assert!(!h.dialog.is_indexing(8));
    assert!(!h.dialog.is_busy(Operation::StartIndexing));
    assert!(matches!(h.dialog.view(), ViewState::IndexingConfig(_)));
    assert!(h.notices()[0].message.starts_with("Failed to start indexing"));
}

/// Periodic sync is refused for kinds that do not support it.
#[tokio::test]
async fn test_periodic_refused_for_non_indexable() {
    let mut tavily = connector(4, ConnectorKind::TavilyApi, "Tavily");
    tavily.is_indexable = false;
    let h = Harness::at(
        vec![tavily],
        "modal=connectors&view=configure&connectorId=4&connectorType=TAVILY_API",
    )
    .await;
    h.dialog.sync_from_address().await;

    let outcome = h
        .dialog
        .start_indexing(IndexingRequest {
            periodic: PeriodicInput::every("60"),
            ..IndexingRequest::default()
        })
        .await;

    assert_eq!(
        outcome.error().and_then(|e| e.as_validation()),
        Some(&ValidationError::PeriodicOnNonIndexable)
    );
    assert!(h.backend.calls().is_empty());
}

#[tokio::test]
async fn test_skip_indexing_closes() {
    let h = Harness::at(
        vec![connector(8, ConnectorKind::SlackConnector, "Slack - Acme")],
        SLACK_CONFIGURE,
    )
    .await;
    h.dialog.sync_from_address().await;

    assert!(h.dialog.skip_indexing().is_completed());
    assert_eq!(h.dialog.view(), ViewState::Closed);
    assert!(h.address().is_empty());
    assert!(h.backend.calls().is_empty());
}

/// The tracker clears a pending connector once the feed shows its
/// `last_indexed_at` moving, and not before.
#[tokio::test]
async fn test_tracker_reconciles_with_feed() {
    let h = Harness::at(
        vec![connector(8, ConnectorKind::SlackConnector, "Slack - Acme")],
        SLACK_CONFIGURE,
    )
    .await;
    h.dialog.sync_from_address().await;
    h.dialog.start_indexing(IndexingRequest::default()).await;
    assert!(h.dialog.is_indexing(8));

    let tracker = h.dialog.tracker();
    let repository = h.dialog.repository();

    // Same value as before: still pending.
    tracker.observe(&repository.refresh().await.unwrap());
    assert!(h.dialog.is_indexing(8));

    h.backend
        .set_last_indexed(8, Utc.with_ymd_and_hms(2026, 2, 17, 12, 0, 0).unwrap());
    let finished = tracker.observe(&repository.refresh().await.unwrap());
    assert_eq!(finished, vec![8]);
    assert!(!h.dialog.is_indexing(8));
}

/// "Index now" from the edit view keeps the view and marks the connector.
#[tokio::test]
async fn test_index_now_from_edit() {
    let mut h = Harness::at(
        vec![connector(5, ConnectorKind::BookstackConnector, "Docs")],
        "modal=connectors&tab=all&view=edit&connectorId=5",
    )
    .await;
    h.dialog.sync_from_address().await;

    let range = DateRange::parse("2026-02-01", "").unwrap();
    let outcome = h.dialog.index_now(range).await;

    assert!(outcome.is_completed(), "{:?}", outcome);
    assert_eq!(h.dialog.view(), ViewState::EditConnector { connector_id: 5 });
    assert!(h.dialog.is_indexing(5));
    match h.backend.mutations().as_slice() {
        [Call::Index(5, options)] => {
            assert_eq!(options.start_date_param().as_deref(), Some("2026-02-01"));
            assert_eq!(options.end_date_param(), None);
        }
        other => panic!("unexpected calls {:?}", other),
    }
    assert!(h
        .notices()
        .iter()
        .any(|n| n.level == NoticeLevel::Success && n.message == "Docs: indexing started"));
}
