//! Flows for the admin, plannings, time-clock and board pages.

use intranet_portal::{
    AbsenceInput, AdminGate, AdminPage, AnnouncementInput, BoardPage, ClockInput,
    ClockKind, DocumentInput, Gateway, MemoryGateway, MemorySession, NewsInput, PlanningInput,
    PlanningsPage, PortalConfig, PortalError, ResourceInput, Row, RowId, TimeClockPage, Timestamp,
    ToastLevel,
};
use intranet_portal::{Notifier, RecordingNotifier};
use serde_json::{json, Value};
use std::sync::Arc;

fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(column, value)| (column.to_string(), value.clone()))
        .collect()
}

fn gate(unlocked: bool) -> AdminGate {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let gate = AdminGate::new(Arc::new(MemorySession::new()), "ADMIN");
    if unlocked {
        assert!(gate.unlock("ADMIN"));
    }
    gate
}

fn news_input(title: &str) -> NewsInput {
    NewsInput {
        title: title.to_string(),
        author: "HR".to_string(),
        content: "Details follow.".to_string(),
        category: None,
        published_at: None,
    }
}

// --- Admin page ---

#[test]
fn test_admin_load_requires_unlocked_session() {
    let page = AdminPage::new(
        Arc::new(MemoryGateway::new()),
        Arc::new(RecordingNotifier::new()),
        gate(false),
        PortalConfig::default(),
    );
    assert!(matches!(page.load(), Err(PortalError::AdminRequired)));
    assert!(matches!(
        page.add_news(news_input("Blocked")),
        Err(PortalError::AdminRequired)
    ));
}

#[test]
fn test_admin_overview_counts_todays_entries() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway
        .insert(
            "time_entries",
            row(&[
                ("employee", json!("Nadia")),
                ("email", json!("nadia@example.com")),
                ("type", json!("arrival")),
                ("timestamp", json!(Timestamp::now().0)),
            ]),
        )
        .unwrap();
    // An old entry stays out of today's count.
    gateway
        .insert(
            "time_entries",
            row(&[
                ("employee", json!("Omar")),
                ("email", json!("omar@example.com")),
                ("type", json!("arrival")),
                ("timestamp", json!(0)),
            ]),
        )
        .unwrap();

    let page = AdminPage::new(
        Arc::clone(&gateway) as Arc<dyn Gateway>,
        Arc::new(RecordingNotifier::new()),
        gate(true),
        PortalConfig::default(),
    );
    page.add_news(news_input("Fleet renewed")).unwrap();
    page.add_document(DocumentInput {
        title: "Safety manual".to_string(),
        category: "HR".to_string(),
        url: "https://docs.example.com/safety".to_string(),
        description: None,
    })
    .unwrap();
    page.add_resource(ResourceInput {
        name: "Van 3".to_string(),
        status: None,
        next_available: None,
        notes: None,
    })
    .unwrap();

    let overview = page.load().unwrap();
    assert_eq!(overview.stats.news, 1);
    assert_eq!(overview.stats.documents, 1);
    assert_eq!(overview.stats.clocked_today, 1);
    assert_eq!(overview.todays_entries[0].employee, "Nadia");
    assert_eq!(overview.resources.len(), 1);
}

#[test]
fn test_admin_delete_surfaces_failure() {
    let gateway = Arc::new(MemoryGateway::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let page = AdminPage::new(
        Arc::clone(&gateway) as Arc<dyn Gateway>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        gate(true),
        PortalConfig::default(),
    );

    let inserted = gateway
        .insert("news", row(&[("title", json!("Temp"))]))
        .unwrap();
    let id = RowId(inserted["id"].as_u64().unwrap());
    page.delete_item("news", id).unwrap();

    let result = page.delete_item("news", id);
    assert!(matches!(result, Err(PortalError::RowNotFound { .. })));
    let toasts = notifier.toasts();
    assert_eq!(
        toasts.last().map(|(level, _)| *level),
        Some(ToastLevel::Danger)
    );
}

#[test]
fn test_admin_close_session_locks_again() {
    let page = AdminPage::new(
        Arc::new(MemoryGateway::new()),
        Arc::new(RecordingNotifier::new()),
        gate(true),
        PortalConfig::default(),
    );
    assert!(page.load().is_ok());
    page.close_session();
    assert!(matches!(page.load(), Err(PortalError::AdminRequired)));
}

// --- Plannings page ---

fn planning_input(title: &str, team: &str, start: i64) -> PlanningInput {
    PlanningInput {
        title: title.to_string(),
        team: team.to_string(),
        start_date: Timestamp(start),
        end_date: Timestamp(start + 1_000),
        location: None,
        description: None,
    }
}

#[test]
fn test_plannings_filters_and_team_options() {
    let gateway = Arc::new(MemoryGateway::new());
    let page = PlanningsPage::new(
        Arc::clone(&gateway) as Arc<dyn Gateway>,
        Arc::new(RecordingNotifier::new()),
    );
    page.add_event(planning_input("Sprint review", "Engineering", 100)).unwrap();
    page.add_event(planning_input("Campaign kickoff", "Marketing", 500)).unwrap();
    page.add_absence(AbsenceInput {
        employee: "Nadia".to_string(),
        team: "Support".to_string(),
        start_date: Timestamp(200),
        end_date: Timestamp(300),
        reason: None,
    })
    .unwrap();
    page.load();

    assert_eq!(
        page.team_options(),
        vec![
            "Engineering".to_string(),
            "Marketing".to_string(),
            "Support".to_string()
        ]
    );

    page.set_team(Some("Marketing"));
    let events = page.filtered_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Campaign kickoff");

    page.reset_filters();
    page.set_range(Some(Timestamp(0)), Some(Timestamp(200)));
    let events = page.filtered_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Sprint review");
}

#[test]
fn test_plannings_realtime_repulls_lists() {
    let gateway = Arc::new(MemoryGateway::new());
    let page = PlanningsPage::new(
        Arc::clone(&gateway) as Arc<dyn Gateway>,
        Arc::new(RecordingNotifier::new()),
    );
    page.load();
    page.connect_realtime();

    gateway
        .insert(
            "absences",
            row(&[
                ("employee", json!("Omar")),
                ("team", json!("Engineering")),
                ("start_date", json!(700)),
            ]),
        )
        .unwrap();
    gateway.deliver_pending();

    let data = page.data();
    assert_eq!(data.absences.len(), 1);
    assert_eq!(data.absences[0].employee, "Omar");

    page.disconnect();
    assert_eq!(gateway.realtime_subscribers(), 0);
}

#[test]
fn test_plannings_partial_failure_toasts_once() {
    let gateway = Arc::new(MemoryGateway::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let page = PlanningsPage::new(
        Arc::clone(&gateway) as Arc<dyn Gateway>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
    );
    gateway.fail_collection("absences");
    page.add_event(planning_input("Sprint review", "Engineering", 100)).unwrap();
    page.load();

    let data = page.data();
    assert_eq!(data.events.len(), 1);
    assert!(data.absences.is_empty());
    let danger_toasts = notifier
        .toasts()
        .iter()
        .filter(|(level, _)| *level == ToastLevel::Danger)
        .count();
    assert_eq!(danger_toasts, 1);
}

// --- Time clock ---

#[test]
fn test_clock_records_and_scopes_history() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway
        .insert(
            "time_entries",
            row(&[
                ("employee", json!("Omar")),
                ("email", json!("omar@example.com")),
                ("type", json!("arrival")),
                ("timestamp", json!(Timestamp::now().0)),
            ]),
        )
        .unwrap();

    let page = TimeClockPage::new(
        Arc::clone(&gateway) as Arc<dyn Gateway>,
        Arc::new(RecordingNotifier::new()),
        PortalConfig::default(),
    );
    page.clock(ClockInput {
        employee: "Nadia".to_string(),
        email: "nadia@example.com".to_string(),
        kind: ClockKind::Arrival,
        note: None,
    })
    .unwrap();

    // Clocking scopes the history to that employee.
    assert_eq!(page.email_filter().as_deref(), Some("nadia@example.com"));
    let entries = page.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, ClockKind::Arrival);

    let stats = page.todays_stats();
    assert_eq!(stats.get(&ClockKind::Arrival), Some(&1));

    page.load_history(None);
    assert_eq!(page.entries().len(), 2);
}

#[test]
fn test_clock_realtime_keeps_filter() {
    let gateway = Arc::new(MemoryGateway::new());
    let page = TimeClockPage::new(
        Arc::clone(&gateway) as Arc<dyn Gateway>,
        Arc::new(RecordingNotifier::new()),
        PortalConfig::default(),
    );
    page.load_history(Some("nadia@example.com"));
    page.connect_realtime();

    gateway
        .insert(
            "time_entries",
            row(&[
                ("employee", json!("Omar")),
                ("email", json!("omar@example.com")),
                ("type", json!("departure")),
                ("timestamp", json!(Timestamp::now().0)),
            ]),
        )
        .unwrap();
    gateway.deliver_pending();

    // The push re-pulled, but the email scope survived.
    assert_eq!(page.email_filter().as_deref(), Some("nadia@example.com"));
    assert!(page.entries().is_empty());

    page.disconnect();
    assert_eq!(gateway.realtime_subscribers(), 0);
}

// --- Announcement board ---

fn announcement(author: &str, message: &str, tags: Option<&str>) -> AnnouncementInput {
    AnnouncementInput {
        author: author.to_string(),
        message: message.to_string(),
        title: None,
        tags: tags.map(str::to_string),
    }
}

#[test]
fn test_board_search_and_tag_filters() {
    let gateway = Arc::new(MemoryGateway::new());
    let page = BoardPage::new(
        Arc::clone(&gateway) as Arc<dyn Gateway>,
        Arc::new(RecordingNotifier::new()),
        gate(false),
    );
    page.post(announcement("Ops", "Parking closed Friday", Some("facilities, parking")))
        .unwrap();
    page.post(announcement("HR", "Benefits enrollment open", Some("hr")))
        .unwrap();

    assert_eq!(
        page.tag_options(),
        vec![
            "facilities".to_string(),
            "hr".to_string(),
            "parking".to_string()
        ]
    );

    page.set_search("PARKING");
    let visible = page.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].author.as_deref(), Some("Ops"));

    page.set_search("");
    page.set_tag(Some("hr"));
    let visible = page.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].author.as_deref(), Some("HR"));

    page.set_tag(Some("missing"));
    assert!(page.visible().is_empty());
}

#[test]
fn test_board_delete_is_admin_gated() {
    let gateway = Arc::new(MemoryGateway::new());
    let admin = gate(false);
    let page = BoardPage::new(
        Arc::clone(&gateway) as Arc<dyn Gateway>,
        Arc::new(RecordingNotifier::new()),
        admin.clone(),
    );
    page.post(announcement("Ops", "Old notice", None)).unwrap();
    let id = RowId(
        gateway.query("announcements", &Default::default()).unwrap()[0]["id"]
            .as_u64()
            .unwrap(),
    );

    assert!(!page.is_admin());
    assert!(matches!(page.delete(id), Err(PortalError::AdminRequired)));

    assert!(admin.unlock("ADMIN"));
    page.delete(id).unwrap();
    assert!(page.visible().is_empty());
}
