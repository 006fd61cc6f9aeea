//! Core types for the portal: row model, timestamps, and the typed records
//! stored on the remote data platform.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A raw row as the gateway returns it: column name to JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Server-assigned identifier for a row.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowId(pub u64);

impl fmt::Debug for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowId({})", self.0)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Timestamp(pub i64);

const MICROS_PER_DAY: i64 = 86_400_000_000;

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards");
        Timestamp(duration.as_micros() as i64)
    }

    /// Midnight (UTC) of the day this timestamp falls in.
    pub fn start_of_day(self) -> Self {
        Timestamp(self.0 - self.0.rem_euclid(MICROS_PER_DAY))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Reservation workflow status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Approved,
    Refused,
}

/// Task workflow status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Open,
    InProgress,
    Done,
    Archived,
}

/// Task priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    High,
    Medium,
    #[default]
    Normal,
    Low,
}

/// Availability of a bookable resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    #[default]
    Available,
    Reserved,
    Unavailable,
}

/// Kind of a time-clock entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockKind {
    Arrival,
    Departure,
    Break,
    BreakReturn,
    Remote,
}

/// A published news item.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: RowId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub published_at: Option<Timestamp>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// A board announcement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Announcement {
    pub id: RowId,
    pub message: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    /// Comma-separated tag list.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// A shared document link.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentLink {
    pub id: RowId,
    pub title: String,
    pub category: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// A room/resource reservation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reservation {
    pub id: RowId,
    pub resource: String,
    pub team: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    #[serde(default)]
    pub status: Option<ReservationStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A tracked task.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: RowId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub due_date: Option<Timestamp>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub status: TaskStatus,
}

/// A chat message on one channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: RowId,
    pub content: String,
    pub channel: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// A comment attached to a news item or document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Comment {
    pub id: RowId,
    pub target_type: String,
    pub target_id: RowId,
    pub author: String,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// An uploaded file linked to a reservation or task.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Attachment {
    pub id: RowId,
    pub target_type: String,
    pub target_id: RowId,
    pub file_name: String,
    pub storage_path: String,
    pub file_url: String,
    #[serde(default)]
    pub uploaded_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// A team planning event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanningEvent {
    pub id: RowId,
    pub title: String,
    pub team: String,
    pub start_date: Timestamp,
    #[serde(default)]
    pub end_date: Option<Timestamp>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A recorded absence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Absence {
    pub id: RowId,
    pub employee: String,
    pub team: String,
    pub start_date: Timestamp,
    #[serde(default)]
    pub end_date: Option<Timestamp>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A tracked resource (room, vehicle, equipment).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceItem {
    pub id: RowId,
    pub name: String,
    #[serde(default)]
    pub status: Option<ResourceStatus>,
    #[serde(default)]
    pub next_available: Option<Timestamp>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One time-clock entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: RowId,
    pub employee: String,
    pub email: String,
    #[serde(rename = "type")]
    pub kind: ClockKind,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub note: Option<String>,
}

/// Aggregate counters shown on the dashboard header.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DashboardMetrics {
    #[serde(default)]
    pub news_count: u64,
    #[serde(default)]
    pub announcements_count: u64,
    #[serde(default)]
    pub documents_count: u64,
    #[serde(default)]
    pub reservations_count: u64,
    #[serde(default)]
    pub open_tasks: u64,
    #[serde(default)]
    pub pending_approvals: u64,
    #[serde(default)]
    pub general_messages: u64,
}

/// Upcoming reservation count for one resource.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub resource: String,
    #[serde(default)]
    pub upcoming_reservations: u64,
}

/// Count of approval requests per type and status.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApprovalSlice {
    pub request_type: String,
    pub status: String,
    #[serde(default)]
    pub total: u64,
}

/// Engagement analytics shown on the dashboard.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EngagementSnapshot {
    #[serde(default)]
    pub avg_reservations_per_resource: f64,
    #[serde(default)]
    pub total_late_arrivals: u64,
    #[serde(default)]
    pub total_comments: u64,
    #[serde(default)]
    pub top_resources: Vec<ResourceUsage>,
    #[serde(default)]
    pub approval_breakdown: Vec<ApprovalSlice>,
}

/// The record the comment modal is currently attached to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommentContext {
    /// Comment target kind, "news" or "document".
    #[serde(rename = "type")]
    pub kind: String,
    pub id: RowId,
    pub title: String,
}

/// File content picked in a form.
#[derive(Clone, Debug)]
pub struct FileUpload {
    pub name: String,
    pub content: Vec<u8>,
}

impl FileUpload {
    /// Empty selections are skipped, not uploaded.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() || self.content.is_empty()
    }
}

/// Result of a blob upload: storage path plus publicly resolvable address.
#[derive(Clone, Debug)]
pub struct StoredFile {
    pub path: String,
    pub url: String,
}

// --- Form inputs (payloads before the server assigns an id) ---

#[derive(Clone, Debug, Serialize)]
pub struct NewsInput {
    pub title: String,
    pub author: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AnnouncementInput {
    pub author: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DocumentInput {
    pub title: String,
    pub category: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReservationInput {
    pub resource: String,
    pub team: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TaskInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Timestamp>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub status: TaskStatus,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlanningInput {
    pub title: String,
    pub team: String,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AbsenceInput {
    pub employee: String,
    pub team: String,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResourceInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ResourceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_available: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ClockInput {
    pub employee: String,
    pub email: String,
    #[serde(rename = "type")]
    pub kind: ClockKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_start_of_day() {
        let noon = Timestamp(3 * MICROS_PER_DAY + MICROS_PER_DAY / 2);
        assert_eq!(noon.start_of_day(), Timestamp(3 * MICROS_PER_DAY));
        assert_eq!(noon.start_of_day().start_of_day(), noon.start_of_day());
    }

    #[test]
    fn test_clock_kind_wire_names() {
        let entry: TimeEntry = serde_json::from_value(json!({
            "id": 7,
            "employee": "Nadia",
            "email": "nadia@example.com",
            "type": "break_return",
            "timestamp": 1_000_000,
        }))
        .unwrap();
        assert_eq!(entry.kind, ClockKind::BreakReturn);
        assert_eq!(entry.note, None);
    }

    #[test]
    fn test_task_defaults() {
        let task: Task = serde_json::from_value(json!({
            "id": 1,
            "title": "Calibrate analyzer",
        }))
        .unwrap();
        assert_eq!(task.status, TaskStatus::Open);
        assert_eq!(task.priority, TaskPriority::Normal);
    }

    #[test]
    fn test_input_skips_empty_options() {
        let input = NewsInput {
            title: "Quarterly review".into(),
            author: "HR".into(),
            content: "All hands on Friday.".into(),
            category: None,
            published_at: None,
        };
        let value = serde_json::to_value(&input).unwrap();
        assert!(value.get("category").is_none());
        assert!(value.get("published_at").is_none());
    }
}
