//! Dashboard page: news, announcements, documents, reservations, tasks,
//! team chat and comments, all routed through the shared state store.
//!
//! Every section renders off the store. Loads fetch into the store; realtime
//! pushes re-pull the affected section (except chat, which appends the pushed
//! row in place). Overlapping fetches for one section resolve
//! latest-request-wins through a per-section [`QuerySlot`].

use crate::config::PortalConfig;
use crate::error::{PortalError, Result};
use crate::gateway::{row_id, to_row, ChangeEvent, ChangeKind, Gateway, QueryOptions};
use crate::realtime::RealtimeHandle;
use crate::session::{AdminGate, SessionStorage};
use crate::state::{QuerySlot, StateMap, StateValue, Store};
use crate::types::{
    AnnouncementInput, CommentContext, DocumentInput, FileUpload, NewsInput, ReservationInput,
    Row, RowId, TaskInput, Timestamp,
};
use crate::ui::{Notifier, ToastLevel};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Store keys for the dashboard sections.
pub mod keys {
    pub const NEWS: &str = "news";
    pub const ANNOUNCEMENTS: &str = "announcements";
    pub const DOCUMENTS: &str = "documents";
    pub const RESERVATIONS: &str = "reservations";
    pub const RESERVATION_ATTACHMENTS: &str = "reservationAttachments";
    pub const RESERVATION_ERROR: &str = "reservationError";
    pub const TASKS: &str = "tasks";
    pub const TASK_ATTACHMENTS: &str = "taskAttachments";
    pub const TASK_ERROR: &str = "taskError";
    pub const MESSAGES: &str = "messages";
    pub const CURRENT_CHANNEL: &str = "currentChannel";
    pub const COMMENTS: &str = "comments";
    pub const COMMENT_CONTEXT: &str = "commentContext";
    pub const METRICS: &str = "metrics";
    pub const ENGAGEMENT: &str = "engagement";
    pub const ADMIN: &str = "admin";
}

/// Default chat channel shown on first paint.
pub const DEFAULT_CHANNEL: &str = "general";

#[derive(Default)]
struct Slots {
    news: QuerySlot,
    announcements: QuerySlot,
    documents: QuerySlot,
    reservations: QuerySlot,
    tasks: QuerySlot,
    messages: QuerySlot,
    comments: QuerySlot,
}

/// The dashboard controller. Cheap to clone; clones share the page.
#[derive(Clone)]
pub struct DashboardPage {
    gateway: Arc<dyn Gateway>,
    notifier: Arc<dyn Notifier>,
    store: Store,
    gate: AdminGate,
    config: Arc<PortalConfig>,
    slots: Arc<Slots>,
    subscriptions: Arc<Mutex<Vec<RealtimeHandle>>>,
    realtime_connected: Arc<AtomicBool>,
}

/// Store contents before the first load.
fn initial_state() -> StateMap {
    StateMap::from([
        (keys::NEWS.to_string(), StateValue::rows(Vec::new())),
        (keys::ANNOUNCEMENTS.to_string(), StateValue::rows(Vec::new())),
        (keys::DOCUMENTS.to_string(), StateValue::rows(Vec::new())),
        (keys::RESERVATIONS.to_string(), StateValue::rows(Vec::new())),
        (
            keys::RESERVATION_ATTACHMENTS.to_string(),
            StateValue::row_map(HashMap::new()),
        ),
        (keys::RESERVATION_ERROR.to_string(), StateValue::Null),
        (keys::TASKS.to_string(), StateValue::rows(Vec::new())),
        (
            keys::TASK_ATTACHMENTS.to_string(),
            StateValue::row_map(HashMap::new()),
        ),
        (keys::TASK_ERROR.to_string(), StateValue::Null),
        (keys::MESSAGES.to_string(), StateValue::rows(Vec::new())),
        (
            keys::CURRENT_CHANNEL.to_string(),
            StateValue::text(DEFAULT_CHANNEL),
        ),
        (keys::COMMENTS.to_string(), StateValue::rows(Vec::new())),
        (keys::COMMENT_CONTEXT.to_string(), StateValue::Null),
        (keys::METRICS.to_string(), StateValue::Null),
        (keys::ENGAGEMENT.to_string(), StateValue::Null),
    ])
}

impl DashboardPage {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        notifier: Arc<dyn Notifier>,
        session: Arc<dyn SessionStorage>,
        config: PortalConfig,
    ) -> Self {
        let store = Store::new(initial_state());
        let gate =
            AdminGate::new(session, &config.admin_password).bind_store(store.clone(), keys::ADMIN);
        Self {
            gateway,
            notifier,
            store,
            gate,
            config: Arc::new(config),
            slots: Arc::new(Slots::default()),
            subscriptions: Arc::new(Mutex::new(Vec::new())),
            realtime_connected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The store the sections render from.
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn gate(&self) -> &AdminGate {
        &self.gate
    }

    /// Load every section for the first paint.
    pub fn load(&self) {
        tracing::debug!("loading dashboard sections");
        self.load_news();
        self.load_announcements();
        self.load_documents();
        self.load_reservations();
        self.load_tasks();
        self.load_messages(&self.current_channel());
        self.refresh_metrics();
        self.refresh_engagement();
    }

    // --- Content sections ---

    pub fn refresh_news(&self) {
        self.load_news();
        self.refresh_metrics();
    }

    pub fn refresh_announcements(&self) {
        self.load_announcements();
        self.refresh_metrics();
    }

    pub fn refresh_documents(&self) {
        self.load_documents();
        self.refresh_metrics();
    }

    fn load_news(&self) {
        let ticket = self.slots.news.issue();
        let options = QueryOptions::new()
            .order_desc("published_at")
            .limit(self.config.news_limit);
        match self.gateway.query("news", &options) {
            Ok(rows) if self.slots.news.is_latest(ticket) => {
                self.store
                    .update([(keys::NEWS.to_string(), StateValue::rows(rows))]);
            }
            Ok(_) => {}
            Err(error) => {
                tracing::error!(%error, "news fetch failed");
                self.notifier
                    .toast(ToastLevel::Danger, "Unable to load the news feed.");
            }
        }
    }

    fn load_announcements(&self) {
        let ticket = self.slots.announcements.issue();
        let options = QueryOptions::new().order_desc("created_at");
        match self.gateway.query("announcements", &options) {
            Ok(rows) if self.slots.announcements.is_latest(ticket) => {
                self.store
                    .update([(keys::ANNOUNCEMENTS.to_string(), StateValue::rows(rows))]);
            }
            Ok(_) => {}
            Err(error) => {
                tracing::error!(%error, "announcements fetch failed");
                self.notifier
                    .toast(ToastLevel::Danger, "Unable to load announcements.");
            }
        }
    }

    fn load_documents(&self) {
        let ticket = self.slots.documents.issue();
        let options = QueryOptions::new()
            .order_desc("updated_at")
            .limit(self.config.documents_limit);
        match self.gateway.query("documents", &options) {
            Ok(rows) if self.slots.documents.is_latest(ticket) => {
                self.store
                    .update([(keys::DOCUMENTS.to_string(), StateValue::rows(rows))]);
            }
            Ok(_) => {}
            Err(error) => {
                tracing::error!(%error, "documents fetch failed");
                self.notifier
                    .toast(ToastLevel::Danger, "Unable to load documents.");
            }
        }
    }

    // --- Reservations and tasks (list plus attachment map plus error slot) ---

    pub fn load_reservations(&self) {
        let ticket = self.slots.reservations.issue();
        let options = QueryOptions::new()
            .order_asc("start_time")
            .limit(self.config.reservations_limit);
        match self.gateway.query("reservations", &options) {
            Ok(rows) => {
                let ids: Vec<RowId> = rows.iter().filter_map(row_id).collect();
                let attachments = self.attachment_map("reservation", &ids);
                if self.slots.reservations.is_latest(ticket) {
                    self.store.update([
                        (keys::RESERVATION_ERROR.to_string(), StateValue::Null),
                        (keys::RESERVATIONS.to_string(), StateValue::rows(rows)),
                        (
                            keys::RESERVATION_ATTACHMENTS.to_string(),
                            StateValue::row_map(attachments),
                        ),
                    ]);
                }
            }
            Err(error) => {
                tracing::error!(%error, "reservations fetch failed");
                if self.slots.reservations.is_latest(ticket) {
                    self.store.update([
                        (
                            keys::RESERVATION_ERROR.to_string(),
                            StateValue::text(error.to_string()),
                        ),
                        (keys::RESERVATIONS.to_string(), StateValue::rows(Vec::new())),
                    ]);
                }
            }
        }
    }

    pub fn load_tasks(&self) {
        let ticket = self.slots.tasks.issue();
        let options = QueryOptions::new()
            .order_asc("due_date")
            .limit(self.config.tasks_limit);
        match self.gateway.query("tasks", &options) {
            Ok(rows) => {
                let ids: Vec<RowId> = rows.iter().filter_map(row_id).collect();
                let attachments = self.attachment_map("task", &ids);
                if self.slots.tasks.is_latest(ticket) {
                    self.store.update([
                        (keys::TASK_ERROR.to_string(), StateValue::Null),
                        (keys::TASKS.to_string(), StateValue::rows(rows)),
                        (
                            keys::TASK_ATTACHMENTS.to_string(),
                            StateValue::row_map(attachments),
                        ),
                    ]);
                }
            }
            Err(error) => {
                tracing::error!(%error, "tasks fetch failed");
                if self.slots.tasks.is_latest(ticket) {
                    self.store.update([
                        (
                            keys::TASK_ERROR.to_string(),
                            StateValue::text(error.to_string()),
                        ),
                        (keys::TASKS.to_string(), StateValue::rows(Vec::new())),
                    ]);
                }
            }
        }
    }

    /// Attachments for the given records, grouped by owning id. A failed
    /// fetch renders the sections without attachments rather than failing
    /// the whole load.
    fn attachment_map(&self, target_type: &str, ids: &[RowId]) -> HashMap<RowId, Vec<Row>> {
        if ids.is_empty() {
            return HashMap::new();
        }
        let options = QueryOptions::new().eq("target_type", target_type).within(
            "target_id",
            ids.iter().map(|id| json!(id.0)).collect(),
        );
        let rows = match self.gateway.query("attachments", &options) {
            Ok(rows) => rows,
            Err(error) => {
                tracing::error!(%error, target_type, "attachment fetch failed");
                return HashMap::new();
            }
        };
        let mut grouped: HashMap<RowId, Vec<Row>> = HashMap::new();
        for row in rows {
            if let Some(target) = row.get("target_id").and_then(Value::as_u64) {
                grouped.entry(RowId(target)).or_default().push(row);
            }
        }
        grouped
    }

    // --- Chat ---

    pub fn current_channel(&self) -> String {
        self.store
            .get(keys::CURRENT_CHANNEL)
            .as_text()
            .unwrap_or(DEFAULT_CHANNEL)
            .to_string()
    }

    /// Switch the chat channel and reload its history. Re-selecting the
    /// current channel is a no-op.
    pub fn set_channel(&self, channel: &str) {
        if channel == self.current_channel() {
            return;
        }
        self.store
            .update([(keys::CURRENT_CHANNEL.to_string(), StateValue::text(channel))]);
        self.load_messages(channel);
    }

    fn load_messages(&self, channel: &str) {
        let ticket = self.slots.messages.issue();
        let options = QueryOptions::new()
            .order_asc("created_at")
            .eq("channel", channel)
            .limit(self.config.chat_history_limit);
        match self.gateway.query("messages", &options) {
            Ok(rows) if self.slots.messages.is_latest(ticket) => {
                tracing::debug!(channel, count = rows.len(), "chat history loaded");
                self.store
                    .update([(keys::MESSAGES.to_string(), StateValue::rows(rows))]);
            }
            Ok(_) => {}
            Err(error) => {
                tracing::error!(%error, channel, "chat history fetch failed");
                self.notifier
                    .toast(ToastLevel::Danger, "Unable to load chat history.");
            }
        }
    }

    pub fn send_chat_message(&self, author: &str, content: &str) -> Result<()> {
        let channel = self.current_channel();
        let mut row = Row::new();
        row.insert("content".to_string(), json!(content));
        row.insert("channel".to_string(), json!(channel));
        row.insert("author".to_string(), json!(author));
        self.gateway.insert("messages", row)?;
        self.notifier.toast(ToastLevel::Success, "Message sent");
        self.refresh_metrics();
        Ok(())
    }

    /// Append one pushed message to the visible history, keeping only the
    /// newest rows.
    fn append_message(&self, row: Row) {
        let mut messages: Vec<Row> = self
            .store
            .get(keys::MESSAGES)
            .as_rows()
            .map(|rows| rows.as_ref().clone())
            .unwrap_or_default();
        messages.push(row);
        let limit = self.config.chat_history_limit;
        if messages.len() > limit {
            let excess = messages.len() - limit;
            messages.drain(..excess);
        }
        self.store
            .update([(keys::MESSAGES.to_string(), StateValue::rows(messages))]);
    }

    // --- Comments ---

    /// Open the comment thread for one record.
    pub fn open_comments(&self, context: CommentContext) {
        let value = match serde_json::to_value(&context) {
            Ok(value) => value,
            Err(error) => {
                tracing::error!(%error, "comment context encode failed");
                return;
            }
        };
        self.store
            .update([(keys::COMMENT_CONTEXT.to_string(), StateValue::context(value))]);
        self.load_comments(&context.kind, context.id);
    }

    /// Close the comment thread.
    pub fn close_comments(&self) {
        self.store.update([
            (keys::COMMENT_CONTEXT.to_string(), StateValue::Null),
            (keys::COMMENTS.to_string(), StateValue::rows(Vec::new())),
        ]);
    }

    pub fn comment_context(&self) -> Option<CommentContext> {
        let value = self.store.get(keys::COMMENT_CONTEXT);
        let context = value.as_context()?;
        serde_json::from_value(context.clone()).ok()
    }

    fn load_comments(&self, kind: &str, id: RowId) {
        let ticket = self.slots.comments.issue();
        let options = QueryOptions::new()
            .eq("target_type", kind)
            .eq("target_id", id.0)
            .order_desc("created_at");
        match self.gateway.query("comments", &options) {
            Ok(rows) if self.slots.comments.is_latest(ticket) => {
                self.store
                    .update([(keys::COMMENTS.to_string(), StateValue::rows(rows))]);
            }
            Ok(_) => {}
            Err(error) => {
                tracing::error!(%error, kind, %id, "comments fetch failed");
                self.notifier
                    .toast(ToastLevel::Danger, "Unable to load comments.");
            }
        }
    }

    /// Post a comment on the open thread.
    pub fn post_comment(&self, author: &str, message: &str) -> Result<()> {
        let context = self.comment_context().ok_or(PortalError::NoCommentTarget)?;
        let mut row = Row::new();
        row.insert("target_type".to_string(), json!(context.kind));
        row.insert("target_id".to_string(), json!(context.id.0));
        row.insert("author".to_string(), json!(author));
        row.insert("message".to_string(), json!(message));
        self.gateway.insert("comments", row)?;
        self.notifier.toast(ToastLevel::Success, "Comment published");
        self.load_comments(&context.kind, context.id);
        Ok(())
    }

    // --- Content actions ---

    pub fn publish_news(&self, mut input: NewsInput) -> Result<()> {
        if input.published_at.is_none() {
            input.published_at = Some(Timestamp::now());
        }
        self.gateway.insert("news", to_row(&input)?)?;
        self.notifier.toast(ToastLevel::Success, "News item published");
        self.refresh_news();
        Ok(())
    }

    pub fn post_announcement(&self, input: AnnouncementInput) -> Result<()> {
        self.gateway.insert("announcements", to_row(&input)?)?;
        self.notifier
            .toast(ToastLevel::Success, "Announcement published");
        self.refresh_announcements();
        Ok(())
    }

    pub fn add_document(&self, input: DocumentInput) -> Result<()> {
        let mut row = to_row(&input)?;
        row.insert("updated_at".to_string(), json!(Timestamp::now()));
        self.gateway.insert("documents", row)?;
        self.notifier.toast(ToastLevel::Success, "Document added");
        self.refresh_documents();
        Ok(())
    }

    pub fn create_reservation(
        &self,
        input: ReservationInput,
        attachment: Option<FileUpload>,
    ) -> Result<()> {
        let row = self.gateway.insert("reservations", to_row(&input)?)?;
        if let (Some(file), Some(id)) = (attachment, row_id(&row)) {
            self.attach_file(&file, "reservations", "reservation", id, Some(&input.team))?;
        }
        self.notifier
            .toast(ToastLevel::Success, "Reservation submitted");
        self.load_reservations();
        self.refresh_engagement();
        Ok(())
    }

    pub fn create_task(&self, input: TaskInput, attachment: Option<FileUpload>) -> Result<()> {
        let row = self.gateway.insert("tasks", to_row(&input)?)?;
        if let (Some(file), Some(id)) = (attachment, row_id(&row)) {
            self.attach_file(&file, "tasks", "task", id, input.assigned_to.as_deref())?;
        }
        self.notifier.toast(ToastLevel::Success, "Task created");
        self.load_tasks();
        self.refresh_engagement();
        Ok(())
    }

    /// Upload a picked file and record it against its owning row. Empty
    /// selections are skipped.
    fn attach_file(
        &self,
        file: &FileUpload,
        folder: &str,
        target_type: &str,
        id: RowId,
        uploaded_by: Option<&str>,
    ) -> Result<()> {
        if file.is_empty() {
            return Ok(());
        }
        let path = format!("{folder}/{id}/{}", file.name);
        let stored = self.gateway.upload(&path, &file.content)?;
        let mut row = Row::new();
        row.insert("target_type".to_string(), json!(target_type));
        row.insert("target_id".to_string(), json!(id.0));
        row.insert("file_name".to_string(), json!(file.name));
        row.insert("storage_path".to_string(), json!(stored.path));
        row.insert("file_url".to_string(), json!(stored.url));
        if let Some(uploaded_by) = uploaded_by {
            row.insert("uploaded_by".to_string(), json!(uploaded_by));
        }
        self.gateway.insert("attachments", row)?;
        Ok(())
    }

    // --- Analytics ---

    pub fn refresh_metrics(&self) {
        let options = QueryOptions::new().limit(1);
        match self.gateway.query("dashboard_metrics", &options) {
            Ok(rows) => {
                let value = match rows.into_iter().next() {
                    Some(row) => StateValue::context(Value::Object(row)),
                    None => StateValue::Null,
                };
                self.store.update([(keys::METRICS.to_string(), value)]);
            }
            Err(error) => {
                tracing::error!(%error, "metrics fetch failed");
            }
        }
    }

    pub fn refresh_engagement(&self) {
        let options = QueryOptions::new().limit(1);
        match self.gateway.query("engagement_dashboard", &options) {
            Ok(rows) => {
                let value = match rows.into_iter().next() {
                    Some(row) => StateValue::context(Value::Object(row)),
                    None => StateValue::Null,
                };
                self.store.update([(keys::ENGAGEMENT.to_string(), value)]);
            }
            Err(error) => {
                tracing::error!(%error, "engagement fetch failed");
                self.notifier
                    .toast(ToastLevel::Danger, "Unable to load engagement analytics.");
            }
        }
    }

    // --- Admin ---

    /// Try to unlock admin mode; surfaces the outcome as a toast either way.
    pub fn unlock_admin(&self, password: &str) -> bool {
        if self.gate.unlock(password) {
            self.notifier.toast(ToastLevel::Success, "Admin mode unlocked");
            true
        } else {
            self.notifier.toast(ToastLevel::Danger, "Incorrect password");
            false
        }
    }

    // --- Realtime ---

    /// Subscribe every section to pushed changes. Idempotent.
    pub fn connect_realtime(&self) {
        if self.realtime_connected.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut handles = Vec::new();

        let page = self.clone();
        handles.push(self.gateway.subscribe(
            "news",
            Arc::new(move |_: &ChangeEvent| page.refresh_news()),
        ));

        let page = self.clone();
        handles.push(self.gateway.subscribe(
            "announcements",
            Arc::new(move |_: &ChangeEvent| page.refresh_announcements()),
        ));

        let page = self.clone();
        handles.push(self.gateway.subscribe(
            "documents",
            Arc::new(move |_: &ChangeEvent| page.refresh_documents()),
        ));

        let page = self.clone();
        handles.push(self.gateway.subscribe(
            "reservations",
            Arc::new(move |_: &ChangeEvent| {
                page.load_reservations();
                page.refresh_engagement();
            }),
        ));

        let page = self.clone();
        handles.push(self.gateway.subscribe(
            "tasks",
            Arc::new(move |_: &ChangeEvent| {
                page.load_tasks();
                page.refresh_engagement();
            }),
        ));

        let page = self.clone();
        handles.push(self.gateway.subscribe(
            "attachments",
            Arc::new(move |event: &ChangeEvent| {
                let target = event
                    .record()
                    .and_then(|row| row.get("target_type"))
                    .and_then(Value::as_str);
                match target {
                    Some("reservation") => page.load_reservations(),
                    Some("task") => page.load_tasks(),
                    _ => {}
                }
            }),
        ));

        // Chat appends the pushed row in place instead of re-fetching.
        let page = self.clone();
        handles.push(self.gateway.subscribe(
            "messages",
            Arc::new(move |event: &ChangeEvent| {
                if event.kind != ChangeKind::Insert {
                    return;
                }
                let Some(row) = &event.new else { return };
                let channel = row.get("channel").and_then(Value::as_str);
                if channel == Some(page.current_channel().as_str()) {
                    page.append_message(row.clone());
                    page.refresh_metrics();
                }
            }),
        ));

        // Comments only re-pull when the pushed row belongs to the open
        // thread.
        let page = self.clone();
        handles.push(self.gateway.subscribe(
            "comments",
            Arc::new(move |event: &ChangeEvent| {
                let Some(context) = page.comment_context() else {
                    return;
                };
                let matches = event.record().is_some_and(|row| {
                    row.get("target_type").and_then(Value::as_str) == Some(context.kind.as_str())
                        && row.get("target_id").and_then(Value::as_u64) == Some(context.id.0)
                });
                if matches {
                    page.load_comments(&context.kind, context.id);
                }
            }),
        ));

        *self.subscriptions.lock() = handles;
    }

    /// Drop every realtime subscription. Called on page teardown; breaks the
    /// handler/page reference cycle.
    pub fn disconnect(&self) {
        self.subscriptions.lock().clear();
        self.realtime_connected.store(false, Ordering::SeqCst);
    }
}
