//! Portal configuration.

/// Configuration shared by the page controllers.
#[derive(Clone, Debug)]
pub struct PortalConfig {
    /// Password for the client-side admin gate. This is a UI affordance,
    /// not a security boundary.
    pub admin_password: String,

    /// Row limit for the dashboard news section.
    pub news_limit: usize,

    /// Row limit for the dashboard documents section.
    pub documents_limit: usize,

    /// Row limit for the dashboard reservations timeline.
    pub reservations_limit: usize,

    /// Row limit for the dashboard task list.
    pub tasks_limit: usize,

    /// Chat messages kept per channel.
    pub chat_history_limit: usize,

    /// Time-clock entries shown in the history table.
    pub clock_history_limit: usize,

    /// Buffered change events per realtime subscription before the
    /// subscriber is dropped.
    pub realtime_buffer: usize,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            admin_password: "ADMIN".to_string(),
            news_limit: 6,
            documents_limit: 6,
            reservations_limit: 8,
            tasks_limit: 5,
            chat_history_limit: 50,
            clock_history_limit: 50,
            realtime_buffer: 256,
        }
    }
}
