//! User-facing feedback and form handling.
//!
//! Pages surface outcomes through short toast notifications and submit
//! forms through [`submit_form`], which clears the fields only when the
//! underlying action succeeded so a failed submission never loses what the
//! user typed.

use crate::error::Result;
use crate::types::FileUpload;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Severity of a toast notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Danger,
}

/// Sink for toast notifications.
pub trait Notifier: Send + Sync {
    fn toast(&self, level: ToastLevel, message: &str);
}

/// Notifier that forwards toasts to the log.
#[derive(Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn toast(&self, level: ToastLevel, message: &str) {
        match level {
            ToastLevel::Danger => tracing::warn!(message, "toast"),
            ToastLevel::Info | ToastLevel::Success => tracing::info!(message, "toast"),
        }
    }
}

/// Notifier that records toasts for inspection in tests.
#[derive(Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<(ToastLevel, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<(ToastLevel, String)> {
        self.toasts.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn toast(&self, level: ToastLevel, message: &str) {
        self.toasts.lock().push((level, message.to_string()));
    }
}

/// Text fields and optional file picked in one form.
#[derive(Clone, Debug, Default)]
pub struct FormFields {
    values: HashMap<String, String>,
    attachment: Option<FileUpload>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn set_attachment(&mut self, file: FileUpload) {
        self.attachment = Some(file);
    }

    pub fn attachment(&self) -> Option<&FileUpload> {
        self.attachment.as_ref()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.attachment = None;
    }
}

/// Run a form action and reset the fields on success. A failed action keeps
/// the fields as typed and raises a danger toast. Returns whether the action
/// succeeded.
pub fn submit_form(
    fields: &mut FormFields,
    notifier: &dyn Notifier,
    action: impl FnOnce(&FormFields) -> Result<()>,
) -> bool {
    match action(fields) {
        Ok(()) => {
            fields.clear();
            true
        }
        Err(error) => {
            tracing::error!(%error, "form submission failed");
            notifier.toast(ToastLevel::Danger, &error.to_string());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PortalError;

    #[test]
    fn test_success_clears_fields() {
        let mut fields = FormFields::new();
        fields.set("title", "Quarterly update");
        fields.set_attachment(FileUpload {
            name: "notes.pdf".to_string(),
            content: vec![1, 2, 3],
        });
        let notifier = RecordingNotifier::new();

        let submitted = submit_form(&mut fields, &notifier, |form| {
            assert_eq!(form.get("title"), "Quarterly update");
            Ok(())
        });

        assert!(submitted);
        assert_eq!(fields.get("title"), "");
        assert!(fields.attachment().is_none());
        assert!(notifier.toasts().is_empty());
    }

    #[test]
    fn test_failure_preserves_fields_and_toasts() {
        let mut fields = FormFields::new();
        fields.set("title", "Quarterly update");
        let notifier = RecordingNotifier::new();

        let submitted = submit_form(&mut fields, &notifier, |_| {
            Err(PortalError::Gateway("connection reset".to_string()))
        });

        assert!(!submitted);
        assert_eq!(fields.get("title"), "Quarterly update");
        let toasts = notifier.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].0, ToastLevel::Danger);
    }

    #[test]
    fn test_missing_field_reads_empty() {
        let fields = FormFields::new();
        assert_eq!(fields.get("absent"), "");
    }
}
