//! Outcome notifications for mutations

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

use crate::error::{CoreError, ErrorSeverity};

/// Notice level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Failure,
}

/// One user-facing outcome message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: "Success".to_string(),
            message: message.into(),
        }
    }

    pub fn from_error(error: &CoreError) -> Self {
        Self {
            level: NoticeLevel::Failure,
            title: "Error".to_string(),
            message: error.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.level == NoticeLevel::Failure
    }
}

/// Fire-and-forget sink for notices
pub trait Notifier {
    fn notify(&self, notice: &Notice);

    /// Report a failed operation
    fn failure(&self, error: &CoreError) {
        self.notify(&Notice::from_error(error));
    }

    /// Report a successful operation
    fn success(&self, message: &str) {
        self.notify(&Notice::success(message));
    }
}

/// Owned notifier handle held by the engine
pub type NotifierRef = Box<dyn Notifier>;

/// Default notifier using the log crate
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Success => {
                log::info!(target: "ledgerbook::notice", "{}: {}", notice.title, notice.message)
            }
            NoticeLevel::Failure => {
                log::warn!(target: "ledgerbook::notice", "{}: {}", notice.title, notice.message)
            }
        }
    }

    fn failure(&self, error: &CoreError) {
        match error.severity() {
            ErrorSeverity::Error => log::error!(
                target: "ledgerbook::notice",
                "ERROR [{}] {}",
                error.code(),
                error.to_details()
            ),
            _ => self.notify(&Notice::from_error(error)),
        }
    }
}

/// Discards every notice
#[derive(Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notice: &Notice) {}
}

/// Keeps every notice in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: RefCell<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.borrow().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices.borrow_mut().push(notice.clone());
    }
}

impl<N: Notifier + ?Sized> Notifier for std::rc::Rc<N> {
    fn notify(&self, notice: &Notice) {
        (**self).notify(notice)
    }

    fn failure(&self, error: &CoreError) {
        (**self).failure(error)
    }

    fn success(&self, message: &str) {
        (**self).success(message)
    }
}
