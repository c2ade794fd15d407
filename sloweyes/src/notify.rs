//! User-visible notifications

use std::collections::VecDeque;

/// Messages kept for the status bar; older ones are only in the log.
pub const MAX_MESSAGES: usize = 32;

/// Channel for messages the user should see (e.g. a tracker icon that
/// could not be written).
pub trait Notifier {
    fn notify(&mut self, title: &str, body: &str);
}

/// Keeps the most recent messages; the app shows the latest one in its
/// status bar.
#[derive(Debug, Default, Clone)]
pub struct MessageLog {
    messages: VecDeque<String>,
}

impl MessageLog {
    pub fn latest(&self) -> Option<&str> {
        self.messages.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Notifier for MessageLog {
    fn notify(&mut self, title: &str, body: &str) {
        log::warn!("{}: {}", title, body);
        if self.messages.len() == MAX_MESSAGES {
            self.messages.pop_front();
        }
        self.messages.push_back(format!("{title}: {body}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_capped() {
        let mut log = MessageLog::default();
        assert!(log.is_empty());
        for i in 0..MAX_MESSAGES * 3 {
            log.notify("Tracker", &format!("cannot write icon {i}"));
        }
        assert_eq!(log.len(), MAX_MESSAGES);
        let last = MAX_MESSAGES * 3 - 1;
        assert_eq!(log.latest(), Some(format!("Tracker: cannot write icon {last}").as_str()));
    }
}
