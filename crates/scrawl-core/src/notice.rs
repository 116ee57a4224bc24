//! User-facing notices and session observer registration.

use crate::storage::SaveRequest;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A non-blocking message for the notification UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        write!(f, "[{level}] {}", self.message)
    }
}

type TabHook = Box<dyn FnMut()>;
type SaveHook = Box<dyn FnMut(&SaveRequest)>;
type NoticeHook = Box<dyn FnMut(&Notice)>;

/// Observers registered on a session.
#[derive(Default)]
pub struct Hooks {
    tab_shown: Vec<TabHook>,
    save_requested: Vec<SaveHook>,
    notice: Vec<NoticeHook>,
}

impl Hooks {
    pub fn on_tab_shown(&mut self, hook: impl FnMut() + 'static) {
        self.tab_shown.push(Box::new(hook));
    }

    pub fn on_save_requested(&mut self, hook: impl FnMut(&SaveRequest) + 'static) {
        self.save_requested.push(Box::new(hook));
    }

    pub fn on_notice(&mut self, hook: impl FnMut(&Notice) + 'static) {
        self.notice.push(Box::new(hook));
    }

    pub(crate) fn tab_shown(&mut self) {
        for hook in &mut self.tab_shown {
            hook();
        }
    }

    pub(crate) fn save_requested(&mut self, request: &SaveRequest) {
        for hook in &mut self.save_requested {
            hook(request);
        }
    }

    pub(crate) fn notice(&mut self, notice: &Notice) {
        for hook in &mut self.notice {
            hook(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_every_registered_hook_runs() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut hooks = Hooks::default();
        for tag in ["a", "b"] {
            let seen = Rc::clone(&seen);
            hooks.on_notice(move |n| seen.borrow_mut().push(format!("{tag}:{}", n.message)));
        }
        hooks.notice(&Notice::warning("hi"));
        assert_eq!(*seen.borrow(), vec!["a:hi", "b:hi"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Notice::error("boom").to_string(), "[error] boom");
    }
}
