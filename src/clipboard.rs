//! Clipboard access and change detection.
//!
//! [`ClipboardWatcher`] holds no platform state: the event loop decides *when*
//! to look (debounced native notification or poll tick) and the watcher
//! decides whether what it sees is worth a translation.

pub trait Clipboard {
    /// Current text content; `None` when empty, non-text, or unreadable.
    fn read_text(&mut self) -> Option<String>;
    fn write_text(&mut self, text: &str) -> anyhow::Result<()>;
}

#[cfg(windows)]
pub struct SystemClipboard;

#[cfg(windows)]
impl SystemClipboard {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self)
    }
}

#[cfg(windows)]
impl Clipboard for SystemClipboard {
    fn read_text(&mut self) -> Option<String> {
        clipboard_win::get_clipboard_string().ok()
    }

    fn write_text(&mut self, text: &str) -> anyhow::Result<()> {
        clipboard_win::set_clipboard_string(text)
            .map_err(|e| anyhow::anyhow!("failed to write clipboard: {}", e))
    }
}

/// On X11 the arboard handle also serves our writes, so it lives as long as the app.
#[cfg(not(windows))]
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

#[cfg(not(windows))]
impl SystemClipboard {
    pub fn new() -> anyhow::Result<Self> {
        let inner = arboard::Clipboard::new()?;
        Ok(Self { inner })
    }
}

#[cfg(not(windows))]
impl Clipboard for SystemClipboard {
    fn read_text(&mut self) -> Option<String> {
        self.inner.get_text().ok()
    }

    fn write_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.inner.set_text(text)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    External,
    SelfWritten,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardSnapshot {
    pub text: String,
    pub origin: Origin,
}

/// Result of one look at the clipboard. Only `Copied` asks for a translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Copied(String),
    Empty,
    Duplicate,
    SelfWrite,
}

#[derive(Debug, Default)]
pub struct ClipboardWatcher {
    last_seen: String,
    pending_self_write: Option<String>,
}

impl ClipboardWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the current content as seen without reacting to it.
    pub fn prime(&mut self, current: Option<String>) {
        if let Some(text) = current {
            self.last_seen = text;
        }
    }

    pub fn last_seen(&self) -> &str {
        &self.last_seen
    }

    /// Must be called before the coordinator writes `text`.
    pub fn record_self_write(&mut self, text: &str) {
        self.last_seen = text.to_string();
        self.pending_self_write = Some(text.to_string());
    }

    /// Undoes [`record_self_write`](Self::record_self_write) after a failed write.
    pub fn abandon_self_write(&mut self, previous: String) {
        self.last_seen = previous;
        self.pending_self_write = None;
    }

    pub fn snapshot(&self, text: String) -> ClipboardSnapshot {
        let origin = if self.pending_self_write.as_deref() == Some(text.as_str()) {
            Origin::SelfWritten
        } else {
            Origin::External
        };
        ClipboardSnapshot { text, origin }
    }

    /// Shared by the notification and poll paths. `last_seen` is updated here,
    /// before any job is started for the text.
    pub fn check(&mut self, current: Option<String>) -> Detection {
        let text = match current {
            Some(t) if !t.trim().is_empty() => t,
            _ => return Detection::Empty,
        };

        let snapshot = self.snapshot(text);
        if snapshot.origin == Origin::SelfWritten {
            self.pending_self_write = None;
            return Detection::SelfWrite;
        }
        if snapshot.text == self.last_seen {
            return Detection::Duplicate;
        }

        self.pending_self_write = None;
        self.last_seen = snapshot.text.clone();
        Detection::Copied(snapshot.text)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Shared in-memory clipboard; clones see the same content.
    #[derive(Clone, Default)]
    pub(crate) struct MemoryClipboard {
        pub text: Arc<Mutex<Option<String>>>,
        pub writes: Arc<Mutex<Vec<String>>>,
        pub fail_writes: bool,
    }

    impl MemoryClipboard {
        pub fn set(&self, text: &str) {
            *self.text.lock().unwrap() = Some(text.to_string());
        }

        pub fn current(&self) -> Option<String> {
            self.text.lock().unwrap().clone()
        }

        pub fn writes(&self) -> Vec<String> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl Clipboard for MemoryClipboard {
        fn read_text(&mut self) -> Option<String> {
            self.current()
        }

        fn write_text(&mut self, text: &str) -> anyhow::Result<()> {
            if self.fail_writes {
                anyhow::bail!("clipboard busy");
            }
            self.set(text);
            self.writes.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn empty_and_whitespace_are_ignored() {
        let mut w = ClipboardWatcher::new();
        assert_eq!(w.check(None), Detection::Empty);
        assert_eq!(w.check(Some(String::new())), Detection::Empty);
        assert_eq!(w.check(Some("  \n\t".into())), Detection::Empty);
        assert_eq!(w.last_seen(), "");
    }

    #[test]
    fn new_text_is_emitted_once() {
        let mut w = ClipboardWatcher::new();
        assert_eq!(w.check(Some("hello".into())), Detection::Copied("hello".into()));
        assert_eq!(w.last_seen(), "hello");
        // native notification and poll tick observing the same change
        assert_eq!(w.check(Some("hello".into())), Detection::Duplicate);
        assert_eq!(w.check(Some("hello".into())), Detection::Duplicate);
        assert_eq!(w.check(Some("world".into())), Detection::Copied("world".into()));
    }

    #[test]
    fn self_write_is_not_emitted() {
        let mut w = ClipboardWatcher::new();
        assert_eq!(w.check(Some("hello".into())), Detection::Copied("hello".into()));
        w.record_self_write("bonjour");
        assert_eq!(w.snapshot("bonjour".into()).origin, Origin::SelfWritten);
        assert_eq!(w.check(Some("bonjour".into())), Detection::SelfWrite);
        assert_eq!(w.check(Some("bonjour".into())), Detection::Duplicate);
    }

    #[test]
    fn external_copy_after_self_write_is_emitted() {
        let mut w = ClipboardWatcher::new();
        w.record_self_write("bonjour");
        // the user copied something else before we saw our own write
        assert_eq!(w.check(Some("next".into())), Detection::Copied("next".into()));
        assert_eq!(w.snapshot("bonjour".into()).origin, Origin::External);
        // copying the original input again is a new change
        assert_eq!(w.check(Some("hello".into())), Detection::Copied("hello".into()));
    }

    #[test]
    fn abandoned_self_write_restores_last_seen() {
        let mut w = ClipboardWatcher::new();
        assert_eq!(w.check(Some("hello".into())), Detection::Copied("hello".into()));
        let previous = w.last_seen().to_string();
        w.record_self_write("bonjour");
        w.abandon_self_write(previous);
        assert_eq!(w.check(Some("hello".into())), Detection::Duplicate);
        assert_eq!(w.check(Some("bonjour".into())), Detection::Copied("bonjour".into()));
    }

    #[test]
    fn primed_content_is_not_emitted() {
        let mut w = ClipboardWatcher::new();
        w.prime(Some("left over from before".into()));
        assert_eq!(w.check(Some("left over from before".into())), Detection::Duplicate);
        w.prime(None);
        assert_eq!(w.last_seen(), "left over from before");
    }
}
