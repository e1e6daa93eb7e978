//! Headless stand-ins for the bits of a page the renderers touch.
//!
//! Markup is produced as strings; what needs tracking is which listeners are
//! wired where, so attach-once and release-on-close can be checked.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Change,
    Submit,
    KeyUp,
    Blur,
    Resize,
    LoadedData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listeners registered on one element (or the window).
#[derive(Debug, Default)]
pub struct EventTarget {
    listeners: Vec<(ListenerId, EventKind)>,
    next_id: u64,
}

impl EventTarget {
    pub fn add(&mut self, kind: EventKind) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, kind));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|(_, k)| *k == kind).count()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_remove() {
        let mut target = EventTarget::default();

        let resize = target.add(EventKind::Resize);
        let click = target.add(EventKind::Click);
        assert_eq!(target.count(EventKind::Resize), 1);
        assert_eq!(target.len(), 2);

        assert!(target.remove(resize));
        assert!(!target.remove(resize));
        assert_eq!(target.count(EventKind::Resize), 0);

        target.remove(click);
        assert!(target.is_empty());
    }
}
