//! The event dispatcher: `progress` and `seeded` listeners, registered and
//! removed by an opaque handle rather than by closure identity.

/// The two event names the core fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    /// Fires on every `add_entropy` call made while the generator was
    /// `NOT_READY` before that call.
    Progress,
    /// Fires at most once per `NOT_READY -> READY*` transition.
    Seeded,
}

/// The payload delivered to a listener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Progress toward readiness, in `[0.0, 1.0]`.
    Progress(f64),
    /// The working strength credited by the reseed that caused the
    /// transition, in bits.
    Seeded(u64),
}

/// An opaque handle returned by [`EventDispatcher::add`], used to remove a
/// listener later. Rust closures have no stable identity to compare
/// against, so this
/// monotonically increasing counter is the idiomatic substitute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    callback: Box<dyn FnMut(Event)>,
}

/// Append-only-per-event-name listener storage, dispatched by snapshot so a
/// listener that unregisters itself mid-dispatch is still called for the
/// event in progress and skipped for subsequent ones.
#[derive(Default)]
pub(crate) struct EventDispatcher {
    next_id: u64,
    progress: Vec<Listener>,
    seeded: Vec<Listener>,
}

impl EventDispatcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn listeners_mut(&mut self, name: EventName) -> &mut Vec<Listener> {
        match name {
            EventName::Progress => &mut self.progress,
            EventName::Seeded => &mut self.seeded,
        }
    }

    pub(crate) fn add(
        &mut self,
        name: EventName,
        callback: impl FnMut(Event) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners_mut(name).push(Listener {
            id,
            callback: Box::new(callback),
        });
        id
    }

    pub(crate) fn remove(&mut self, name: EventName, id: ListenerId) {
        self.listeners_mut(name).retain(|l| l.id != id);
    }

    /// Snapshot the currently registered ids for `name`, then invoke each
    /// listener still present by id, in registration order. Listeners
    /// registered during this dispatch are not included; listeners removed
    /// during this dispatch are still invoked once, for this event.
    pub(crate) fn fire(&mut self, name: EventName, event: Event) {
        let ids: Vec<ListenerId> = self.listeners_mut(name).iter().map(|l| l.id).collect();
        for id in ids {
            if let Some(listener) = self.listeners_mut(name).iter_mut().find(|l| l.id == id) {
                (listener.callback)(event);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn listener_count(&self, name: EventName) -> usize {
        match name {
            EventName::Progress => self.progress.len(),
            EventName::Seeded => self.seeded.len(),
        }
    }
}
