//! Contact routing
//!
//! Translates raw two-body contacts from the physics layer into semantic
//! game events. Each object produces at most one event: it is forgotten the
//! moment its first qualifying contact is routed, so re-entrant callbacks for
//! the same object fall through silently.

use std::collections::{HashSet, VecDeque};

use super::notes::NoteVariant;
use super::state::{FallingObject, ObjectKind};

/// A body taking part in a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Body {
    /// The player's instrument
    Catcher,
    /// The ground line below the play area
    Ground,
    Object { id: u32, kind: ObjectKind },
}

impl Body {
    pub fn object(object: &FallingObject) -> Self {
        Body::Object {
            id: object.id,
            kind: object.kind,
        }
    }
}

/// A raw contact between two bodies, in either order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: Body,
    pub b: Body,
}

impl Contact {
    pub fn new(a: Body, b: Body) -> Self {
        Self { a, b }
    }
}

/// Semantic gameplay events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    NoteCaught(NoteVariant),
    NoteMissed(NoteVariant),
    CoinCaught,
}

/// Receiver of semantic gameplay events
pub trait GameEventSink {
    fn on_note_caught(&mut self, variant: NoteVariant);
    fn on_note_missed(&mut self, variant: NoteVariant);
    fn on_coin_caught(&mut self);

    fn deliver(&mut self, event: GameEvent) {
        match event {
            GameEvent::NoteCaught(variant) => self.on_note_caught(variant),
            GameEvent::NoteMissed(variant) => self.on_note_missed(variant),
            GameEvent::CoinCaught => self.on_coin_caught(),
        }
    }
}

/// FIFO of events waiting for the single mutation step
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.events.drain(..)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl GameEventSink for EventQueue {
    fn on_note_caught(&mut self, variant: NoteVariant) {
        self.push(GameEvent::NoteCaught(variant));
    }

    fn on_note_missed(&mut self, variant: NoteVariant) {
        self.push(GameEvent::NoteMissed(variant));
    }

    fn on_coin_caught(&mut self) {
        self.push(GameEvent::CoinCaught);
    }
}

/// Classify a contact, ignoring body order.
/// Returns the object to remove and the event it produces.
pub fn classify(contact: &Contact) -> Option<(u32, GameEvent)> {
    let (other, id, kind) = match (contact.a, contact.b) {
        (Body::Object { id, kind }, other) | (other, Body::Object { id, kind }) => (other, id, kind),
        _ => return None,
    };

    match (other, kind) {
        (Body::Catcher, ObjectKind::Note(variant)) => Some((id, GameEvent::NoteCaught(variant))),
        (Body::Catcher, ObjectKind::BonusCoin) => Some((id, GameEvent::CoinCaught)),
        (Body::Ground, ObjectKind::Note(variant)) => Some((id, GameEvent::NoteMissed(variant))),
        _ => None,
    }
}

/// Routes contacts for the objects currently in flight
#[derive(Debug, Clone, Default)]
pub struct CollisionRouter {
    live: HashSet<u32>,
}

impl CollisionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a freshly spawned object
    pub fn register(&mut self, object: &FallingObject) {
        self.live.insert(object.id);
    }

    /// Stop tracking an object that left the simulation without an event
    pub fn forget(&mut self, id: u32) {
        self.live.remove(&id);
    }

    pub fn clear(&mut self) {
        self.live.clear();
    }

    pub fn is_live(&self, id: u32) -> bool {
        self.live.contains(&id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Deliver at most one event for the contact.
    /// Returns the id of the object that must be removed from the simulation.
    pub fn route<S: GameEventSink + ?Sized>(&mut self, contact: Contact, sink: &mut S) -> Option<u32> {
        let Some((id, event)) = classify(&contact) else {
            log::trace!("Ignoring contact {:?}", contact);
            return None;
        };
        if !self.live.remove(&id) {
            log::trace!("Ignoring contact for removed object {}", id);
            return None;
        }
        log::debug!("Object {} -> {:?}", id, event);
        sink.deliver(event);
        Some(id)
    }
}
