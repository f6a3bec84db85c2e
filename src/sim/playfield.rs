//! Headless falling-body playfield
//!
//! A minimal physics layer: objects fall under gravity, the catcher slides
//! along the bottom, and overlaps are reported as raw contacts. It never
//! scores anything itself; contacts go through the collision router.

use glam::Vec2;

use super::collision::{Body, Contact};
use super::state::FallingObject;
use crate::platform::Scene;
use crate::tuning::Tuning;

/// The player's instrument (axis-aligned box)
#[derive(Debug, Clone, PartialEq)]
pub struct Catcher {
    /// Center
    pub pos: Vec2,
    pub size: Vec2,
    /// Where the player is dragging it
    pub target_x: f32,
}

impl Catcher {
    /// Circle-vs-box overlap test
    pub fn touches(&self, center: Vec2, radius: f32) -> bool {
        let half = self.size / 2.0;
        let closest = center.clamp(self.pos - half, self.pos + half);
        closest.distance_squared(center) <= radius * radius
    }
}

/// Result of one physics step
#[derive(Debug, Clone, Default)]
pub struct StepOutcome {
    pub contacts: Vec<Contact>,
    /// Objects that fell out of the world without a contact
    pub culled: Vec<u32>,
}

/// Falling objects, the catcher and the ground line
#[derive(Debug, Clone)]
pub struct Playfield {
    width: f32,
    gravity: f32,
    catcher_speed: f32,
    pub catcher: Catcher,
    /// Sorted by id for deterministic iteration
    objects: Vec<FallingObject>,
    paused: bool,
}

impl Playfield {
    pub fn new(tuning: &Tuning) -> Self {
        let center = tuning.play_width / 2.0;
        Self {
            width: tuning.play_width,
            gravity: tuning.gravity,
            catcher_speed: tuning.catcher_speed,
            catcher: Catcher {
                pos: Vec2::new(center, tuning.catcher_y),
                size: Vec2::new(tuning.catcher_width, tuning.catcher_height),
                target_x: center,
            },
            objects: Vec::new(),
            paused: false,
        }
    }

    /// Steer the catcher toward `x` (clamped to keep it on screen)
    pub fn move_catcher(&mut self, x: f32) {
        if self.paused {
            return;
        }
        let half = self.catcher.size.x / 2.0;
        self.catcher.target_x = x.clamp(half, (self.width - half).max(half));
    }

    pub fn objects(&self) -> &[FallingObject] {
        &self.objects
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Advance physics by `dt` seconds and report contacts
    pub fn step(&mut self, dt: f32) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        if self.paused {
            return outcome;
        }

        let max_move = self.catcher_speed * dt;
        let delta = (self.catcher.target_x - self.catcher.pos.x).clamp(-max_move, max_move);
        self.catcher.pos.x += delta;

        let gravity = Vec2::new(0.0, -self.gravity);
        for object in &mut self.objects {
            object.vel += gravity * dt;
            object.pos += object.vel * dt;
        }

        for object in &self.objects {
            let radius = object.radius();
            if self.catcher.touches(object.pos, radius) {
                outcome.contacts.push(Contact::new(Body::Catcher, Body::object(object)));
            } else if object.pos.y - radius <= 0.0 {
                outcome.contacts.push(Contact::new(Body::object(object), Body::Ground));
            }
        }

        // Anything fully below the ground is gone for good
        self.objects.retain(|o| {
            let gone = o.pos.y + o.size < 0.0;
            if gone {
                outcome.culled.push(o.id);
            }
            !gone
        });

        outcome
    }
}

impl Scene for Playfield {
    fn spawn(&mut self, object: FallingObject) {
        self.objects.push(object);
        self.objects.sort_by_key(|o| o.id);
    }

    fn remove(&mut self, id: u32) {
        self.objects.retain(|o| o.id != id);
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn reset_scene(&mut self) {
        self.objects.clear();
        self.paused = false;
        self.catcher.pos.x = self.width / 2.0;
        self.catcher.target_x = self.catcher.pos.x;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::notes::NoteVariant;
    use crate::sim::state::ObjectKind;

    fn note_at(id: u32, x: f32, y: f32) -> FallingObject {
        FallingObject {
            id,
            kind: ObjectKind::Note(NoteVariant::Note1),
            pos: Vec2::new(x, y),
            vel: Vec2::ZERO,
            size: 30.0,
            spawn_time_ms: 0,
        }
    }

    fn run_until_contact(field: &mut Playfield) -> Vec<Contact> {
        for _ in 0..1000 {
            let outcome = field.step(SIM_DT);
            if !outcome.contacts.is_empty() {
                return outcome.contacts;
            }
        }
        Vec::new()
    }

    #[test]
    fn test_note_over_catcher_is_caught() {
        let mut field = Playfield::new(&Tuning::default());
        let x = field.catcher.pos.x;
        field.spawn(note_at(1, x, 400.0));
        let contacts = run_until_contact(&mut field);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].a, Body::Catcher);
    }

    #[test]
    fn test_note_beside_catcher_hits_ground() {
        let mut field = Playfield::new(&Tuning::default());
        field.spawn(note_at(1, 30.0, 400.0));
        let contacts = run_until_contact(&mut field);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].b, Body::Ground);
    }

    #[test]
    fn test_catcher_speed_and_clamp() {
        let tuning = Tuning::default();
        let mut field = Playfield::new(&tuning);
        field.move_catcher(-500.0);
        assert_eq!(field.catcher.target_x, tuning.catcher_width / 2.0);
        let start = field.catcher.pos.x;
        field.step(SIM_DT);
        let moved = start - field.catcher.pos.x;
        assert!((moved - tuning.catcher_speed * SIM_DT).abs() < 1e-3);
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut field = Playfield::new(&Tuning::default());
        field.spawn(note_at(1, 30.0, 400.0));
        field.pause();
        let outcome = field.step(SIM_DT);
        assert!(outcome.contacts.is_empty());
        assert_eq!(field.objects()[0].pos.y, 400.0);
        field.resume();
        field.step(SIM_DT);
        assert!(field.objects()[0].pos.y < 400.0);
    }

    #[test]
    fn test_reset_scene_clears() {
        let mut field = Playfield::new(&Tuning::default());
        field.spawn(note_at(1, 30.0, 400.0));
        field.pause();
        field.reset_scene();
        assert!(field.objects().is_empty());
        assert!(!field.is_paused());
    }

    #[test]
    fn test_objects_below_ground_are_culled() {
        let mut field = Playfield::new(&Tuning::default());
        field.spawn(note_at(9, 30.0, -40.0));
        let outcome = field.step(SIM_DT);
        assert_eq!(outcome.culled, vec![9]);
        assert!(field.objects().is_empty());
    }
}
