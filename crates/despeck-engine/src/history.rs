//! Bounded undo history of whole-scene snapshots.

use std::collections::VecDeque;

use crate::shape::Scene;

/// An immutable copy of a scene, including its id counter.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot(Scene);

impl Snapshot {
    /// Capture the scene as it is now.
    #[must_use]
    pub fn capture(scene: &Scene) -> Self {
        Self(scene.clone())
    }

    /// The captured scene.
    #[must_use]
    pub const fn scene(&self) -> &Scene {
        &self.0
    }

    /// Consume the snapshot, yielding the captured scene.
    #[must_use]
    pub fn into_scene(self) -> Scene {
        self.0
    }
}

/// A stack of snapshots holding at most `capacity` entries. Pushing onto a
/// full stack evicts the oldest snapshot.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Snapshot>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl History {
    /// Default number of retained snapshots.
    pub const DEFAULT_CAPACITY: usize = 25;

    /// Empty history retaining at most `capacity` snapshots (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a snapshot, evicting the oldest entries beyond the cap.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.entries.push_back(snapshot);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Pop the most recent snapshot.
    pub fn pop(&mut self) -> Option<Snapshot> {
        self.entries.pop_back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every snapshot.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shape::{Geometry, Shape};

    fn scene_with(n: usize) -> Scene {
        let mut scene = Scene::default();
        for _ in 0..n {
            scene.add(Shape::new(Geometry::path("M0 0 H1 V1 Z")));
        }
        scene
    }

    #[test]
    fn pop_is_lifo() {
        let mut history = History::default();
        history.push(Snapshot::capture(&scene_with(1)));
        history.push(Snapshot::capture(&scene_with(2)));
        assert_eq!(history.pop().unwrap().scene().len(), 2);
        assert_eq!(history.pop().unwrap().scene().len(), 1);
        assert!(history.pop().is_none());
    }

    #[test]
    fn cap_evicts_oldest() {
        let mut history = History::new(3);
        for n in 0..10 {
            history.push(Snapshot::capture(&scene_with(n)));
            assert!(history.len() <= 3);
        }
        let kept: Vec<usize> = std::iter::from_fn(|| history.pop())
            .map(|s| s.scene().len())
            .collect();
        assert_eq!(kept, vec![9, 8, 7]);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut history = History::new(0);
        assert_eq!(history.capacity(), 1);
        history.push(Snapshot::capture(&scene_with(1)));
        history.push(Snapshot::capture(&scene_with(2)));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn snapshot_is_independent_of_later_mutation() {
        let mut scene = scene_with(2);
        let snapshot = Snapshot::capture(&scene);
        let first = scene.shapes()[0].id();
        scene.remove(first);
        assert_eq!(snapshot.scene().len(), 2);
        assert_eq!(snapshot.into_scene().position(first), Some(0));
    }
}
