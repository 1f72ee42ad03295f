use std::f64::consts::{PI, TAU};

/// Fixed angular layout of a ring of `count` items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleModel {
    count: usize,
    step: f64,
}

impl AngleModel {
    pub fn new(count: usize) -> Option<Self> {
        (count > 0).then(|| Self {
            count,
            step: TAU / count as f64,
        })
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.count
    }

    pub fn angle_of(&self, index: usize) -> f64 {
        index as f64 * self.step
    }

    /// Steps `delta` slots around the ring, wrapping in both directions.
    pub fn wrap(&self, index: usize, delta: i32) -> usize {
        (index as i64 + delta as i64).rem_euclid(self.count as i64) as usize
    }

    /// Index of the item nearest the front for an unbounded ring rotation.
    pub fn front_index_at(&self, rotation: f64) -> usize {
        let steps = (rotation / self.step).round() as i64;
        steps.rem_euclid(self.count as i64) as usize
    }

    /// Whole turns wound up by `rotation`, counted from the slot at the front.
    pub fn turn_of(&self, rotation: f64) -> i64 {
        let steps = (rotation / self.step).round() as i64;
        steps.div_euclid(self.count as i64)
    }

    /// `angle_of(index)` placed within the turn `rotation` is in.
    ///
    /// Equals `angle_of(index)` on an unwound ring and always lies less than
    /// one full turn away from `rotation`.
    pub fn angle_in_turn(&self, rotation: f64, index: usize) -> f64 {
        self.turn_of(rotation) as f64 * TAU + self.angle_of(index)
    }
}

/// Signed delta in `(-PI, PI]` such that `from + delta` lands on `to` modulo a full turn.
pub fn shortest_delta(from: f64, to: f64) -> f64 {
    // rem_euclid keeps the remainder non-negative regardless of the sign of `to - from`
    let delta = (to - from + PI).rem_euclid(TAU) - PI;
    if delta <= -PI { delta + TAU } else { delta }
}
