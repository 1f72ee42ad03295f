use std::time::Duration;

pub mod angle;
pub mod guard;
pub mod highlight;
pub mod lifecycle;
pub mod rotation;

pub use angle::{AngleModel, shortest_delta};
pub use guard::{AcquireOptions, GuardPhase, HeldLock, LockReason, SelectionGuard, SelectionLock};
pub use highlight::HighlightController;
pub use lifecycle::{DisposeFailure, DisposeFailures, DisposePhase, Lifecycle};
pub use rotation::{Ring, RingItem, RingSnapshot, SelectionState};

pub const SCROLL_DURATION: Duration = Duration::from_millis(350);
pub const SELECT_DURATION: Duration = Duration::from_millis(600);
pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(200);
pub const MAX_TRANSITION: Duration = Duration::from_millis(5000);
pub const HIGHLIGHT_SCALE: f64 = 1.15; // scale of the front item
pub const SCALE_EPSILON: f64 = 1e-6;
