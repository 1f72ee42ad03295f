pub mod clock;
pub mod scene;
pub mod tween;

pub use clock::{Clock, ManualClock, SystemClock};
pub use scene::{HandleId, SceneArena, SceneHost, SceneNode, VisualVariant};
pub use tween::{Ease, TweenEngine, TweenEvent, TweenHandle, TweenProperty, TweenSink, TweenSpec, Tweener};
