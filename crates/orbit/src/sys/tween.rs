//! Tween engine seam and a frame-driven implementation.
//!
//! Engines never call back into the ring. Every update and completion is sent
//! through the [`TweenSink`] handed over with the request, and the ring drains
//! those events once per frame.

use crate::error::HostError;
use crate::sys::scene::HandleId;
use async_channel::Sender;
use derive_more::{Display, From, Into};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::time::Duration;
use strum::{Display as StrumDisplay, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into)]
#[display("tween:{_0}")]
pub struct TweenHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum TweenProperty {
    Rotation,
    Scale,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    SerializeDisplay,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
pub enum Ease {
    #[strum(to_string = "linear")]
    Linear,
    #[strum(to_string = "ease-in", serialize = "easein", serialize = "in")]
    EaseIn,
    #[default]
    #[strum(to_string = "ease-out", serialize = "easeout", serialize = "out")]
    EaseOut,
    #[strum(to_string = "ease-in-out", serialize = "easeinout", serialize = "in-out")]
    EaseInOut,
    #[strum(to_string = "ease-out-cubic", serialize = "easeoutcubic", serialize = "cubic")]
    EaseOutCubic,
}

impl Ease {
    /// Maps linear progress `t` in [0, 1] onto the curve.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenSpec {
    pub target: HandleId,
    pub property: TweenProperty,
    pub from: f64,
    pub to: f64,
    pub duration: Duration,
    pub ease: Ease,
}

impl TweenSpec {
    pub fn value_at(&self, elapsed: Duration) -> f64 {
        let t = if self.duration.is_zero() {
            1.0
        } else {
            elapsed.as_secs_f64() / self.duration.as_secs_f64()
        };
        self.from + (self.to - self.from) * self.ease.apply(t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenEvent {
    Update { handle: TweenHandle, value: f64 },
    Complete { handle: TweenHandle, value: f64 },
}

impl TweenEvent {
    pub fn handle(&self) -> TweenHandle {
        match self {
            Self::Update { handle, .. } | Self::Complete { handle, .. } => *handle,
        }
    }
}

/// Where an engine reports progress for one tween.
#[derive(Debug, Clone)]
pub struct TweenSink {
    tx: Sender<TweenEvent>,
}

impl TweenSink {
    pub fn new(tx: Sender<TweenEvent>) -> Self {
        Self { tx }
    }

    pub fn update(&self, handle: TweenHandle, value: f64) {
        self.send(TweenEvent::Update { handle, value });
    }

    pub fn complete(&self, handle: TweenHandle, value: f64) {
        self.send(TweenEvent::Complete { handle, value });
    }

    fn send(&self, event: TweenEvent) {
        // closed once the ring is disposed; late events have nowhere to go
        if self.tx.try_send(event).is_err() {
            log::trace!("Dropping {:?} for a closed ring", event);
        }
    }
}

pub trait TweenEngine {
    fn animate(&mut self, spec: TweenSpec, sink: TweenSink) -> Result<TweenHandle, HostError>;

    /// After this returns, the engine must not emit anything more for `handle`.
    fn cancel(&mut self, handle: TweenHandle) -> Result<(), HostError>;
}

#[derive(Debug)]
struct RunningTween {
    handle: TweenHandle,
    spec: TweenSpec,
    elapsed: Duration,
    sink: TweenSink,
}

/// Frame-driven tween engine: call [`Tweener::advance`] once per frame.
#[derive(Debug, Default)]
pub struct Tweener {
    running: Vec<RunningTween>,
    next_handle: u64,
}

impl Tweener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.running.len()
    }

    pub fn advance(&mut self, dt: Duration) {
        self.running.retain_mut(|tween| {
            tween.elapsed += dt;
            if tween.elapsed >= tween.spec.duration {
                tween.sink.complete(tween.handle, tween.spec.to);
                false
            } else {
                tween
                    .sink
                    .update(tween.handle, tween.spec.value_at(tween.elapsed));
                true
            }
        });
    }
}

impl TweenEngine for Tweener {
    fn animate(&mut self, spec: TweenSpec, sink: TweenSink) -> Result<TweenHandle, HostError> {
        if !spec.from.is_finite() || !spec.to.is_finite() {
            return Err(HostError::Tween(format!(
                "non-finite {} tween {} -> {}",
                spec.property, spec.from, spec.to
            )));
        }
        self.next_handle += 1;
        let handle = TweenHandle(self.next_handle);
        self.running.push(RunningTween {
            handle,
            spec,
            elapsed: Duration::ZERO,
            sink,
        });
        Ok(handle)
    }

    fn cancel(&mut self, handle: TweenHandle) -> Result<(), HostError> {
        self.running.retain(|t| t.handle != handle);
        Ok(())
    }
}
