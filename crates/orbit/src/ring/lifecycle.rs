use crate::error::{HostError, RingError};
use crate::ring::rotation::Ring;
use crate::sys::{HandleId, SceneHost, TweenEngine};
use derive_more::{Deref, From};
use strum::Display as StrumDisplay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum Lifecycle {
    Live,
    Disposing,
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
#[strum(serialize_all = "kebab-case")]
pub enum DisposePhase {
    CancelTweens,
    ReleaseItems,
    DetachRing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisposeFailure {
    pub phase: DisposePhase,
    pub handle: Option<HandleId>,
    pub error: HostError,
}

/// Host failures collected while tearing a ring down.
#[derive(Debug, Clone, Default, PartialEq, Deref, From)]
pub struct DisposeFailures(Vec<DisposeFailure>);

impl DisposeFailures {
    fn record(
        &mut self,
        phase: DisposePhase,
        handle: Option<HandleId>,
        result: Result<(), HostError>,
    ) {
        if let Err(error) = result {
            log::error!("Dispose {} failed for {:?}: {}", phase, handle, error);
            self.0.push(DisposeFailure {
                phase,
                handle,
                error,
            });
        }
    }
}

impl<H: SceneHost, T: TweenEngine> Ring<H, T> {
    /// Tears the ring down. Safe to call any number of times; only the first call does work.
    ///
    /// Tweens are cancelled before any scene object is touched. Every phase
    /// runs even if an earlier one failed, and all failures are returned together.
    pub fn dispose(&mut self) -> Result<(), RingError> {
        if self.lifecycle != Lifecycle::Live {
            log::debug!("Ring {} already {}", self.handle, self.lifecycle);
            return Ok(());
        }
        self.lifecycle = Lifecycle::Disposing;

        let mut failures = DisposeFailures::default();
        if let Some(mut core) = self.core.take() {
            core.guard.check_and_auto_repair();
            core.guard.begin_disposal();

            if let Some(active) = core.active.take() {
                failures.record(
                    DisposePhase::CancelTweens,
                    Some(self.handle),
                    self.tweens.cancel(active.handle()),
                );
            }
            for tween in core.highlight.take_scale_tweens() {
                failures.record(DisposePhase::CancelTweens, None, self.tweens.cancel(tween));
            }
            core.highlight.clear();

            for item in &core.items {
                failures.record(
                    DisposePhase::ReleaseItems,
                    Some(item.handle),
                    self.host.release_resources(item.handle),
                );
                failures.record(
                    DisposePhase::ReleaseItems,
                    Some(item.handle),
                    self.host.detach(item.handle),
                );
            }

            failures.record(
                DisposePhase::DetachRing,
                Some(self.handle),
                self.host.detach(self.handle),
            );

            core.guard.mark_disposed();
        }
        self.lifecycle = Lifecycle::Disposed;

        if failures.is_empty() {
            log::info!("Ring {} disposed", self.handle);
            Ok(())
        } else {
            Err(RingError::Dispose(failures))
        }
    }
}
