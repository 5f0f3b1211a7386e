//! Time Authority
//!
//! Single owner of the simulation time scale. Time-affecting abilities ask the
//! authority for a scale and give it back when they end; at most one request
//! is held at a time and conflicting requests are rejected, never queued.
//!
//! The authority is the source of truth. Each frame its scale is copied into
//! Bevy's virtual clock so any host system reading `Time<Virtual>` follows it,
//! but nothing is ever read back from the clock.
//!
//! ## Dual-time rule
//!
//! The encounter runs on two clocks per frame, both exposed by [`FrameClock`]:
//! - `unscaled`: player control, jump impulses, player position integration,
//!   ability timers, invincibility and knockback.
//! - `scaled` (`unscaled * effective_scale`): boss AI, boss projectiles and
//!   gravity contributions.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Which ability currently holds the time scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeScaleSource {
    TimeStop,
    TimeSlowDown,
}

impl TimeScaleSource {
    pub fn name(&self) -> &'static str {
        match self {
            TimeScaleSource::TimeStop => "Time Stop",
            TimeScaleSource::TimeSlowDown => "Time Slow Down",
        }
    }
}

/// An accepted request to run the simulation at a reduced speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScaleRequest {
    pub source: TimeScaleSource,
    /// Always within (0, 1]
    pub scale: f32,
}

/// The single time-scale slot.
#[derive(Resource, Debug, Default)]
pub struct TimeAuthority {
    request: Option<TimeScaleRequest>,
}

impl TimeAuthority {
    /// Try to take the time-scale slot for `source`.
    ///
    /// Fails without side effects if any source (including `source` itself)
    /// already holds the slot, or if `scale` is outside (0, 1].
    pub fn request_scale(&mut self, source: TimeScaleSource, scale: f32) -> bool {
        if !(scale > 0.0 && scale <= 1.0) {
            warn!(
                "Rejected time scale {} from {}: must be within (0, 1]",
                scale,
                source.name()
            );
            return false;
        }

        if let Some(held) = self.request {
            debug!(
                "Rejected time scale request from {}: slot held by {}",
                source.name(),
                held.source.name()
            );
            return false;
        }

        self.request = Some(TimeScaleRequest { source, scale });
        true
    }

    /// Give the slot back. No-op unless `source` is the current holder.
    ///
    /// Returns true if the slot was actually released.
    pub fn release(&mut self, source: TimeScaleSource) -> bool {
        match self.request {
            Some(held) if held.source == source => {
                self.request = None;
                true
            }
            _ => false,
        }
    }

    /// Scale currently applied to the simulation (1.0 when nothing holds the slot).
    pub fn effective_scale(&self) -> f32 {
        self.request.map_or(1.0, |r| r.scale)
    }

    pub fn holder(&self) -> Option<TimeScaleSource> {
        self.request.map(|r| r.source)
    }

    pub fn active_request(&self) -> Option<&TimeScaleRequest> {
        self.request.as_ref()
    }
}

/// Delta times for the current frame.
#[derive(Resource, Debug, Clone, Copy)]
pub struct FrameClock {
    /// Real seconds since last frame
    pub unscaled: f32,
    /// `unscaled * scale`
    pub scaled: f32,
    /// Scale that was in effect when `scaled` was computed
    pub scale: f32,
    /// Total real seconds since the encounter started
    pub elapsed: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            unscaled: 0.0,
            scaled: 0.0,
            scale: 1.0,
            elapsed: 0.0,
        }
    }
}

impl FrameClock {
    /// Start a new frame with the given real delta.
    pub fn begin_frame(&mut self, unscaled: f32) {
        self.unscaled = unscaled.max(0.0);
        self.scaled = self.unscaled * self.scale;
        self.elapsed += self.unscaled;
    }

    /// Re-derive the scaled delta after the authority changed mid-frame.
    pub fn apply_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.scaled = self.unscaled * scale;
    }
}

/// Reads the real clock at the start of the encounter frame.
pub fn advance_frame_clock(real_time: Res<Time<Real>>, mut clock: ResMut<FrameClock>) {
    clock.begin_frame(real_time.delta_secs());
}

/// Applies the authority's scale to this frame's clock and mirrors it into
/// Bevy's virtual time. Runs after abilities have been processed.
pub fn apply_time_scale(
    authority: Res<TimeAuthority>,
    mut clock: ResMut<FrameClock>,
    mut virtual_time: ResMut<Time<Virtual>>,
) {
    let scale = authority.effective_scale();
    clock.apply_scale(scale);

    if (virtual_time.relative_speed() - scale).abs() > f32::EPSILON {
        virtual_time.set_relative_speed(scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scale_is_one() {
        let authority = TimeAuthority::default();
        assert_eq!(authority.effective_scale(), 1.0);
        assert_eq!(authority.holder(), None);
    }

    #[test]
    fn test_request_then_release() {
        let mut authority = TimeAuthority::default();
        assert!(authority.request_scale(TimeScaleSource::TimeStop, 0.01));
        assert_eq!(authority.effective_scale(), 0.01);
        assert_eq!(authority.holder(), Some(TimeScaleSource::TimeStop));

        assert!(authority.release(TimeScaleSource::TimeStop));
        assert_eq!(authority.effective_scale(), 1.0);
    }

    #[test]
    fn test_second_request_is_rejected_without_side_effects() {
        let mut authority = TimeAuthority::default();
        assert!(authority.request_scale(TimeScaleSource::TimeSlowDown, 0.3));
        assert!(!authority.request_scale(TimeScaleSource::TimeStop, 0.01));
        assert_eq!(authority.effective_scale(), 0.3);
        assert_eq!(authority.holder(), Some(TimeScaleSource::TimeSlowDown));

        // The holder cannot stack a second request either
        assert!(!authority.request_scale(TimeScaleSource::TimeSlowDown, 0.5));
        assert_eq!(authority.effective_scale(), 0.3);
    }

    #[test]
    fn test_release_by_non_holder_is_noop() {
        let mut authority = TimeAuthority::default();
        authority.request_scale(TimeScaleSource::TimeStop, 0.01);
        assert!(!authority.release(TimeScaleSource::TimeSlowDown));
        assert_eq!(authority.effective_scale(), 0.01);
    }

    #[test]
    fn test_out_of_range_scales_rejected() {
        let mut authority = TimeAuthority::default();
        assert!(!authority.request_scale(TimeScaleSource::TimeStop, 0.0));
        assert!(!authority.request_scale(TimeScaleSource::TimeStop, -0.5));
        assert!(!authority.request_scale(TimeScaleSource::TimeStop, 1.5));
        assert!(!authority.request_scale(TimeScaleSource::TimeStop, f32::NAN));
        assert_eq!(authority.holder(), None);
        assert!(authority.request_scale(TimeScaleSource::TimeStop, 1.0));
    }

    #[test]
    fn test_frame_clock_scales_delta() {
        let mut clock = FrameClock::default();
        clock.begin_frame(0.5);
        assert_eq!(clock.scaled, 0.5);
        clock.apply_scale(0.3);
        assert!((clock.scaled - 0.15).abs() < 1e-6);
        assert_eq!(clock.unscaled, 0.5);

        // Scale persists into the next frame until changed
        clock.begin_frame(1.0);
        assert!((clock.scaled - 0.3).abs() < 1e-6);
        assert!((clock.elapsed - 1.5).abs() < 1e-6);
    }
}
