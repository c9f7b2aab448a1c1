//! Transport Decoder: turns host `Position` events into Clock edges.

use crate::clock::Clock;

/// One transport update from the host's input event stream. Either field
/// may be absent; absent fields are left untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct PositionEvent {
    pub tempo: Option<f32>,
    pub speed: Option<f32>,
}

/// Tracks the playing/stopped edge so that `speed` transitions (not levels)
/// drive `Clock::start`/`Clock::stop`.
#[derive(Default)]
pub struct Transport {
    speed_positive: bool,
}

/// An edge detected while applying a [`PositionEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportEdge {
    None,
    Started,
    Stopped,
}

impl Transport {
    pub fn new() -> Transport {
        Transport::default()
    }

    /// Applies one event to `clock`, returning the edge it produced, if
    /// any. Tempo updates apply unconditionally (when positive) regardless
    /// of whether a speed edge also occurred in the same event.
    pub fn apply(&mut self, event: PositionEvent, clock: &mut Clock) -> TransportEdge {
        if let Some(tempo) = event.tempo {
            clock.set_tempo(tempo);
        }
        let Some(speed) = event.speed else {
            return TransportEdge::None;
        };
        let positive = speed > 0.0;
        let edge = if positive && !self.speed_positive {
            clock.start();
            defmt::debug!("transport started");
            TransportEdge::Started
        } else if !positive && self.speed_positive {
            clock.stop();
            defmt::debug!("transport stopped");
            TransportEdge::Stopped
        } else {
            TransportEdge::None
        };
        self.speed_positive = positive;
        edge
    }
}
