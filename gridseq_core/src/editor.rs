//! Editor Sync: the channel-based protocol that keeps an external,
//! out-of-process pattern editor mirrored to [`Pattern`] state.
//!
//! Persistent scalar channels (floats, sampled by the host before every
//! tick) are turned into edge-triggered edits here; nothing else in the
//! crate talks to the editor directly.

use crate::controller::Controller;
use crate::midi::EventSink;
#[cfg(test)]
use crate::midi::DEVICE_INQUIRY;
use crate::pattern::Pattern;
use crate::{MAX_STEPS, VISIBLE_ROWS};

const SENTINEL_RESET: f32 = -100.0;
const SENTINEL_DEVICE_INQUIRY: f32 = -200.0;
const SENTINEL_CLEAR: f32 = -300.0;
const SENTINEL_RECENTER: f32 = -400.0;

/// Width in bytes of the notification blob: an 8x8 viewport, one byte per
/// cell.
pub const NOTIFICATION_BYTES: usize = VISIBLE_ROWS * 8;

/// One tick's worth of persistent editor input channel values, as sampled
/// by the host immediately before `tick`.
#[derive(Clone, Copy, Debug)]
pub struct EditorInputs {
    pub grid_x: f32,
    pub grid_y: f32,
    pub sequence_length: f32,
    pub midi_filter: f32,
}

/// Edge-detection state for the coordinate and length channels. `None`
/// means "no value observed yet", so the very first tick's inputs are
/// always treated as a change.
#[derive(Default)]
pub struct EditorSync {
    last_grid_x: Option<f32>,
    last_sequence_length: Option<f32>,
}

impl EditorSync {
    pub fn new() -> EditorSync {
        EditorSync::default()
    }

    pub fn midi_filter_active(value: f32) -> bool {
        value >= 0.5
    }

    /// Applies one tick's inputs, mutating `pattern` and `controller` as
    /// needed. `primary`/`hardware` receive the device-inquiry sysex when
    /// requested via the `-200` sentinel. Whether the pattern grid or view
    /// state actually changed is observable afterwards via
    /// `Pattern::grid_changed`, which every mutating path here already
    /// bumps; callers needing that signal (e.g. the notification blob)
    /// compare it across the tick rather than through a separate return
    /// value.
    pub fn apply<const N: usize, const M: usize>(
        &mut self,
        inputs: EditorInputs,
        pattern: &mut Pattern,
        controller: &mut Controller,
        primary: &mut EventSink<N>,
        hardware: &mut EventSink<M>,
    ) {
        let length = inputs
            .sequence_length
            .clamp(crate::MIN_SEQUENCE_LENGTH as f32, crate::MAX_SEQUENCE_LENGTH as f32);
        if self.last_sequence_length != Some(length) {
            pattern.set_length(length as u8);
            controller.mark_dirty();
            self.last_sequence_length = Some(length);
        }

        if self.last_grid_x != Some(inputs.grid_x) {
            self.last_grid_x = Some(inputs.grid_x);
            self.apply_coordinate(inputs, pattern, controller, primary, hardware);
        }
    }

    fn apply_coordinate<const N: usize, const M: usize>(
        &mut self,
        inputs: EditorInputs,
        pattern: &mut Pattern,
        controller: &mut Controller,
        primary: &mut EventSink<N>,
        hardware: &mut EventSink<M>,
    ) {
        let gx = inputs.grid_x;
        if gx == SENTINEL_RESET {
            controller.reset(primary, hardware);
            return;
        }
        if gx == SENTINEL_DEVICE_INQUIRY {
            controller.device_inquiry(primary, hardware);
            return;
        }
        if gx == SENTINEL_CLEAR {
            pattern.clear_all();
            controller.mark_dirty();
            return;
        }
        if gx == SENTINEL_RECENTER {
            pattern.set_pitch_offset(crate::DEFAULT_PITCH_OFFSET);
            controller.mark_dirty();
            return;
        }
        if gx < 0.0 {
            return; // reserved sentinel, ignored
        }
        let gx = gx as i64;
        let gy = inputs.grid_y as i64;
        if (0..MAX_STEPS as i64).contains(&gx) && (0..VISIBLE_ROWS as i64).contains(&gy) {
            let pitch = pattern.pitch_offset() as u16 + gy as u16;
            if pitch < crate::PITCH_RANGE as u16 && pattern.toggle(gx as u8, pitch as u8) {
                controller.mark_dirty();
            }
        }
    }

    pub fn apply_midi_filter(filter_value: f32, sequencer: &mut crate::sequencer::Sequencer) {
        sequencer.set_midi_filter(EditorSync::midi_filter_active(filter_value));
    }
}

/// The observable outputs written once per tick at the end of the
/// scheduler, per the spec's step 8.
#[derive(Clone, Copy, Debug, Default)]
pub struct EditorOutputs {
    pub current_step: u8,
    pub sequence_length: u8,
    pub grid_changed: u32,
    pub rows: [u8; MAX_STEPS],
}

impl EditorOutputs {
    pub fn capture(pattern: &Pattern, current_step: u8) -> EditorOutputs {
        let mut rows = [0u8; MAX_STEPS];
        for (x, row) in rows.iter_mut().enumerate() {
            *row = pattern.pack_visible_row(x as u8);
        }
        EditorOutputs {
            current_step,
            sequence_length: pattern.sequence_length(),
            grid_changed: pattern.grid_changed(),
            rows,
        }
    }
}

/// Packs the 8x8 active viewport (relative to `pitch_offset`, the same
/// window `pack_visible_row` exposes) into the 64-byte consistency beacon
/// sent to the editor on any pattern mutation.
pub fn pack_notification(pattern: &Pattern) -> [u8; NOTIFICATION_BYTES] {
    let mut blob = [0u8; NOTIFICATION_BYTES];
    for x in 0..8u8 {
        let row = pattern.pack_visible_row(x);
        for y in 0..VISIBLE_ROWS as u8 {
            blob[x as usize * 8 + y as usize] = (row >> y) & 1;
        }
    }
    blob
}
