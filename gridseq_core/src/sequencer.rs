//! Sequencer Core: turns Clock boundary crossings into MIDI Note On / Note
//! Off events against the Pattern Store, and owns the Active Note Set.

use crate::clock::Crossing;
use crate::midi::{self, EventSink};
use crate::notes::ActiveNotes;
use crate::pattern::Pattern;

const NOTE_ON_VELOCITY: u8 = 100;
const CHANNEL: u8 = 0;

/// Emits Note On/Off against a [`Pattern`] as [`Crossing`]s arrive, holding
/// the [`ActiveNotes`] set that makes "one Note Off per Note On" true
/// across tick boundaries.
#[derive(Default)]
pub struct Sequencer {
    active: ActiveNotes,
    midi_filter: bool,
    first_run: bool,
}

impl Sequencer {
    pub fn new() -> Sequencer {
        Sequencer::default()
    }

    pub fn active_notes(&self) -> &ActiveNotes {
        &self.active
    }

    /// When set, mid-step Note Offs are suppressed (transport-stop Note
    /// Offs still fire). Owned here, not threaded through every call site,
    /// per the Sequencer Core's ownership of gate behaviour.
    pub fn set_midi_filter(&mut self, filter: bool) {
        self.midi_filter = filter;
    }

    pub fn midi_filter(&self) -> bool {
        self.midi_filter
    }

    /// Arms the "emit step 0 at offset 0 with no boundary crossed" rule
    /// that a fresh `start()` requires.
    pub fn arm_first_run(&mut self) {
        self.first_run = true;
    }

    pub fn take_first_run(&mut self) -> bool {
        core::mem::replace(&mut self.first_run, false)
    }

    /// Emits a Note On for every active cell in `step`, marking each pitch
    /// active. Used both for ordinary step-start crossings and for the
    /// first-run step-0 emission.
    pub fn emit_step_start<const N: usize>(
        &mut self,
        pattern: &Pattern,
        step: u8,
        offset: u32,
        out: &mut EventSink<N>,
    ) {
        for pitch in 0..crate::PITCH_RANGE as u16 {
            let pitch = pitch as u8;
            if pattern.is_set(step, pitch) {
                self.active.set(pitch);
                out.push(offset, &midi::note_on_bytes(CHANNEL, pitch, NOTE_ON_VELOCITY));
            }
        }
    }

    /// Emits Note Off for every currently active pitch and clears the set.
    /// Ignores `midi_filter`; callers gate that themselves so that the
    /// "stop always emits all-notes-off" guarantee cannot be silenced by
    /// the filter flag.
    pub fn emit_all_notes_off<const N: usize>(&mut self, offset: u32, out: &mut EventSink<N>) {
        for pitch in self.active.iter() {
            out.push(offset, &midi::note_off_bytes(CHANNEL, pitch, 0));
        }
        self.active.clear();
    }

    /// Emits the mid-step Note Off unless `midi_filter` is set, in which
    /// case the Active Note Set is left untouched: filtered notes keep
    /// sounding until the next Note On of the same pitch or a transport
    /// stop, by design of the filter.
    fn emit_mid_step<const N: usize>(&mut self, offset: u32, out: &mut EventSink<N>) {
        if self.midi_filter {
            return;
        }
        self.emit_all_notes_off(offset, out);
    }

    /// Applies one [`Crossing`] to `pattern`, writing resulting MIDI into
    /// `out`. `current_step` must be the step that just started, for
    /// `Crossing::StepStart`.
    pub fn apply_crossing<const N: usize>(
        &mut self,
        pattern: &Pattern,
        crossing: Crossing,
        current_step: u8,
        out: &mut EventSink<N>,
    ) {
        match crossing {
            Crossing::StepStart { offset } => {
                self.emit_step_start(pattern, current_step, offset, out);
            }
            Crossing::MidStep { offset } => {
                self.emit_mid_step(offset, out);
            }
        }
    }
}
