//! Engine: the real-time entry point. Owns every other component and
//! sequences them within one `tick` call with fixed ordering and no
//! allocation.

use crate::clock::{Clock, Crossing};
use crate::controller::Controller;
use crate::editor::{self, EditorInputs, EditorOutputs, EditorSync};
use crate::midi::{self, EventSink};
use crate::notes::ActiveNotes;
use crate::pattern::Pattern;
use crate::sequencer::Sequencer;
use crate::transport::{PositionEvent, Transport, TransportEdge};

/// Capacity of the primary MIDI output sink. Sized generously above any
/// single-tick worst case (every pitch turning on, then off, across a
/// handful of step boundaries) rather than tuned tightly, per the
/// best-effort output-buffer contract: normal ticks never come close.
pub const PRIMARY_CAPACITY: usize = 320;

/// Capacity of the hardware output sink: 64 pad LEDs + 4 aux LEDs + room
/// for a mode sysex and a device-inquiry reply in the same tick.
pub const HARDWARE_CAPACITY: usize = 72;

pub type PrimarySink = EventSink<PRIMARY_CAPACITY>;
pub type HardwareSink = EventSink<HARDWARE_CAPACITY>;

/// Everything the host hands the engine for one tick beyond the sample
/// count and the output buffers: the drained input event stream and the
/// editor's persistent scalar channels.
pub struct TickInput<'a> {
    pub position_events: &'a [PositionEvent],
    /// Raw bytes of each MIDI message from the hardware pad device,
    /// already framed by the host (one message per slice).
    pub hardware_midi: &'a [&'a [u8]],
    pub editor: EditorInputs,
}

/// Everything the engine hands back after one tick: the values the
/// scheduler's step 8 writes, plus the notification blob if the pattern
/// mutated this tick.
pub struct TickOutputs {
    pub editor: EditorOutputs,
    pub notification: Option<[u8; editor::NOTIFICATION_BYTES]>,
}

/// The sequencer core, wired end to end. A `null` (`None`) instantiation
/// result stands in for the "programmer error" failure mode described for
/// the core: the host receiving `None` aborts loading rather than ticking
/// a half-built engine.
pub struct Engine {
    pattern: Pattern,
    clock: Clock,
    sequencer: Sequencer,
    transport: Transport,
    controller: Controller,
    editor: EditorSync,
    force_all_notes_off: bool,
}

impl Engine {
    /// Returns `None` if `sample_rate` or `tempo` is non-positive.
    pub fn new(sample_rate: f32, tempo: f32) -> Option<Engine> {
        if sample_rate <= 0.0 || tempo <= 0.0 {
            return None;
        }
        Some(Engine {
            pattern: Pattern::new(),
            clock: Clock::new(sample_rate, tempo),
            sequencer: Sequencer::new(),
            transport: Transport::new(),
            controller: Controller::new(),
            editor: EditorSync::new(),
            force_all_notes_off: false,
        })
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn pattern_mut(&mut self) -> &mut Pattern {
        &mut self.pattern
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    pub fn active_notes(&self) -> &ActiveNotes {
        self.sequencer.active_notes()
    }

    pub fn mode_entered(&self) -> bool {
        self.controller.mode_entered()
    }

    /// Starts playback from frame 0 with a clean Active Note Set and
    /// forces the hardware device back through its mode-entry handshake
    /// on the next tick. Any notes left active from a prior deactivate are
    /// flushed with Note Offs on the next `tick`, the same mechanism
    /// `deactivate` uses.
    pub fn activate(&mut self) {
        self.clock.start();
        self.sequencer.arm_first_run();
        self.controller.mark_dirty();
        self.force_all_notes_off = true;
    }

    /// Stops playback. The all-notes-off guarantee is honoured on the
    /// engine's next `tick`, since that is the first point at which an
    /// output buffer is available to carry it.
    pub fn deactivate(&mut self) {
        self.clock.stop();
        self.force_all_notes_off = true;
    }

    /// Runs one host buffer's worth of processing. Fixed ordering:
    /// 1. apply length/filter/coordinate editor inputs,
    /// 2. drain transport + hardware MIDI input,
    /// 3. enter programmer mode if not yet entered,
    /// 4. advance the clock and emit scheduled MIDI,
    /// 5. refresh hardware LEDs if dirty or the step advanced,
    /// 6. capture observable outputs.
    pub fn tick(
        &mut self,
        n_samples: u32,
        input: TickInput,
        primary: &mut PrimarySink,
        hardware: &mut HardwareSink,
    ) -> TickOutputs {
        primary.clear();
        hardware.clear();

        let grid_changed_before = self.pattern.grid_changed();
        // Snapshot before this tick's editor inputs are applied: a `-100`
        // reset sentinel clears `mode_entered` below, but re-entry must
        // wait for the *following* tick, not re-fire later in this same
        // output buffer.
        let mode_was_entered = self.controller.mode_entered();

        editor::EditorSync::apply_midi_filter(input.editor.midi_filter, &mut self.sequencer);
        self.editor
            .apply(input.editor, &mut self.pattern, &mut self.controller, primary, hardware);

        for event in input.position_events {
            match self.transport.apply(*event, &mut self.clock) {
                TransportEdge::Started => self.sequencer.arm_first_run(),
                TransportEdge::Stopped => self.force_all_notes_off = true,
                TransportEdge::None => {}
            }
        }
        for message in input.hardware_midi {
            if let Some(parsed) = midi::parse(message) {
                self.controller.handle_midi(&mut self.pattern, parsed);
            }
        }

        if !mode_was_entered {
            self.controller.enter_mode(primary, hardware);
        }

        if self.force_all_notes_off {
            self.sequencer.emit_all_notes_off(0, primary);
            self.force_all_notes_off = false;
        }

        if self.sequencer.take_first_run() {
            let step = self.clock.current_step(self.pattern.sequence_length());
            self.sequencer.emit_step_start(&self.pattern, step, 0, primary);
            self.controller.mark_dirty();
        } else {
            for crossing in self.clock.advance(n_samples) {
                match crossing {
                    Crossing::StepStart { .. } => {
                        let step = self.clock.current_step(self.pattern.sequence_length());
                        self.sequencer.apply_crossing(&self.pattern, crossing, step, primary);
                        self.controller.mark_dirty();
                    }
                    Crossing::MidStep { .. } => {
                        self.sequencer.apply_crossing(&self.pattern, crossing, 0, primary);
                    }
                }
            }
        }

        let current_step = self.clock.current_step(self.pattern.sequence_length());
        if self.controller.needs_refresh(current_step) {
            self.controller.refresh_leds(&self.pattern, current_step, hardware);
        }

        let outputs = EditorOutputs::capture(&self.pattern, current_step);
        let notification = if self.pattern.grid_changed() != grid_changed_before {
            Some(editor::pack_notification(&self.pattern))
        } else {
            None
        };

        TickOutputs {
            editor: outputs,
            notification,
        }
    }
}
