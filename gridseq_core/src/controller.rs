//! Controller Bridge: decodes the 8x8 pad hardware's input protocol into
//! pattern edits, and drives its LEDs.

use crate::midi::{self, color, EventSink, ParsedMidi, DEVICE_INQUIRY, ENTER_PROGRAMMER_MODE, EXIT_PROGRAMMER_MODE};
use crate::pattern::Pattern;
use crate::{PITCH_RANGE, VISIBLE_ROWS};

const CC_PITCH_DOWN: u8 = 91;
const CC_PITCH_UP: u8 = 92;
const CC_PAGE_0: u8 = 93;
const CC_PAGE_1: u8 = 94;

fn pad_note(x: u8, y: u8) -> u8 {
    11 + x + 10 * y
}

/// Decodes a pad Note On's note number into `(x, y)`, if it falls within
/// the 8x8 grid. Coordinates resulting outside `[0, 8)` on either axis (the
/// numbering scheme has gaps and an upper tail) are not a pad press.
fn decode_pad(note: u8) -> Option<(u8, u8)> {
    if !(11..=88).contains(&note) {
        return None;
    }
    let n = note - 11;
    let x = n % 10;
    let y = n / 10;
    if x >= 8 || y >= 8 {
        None
    } else {
        Some((x, y))
    }
}

/// Owns the hardware device's mode state and LED dirty-tracking. Pattern
/// edits land directly on [`Pattern`]; this type never stores a shadow copy
/// of grid content.
pub struct Controller {
    mode_entered: bool,
    dirty: bool,
    prev_led_step: Option<u8>,
}

impl Default for Controller {
    fn default() -> Self {
        Controller {
            mode_entered: false,
            dirty: false,
            prev_led_step: None,
        }
    }
}

impl Controller {
    pub fn new() -> Controller {
        Controller::default()
    }

    pub fn mode_entered(&self) -> bool {
        self.mode_entered
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// True if an LED refresh is owed: either something changed the grid
    /// or LED-affecting view state, or the playhead moved since the last
    /// refresh.
    pub fn needs_refresh(&self, current_step: u8) -> bool {
        self.dirty || self.prev_led_step != Some(current_step)
    }

    pub fn enter_mode<const N: usize, const M: usize>(
        &mut self,
        primary: &mut EventSink<N>,
        hardware: &mut EventSink<M>,
    ) {
        primary.push(0, &ENTER_PROGRAMMER_MODE);
        hardware.push(0, &ENTER_PROGRAMMER_MODE);
        self.mode_entered = true;
        defmt::debug!("entered programmer mode");
    }

    /// Exits programmer mode; the next tick's [`Controller::enter_mode`]
    /// call (driven by the scheduler checking `mode_entered`) re-enters.
    pub fn reset<const N: usize, const M: usize>(
        &mut self,
        primary: &mut EventSink<N>,
        hardware: &mut EventSink<M>,
    ) {
        primary.push(0, &EXIT_PROGRAMMER_MODE);
        hardware.push(0, &EXIT_PROGRAMMER_MODE);
        self.mode_entered = false;
        self.dirty = true;
        defmt::debug!("exited programmer mode");
    }

    pub fn device_inquiry<const N: usize, const M: usize>(
        &self,
        primary: &mut EventSink<N>,
        hardware: &mut EventSink<M>,
    ) {
        primary.push(0, &DEVICE_INQUIRY);
        hardware.push(0, &DEVICE_INQUIRY);
    }

    /// Applies one decoded hardware-input message to `pattern`. Anything
    /// other than a pad Note On or an auxiliary CC (including any SysEx
    /// reply the device sends) is not part of this bridge's input
    /// contract and is ignored here.
    pub fn handle_midi(&mut self, pattern: &mut Pattern, parsed: ParsedMidi) {
        match parsed {
            ParsedMidi::NoteOn { note, velocity, .. } if velocity > 0 => {
                if let Some((x, y)) = decode_pad(note) {
                    let step = x + 8 * pattern.hardware_page();
                    let pitch = pattern.pitch_offset() as u16 + y as u16;
                    if (step as usize) < pattern.sequence_length() as usize && pitch < PITCH_RANGE as u16 {
                        if pattern.toggle(step, pitch as u8) {
                            self.dirty = true;
                        }
                    }
                }
            }
            ParsedMidi::ControlChange { control, value, .. } if value > 0 => {
                match control {
                    CC_PITCH_DOWN => {
                        if pattern.pitch_offset() > 0 {
                            pattern.set_pitch_offset(pattern.pitch_offset() - 1);
                            self.dirty = true;
                        }
                    }
                    CC_PITCH_UP => {
                        let max = (PITCH_RANGE - VISIBLE_ROWS) as u8;
                        if pattern.pitch_offset() < max {
                            pattern.set_pitch_offset(pattern.pitch_offset() + 1);
                            self.dirty = true;
                        }
                    }
                    CC_PAGE_0 => {
                        if pattern.hardware_page() > 0 {
                            pattern.set_hardware_page(0);
                            self.dirty = true;
                        }
                    }
                    CC_PAGE_1 => {
                        if pattern.hardware_page() == 0 && pattern.set_hardware_page(1) {
                            self.dirty = true;
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn pad_color(pattern: &Pattern, step: u8, pitch: u8, current_step: u8) -> u8 {
        if step >= pattern.sequence_length() {
            color::OFF
        } else if step == current_step {
            if pattern.is_set(step, pitch) {
                color::YELLOW
            } else {
                color::DIM_GREEN
            }
        } else if pattern.is_set(step, pitch) {
            color::GREEN
        } else {
            color::OFF
        }
    }

    /// Redraws every pad and auxiliary LED from current pattern state and
    /// clears the dirty flag. Always emits a full 8x8 + 4-aux frame; the
    /// device has no partial-update command.
    pub fn refresh_leds<const N: usize>(
        &mut self,
        pattern: &Pattern,
        current_step: u8,
        out: &mut EventSink<N>,
    ) {
        let hardware_page = pattern.hardware_page();
        for y in 0..VISIBLE_ROWS as u8 {
            for x in 0..8u8 {
                let step = x + 8 * hardware_page;
                let pitch_u16 = pattern.pitch_offset() as u16 + y as u16;
                let pitch = if pitch_u16 < PITCH_RANGE as u16 {
                    pitch_u16 as u8
                } else {
                    0
                };
                let color = if pitch_u16 >= PITCH_RANGE as u16 {
                    color::OFF
                } else {
                    Self::pad_color(pattern, step, pitch, current_step)
                };
                out.push(0, &midi::note_on_bytes(0, pad_note(x, y), color));
            }
        }
        let max_offset = (PITCH_RANGE - VISIBLE_ROWS) as u8;
        let pitch_down = if pattern.pitch_offset() > 0 {
            color::WHITE
        } else {
            color::OFF
        };
        let pitch_up = if pattern.pitch_offset() < max_offset {
            color::WHITE
        } else {
            color::OFF
        };
        let page_0 = if pattern.hardware_page() > 0 {
            color::WHITE
        } else {
            color::OFF
        };
        let page_1 = if pattern.sequence_length() > VISIBLE_ROWS as u8 && pattern.hardware_page() == 0 {
            color::WHITE
        } else {
            color::OFF
        };
        out.push(0, &midi::control_change_bytes(0, CC_PITCH_DOWN, pitch_down));
        out.push(0, &midi::control_change_bytes(0, CC_PITCH_UP, pitch_up));
        out.push(0, &midi::control_change_bytes(0, CC_PAGE_0, page_0));
        out.push(0, &midi::control_change_bytes(0, CC_PAGE_1, page_1));
        self.dirty = false;
        self.prev_led_step = Some(current_step);
    }
}
