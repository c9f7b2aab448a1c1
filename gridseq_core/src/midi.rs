//! Raw MIDI byte handling shared by the Sequencer Core and the Controller
//! Bridge: status/data decoding with resync-on-garbage, the hardware
//! protocol's literal sysex constants and LED colour palette, and the
//! fixed-capacity event sink every output stream is built from.
//!
//! Typed wrapper crates (`midi-types`, `embedded-midi`) were dropped for
//! this layer; see `DESIGN.md`. The wire format here is exactly the bytes
//! the spec defines, which a hand-rolled codec expresses more directly
//! than a generic MIDI-message enum would.

use heapless::Vec;

/// Enter the hardware device's programmer mode (direct LED control).
pub const ENTER_PROGRAMMER_MODE: [u8; 9] = [0xF0, 0x00, 0x20, 0x29, 0x02, 0x0D, 0x0E, 0x01, 0xF7];

/// Exit programmer mode, returning the device to its native firmware UI.
pub const EXIT_PROGRAMMER_MODE: [u8; 9] = [0xF0, 0x00, 0x20, 0x29, 0x02, 0x0D, 0x0E, 0x00, 0xF7];

/// Universal MIDI device inquiry.
pub const DEVICE_INQUIRY: [u8; 6] = [0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7];

/// LED colour palette indices used by the hardware protocol.
pub mod color {
    pub const OFF: u8 = 0;
    pub const WHITE: u8 = 3;
    pub const RED: u8 = 5;
    pub const YELLOW: u8 = 13;
    pub const GREEN: u8 = 21;
    pub const DIM_GREEN: u8 = 23;
}

/// A decoded channel-voice or sysex message relevant to this sequencer.
/// Anything else on the wire (aftertouch, pitch bend, clock, ...) is not
/// represented here and is implicitly skipped by [`parse`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParsedMidi {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, control: u8, value: u8 },
    SysEx,
}

/// Parses one MIDI message from the front of `bytes`.
///
/// Truncated messages and unrecognised status bytes are not an error: they
/// are simply not decoded into a [`ParsedMidi`], matching the spec's
/// "skip byte-by-byte until resync on a new status byte" contract. Callers
/// that feed one already-framed message per call (as the host's input
/// event stream does) never need the resync behaviour themselves; it is
/// here so a single malformed event cannot wedge the bridge.
pub fn parse(bytes: &[u8]) -> Option<ParsedMidi> {
    let status = *bytes.first()?;
    match status & 0xF0 {
        0x90 => {
            let (note, velocity) = (*bytes.get(1)?, *bytes.get(2)?);
            let channel = status & 0x0F;
            if velocity == 0 {
                Some(ParsedMidi::NoteOff {
                    channel,
                    note,
                    velocity,
                })
            } else {
                Some(ParsedMidi::NoteOn {
                    channel,
                    note,
                    velocity,
                })
            }
        }
        0x80 => Some(ParsedMidi::NoteOff {
            channel: status & 0x0F,
            note: *bytes.get(1)?,
            velocity: *bytes.get(2)?,
        }),
        0xB0 => Some(ParsedMidi::ControlChange {
            channel: status & 0x0F,
            control: *bytes.get(1)?,
            value: *bytes.get(2)?,
        }),
        0xF0 => {
            if status == 0xF0 && bytes.last() == Some(&0xF7) {
                Some(ParsedMidi::SysEx)
            } else {
                None
            }
        }
        _ => {
            defmt::trace!("skipping unrecognised MIDI status byte");
            None
        }
    }
}

pub fn note_on_bytes(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [0x90 | (channel & 0x0F), note, velocity]
}

pub fn note_off_bytes(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [0x80 | (channel & 0x0F), note, velocity]
}

pub fn control_change_bytes(channel: u8, control: u8, value: u8) -> [u8; 3] {
    [0xB0 | (channel & 0x0F), control, value]
}

/// Maximum bytes a single message this crate emits can carry. The longest
/// is [`ENTER_PROGRAMMER_MODE`] / [`EXIT_PROGRAMMER_MODE`] at 9 bytes.
pub const MAX_EVENT_BYTES: usize = 9;

/// One outgoing MIDI message, timestamped with a sample offset relative to
/// the start of the tick that produced it.
#[derive(Clone, Copy, Debug)]
pub struct MidiEvent {
    pub offset: u32,
    len: u8,
    bytes: [u8; MAX_EVENT_BYTES],
}

impl MidiEvent {
    pub fn new(offset: u32, data: &[u8]) -> MidiEvent {
        let mut bytes = [0u8; MAX_EVENT_BYTES];
        let len = data.len().min(MAX_EVENT_BYTES);
        bytes[..len].copy_from_slice(&data[..len]);
        MidiEvent {
            offset,
            len: len as u8,
            bytes,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

/// A bounded, append-only buffer of outgoing MIDI events. Every output
/// stream the engine writes to (primary MIDI, hardware MIDI) is one of
/// these, parameterised only by its capacity: the three output streams
/// described by the spec are not three distinct types, just three sinks
/// bound to different host buffers.
///
/// Pushing past capacity drops the event and reports `false`; it never
/// panics, allocates, or blocks. Events must be pushed in non-decreasing
/// `offset` order by the caller, which every producer in this crate does
/// naturally because it processes crossings in time order.
pub struct EventSink<const N: usize> {
    events: Vec<MidiEvent, N>,
}

impl<const N: usize> EventSink<N> {
    pub fn new() -> EventSink<N> {
        EventSink { events: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Appends an event, returning `false` (and dropping it) if the sink
    /// is already full.
    pub fn push(&mut self, offset: u32, data: &[u8]) -> bool {
        let ok = self.events.push(MidiEvent::new(offset, data)).is_ok();
        if !ok {
            defmt::warn!("dropping MIDI event: output sink full");
        }
        ok
    }

    pub fn as_slice(&self) -> &[MidiEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<const N: usize> Default for EventSink<N> {
    fn default() -> Self {
        EventSink::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_note_on_and_off() {
        assert_eq!(
            Some(ParsedMidi::NoteOn {
                channel: 0,
                note: 45,
                velocity: 127
            }),
            parse(&[0x90, 45, 127])
        );
        assert_eq!(
            Some(ParsedMidi::NoteOff {
                channel: 0,
                note: 45,
                velocity: 0
            }),
            parse(&[0x80, 45, 0])
        );
    }

    #[test]
    fn note_on_with_zero_velocity_is_a_note_off() {
        assert_eq!(
            Some(ParsedMidi::NoteOff {
                channel: 3,
                note: 10,
                velocity: 0
            }),
            parse(&[0x93, 10, 0])
        );
    }

    #[test]
    fn parses_control_change() {
        assert_eq!(
            Some(ParsedMidi::ControlChange {
                channel: 0,
                control: 92,
                value: 127
            }),
            parse(&[0xB0, 92, 127])
        );
    }

    #[test]
    fn truncated_message_does_not_parse() {
        assert_eq!(None, parse(&[0x90, 45]));
        assert_eq!(None, parse(&[]));
    }

    #[test]
    fn unknown_status_is_skipped_not_errored() {
        assert_eq!(None, parse(&[0xA0, 1, 2]));
    }

    #[test]
    fn sink_drops_events_past_capacity() {
        let mut sink: EventSink<2> = EventSink::new();
        assert!(sink.push(0, &[0x90, 1, 2]));
        assert!(sink.push(1, &[0x90, 1, 2]));
        assert!(!sink.push(2, &[0x90, 1, 2]));
        assert_eq!(2, sink.len());
    }

    #[test]
    fn sink_clear_empties_without_reallocating_capacity() {
        let mut sink: EventSink<4> = EventSink::new();
        sink.push(0, &[0x90, 1, 2]);
        sink.clear();
        assert!(sink.is_empty());
        assert!(sink.push(0, &ENTER_PROGRAMMER_MODE));
        assert_eq!(9, sink.as_slice()[0].as_bytes().len());
    }
}
