#![cfg_attr(not(test), no_std)]

//! Real-time core of a grid-based MIDI step sequencer.
//!
//! This crate holds the part of the sequencer that runs on the audio
//! thread: pattern storage, a sample-accurate clock, Note On/Off
//! scheduling, a bridge to an 8x8 illuminated-pad hardware controller, and
//! the glue ("editor sync") that keeps an out-of-process pattern editor
//! mirrored to pattern state. Everything here is `no_std` and allocates
//! nothing after construction; every container is a fixed-capacity
//! `heapless` collection or a plain array.
//!
//! The crate does not know how it is hosted. A real-time audio host is
//! expected to drive [`engine::Engine::tick`] once per audio buffer,
//! supplying MIDI input, transport events and editor scalar channels, and
//! reading back MIDI output and the editor-facing snapshot.

pub mod clock;
pub mod controller;
pub mod editor;
pub mod engine;
pub mod midi;
pub mod notes;
pub mod pattern;
pub mod sequencer;
pub mod transport;

/// Columns in the pattern grid.
pub const MAX_STEPS: usize = 16;

/// Rows in the pattern grid; one per MIDI note number.
pub const PITCH_RANGE: usize = 128;

/// Rows visible through the hardware/editor viewport at once.
pub const VISIBLE_ROWS: usize = 8;

/// `pitch_offset` applied when the editor asks for "recenter".
pub const DEFAULT_PITCH_OFFSET: u8 = 36;

/// Lower bound of `sequence_length`.
pub const MIN_SEQUENCE_LENGTH: u8 = 1;

/// Upper bound of `sequence_length`, equal to [`MAX_STEPS`].
pub const MAX_SEQUENCE_LENGTH: u8 = MAX_STEPS as u8;

pub use engine::Engine;
pub use pattern::Pattern;
