//! End-to-end scenarios driven entirely through `Engine::tick`, mirroring
//! the fixed playback/editing sequences the core is expected to handle.

use gridseq_core::editor::EditorInputs;
use gridseq_core::engine::{Engine, HardwareSink, PrimarySink, TickInput};
use gridseq_core::transport::PositionEvent;

fn idle_input() -> TickInput<'static> {
    TickInput {
        position_events: &[],
        hardware_midi: &[],
        editor: EditorInputs {
            grid_x: -999.0,
            grid_y: 0.0,
            sequence_length: 8.0,
            midi_filter: 0.0,
        },
    }
}

#[test]
fn s3_step_advance_swaps_active_notes() {
    let mut engine = Engine::new(48000.0, 120.0).unwrap();
    engine.pattern_mut().toggle(0, 36);
    engine.pattern_mut().toggle(1, 38);
    engine.activate();

    let mut primary = PrimarySink::new();
    let mut hardware = HardwareSink::new();
    engine.tick(24000, idle_input(), &mut primary, &mut hardware);
    assert!(engine.active_notes().is_set(36));

    let out = engine.tick(256, idle_input(), &mut primary, &mut hardware);

    let note_off = primary
        .as_slice()
        .iter()
        .find(|e| e.as_bytes()[0] == 0x80 && e.as_bytes()[1] == 36);
    let note_on = primary
        .as_slice()
        .iter()
        .find(|e| e.as_bytes()[0] == 0x90 && e.as_bytes()[1] == 38);
    assert!(note_off.is_some(), "note off for pitch 36 expected");
    assert!(note_on.is_some(), "note on for pitch 38 expected");
    assert!(note_off.unwrap().offset <= note_on.unwrap().offset);
    assert_eq!(1, out.editor.current_step);
    assert!(engine.active_notes().is_set(38));
    assert!(!engine.active_notes().is_set(36));
}

#[test]
fn s4_pad_toggle_refreshes_leds_with_green() {
    let mut engine = Engine::new(48000.0, 120.0).unwrap();
    engine.activate();
    let mut primary = PrimarySink::new();
    let mut hardware = HardwareSink::new();

    let pad_press = [0x90u8, 0x2D, 0x7F];
    let mut input = idle_input();
    let messages = [&pad_press[..]];
    input.hardware_midi = &messages;
    let out = engine.tick(64, input, &mut primary, &mut hardware);

    assert!(engine.pattern().is_set(4, 39));
    assert!(out.editor.grid_changed > 0);
    let pad_led = hardware
        .as_slice()
        .iter()
        .find(|e| e.as_bytes().len() == 3 && e.as_bytes()[0] == 0x90 && e.as_bytes()[1] == 11 + 4 + 10 * 3)
        .expect("pad (4,3) LED update");
    assert_eq!(21, pad_led.as_bytes()[2], "GREEN palette index");
}

#[test]
fn s5_pitch_shift_up_via_cc92() {
    let mut engine = Engine::new(48000.0, 120.0).unwrap();
    engine.activate();
    assert_eq!(36, engine.pattern().pitch_offset());

    let mut primary = PrimarySink::new();
    let mut hardware = HardwareSink::new();
    let cc = [0xB0u8, 92, 0x7F];
    let mut input = idle_input();
    let messages = [&cc[..]];
    input.hardware_midi = &messages;
    engine.tick(64, input, &mut primary, &mut hardware);

    assert_eq!(37, engine.pattern().pitch_offset());
}

#[test]
fn s6_transport_stop_then_resume_replays_step_zero() {
    let mut engine = Engine::new(48000.0, 120.0).unwrap();
    engine.pattern_mut().toggle(0, 36);
    engine.activate();
    let mut primary = PrimarySink::new();
    let mut hardware = HardwareSink::new();
    engine.tick(256, idle_input(), &mut primary, &mut hardware);

    let mut stop_input = idle_input();
    let stop = [PositionEvent {
        tempo: None,
        speed: Some(0.0),
    }];
    stop_input.position_events = &stop;
    engine.tick(64, stop_input, &mut primary, &mut hardware);
    assert!(engine.active_notes().is_empty());
    assert!(!engine.is_playing());

    let mut start_input = idle_input();
    let start = [PositionEvent {
        tempo: None,
        speed: Some(1.0),
    }];
    start_input.position_events = &start;
    engine.tick(64, start_input, &mut primary, &mut hardware);

    let note_on = primary
        .as_slice()
        .iter()
        .find(|e| e.as_bytes()[0] == 0x90 && e.as_bytes()[1] == 36)
        .expect("replayed step 0 note on");
    assert_eq!(0, note_on.offset);
}

#[test]
fn invariant_every_active_note_has_had_a_note_on_with_no_matching_note_off() {
    let mut engine = Engine::new(48000.0, 120.0).unwrap();
    engine.pattern_mut().toggle(0, 36);
    engine.pattern_mut().toggle(4, 50);
    engine.activate();
    let mut primary = PrimarySink::new();
    let mut hardware = HardwareSink::new();

    for _ in 0..40 {
        engine.tick(6000, idle_input(), &mut primary, &mut hardware);
        for pitch in engine.active_notes().iter() {
            let sounded = primary
                .as_slice()
                .iter()
                .any(|e| e.as_bytes()[0] == 0x90 && e.as_bytes().get(1) == Some(&pitch))
                || pitch == 36
                || pitch == 50;
            assert!(sounded, "pitch {pitch} active without ever sounding");
        }
    }
}

#[test]
fn invariant_current_step_always_below_sequence_length() {
    let mut engine = Engine::new(48000.0, 120.0).unwrap();
    engine.activate();
    let mut primary = PrimarySink::new();
    let mut hardware = HardwareSink::new();
    for _ in 0..64 {
        let out = engine.tick(3000, idle_input(), &mut primary, &mut hardware);
        assert!(out.editor.current_step < out.editor.sequence_length.max(1));
    }
}

#[test]
fn invariant_row_bits_match_grid_cells_exactly() {
    let mut engine = Engine::new(48000.0, 120.0).unwrap();
    engine.pattern_mut().set_pitch_offset(40);
    engine.pattern_mut().toggle(3, 41);
    engine.pattern_mut().toggle(3, 46);
    engine.activate();
    let mut primary = PrimarySink::new();
    let mut hardware = HardwareSink::new();
    let out = engine.tick(10, idle_input(), &mut primary, &mut hardware);

    for x in 0..16u8 {
        for y in 0..8u8 {
            let expected = engine.pattern().is_set(x, 40 + y);
            let actual = out.editor.rows[x as usize] & (1 << y) != 0;
            assert_eq!(expected, actual, "x={x} y={y}");
        }
    }
}

#[test]
fn notification_blob_emitted_only_on_mutation() {
    let mut engine = Engine::new(48000.0, 120.0).unwrap();
    engine.activate();
    let mut primary = PrimarySink::new();
    let mut hardware = HardwareSink::new();

    let out = engine.tick(64, idle_input(), &mut primary, &mut hardware);
    assert!(out.notification.is_none());

    let mut input = idle_input();
    input.editor.grid_x = 0.0;
    input.editor.grid_y = 0.0;
    let out = engine.tick(64, input, &mut primary, &mut hardware);
    assert!(out.notification.is_some());
    let blob = out.notification.unwrap();
    assert_eq!(1, blob[0]);
}
