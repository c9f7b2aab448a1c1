//! The timebase: tempo + sample rate turned into a frame counter, with
//! sample-accurate detection of step-start and mid-step (50% gate)
//! boundary crossings.

use heapless::Vec;

/// A single boundary crossing discovered during one [`Clock::advance`]
/// call, with the sample offset (relative to the start of that call) at
/// which it occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Crossing {
    StepStart { offset: u32 },
    MidStep { offset: u32 },
}

/// Upper bound on crossings reported by one `advance` call. A host tick
/// spanning more than four full steps is not a realistic real-time buffer
/// size; if it happens, the tail of the crossing list is dropped rather
/// than growing without bound, matching the "best effort" output-buffer
/// contract the rest of the crate follows.
pub const MAX_CROSSINGS_PER_TICK: usize = 8;

pub struct Clock {
    sample_rate: f32,
    tempo: f32,
    frames_per_step: u64,
    frame_counter: u64,
    playing: bool,
}

fn compute_frames_per_step(sample_rate: f32, tempo: f32) -> u64 {
    let frames = libm::round(sample_rate as f64 * 60.0 / tempo as f64);
    if frames < 1.0 {
        1
    } else {
        frames as u64
    }
}

impl Clock {
    pub fn new(sample_rate: f32, tempo: f32) -> Clock {
        Clock {
            sample_rate,
            tempo,
            frames_per_step: compute_frames_per_step(sample_rate, tempo),
            frame_counter: 0,
            playing: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn frames_per_step(&self) -> u64 {
        self.frames_per_step
    }

    /// Ignored if `sr` is non-positive.
    pub fn set_sample_rate(&mut self, sr: f32) {
        if sr <= 0.0 {
            return;
        }
        self.sample_rate = sr;
        self.frames_per_step = compute_frames_per_step(self.sample_rate, self.tempo);
    }

    /// Ignored if `bpm` is non-positive. Takes effect immediately; does not
    /// retroactively alter `current_step`.
    pub fn set_tempo(&mut self, bpm: f32) {
        if bpm <= 0.0 {
            return;
        }
        self.tempo = bpm;
        self.frames_per_step = compute_frames_per_step(self.sample_rate, self.tempo);
    }

    pub fn start(&mut self) {
        self.playing = true;
        self.frame_counter = 0;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// `current_step` is re-derived from `frame_counter` on every call, as
    /// required: it is never cached.
    pub fn current_step(&self, sequence_length: u8) -> u8 {
        let length = sequence_length.max(1) as u64;
        ((self.frame_counter / self.frames_per_step) % length) as u8
    }

    /// Advances the frame counter by `n_samples` (a no-op while stopped)
    /// and returns every step-start / mid-step boundary crossed during
    /// this tick, in non-decreasing offset order.
    ///
    /// A step-start crossing at frame `s` is attributed to the tick whose
    /// sample range `(f0, f1]` contains it; this keeps a boundary that
    /// lands exactly on a tick edge from being reported twice or dropped.
    /// The mid-step ("50% gate") crossing for a step follows the same
    /// rule.
    pub fn advance(&mut self, n_samples: u32) -> Vec<Crossing, MAX_CROSSINGS_PER_TICK> {
        let mut out = Vec::new();
        if !self.playing {
            return out;
        }
        let f0 = self.frame_counter;
        let f1 = f0 + n_samples as u64;
        let l = self.frames_per_step.max(1);
        let mut k = f0 / l;
        loop {
            let mid = k * l + l / 2;
            let start = (k + 1) * l;
            if mid > f0 && mid <= f1 {
                let _ = out.push(Crossing::MidStep {
                    offset: (mid - f0) as u32,
                });
            }
            if start <= f1 {
                let _ = out.push(Crossing::StepStart {
                    offset: (start - f0) as u32,
                });
                k += 1;
            } else {
                break;
            }
        }
        self.frame_counter = f1;
        out
    }
}
