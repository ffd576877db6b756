/// Sound effects, synthesised at startup and played through rodio.
///
/// Every effect is a short list of notes rendered into an in-memory WAV
/// clip once; playback appends the clip to a detached sink and returns.
///
/// Without the "sound" feature `SoundEngine` is an empty stub with the
/// same API.

use crate::sim::event::GameEvent;

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use tracing::debug;

    const SAMPLE_RATE: u32 = 22050;

    #[derive(Clone, Copy)]
    enum Wave {
        Sine,
        /// Odd harmonics only; reads as a soft square.
        Hollow,
        /// Sine with a noise burst mixed in.
        Grit,
    }

    /// One note: start/end frequency for glides, seconds, peak volume.
    #[derive(Clone, Copy)]
    struct Note {
        from_hz: f32,
        to_hz: f32,
        secs: f32,
        vol: f32,
    }

    const fn note(hz: f32, secs: f32, vol: f32) -> Note {
        Note { from_hz: hz, to_hz: hz, secs, vol }
    }

    const fn glide(from_hz: f32, to_hz: f32, secs: f32, vol: f32) -> Note {
        Note { from_hz, to_hz, secs, vol }
    }

    // E6, B6: short two-step chirp.
    const PICKUP: &[Note] = &[note(1319.0, 0.05, 0.25), note(1976.0, 0.09, 0.25)];
    // Low rumble sliding down.
    const CURSE: &[Note] = &[glide(220.0, 90.0, 0.28, 0.3)];
    // Quick upward swish.
    const SLIP: &[Note] = &[glide(500.0, 1100.0, 0.12, 0.18)];
    // G4 C5 E5 G5, held C6.
    const WIN: &[Note] = &[
        note(392.0, 0.09, 0.28),
        note(523.0, 0.09, 0.28),
        note(659.0, 0.09, 0.28),
        note(784.0, 0.09, 0.28),
        note(1047.0, 0.35, 0.3),
    ];
    // D4 C#4 C4, then a sagging B3.
    const LOSE: &[Note] = &[
        note(294.0, 0.16, 0.3),
        note(277.0, 0.16, 0.3),
        note(262.0, 0.16, 0.3),
        glide(247.0, 200.0, 0.45, 0.3),
    ];

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        pickup: Arc<[u8]>,
        curse: Arc<[u8]>,
        slip: Arc<[u8]>,
        win: Arc<[u8]>,
        lose: Arc<[u8]>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    debug!("no audio output: {e}");
                    return None;
                }
            };
            let clip = |notes: &[Note], wave: Wave| -> Arc<[u8]> {
                encode_wav(&render(notes, wave)).into()
            };
            Some(SoundEngine {
                _stream: stream,
                handle,
                pickup: clip(PICKUP, Wave::Hollow),
                curse: clip(CURSE, Wave::Grit),
                slip: clip(SLIP, Wave::Sine),
                win: clip(WIN, Wave::Hollow),
                lose: clip(LOSE, Wave::Sine),
            })
        }

        fn play(&self, clip: &Arc<[u8]>) {
            let Ok(sink) = Sink::try_new(&self.handle) else { return };
            if let Ok(src) = rodio::Decoder::new(Cursor::new(Arc::clone(clip))) {
                sink.append(src);
                sink.detach();
            }
        }

        pub fn play_pickup(&self) { self.play(&self.pickup); }
        pub fn play_curse(&self) { self.play(&self.curse); }
        pub fn play_slip(&self) { self.play(&self.slip); }
        pub fn play_win(&self) { self.play(&self.win); }
        pub fn play_lose(&self) { self.play(&self.lose); }
    }

    /// Render a note list to mono samples in [-1, 1].
    fn render(notes: &[Note], wave: Wave) -> Vec<f32> {
        let mut out = Vec::new();
        let mut noise: u32 = 0x9e37_79b9;
        for n in notes {
            let len = (SAMPLE_RATE as f32 * n.secs) as usize;
            let mut phase = 0.0_f32;
            for i in 0..len {
                let t = i as f32 / len.max(1) as f32;
                let hz = n.from_hz + (n.to_hz - n.from_hz) * t;
                phase = (phase + hz / SAMPLE_RATE as f32).fract();
                let x = phase * TAU;
                let s = match wave {
                    Wave::Sine => x.sin(),
                    Wave::Hollow => x.sin() * 0.75 + (3.0 * x).sin() * 0.2 + (5.0 * x).sin() * 0.05,
                    Wave::Grit => {
                        noise ^= noise << 13;
                        noise ^= noise >> 17;
                        noise ^= noise << 5;
                        let r = noise as f32 / u32::MAX as f32 * 2.0 - 1.0;
                        x.sin() * 0.6 + r * 0.4
                    }
                };
                // Short attack, linear release.
                let attack = (t * 40.0).min(1.0);
                out.push(s * attack * (1.0 - t) * n.vol);
            }
        }
        out
    }

    /// 16-bit mono PCM WAV.
    fn encode_wav(samples: &[f32]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut buf = Vec::with_capacity(44 + data_len as usize);
        let mut put = |bytes: &[u8]| buf.extend_from_slice(bytes);

        put(b"RIFF");
        put(&(36 + data_len).to_le_bytes());
        put(b"WAVE");
        put(b"fmt ");
        put(&16u32.to_le_bytes());
        put(&1u16.to_le_bytes()); // PCM
        put(&1u16.to_le_bytes()); // mono
        put(&SAMPLE_RATE.to_le_bytes());
        put(&(SAMPLE_RATE * 2).to_le_bytes()); // byte rate
        put(&2u16.to_le_bytes()); // block align
        put(&16u16.to_le_bytes());
        put(b"data");
        put(&data_len.to_le_bytes());
        for &s in samples {
            put(&((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16).to_le_bytes());
        }
        buf
    }

}

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_pickup(&self) {}
    pub fn play_curse(&self) {}
    pub fn play_slip(&self) {}
    pub fn play_win(&self) {}
    pub fn play_lose(&self) {}
}

impl SoundEngine {
    /// Play whatever this batch of game events calls for.
    pub fn react(&self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::TreasureCollected { .. } => self.play_pickup(),
                GameEvent::TreasureCursed { .. } => self.play_curse(),
                GameEvent::TreasureRelocated { .. } => self.play_slip(),
                GameEvent::Won => self.play_win(),
                GameEvent::Lost { .. } => self.play_lose(),
                _ => {}
            }
        }
    }
}
