//! Audio Test Fixture Generator
//!
//! Synthesizes the clips the scenario tests run on: a perfectly regular
//! harmonic tone, a speech-like clip with natural irregularity, and silence.
//! Clips are encoded as 16-bit WAV in memory with hound.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::io::Cursor;

pub const TEST_SAMPLE_RATE: u32 = 16000;

/// Harmonics 1..=5 of `f0` with 1/k amplitudes, peak 0.8
///
/// Perfectly steady pitch and amplitude.
pub fn harmonic_tone(f0: f64, seconds: f64, sample_rate: u32) -> Vec<f32> {
    let n = (seconds * sample_rate as f64) as usize;
    let raw: Vec<f64> = (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (1..=5)
                .map(|k| (2.0 * PI * k as f64 * f0 * t).sin() / k as f64)
                .sum()
        })
        .collect();
    normalize(&raw, 0.8)
}

/// Digital silence with a faint noise floor
pub fn silence(seconds: f64, sample_rate: u32, level: f32) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(7);
    let n = (seconds * sample_rate as f64) as usize;
    (0..n).map(|_| level * rng.gen_range(-1.0f32..1.0)).collect()
}

/// One scripted syllable
struct Syllable {
    seconds: f64,
    f0_start: f64,
    f0_end: f64,
    amplitude: f64,
    /// (F1, F2) formant centres in Hz
    formants: (f64, f64),
}

/// Events in a phrase plan
enum Segment {
    Voiced(Syllable),
    /// Unvoiced fricative burst (seconds, amplitude)
    Fricative(f64, f64),
    /// Breath pause (seconds)
    Pause(f64),
}

/// Speech-like clip with jitter, intonation, breathiness and irregular pauses
///
/// Deterministic for a given `seed`. Roughly five seconds at 16 kHz.
pub fn speech_like(seed: u64) -> Vec<f32> {
    use Segment::*;

    let syl = |seconds, f0_start, f0_end, amplitude, formants| {
        Voiced(Syllable {
            seconds,
            f0_start,
            f0_end,
            amplitude,
            formants,
        })
    };

    let plan = [
        syl(0.22, 120.0, 135.0, 0.8, (700.0, 1200.0)),
        syl(0.30, 138.0, 118.0, 1.0, (500.0, 1800.0)),
        Fricative(0.09, 0.25),
        syl(0.18, 112.0, 104.0, 0.6, (650.0, 1100.0)),
        Pause(0.30),
        syl(0.26, 150.0, 170.0, 0.9, (550.0, 1900.0)),
        syl(0.20, 165.0, 140.0, 0.7, (720.0, 1250.0)),
        syl(0.24, 145.0, 128.0, 0.8, (600.0, 1400.0)),
        Pause(0.12),
        Fricative(0.12, 0.2),
        syl(0.34, 128.0, 100.0, 1.0, (600.0, 1500.0)),
        Pause(0.42),
        syl(0.24, 140.0, 155.0, 0.85, (680.0, 1150.0)),
        Fricative(0.07, 0.3),
        syl(0.28, 150.0, 125.0, 0.95, (520.0, 1750.0)),
        Pause(0.18),
        syl(0.30, 118.0, 132.0, 0.75, (640.0, 1300.0)),
        syl(0.22, 130.0, 108.0, 0.65, (560.0, 1650.0)),
        syl(0.16, 98.0, 95.0, 0.5, (480.0, 2000.0)),
    ];

    let sr = TEST_SAMPLE_RATE as f64;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out: Vec<f64> = Vec::new();

    let breath = |rng: &mut StdRng, n: usize| -> Vec<f64> {
        (0..n).map(|_| 0.003 * rng.gen_range(-1.0..1.0)).collect()
    };

    // Leading silence
    let lead = breath(&mut rng, (0.15 * sr) as usize);
    out.extend(lead);

    let mut phase = 0.0f64;
    let mut jitter = 0.0f64;
    for segment in &plan {
        match segment {
            Voiced(s) => {
                let n = (s.seconds * sr) as usize;
                for i in 0..n {
                    let progress = i as f64 / n as f64;
                    // Smoothed random walk around the intonation contour
                    jitter = 0.995 * jitter + 0.002 * rng.gen_range(-1.0..1.0);
                    let f0 = (s.f0_start + (s.f0_end - s.f0_start) * progress) * (1.0 + jitter);
                    phase += 2.0 * PI * f0 / sr;

                    let mut voiced = 0.0;
                    let mut k = 1;
                    while k as f64 * f0 < 3800.0 {
                        let fk = k as f64 * f0;
                        let gain = formant_gain(fk, s.formants.0, 120.0)
                            + formant_gain(fk, s.formants.1, 180.0)
                            + 0.4 * formant_gain(fk, 2500.0, 250.0)
                            + 0.05;
                        voiced += gain * (k as f64 * phase).sin() / (k as f64).sqrt();
                        k += 1;
                    }

                    let aspiration = 0.08 * rng.gen_range(-1.0..1.0);
                    let envelope = (PI * progress).sin();
                    out.push(s.amplitude * envelope * (0.25 * voiced + aspiration));
                }
            }
            Fricative(seconds, amplitude) => {
                let n = (seconds * sr) as usize;
                let mut previous = 0.0;
                for i in 0..n {
                    let white: f64 = rng.gen_range(-1.0..1.0);
                    // First difference tilts the noise towards high frequencies
                    let hiss = white - previous;
                    previous = white;
                    let envelope = (PI * i as f64 / n as f64).sin();
                    out.push(amplitude * envelope * hiss);
                }
            }
            Pause(seconds) => {
                let n = (seconds * sr) as usize;
                out.extend(breath(&mut rng, n));
            }
        }
    }

    // Trailing silence
    out.extend(breath(&mut rng, (0.2 * sr) as usize));

    normalize(&out, 0.8)
}

/// Resonance gain of a formant at `freq`
fn formant_gain(freq: f64, centre: f64, bandwidth: f64) -> f64 {
    let x = (freq - centre) / bandwidth;
    1.0 / (1.0 + x * x)
}

fn normalize(samples: &[f64], peak: f64) -> Vec<f32> {
    let max = samples.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    if max == 0.0 {
        return samples.iter().map(|&v| v as f32).collect();
    }
    samples.iter().map(|v| (v / max * peak) as f32).collect()
}

/// Encode mono samples as a 16-bit PCM WAV file in memory
pub fn wav_bytes(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            let value = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}
