//! Audio Decoding
//!
//! **Purpose:** Decode an in-memory audio payload to mono f32 PCM at the
//! analysis sample rate.
//!
//! **Algorithm:**
//! 1. Gate on the declared format (exactly one format is accepted)
//! 2. Sniff the container from magic bytes and use it as a format hint
//! 3. Let symphonia detect the format, pick the first audio track
//! 4. Decode packets, mixing channels down to mono; corrupt packets are
//!    skipped and decoding stops once the analysis window cap is covered
//! 5. Resample to the analysis rate
//! 6. Truncate to the cap, reject too-short or silent clips

use std::io::Cursor;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::{debug, warn};

use crate::audio::resampler::resample_mono;
use crate::config::DecoderConfig;
use crate::error::{DetectError, DetectResult};
use crate::types::AudioSample;

/// Container detected from the payload's leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Mp3,
    Wav,
    Ogg,
    Flac,
    Aiff,
    Unknown,
}

impl Container {
    /// File extension handed to symphonia as a format hint
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Container::Mp3 => Some("mp3"),
            Container::Wav => Some("wav"),
            Container::Ogg => Some("ogg"),
            Container::Flac => Some("flac"),
            Container::Aiff => Some("aiff"),
            Container::Unknown => None,
        }
    }
}

/// Identify the container from magic bytes
pub fn sniff_container(bytes: &[u8]) -> Container {
    match bytes {
        [b'I', b'D', b'3', ..] => Container::Mp3,
        [0xFF, second, ..] if second & 0xE0 == 0xE0 => Container::Mp3,
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => Container::Wav,
        [b'O', b'g', b'g', b'S', ..] => Container::Ogg,
        [b'f', b'L', b'a', b'C', ..] => Container::Flac,
        [b'F', b'O', b'R', b'M', ..] => Container::Aiff,
        _ => Container::Unknown,
    }
}

/// Decode an encoded payload into an [`AudioSample`]
///
/// # Errors
/// * `UnsupportedFormat` - declared format is not `config.supported_format`
/// * `Decode` - empty, malformed, or undecodable payload, or zero decoded samples
/// * `InsufficientAudio` - shorter than `min_duration_seconds` or near-silent
pub fn decode(bytes: &[u8], declared_format: &str, config: &DecoderConfig) -> DetectResult<AudioSample> {
    let declared = declared_format.trim();
    if !declared.eq_ignore_ascii_case(config.supported_format.trim()) {
        return Err(DetectError::UnsupportedFormat {
            declared: declared.to_string(),
            supported: config.supported_format.clone(),
        });
    }

    if bytes.is_empty() {
        return Err(DetectError::Decode("audio payload is empty".to_string()));
    }

    let container = sniff_container(bytes);
    debug!(bytes = bytes.len(), container = ?container, "Decoding audio payload");

    let pcm = decode_to_mono(bytes, container, config.max_duration_seconds)?;
    if pcm.samples.is_empty() {
        return Err(DetectError::Decode("payload decoded to zero samples".to_string()));
    }

    let resampled = resample_mono(&pcm.samples, pcm.sample_rate, config.analysis_sample_rate)?;
    if resampled.is_empty() {
        return Err(DetectError::Decode("resampling produced zero samples".to_string()));
    }

    let mut audio = AudioSample::new(resampled, config.analysis_sample_rate)?;

    let duration = audio.duration_seconds();
    if duration < config.min_duration_seconds {
        return Err(DetectError::InsufficientAudio(format!(
            "clip is {:.2}s long, at least {:.2}s is required",
            duration, config.min_duration_seconds
        )));
    }

    if pcm.truncated || duration > config.max_duration_seconds {
        warn!(
            max_duration_seconds = config.max_duration_seconds,
            "Audio exceeds analysis window, truncating"
        );
        audio = audio.truncated(config.max_duration_seconds);
    }

    let peak = audio.peak();
    if peak < config.silence_peak_floor {
        return Err(DetectError::InsufficientAudio(format!(
            "clip is effectively silent (peak amplitude {:.6})",
            peak
        )));
    }

    debug!(
        source_rate = pcm.sample_rate,
        samples = audio.len(),
        duration_seconds = audio.duration_seconds(),
        "Audio decoding complete"
    );

    Ok(audio)
}

/// Mono PCM at the payload's native sample rate
struct DecodedPcm {
    samples: Vec<f32>,
    sample_rate: u32,
    /// Decoding stopped early at the analysis window cap
    truncated: bool,
}

/// Native-rate samples to collect for `max_seconds` of analysis audio
///
/// Includes 100 ms of headroom so the resampled clip still covers the cap.
fn source_sample_limit(sample_rate: u32, max_seconds: f64) -> usize {
    (max_seconds * sample_rate as f64).ceil() as usize + sample_rate as usize / 10
}

/// Decode packets of the first audio track to mono samples
///
/// Stops once enough audio for `max_seconds` has been collected.
fn decode_to_mono(bytes: &[u8], container: Container, max_seconds: f64) -> DetectResult<DecodedPcm> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = container.extension() {
        hint.with_extension(extension);
    }

    let detected = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| DetectError::Decode(format!("unrecognized audio payload: {}", e)))?;

    let mut format = detected.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DetectError::Decode("no audio track found".to_string()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DetectError::Decode(format!("unsupported codec: {}", e)))?;

    let mut mono: Vec<f32> = Vec::new();
    let mut skipped_packets = 0usize;
    let mut truncated = false;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                if mono.is_empty() {
                    return Err(DetectError::Decode(format!("error reading packet: {}", e)));
                }
                warn!(error = %e, "Stopping at unreadable packet");
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                if sample_rate.is_none() {
                    sample_rate = Some(decoded.spec().rate);
                }
                mix_to_mono(&decoded, &mut mono);

                if let Some(limit) = sample_rate.map(|rate| source_sample_limit(rate, max_seconds)) {
                    if mono.len() >= limit {
                        mono.truncate(limit);
                        truncated = true;
                        break;
                    }
                }
            }
            Err(SymphoniaError::DecodeError(e)) => {
                skipped_packets += 1;
                debug!(error = %e, "Skipping corrupt packet");
            }
            Err(e) => return Err(DetectError::Decode(format!("decoder failure: {}", e))),
        }
    }

    if skipped_packets > 0 {
        warn!(skipped_packets = skipped_packets, "Skipped corrupt audio packets");
    }

    let sample_rate = sample_rate
        .filter(|rate| *rate > 0)
        .ok_or_else(|| DetectError::Decode("sample rate unknown".to_string()))?;

    Ok(DecodedPcm {
        samples: mono,
        sample_rate,
        truncated,
    })
}

/// Average all channels of a decoded buffer and append to `out`
fn mix_to_mono(decoded: &AudioBufferRef, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::U8(buf) => mix_planes(&**buf, out),
        AudioBufferRef::U16(buf) => mix_planes(&**buf, out),
        AudioBufferRef::U24(buf) => mix_planes(&**buf, out),
        AudioBufferRef::U32(buf) => mix_planes(&**buf, out),
        AudioBufferRef::S8(buf) => mix_planes(&**buf, out),
        AudioBufferRef::S16(buf) => mix_planes(&**buf, out),
        AudioBufferRef::S24(buf) => mix_planes(&**buf, out),
        AudioBufferRef::S32(buf) => mix_planes(&**buf, out),
        AudioBufferRef::F32(buf) => mix_planes(&**buf, out),
        AudioBufferRef::F64(buf) => mix_planes(&**buf, out),
    }
}

fn mix_planes<S: Sample>(buf: &AudioBuffer<S>, out: &mut Vec<f32>)
where
    f32: FromSample<S>,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    if channels == 0 {
        return;
    }

    out.reserve(frames);
    for frame in 0..frames {
        let sum: f32 = (0..channels)
            .map(|ch| f32::from_sample(buf.chan(ch)[frame]))
            .sum();
        out.push(sum / channels as f32);
    }
}
