//! Microphone capture and WAV encoding.
//!
//! Audio is captured from the configured input device at its native sample
//! rate and mixed down to mono. Each callback delivers one chunk; chunks are
//! accumulated in order and concatenated into a single WAV file when the
//! recording ends.

use super::alsa::suppress_stderr;
use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::WavWriter;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Records audio from a specified or default input device.
///
/// Features:
/// - Captures from a specified input device or system default at its native sample rate
/// - Converts multi-channel audio to mono by averaging channels
/// - Accumulates ordered mono chunks, concatenated at stop time
pub struct AudioRecorder {
    /// Actual recording sample rate from device
    sample_rate: u32,
    /// Ordered mono chunks, one per audio callback
    chunks: Arc<Mutex<Vec<Vec<i16>>>>,
    /// Active audio input stream (kept alive during recording)
    stream: Option<cpal::Stream>,
    /// Device name or "default" to use the system default device
    device_name: String,
}

impl AudioRecorder {
    /// Creates a new audio recorder with requested sample rate and device.
    ///
    /// Note: The actual recording sample rate may differ based on device
    /// capabilities. Call `sample_rate()` after `start()` to get the real rate.
    pub fn new(requested_sample_rate: u32, device_name: String) -> Self {
        Self {
            sample_rate: requested_sample_rate,
            chunks: Arc::new(Mutex::new(Vec::new())),
            stream: None,
            device_name,
        }
    }

    /// Starts capturing from the configured input device.
    ///
    /// # Errors
    /// - If no input device is available or the named device is not found
    /// - If device configuration fails
    /// - If audio stream creation fails
    pub fn start(&mut self) -> Result<()> {
        // Get device while suppressing ALSA library warnings
        let device = suppress_stderr(|| {
            let host = cpal::default_host();

            if self.device_name == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device_by_name(&host, &self.device_name)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", device_name);

        let device_config = device.default_input_config()?;
        let device_sample_rate = device_config.sample_rate().0;
        let num_channels = device_config.channels() as usize;

        if device_sample_rate != self.sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Recording at device rate.",
                self.sample_rate,
                device_sample_rate
            );
        }

        tracing::debug!(
            "Device configuration: {}Hz, {} channels",
            device_sample_rate,
            num_channels
        );

        self.sample_rate = device_sample_rate;

        let chunks_arc = Arc::clone(&self.chunks);

        let stream = device.build_input_stream(
            &device_config.into(),
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let chunk = mix_to_mono(data, num_channels);
                chunks_arc.lock().unwrap().push(chunk);
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )?;

        stream.play()?;
        self.stream = Some(stream);

        tracing::debug!("Audio stream started");
        Ok(())
    }

    /// Halts capture. Chunks recorded so far remain available.
    ///
    /// Safe to call more than once; the stream is only dropped the first time.
    pub fn halt(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Audio stream stopped");
        }
    }

    /// Concatenates all recorded chunks into a single sample buffer.
    pub fn concat_samples(&self) -> Vec<i16> {
        let chunks = self.chunks.lock().unwrap();
        let total: usize = chunks.iter().map(|c| c.len()).sum();
        let mut samples = Vec::with_capacity(total);
        for chunk in chunks.iter() {
            samples.extend_from_slice(chunk);
        }
        samples
    }

    /// Returns the number of recorded samples across all chunks.
    pub fn sample_count(&self) -> usize {
        self.chunks.lock().unwrap().iter().map(|c| c.len()).sum()
    }

    /// Returns the actual sample rate of the recording.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Writes the concatenated samples to a mono 16-bit PCM WAV file.
    ///
    /// # Errors
    /// - If no samples were recorded
    /// - If the WAV file cannot be created or written
    pub fn save_wav(&self, path: &Path) -> Result<()> {
        let samples = self.concat_samples();
        if samples.is_empty() {
            return Err(anyhow!("No audio was captured"));
        }

        let duration_secs = samples.len() as f32 / self.sample_rate as f32;
        tracing::info!(
            "Saving recording: {:.2}s ({} samples at {}Hz)",
            duration_secs,
            samples.len(),
            self.sample_rate
        );

        write_wav(&samples, self.sample_rate, path)?;

        let file_size = std::fs::metadata(path)?.len();
        tracing::info!("Audio saved: {} ({} bytes)", path.display(), file_size);
        Ok(())
    }
}

/// Mixes an interleaved sample frame down to mono by averaging channels.
fn mix_to_mono(data: &[i16], num_channels: usize) -> Vec<i16> {
    match num_channels {
        0 | 1 => data.to_vec(),
        2 => data
            .chunks_exact(2)
            .map(|pair| {
                let left = pair[0] as i32;
                let right = pair[1] as i32;
                ((left + right) / 2) as i16
            })
            .collect(),
        n => data
            .chunks_exact(n)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / n as i32) as i16
            })
            .collect(),
    }
}

/// Writes mono 16-bit PCM samples to a WAV file.
fn write_wav(samples: &[i16], sample_rate: u32, path: &Path) -> Result<()> {
    let wav_spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, wav_spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    tracing::debug!("WAV written: {}", path.display());
    Ok(())
}

/// Finds an audio input device by name or numeric index.
///
/// # Arguments
/// * `host` - The cpal audio host
/// * `device_spec` - Either a device name or a numeric index (0, 1, 2, etc.)
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    // Try to parse as a numeric index first
    if let Ok(index) = device_spec.parse::<usize>() {
        let devices: Vec<_> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
            .collect();

        if index < devices.len() {
            return Ok(devices.into_iter().nth(index).unwrap());
        } else {
            return Err(anyhow!(
                "Device index {} is out of range (0-{})",
                index,
                devices.len().saturating_sub(1)
            ));
        }
    }

    let devices = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    for device in devices {
        if let Ok(name) = device.name() {
            if name == device_spec {
                return Ok(device);
            }
        }
    }

    Err(anyhow!(
        "Audio input device '{device_spec}' not found. Use 'singmatch list-devices' to see available devices."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_data_passes_through() {
        let data = [1i16, -2, 3];
        assert_eq!(mix_to_mono(&data, 1), vec![1, -2, 3]);
    }

    #[test]
    fn stereo_averages_pairs() {
        let data = [100i16, 200, -100, -300];
        assert_eq!(mix_to_mono(&data, 2), vec![150, -200]);
    }

    #[test]
    fn multichannel_averages_frames() {
        let data = [3i16, 6, 9, 30, 60, 90];
        assert_eq!(mix_to_mono(&data, 3), vec![6, 60]);
    }

    #[test]
    fn wav_round_trip_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        let samples = vec![0i16, 1000, -1000, 32767, -32768];

        write_wav(&samples, 16000, &path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);
    }
}
