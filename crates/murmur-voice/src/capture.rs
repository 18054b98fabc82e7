//! Audio capture.
//!
//! An [`AudioSource`] delivers mono 16-bit PCM chunks over a tokio channel.
//! The cpal microphone implementation (feature `cpal`) owns its input
//! stream on a dedicated thread, since cpal streams are not `Send` on every
//! platform; dropping or stopping the source tears that thread down.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::VoiceError;

/// Chunks queued between the audio callback and the recognizer.
pub const CHUNK_QUEUE: usize = 64;

/// A started capture: the real sample rate plus the chunk stream.
#[derive(Debug)]
pub struct AudioStream {
    /// Sample rate the device actually runs at.
    pub sample_rate: u32,
    /// Mono PCM chunks in capture order. Closes when capture stops.
    pub chunks: mpsc::Receiver<Vec<i16>>,
}

/// A source of mono 16-bit PCM audio.
pub trait AudioSource: Send {
    /// Start capturing.
    fn start(&mut self) -> Result<AudioStream, VoiceError>;

    /// Stop capturing. The chunk stream closes once buffered chunks drain.
    fn stop(&mut self);
}

/// Hand-off from the audio callback to the chunk queue.
///
/// The callback must not block, so a chunk offered to a full queue is
/// dropped and counted in the shared counter.
#[derive(Debug, Clone)]
pub struct ChunkSender {
    tx: mpsc::Sender<Vec<i16>>,
    dropped: Arc<AtomicUsize>,
}

impl ChunkSender {
    pub fn new(tx: mpsc::Sender<Vec<i16>>, dropped: Arc<AtomicUsize>) -> Self {
        Self { tx, dropped }
    }

    /// Queue `chunk` if there is room. A closed queue is not a drop.
    pub fn offer(&self, chunk: Vec<i16>) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(chunk) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Keep the first channel of each interleaved frame.
pub fn downmix<T: Copy>(data: &[T], channels: usize) -> Vec<T> {
    let channels = channels.max(1);
    data.chunks(channels).map(|frame| frame[0]).collect()
}

/// Convert a float sample in `[-1.0, 1.0]` to `i16`, clamping.
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32768.0).clamp(-32768.0, 32767.0) as i16
}

/// Convert an unsigned sample centred on 32768 to `i16`.
pub fn u16_to_i16(sample: u16) -> i16 {
    (sample as i32 - 32768) as i16
}

#[cfg(feature = "cpal")]
pub use self::microphone::MicrophoneCapture;

#[cfg(feature = "cpal")]
mod microphone {
    use std::sync::mpsc as std_mpsc;
    use std::thread::JoinHandle;

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{SampleFormat, SampleRate, SupportedStreamConfig};
    use tokio::sync::mpsc;
    use tracing::{debug, error, info, warn};

    use murmur_types::config::AudioConfig;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{
        AudioSource, AudioStream, CHUNK_QUEUE, ChunkSender, downmix, f32_to_i16, u16_to_i16,
    };
    use crate::error::VoiceError;

    /// Microphone capture through the default cpal host.
    pub struct MicrophoneCapture {
        config: AudioConfig,
        stop_tx: Option<std_mpsc::Sender<()>>,
        thread: Option<JoinHandle<()>>,
    }

    impl MicrophoneCapture {
        pub fn new(config: AudioConfig) -> Self {
            Self {
                config,
                stop_tx: None,
                thread: None,
            }
        }

        pub fn is_active(&self) -> bool {
            self.stop_tx.is_some()
        }
    }

    impl AudioSource for MicrophoneCapture {
        fn start(&mut self) -> Result<AudioStream, VoiceError> {
            if self.is_active() {
                return Err(VoiceError::Audio("capture already started".into()));
            }

            let (chunk_tx, chunks) = mpsc::channel(CHUNK_QUEUE);
            let (ready_tx, ready_rx) = std_mpsc::channel::<Result<u32, VoiceError>>();
            let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
            let config = self.config.clone();

            let thread = std::thread::Builder::new()
                .name("murmur-capture".into())
                .spawn(move || {
                    let dropped = Arc::new(AtomicUsize::new(0));
                    let sender = ChunkSender::new(chunk_tx, dropped.clone());
                    let stream = match open_stream(&config, sender) {
                        Ok((stream, rate)) => {
                            let _ = ready_tx.send(Ok(rate));
                            stream
                        }
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };
                    // Blocks until stop() or the sender is dropped.
                    let _ = stop_rx.recv();
                    drop(stream);
                    let dropped = dropped.load(Ordering::Relaxed);
                    if dropped > 0 {
                        warn!(dropped, "audio chunks dropped while the recognizer was behind");
                    }
                    debug!("capture thread exiting");
                })?;

            let sample_rate = ready_rx
                .recv()
                .map_err(|_| VoiceError::Audio("capture thread exited during setup".into()))??;

            self.stop_tx = Some(stop_tx);
            self.thread = Some(thread);
            Ok(AudioStream {
                sample_rate,
                chunks,
            })
        }

        fn stop(&mut self) {
            if let Some(tx) = self.stop_tx.take() {
                let _ = tx.send(());
            }
            if let Some(thread) = self.thread.take() {
                if thread.join().is_err() {
                    warn!("capture thread panicked");
                }
                info!("audio capture stopped");
            }
        }
    }

    impl Drop for MicrophoneCapture {
        fn drop(&mut self) {
            self.stop();
        }
    }

    fn select_device(host: &cpal::Host, wanted: Option<&str>) -> Result<cpal::Device, VoiceError> {
        let Some(wanted) = wanted else {
            return host.default_input_device().ok_or(VoiceError::NoInputDevice);
        };
        let needle = wanted.to_lowercase();
        let devices = host
            .input_devices()
            .map_err(|e| VoiceError::Audio(e.to_string()))?;
        for device in devices {
            if device
                .name()
                .map(|n| n.to_lowercase().contains(&needle))
                .unwrap_or(false)
            {
                return Ok(device);
            }
        }
        Err(VoiceError::DeviceNotFound {
            name: wanted.to_string(),
        })
    }

    /// Prefer the configured rate when the device supports it at the
    /// default sample format, else fall back to the device default.
    fn choose_config(
        device: &cpal::Device,
        wanted_rate: u32,
    ) -> Result<SupportedStreamConfig, VoiceError> {
        let default = device
            .default_input_config()
            .map_err(|e| VoiceError::Audio(e.to_string()))?;
        if default.sample_rate().0 == wanted_rate {
            return Ok(default);
        }
        let format = default.sample_format();
        let matching = device
            .supported_input_configs()
            .map_err(|e| VoiceError::Audio(e.to_string()))?
            .find(|range| {
                range.sample_format() == format
                    && range.min_sample_rate().0 <= wanted_rate
                    && wanted_rate <= range.max_sample_rate().0
            });
        match matching {
            Some(range) => Ok(range.with_sample_rate(SampleRate(wanted_rate))),
            None => {
                warn!(
                    wanted = wanted_rate,
                    using = default.sample_rate().0,
                    "device does not support the configured sample rate"
                );
                Ok(default)
            }
        }
    }

    fn open_stream(
        config: &AudioConfig,
        tx: ChunkSender,
    ) -> Result<(cpal::Stream, u32), VoiceError> {
        let host = cpal::default_host();
        let device = select_device(&host, config.input_device.as_deref())?;
        if let Ok(name) = device.name() {
            info!(device = %name, "using input device");
        }

        let supported = choose_config(&device, config.sample_rate)?;
        let rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let format = supported.sample_format();
        let stream_config: cpal::StreamConfig = supported.into();

        let err_fn = |err| error!(error = %err, "audio input stream error");
        let build_err = |e: cpal::BuildStreamError| VoiceError::Audio(e.to_string());

        let stream = match format {
            SampleFormat::I16 => device
                .build_input_stream(
                    &stream_config,
                    move |data: &[i16], _| tx.offer(downmix(data, channels)),
                    err_fn,
                    None,
                )
                .map_err(build_err)?,
            SampleFormat::U16 => device
                .build_input_stream(
                    &stream_config,
                    move |data: &[u16], _| {
                        let mono = downmix(data, channels).into_iter().map(u16_to_i16).collect();
                        tx.offer(mono);
                    },
                    err_fn,
                    None,
                )
                .map_err(build_err)?,
            SampleFormat::F32 => device
                .build_input_stream(
                    &stream_config,
                    move |data: &[f32], _| {
                        let mono = downmix(data, channels).into_iter().map(f32_to_i16).collect();
                        tx.offer(mono);
                    },
                    err_fn,
                    None,
                )
                .map_err(build_err)?,
            other => {
                return Err(VoiceError::Audio(format!(
                    "unsupported sample format: {other:?}"
                )));
            }
        };

        stream
            .play()
            .map_err(|e| VoiceError::Audio(e.to_string()))?;
        info!(sample_rate = rate, channels, "audio capture started");
        Ok((stream, rate))
    }
}
