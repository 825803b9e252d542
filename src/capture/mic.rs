use super::source::{AudioChunk, CaptureError, CaptureSource};
use crate::config::CaptureConstraints;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

/// Microphone capture source backed by cpal
///
/// The cpal stream is not `Send`, so it lives on a dedicated thread for
/// the lifetime of the capture. The stream callback appends samples to a
/// shared buffer; a tokio task slices that buffer into one chunk per
/// emission interval.
pub struct MicSource {
    active: Arc<AtomicBool>,
    stop_tx: Option<std::sync::mpsc::Sender<()>>,
}

/// Result of device acquisition, reported back from the stream thread
struct StreamInfo {
    sample_rate: u32,
    channels: u16,
}

impl MicSource {
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
            stop_tx: None,
        }
    }

    /// Open the default input device and run the stream until stopped
    ///
    /// Runs on the dedicated stream thread. Acquisition outcome is sent
    /// once on `ready_tx`; samples flow into `buffer` until the stop
    /// signal arrives or the stream errors out.
    fn run_stream(
        buffer: Arc<Mutex<Vec<i16>>>,
        active: Arc<AtomicBool>,
        ready_tx: oneshot::Sender<Result<StreamInfo, CaptureError>>,
        stop_rx: std::sync::mpsc::Receiver<()>,
    ) {
        let host = cpal::default_host();
        let device = match host.default_input_device() {
            Some(d) => d,
            None => {
                let _ = ready_tx.send(Err(CaptureError::Access(
                    "no input device available".into(),
                )));
                return;
            }
        };

        let config = match device.default_input_config() {
            Ok(c) => c,
            Err(e) => {
                let _ = ready_tx.send(Err(CaptureError::Access(e.to_string())));
                return;
            }
        };

        info!(
            device_name = %device.name().unwrap_or_else(|_| "unknown".into()),
            ?config,
            "capturing from device"
        );

        let info = StreamInfo {
            sample_rate: config.sample_rate().0,
            channels: config.channels(),
        };

        let err_active = Arc::clone(&active);
        let err_fn = move |err| {
            error!("capture stream error: {}", err);
            // Device loss mid-session; the slicer task notices and the
            // session tears the source down.
            err_active.store(false, Ordering::SeqCst);
        };

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                let buf = Arc::clone(&buffer);
                device.build_input_stream(
                    &config.into(),
                    move |data: &[f32], _: &_| {
                        let mut guard = buf.lock().unwrap_or_else(|e| e.into_inner());
                        guard.extend(data.iter().map(|&s| {
                            (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
                        }));
                    },
                    err_fn,
                    None,
                )
            }
            cpal::SampleFormat::I16 => {
                let buf = Arc::clone(&buffer);
                device.build_input_stream(
                    &config.into(),
                    move |data: &[i16], _: &_| {
                        let mut guard = buf.lock().unwrap_or_else(|e| e.into_inner());
                        guard.extend_from_slice(data);
                    },
                    err_fn,
                    None,
                )
            }
            other => {
                let _ = ready_tx.send(Err(CaptureError::Access(format!(
                    "sample format not supported: {:?}",
                    other
                ))));
                return;
            }
        };

        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                let _ = ready_tx.send(Err(CaptureError::Access(e.to_string())));
                return;
            }
        };

        if let Err(e) = stream.play() {
            let _ = ready_tx.send(Err(CaptureError::Stream(e.to_string())));
            return;
        }

        if ready_tx.send(Ok(info)).is_err() {
            return;
        }

        // Park until halt; the stream stays alive as long as this thread
        // holds it.
        let _ = stop_rx.recv();
        drop(stream);
        info!("capture stream released");
    }

    /// Resample mono PCM to the target rate
    ///
    /// Even ratios decimate; anything else (44100 → 16000 being the
    /// common case) falls back to linear interpolation so the output is
    /// genuinely at the rate the chunk is labeled with.
    fn resample(samples: Vec<i16>, source_rate: u32, target_rate: u32) -> Vec<i16> {
        if source_rate == target_rate || samples.is_empty() {
            return samples;
        }

        if source_rate % target_rate == 0 {
            let ratio = source_rate / target_rate;
            return samples.into_iter().step_by(ratio as usize).collect();
        }

        let step = source_rate as f64 / target_rate as f64;
        let out_len = (samples.len() as u64 * target_rate as u64 / source_rate as u64) as usize;
        let mut out = Vec::with_capacity(out_len);
        for i in 0..out_len {
            let pos = i as f64 * step;
            let idx = pos as usize;
            let frac = pos - idx as f64;
            let a = samples[idx] as f64;
            let b = samples[(idx + 1).min(samples.len() - 1)] as f64;
            out.push((a + (b - a) * frac).round() as i16);
        }
        out
    }

    /// Take buffered samples for one chunk
    ///
    /// With a stereo device a trailing unpaired sample is left in the
    /// buffer so its frame is completed by the next callback instead of
    /// being dropped.
    fn drain_frames(buffer: &mut Vec<i16>, channels: u16) -> Vec<i16> {
        if channels == 2 && buffer.len() % 2 == 1 {
            let keep = buffer.len() - 1;
            return buffer.drain(..keep).collect();
        }
        std::mem::take(buffer)
    }

    /// Sum stereo pairs into mono, clamped
    fn stereo_to_mono(samples: Vec<i16>) -> Vec<i16> {
        samples
            .chunks_exact(2)
            .map(|pair| {
                let sum = pair[0] as i32 + pair[1] as i32;
                sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16
            })
            .collect()
    }
}

impl Default for MicSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CaptureSource for MicSource {
    async fn begin(
        &mut self,
        constraints: &CaptureConstraints,
        interval: Duration,
    ) -> Result<mpsc::Receiver<AudioChunk>, CaptureError> {
        if self.active.load(Ordering::SeqCst) {
            return Err(CaptureError::AlreadyActive);
        }

        let buffer: Arc<Mutex<Vec<i16>>> = Arc::new(Mutex::new(Vec::new()));
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std::sync::mpsc::channel();

        {
            let buffer = Arc::clone(&buffer);
            let active = Arc::clone(&self.active);
            std::thread::spawn(move || {
                Self::run_stream(buffer, active, ready_tx, stop_rx);
            });
        }

        let info = ready_rx
            .await
            .map_err(|_| CaptureError::Access("capture thread exited".into()))??;

        self.active.store(true, Ordering::SeqCst);
        self.stop_tx = Some(stop_tx);

        let (chunk_tx, chunk_rx) = mpsc::channel(16);
        let active = Arc::clone(&self.active);
        let target_rate = constraints.sample_rate;
        let target_channels = constraints.channels;
        let interval_ms = interval.as_millis() as u64;

        // Slicer: one chunk per interval, independent of downstream
        // encode/transmit latency.
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await; // first tick fires immediately
            let mut elapsed_ms = 0u64;

            loop {
                ticker.tick().await;
                // Checked after the tick so nothing is emitted once halt
                // has flipped the flag.
                if !active.load(Ordering::SeqCst) {
                    break;
                }
                elapsed_ms += interval_ms;

                let raw = {
                    let mut guard = buffer.lock().unwrap_or_else(|e| e.into_inner());
                    Self::drain_frames(&mut *guard, info.channels)
                };
                if raw.is_empty() {
                    continue;
                }

                let mut samples = raw;
                let mut channels = info.channels;
                if channels == 2 && target_channels == 1 {
                    samples = Self::stereo_to_mono(samples);
                    channels = 1;
                }
                samples = Self::resample(samples, info.sample_rate, target_rate);

                let chunk = AudioChunk {
                    samples,
                    sample_rate: target_rate,
                    channels,
                    timestamp_ms: elapsed_ms,
                };

                if chunk_tx.send(chunk).await.is_err() {
                    // Receiver gone; nothing left to emit to.
                    break;
                }
            }
            // Closing chunk_tx here is what signals capture loss when the
            // stream errored out rather than being halted.
        });

        info!(interval_ms, "microphone capture started");
        Ok(chunk_rx)
    }

    async fn halt(&mut self) {
        if !self.active.swap(false, Ordering::SeqCst) && self.stop_tx.is_none() {
            return;
        }
        if let Some(stop) = self.stop_tx.take() {
            if stop.send(()).is_err() {
                warn!("capture thread already gone at halt");
            }
        }
        info!("microphone capture halted");
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "microphone"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_44100_to_16000_yields_true_target_rate() {
        // One second of input must come out as one second at 16kHz, not
        // the 22050 samples plain decimation would produce.
        let samples = vec![1000i16; 44100];
        let out = MicSource::resample(samples, 44100, 16000);
        assert_eq!(out.len(), 16000);
        // A constant signal survives interpolation unchanged.
        assert!(out.iter().all(|&s| s == 1000));
    }

    #[test]
    fn resample_even_ratio_decimates() {
        let samples: Vec<i16> = (0..32000).map(|i| (i % 100) as i16).collect();
        let out = MicSource::resample(samples, 32000, 16000);
        assert_eq!(out.len(), 16000);
        assert_eq!(out[0], 0);
        assert_eq!(out[1], 2); // every second sample
    }

    #[test]
    fn resample_same_rate_is_identity() {
        let samples = vec![1i16, 2, 3, 4];
        let out = MicSource::resample(samples.clone(), 16000, 16000);
        assert_eq!(out, samples);
    }

    #[test]
    fn resample_interpolates_between_neighbors() {
        // 4 -> 3 samples: positions 0.0, 4/3, 8/3 over [0, 300, 600, 900]
        let out = MicSource::resample(vec![0, 300, 600, 900], 48000, 36000);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], 0);
        assert_eq!(out[1], 400);
        assert_eq!(out[2], 800);
    }

    #[test]
    fn drain_frames_carries_odd_stereo_tail() {
        let mut buffer = vec![1i16, 2, 3, 4, 5];
        let taken = MicSource::drain_frames(&mut buffer, 2);
        assert_eq!(taken, vec![1, 2, 3, 4]);
        assert_eq!(buffer, vec![5], "unpaired sample waits for its frame");

        // Completed by the next callback, drained in full next tick.
        buffer.push(6);
        let taken = MicSource::drain_frames(&mut buffer, 2);
        assert_eq!(taken, vec![5, 6]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn drain_frames_takes_everything_for_mono() {
        let mut buffer = vec![1i16, 2, 3];
        let taken = MicSource::drain_frames(&mut buffer, 1);
        assert_eq!(taken, vec![1, 2, 3]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn stereo_pairs_sum_into_mono() {
        let out = MicSource::stereo_to_mono(vec![100, 200, -50, 50, i16::MAX, i16::MAX]);
        assert_eq!(out, vec![300, 0, i16::MAX]); // clamped, not wrapped
    }
}
