//! Synthesizer engine: owns the output stream and the shared snapshot.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use rtrb::{Consumer, RingBuffer};
use tracing::{error, info, warn};

use super::processor::{BlockProcessor, EngineSnapshot, SharedSnapshot};
use crate::error::{AudioError, ConfigError};
use crate::modal::Mode;
use crate::params::{
    audio_constants::VISUALIZATION_QUEUE_BLOCKS, check_level, ExcitationKind, Pitch,
    RecordingConfig, ResponseMode, SynthesizerConfig,
};
use crate::reference::ReferenceSpectrum;

/// Real-time synthesizer driven by the current mode list.
///
/// `Stopped` until `start` opens the output stream; `stop` closes it again.
/// Setters validate first and then swap a new snapshot in as a whole, so the
/// audio thread always reads one consistent configuration per block.
pub struct Synthesizer {
    shared: SharedSnapshot,

    /// Per-stream DSP state; survives stop/start
    processor: Arc<Mutex<BlockProcessor>>,

    /// Blocks the processor replaced with silence, and how many were logged
    faults: Arc<AtomicU64>,
    reported_faults: AtomicU64,

    /// Consumer side of the visualization hand-off
    visualization: Mutex<Consumer<f32>>,

    /// Audio output stream (kept alive while running)
    stream: Option<cpal::Stream>,

    sample_rate_hz: u32,
    block_size: usize,
}

impl Synthesizer {
    /// Create a stopped engine.
    ///
    /// The reference is smoothed to `config.smoothing_level` up front.
    pub fn new(
        config: SynthesizerConfig,
        modes: Arc<[Mode]>,
        reference: Arc<ReferenceSpectrum>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let reference = smoothed(&reference, config.smoothing_level);
        let sample_rate_hz = config.sample_rate_hz;
        let block_size = config.block_size;

        let snapshot = Arc::new(EngineSnapshot {
            config,
            modes,
            reference,
        });
        let (producer, consumer) = RingBuffer::new(block_size * VISUALIZATION_QUEUE_BLOCKS);
        let processor = BlockProcessor::new(Arc::clone(&snapshot), Some(producer));
        let faults = processor.fault_counter();

        Ok(Self {
            shared: Arc::new(Mutex::new(snapshot)),
            processor: Arc::new(Mutex::new(processor)),
            faults,
            reported_faults: AtomicU64::new(0),
            visualization: Mutex::new(consumer),
            stream: None,
            sample_rate_hz,
            block_size,
        })
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }

    /// Current published snapshot
    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        Arc::clone(&*self.shared.lock())
    }

    pub fn config(&self) -> SynthesizerConfig {
        self.snapshot().config.clone()
    }

    pub fn modes(&self) -> Arc<[Mode]> {
        Arc::clone(&self.snapshot().modes)
    }

    /// Reference table as the engine applies it (smoothing included)
    pub fn reference(&self) -> Arc<ReferenceSpectrum> {
        Arc::clone(&self.snapshot().reference)
    }

    /// Replace the whole configuration.
    ///
    /// Sample rate and block size cannot change while the engine exists.
    pub fn set_config(&self, config: SynthesizerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if config.sample_rate_hz != self.sample_rate_hz || config.block_size != self.block_size {
            return Err(ConfigError::StreamFormatChanged);
        }
        let current = self.snapshot();
        let reference = if config.smoothing_level != current.config.smoothing_level {
            smoothed(&current.reference, config.smoothing_level)
        } else {
            Arc::clone(&current.reference)
        };
        self.publish(|snapshot| {
            snapshot.config = config;
            snapshot.reference = reference;
        });
        Ok(())
    }

    pub fn set_pitch(&self, pitch: Pitch) -> Result<(), ConfigError> {
        pitch.validate()?;
        self.publish(|snapshot| snapshot.config.pitch = pitch);
        Ok(())
    }

    pub fn set_frequency(&self, frequency_hz: f32) -> Result<(), ConfigError> {
        self.set_pitch(Pitch::Fixed(frequency_hz))
    }

    pub fn set_excitation(&self, excitation: ExcitationKind) {
        self.publish(|snapshot| snapshot.config.excitation = excitation);
    }

    pub fn set_response_mode(&self, response_mode: ResponseMode) {
        self.publish(|snapshot| snapshot.config.response_mode = response_mode);
    }

    pub fn set_noise_level(&self, noise_level: f32) -> Result<(), ConfigError> {
        check_level("noise_level", noise_level)?;
        self.publish(|snapshot| snapshot.config.noise_level = noise_level);
        Ok(())
    }

    /// Change reference smoothing; the table is recomputed off the audio thread
    pub fn set_smoothing_level(&self, smoothing_level: f32) -> Result<(), ConfigError> {
        check_level("smoothing_level", smoothing_level)?;
        let reference = smoothed(&self.reference(), smoothing_level);
        self.publish(|snapshot| {
            snapshot.config.smoothing_level = smoothing_level;
            snapshot.reference = reference;
        });
        Ok(())
    }

    pub fn set_bow(&self, bow_velocity: f32, bow_force: f32) -> Result<(), ConfigError> {
        check_level("bow_velocity", bow_velocity)?;
        check_level("bow_force", bow_force)?;
        self.publish(|snapshot| {
            snapshot.config.bow_velocity = bow_velocity;
            snapshot.config.bow_force = bow_force;
        });
        Ok(())
    }

    /// Swap in a freshly predicted mode list
    pub fn set_modes(&self, modes: Arc<[Mode]>) {
        self.publish(|snapshot| snapshot.modes = modes);
    }

    /// Copy the current snapshot, apply `update` and swap the result in.
    ///
    /// Cloning only copies the config fields and bumps `Arc` counts, so the
    /// lock is held for a constant amount of work.
    fn publish(&self, update: impl FnOnce(&mut EngineSnapshot)) {
        let mut shared = self.shared.lock();
        let mut next = EngineSnapshot::clone(&shared);
        update(&mut next);
        *shared = Arc::new(next);
    }

    /// Open the default output device and start streaming. No-op if running.
    pub fn start(&mut self) -> Result<(), AudioError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;
        let channels = device.default_output_config()?.channels();

        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(self.sample_rate_hz),
            buffer_size: cpal::BufferSize::Default,
        };

        info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate = self.sample_rate_hz,
            channels,
            block_size = self.block_size,
            "Opening audio output"
        );

        let processor = Arc::clone(&self.processor);
        let shared = Arc::clone(&self.shared);
        let stream = device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                // Offline rendering holds the processor; never wait for it here
                match processor.try_lock() {
                    Some(mut processor) => {
                        processor.fill_interleaved(data, channels as usize, &shared)
                    }
                    None => data.fill(0.0),
                }
            },
            |err| error!(%err, "Audio stream error"),
            None,
        )?;
        stream.play()?;

        self.stream = Some(stream);
        info!("Synthesizer running");
        Ok(())
    }

    /// Close the output stream. Safe to call in any state.
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            info!("Synthesizer stopped");
        }
        self.report_faults();
    }

    /// Log blocks silenced since the last report and return the total.
    ///
    /// Faults are only counted on the audio thread; the warning is emitted
    /// here, on the caller's thread.
    pub fn report_faults(&self) -> u64 {
        let total = self.faults.load(Ordering::Relaxed);
        let reported = self.reported_faults.swap(total, Ordering::Relaxed);
        if total > reported {
            warn!(
                new = total - reported,
                total,
                "Audio blocks failed and were replaced with silence"
            );
        }
        total
    }

    /// Render `frames` mono samples through the same pipeline without a device
    pub fn render_offline(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        self.processor
            .lock()
            .fill_interleaved(&mut out, 1, &self.shared);
        out
    }

    /// Render `recording.duration_secs` offline and write it as a WAV file
    pub fn record(&self, recording: &RecordingConfig) -> Result<usize, AudioError> {
        let frames = recording.total_frames(self.sample_rate_hz);
        let samples = self.render_offline(frames);
        self.report_faults();
        write_wav(&recording.output_path, self.sample_rate_hz, &samples)?;
        info!(
            path = %recording.output_path.display(),
            frames,
            "Recording written"
        );
        Ok(frames)
    }

    /// Oldest unread visualization block, `None` when nothing is queued
    pub fn next_visual_block(&self) -> Option<Vec<f32>> {
        let mut consumer = self.visualization.lock();
        if consumer.slots() < self.block_size {
            return None;
        }
        Some(
            (0..self.block_size)
                .filter_map(|_| consumer.pop().ok())
                .collect(),
        )
    }

    /// Drain the queue and return only the most recent block
    pub fn latest_block(&self) -> Option<Vec<f32>> {
        let mut latest = None;
        while let Some(block) = self.next_visual_block() {
            latest = Some(block);
        }
        latest
    }
}

fn smoothed(reference: &ReferenceSpectrum, level: f32) -> Arc<ReferenceSpectrum> {
    let mut reference = reference.clone();
    reference.set_smoothing(level);
    Arc::new(reference)
}

/// Write mono 32-bit float samples
pub fn write_wav(path: &Path, sample_rate_hz: u32, samples: &[f32]) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: sample_rate_hz,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;
    Ok(())
}
