//! Per-block synthesis pipeline shared by the output stream and offline
//! rendering.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rtrb::Producer;

use super::filter::{normalize_and_limit, HighPass, SpectralFilter, HIGH_PASS_CORNER_HZ};
use crate::excitation::ExcitationBank;
use crate::modal::Mode;
use crate::params::{ResponseMode, SynthesizerConfig};
use crate::reference::ReferenceSpectrum;
use crate::response::ResponseShape;

/// Everything the audio thread reads for one block, replaced as a whole
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub config: SynthesizerConfig,
    pub modes: Arc<[Mode]>,
    pub reference: Arc<ReferenceSpectrum>,
}

impl EngineSnapshot {
    pub fn response_shape(&self) -> ResponseShape<'_> {
        ResponseShape {
            mode: self.config.response_mode,
            modes: &self.modes,
            reference: &self.reference,
            noise_level: self.config.noise_level as f64,
        }
    }
}

/// Shared handle the control side swaps snapshots into
pub type SharedSnapshot = Arc<Mutex<Arc<EngineSnapshot>>>;

/// A rendered block that cannot be played
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockFault {
    NonFinite,
}

/// Owns all per-stream DSP state: excitation sources, FFT plans, the
/// high-pass history and the running sample clock.
pub struct BlockProcessor {
    sample_rate_hz: u32,
    snapshot: Arc<EngineSnapshot>,
    sources: ExcitationBank,
    filter: SpectralFilter,
    high_pass: HighPass,
    excitation: Vec<f32>,
    block: Vec<f32>,
    /// Read position inside `block` for the stream callback
    cursor: usize,
    samples_elapsed: u64,
    /// Snapshot the filter response was last built from
    response_source: Option<Arc<EngineSnapshot>>,
    rng: StdRng,
    visualization: Option<Producer<f32>>,
    /// Blocks replaced with silence; logged from the control side
    faults: Arc<AtomicU64>,
}

impl BlockProcessor {
    pub fn new(snapshot: Arc<EngineSnapshot>, visualization: Option<Producer<f32>>) -> Self {
        let sample_rate_hz = snapshot.config.sample_rate_hz;
        let block_size = snapshot.config.block_size;
        Self {
            sample_rate_hz,
            snapshot,
            sources: ExcitationBank::with_block_size(block_size),
            filter: SpectralFilter::new(block_size),
            high_pass: HighPass::new(HIGH_PASS_CORNER_HZ, sample_rate_hz as f32),
            excitation: vec![0.0; block_size],
            block: vec![0.0; block_size],
            cursor: block_size,
            samples_elapsed: 0,
            response_source: None,
            rng: StdRng::from_entropy(),
            visualization,
            faults: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block.len()
    }

    pub fn samples_elapsed(&self) -> u64 {
        self.samples_elapsed
    }

    pub fn fault_count(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }

    /// Counter the control side reads without touching the processor lock
    pub fn fault_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.faults)
    }

    /// Produce the next block and return it.
    ///
    /// The snapshot is refreshed with `try_lock`; when the control side holds
    /// the lock the previous snapshot is reused for this block.
    pub fn process_block(&mut self, shared: &Mutex<Arc<EngineSnapshot>>) -> &[f32] {
        if let Some(latest) = shared.try_lock() {
            if !Arc::ptr_eq(&*latest, &self.snapshot) {
                self.snapshot = Arc::clone(&*latest);
            }
        }

        // A panic and a non-finite block are handled alike
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.render_block()));
        if !matches!(outcome, Ok(Ok(()))) {
            self.recover();
        }

        self.samples_elapsed += self.block.len() as u64;
        self.publish();
        &self.block
    }

    /// Fill an interleaved device buffer, producing blocks as needed.
    ///
    /// Every channel of a frame receives the same sample.
    pub fn fill_interleaved(
        &mut self,
        data: &mut [f32],
        channels: usize,
        shared: &Mutex<Arc<EngineSnapshot>>,
    ) {
        let channels = channels.max(1);
        for frame in data.chunks_mut(channels) {
            if self.cursor >= self.block.len() {
                self.process_block(shared);
                self.cursor = 0;
            }
            frame.fill(self.block[self.cursor]);
            self.cursor += 1;
        }
    }

    fn render_block(&mut self) -> Result<(), BlockFault> {
        let snapshot = Arc::clone(&self.snapshot);
        let config = &snapshot.config;
        let sample_rate = self.sample_rate_hz as f64;

        let elapsed_s = self.samples_elapsed as f64 / sample_rate;
        let frequency = config.pitch.resolve(elapsed_s);

        self.sources.generate(
            config.excitation,
            &mut self.excitation,
            frequency,
            sample_rate as f32,
            config.bow_velocity,
            config.bow_force,
        );

        // Noisy responses are redrawn every block; the rest only on change
        let stale = match &self.response_source {
            Some(source) => !Arc::ptr_eq(source, &snapshot),
            None => true,
        };
        if stale || config.response_mode == ResponseMode::Noisy {
            self.filter
                .set_response(&snapshot.response_shape(), sample_rate, &mut self.rng);
            self.response_source = Some(Arc::clone(&snapshot));
        }

        self.filter.process(&self.excitation, &mut self.block);
        self.high_pass.process(&mut self.block);
        normalize_and_limit(&mut self.block);

        if self.block.iter().all(|s| s.is_finite()) {
            Ok(())
        } else {
            Err(BlockFault::NonFinite)
        }
    }

    /// Silence this block and clear state a fault may have poisoned
    fn recover(&mut self) {
        self.block.fill(0.0);
        self.high_pass.reset();
        self.sources.get_mut(self.snapshot.config.excitation).reset();
        self.response_source = None;
        self.faults.fetch_add(1, Ordering::Relaxed);
    }

    /// Hand a copy of the block to visualization; dropped when the queue is full
    fn publish(&mut self) {
        let Some(producer) = self.visualization.as_mut() else {
            return;
        };
        if producer.slots() < self.block.len() {
            return;
        }
        for sample in &self.block {
            let _ = producer.push(*sample);
        }
    }
}
