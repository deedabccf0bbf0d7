use std::time::Instant;

use moodlink_audio::mfcc::{FeatureExtractor, FeatureMatrix, MfccConfig, SpectralBasis};
use moodlink_audio::pool::{PoolAllocator, PoolUsage};
use moodlink_audio::{normalize, SignalStats};
use moodlink_inference::{ClassificationResult, Engine, ModelInfo, QuantizationAdapter};
use tracing::{debug, info, warn};

use crate::capture::Capture;
use crate::config::PipelineConfig;
use crate::error::{CaptureError, InitError, PipelineError};
use crate::metrics::{elapsed_ms, CycleReport, StageTimings};

/// Capture, normalization and feature extraction over owned buffers.
///
/// Everything is allocated once, through the configured pool policy, and
/// reused by every cycle.
#[derive(Debug)]
pub struct FeatureStage {
    config: PipelineConfig,
    samples: Vec<i16>,
    features: FeatureMatrix,
    extractor: FeatureExtractor,
    pool_usage: PoolUsage,
}

impl FeatureStage {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let mut alloc = PoolAllocator::new(config.pool.clone());
        Self::with_allocator(config, &mut alloc)
    }

    fn with_allocator(
        config: PipelineConfig,
        alloc: &mut PoolAllocator,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let mfcc = MfccConfig::default();

        let basis = SpectralBasis::new(&mfcc, alloc)?;
        let extractor = FeatureExtractor::new(basis, alloc)?;
        let samples = alloc.alloc("sample buffer", mfcc.num_samples)?;
        let features = FeatureMatrix::new(&mfcc, alloc)?;

        let pool_usage = alloc.usage();
        info!(
            internal_bytes = pool_usage.internal,
            external_bytes = pool_usage.external,
            "pipeline: buffers allocated"
        );
        Ok(Self {
            config,
            samples,
            features,
            extractor,
            pool_usage,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn mfcc_config(&self) -> &MfccConfig {
        self.extractor.config()
    }

    pub fn basis(&self) -> &SpectralBasis {
        self.extractor.basis()
    }

    /// The sample buffer as left by the last cycle (normalized).
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// The feature matrix of the last cycle.
    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    /// Bytes placed in each memory pool at construction.
    pub fn pool_usage(&self) -> PoolUsage {
        self.pool_usage
    }

    /// Mel energies of one frame of the current sample buffer.
    pub fn mel_energies(&mut self, frame_index: usize) -> &[f32] {
        self.extractor.mel_energies(&self.samples, frame_index)
    }

    /// Fills the sample buffer from `source`.
    ///
    /// Samples the source did not deliver are zeroed so a short capture never
    /// mixes with the previous recording.
    pub fn acquire<C: Capture>(&mut self, source: &mut C) -> Result<usize, PipelineError> {
        let n = match source.capture(&mut self.samples) {
            Ok(0) => Err(CaptureError::NoSamples),
            Ok(n) => Ok(n.min(self.samples.len())),
            Err(e) => Err(e),
        };
        let n = match n {
            Ok(n) => n,
            Err(e) => {
                self.samples.fill(0);
                warn!(error = %e, "pipeline: audio acquisition failed");
                return Err(e.into());
            }
        };

        self.samples[n..].fill(0);
        let len = self.samples.len();
        if (n as f32) < self.config.min_capture_ratio * len as f32 {
            warn!(
                captured = n,
                expected = len,
                "pipeline: partial capture, remainder zero-filled"
            );
        }
        Ok(n)
    }

    /// Runs capture, statistics, normalization and feature extraction.
    pub fn condition<C: Capture>(&mut self, source: &mut C) -> Result<CycleReport, PipelineError> {
        let cycle_start = Instant::now();

        let start = Instant::now();
        let captured = self.acquire(source)?;
        let capture_ms = elapsed_ms(start);

        let start = Instant::now();
        let before = SignalStats::compute(&self.samples);
        let normalization = normalize(&mut self.samples, self.config.target_db);
        let after = SignalStats::compute(&self.samples);
        let normalize_ms = elapsed_ms(start);
        debug!(%before, %after, gain = normalization.gain, "pipeline: conditioned");

        let start = Instant::now();
        self.extractor
            .extract_into(&self.samples, &mut self.features)
            .map_err(PipelineError::Extraction)?;
        let features_ms = elapsed_ms(start);

        Ok(CycleReport {
            captured,
            before,
            after,
            silent: normalization.is_silent(),
            normalization,
            result: None,
            timings: StageTimings {
                capture_ms,
                normalize_ms,
                features_ms,
                inference_ms: 0.0,
                total_ms: elapsed_ms(cycle_start),
            },
        })
    }
}

/// Long-lived state of the capture-to-classification loop.
///
/// ```ignore
/// let mut ctx = PipelineContext::new(PipelineConfig::default(), DenseEngine::new(), &model)?;
/// loop {
///     match ctx.run_cycle(&mut mic) {
///         Ok(report) => println!("{}", report.result.unwrap()),
///         Err(e) if !e.is_fatal() => continue,
///         Err(e) => return Err(e.into()),
///     }
/// }
/// ```
#[derive(Debug)]
pub struct PipelineContext<E> {
    stage: FeatureStage,
    adapter: QuantizationAdapter<E>,
    model: ModelInfo,
    cycles: u64,
}

impl<E: Engine> PipelineContext<E> {
    /// Allocates every buffer, builds the spectral basis and loads `model`
    /// into `engine`. Any failure here is fatal.
    pub fn new(config: PipelineConfig, engine: E, model: &[u8]) -> Result<Self, PipelineError> {
        let stage = FeatureStage::new(config)?;

        let mut adapter = QuantizationAdapter::new(engine);
        let info = adapter.load(model)?;
        let expected = stage.mfcc_config().feature_len();
        if info.input_len() != expected {
            return Err(InitError::InputMismatch {
                expected,
                got: info.input_len(),
            }
            .into());
        }

        Ok(Self {
            stage,
            adapter,
            model: info,
            cycles: 0,
        })
    }

    pub fn stage(&self) -> &FeatureStage {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut FeatureStage {
        &mut self.stage
    }

    pub fn adapter(&self) -> &QuantizationAdapter<E> {
        &self.adapter
    }

    pub fn model_info(&self) -> &ModelInfo {
        &self.model
    }

    pub fn features(&self) -> &FeatureMatrix {
        self.stage.features()
    }

    pub fn samples(&self) -> &[i16] {
        self.stage.samples()
    }

    /// Completed cycles, including those whose inference failed.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Runs one full cycle.
    ///
    /// Acquisition failures return a recoverable error. Inference failures
    /// do not: the report carries the `error` result instead.
    pub fn run_cycle<C: Capture>(&mut self, source: &mut C) -> Result<CycleReport, PipelineError> {
        let cycle_start = Instant::now();
        let mut report = self.stage.condition(source)?;

        let start = Instant::now();
        let result = self.adapter.classify(self.stage.features().as_slice());
        report.timings.inference_ms = elapsed_ms(start);
        report.timings.total_ms = elapsed_ms(cycle_start);

        self.cycles += 1;
        log_result(self.cycles, &result, &report);
        report.result = Some(result);
        Ok(report)
    }
}

fn log_result(cycle: u64, result: &ClassificationResult, report: &CycleReport) {
    info!(
        cycle,
        label = %result.label,
        confidence = result.confidence,
        silent = report.silent,
        total_ms = report.timings.total_ms,
        "pipeline: cycle complete"
    );
}
