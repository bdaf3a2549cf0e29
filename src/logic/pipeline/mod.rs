//! Scan Pipeline
//!
//! Source → Extractor → Reconciler → Normalizer → Classifier → Verdicts → result table.
//!
//! Single-pass, single-threaded. Mọi fatal error xảy ra TRƯỚC khi result
//! table được ghi; file chỉ xuất hiện khi toàn bộ batch đã được score.

pub mod report;


use std::path::{Path, PathBuf};
use std::time::Instant;
use chrono::Utc;
use uuid::Uuid;

use crate::logic::capture::{JsonLinesSource, RawRecord, RecordSource, TableSource, VecSource};
use crate::logic::config::{InputFormat, ScanConfig};
use crate::logic::error::ScanResult;
use crate::logic::features::{
    FeatureExtractor, FeatureVector, PacketExtractor, ReconcileStats, ReconciledRow,
    SchemaReconciler,
};
use crate::logic::model::{
    Classifier, ClassifierAdapter, ModelBundle, NormalizeStats, Normalizer, ScalerParams,
    ThresholdConfig,
};
use crate::logic::verdict::{self, ResultWriter, VerdictBatch};

pub use report::{ScanReport, ScanSummary};

/// What to scan
pub enum ScanInput {
    /// Bulk capture table; columns go straight to the reconciler
    Table(PathBuf),
    /// Raw record stream file; records go through the extractor
    JsonLines(PathBuf),
    /// Raw records already in memory; records go through the extractor
    Records(Vec<RawRecord>),
}

impl ScanInput {
    pub fn from_path(path: impl Into<PathBuf>, format: InputFormat) -> Self {
        let path = path.into();
        match format.resolve(&path) {
            InputFormat::Jsonl => ScanInput::JsonLines(path),
            _ => ScanInput::Table(path),
        }
    }

    fn describe(&self) -> String {
        match self {
            ScanInput::Table(p) | ScanInput::JsonLines(p) => p.display().to_string(),
            ScanInput::Records(r) => format!("<memory:{}>", r.len()),
        }
    }
}

/// Everything computed for a batch before anything is written
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub records_read: usize,
    pub records_skipped: usize,
    /// Encoded, unscaled vectors in verdict order
    pub vectors: Vec<FeatureVector>,
    pub scores: Vec<f32>,
    pub verdicts: VerdictBatch,
    pub reconcile: ReconcileStats,
    pub normalize: NormalizeStats,
    pub inference_time_us: u64,
}

pub struct Pipeline {
    extractor: PacketExtractor,
    normalizer: Normalizer,
    adapter: ClassifierAdapter,
    threshold: ThresholdConfig,
}

impl Pipeline {
    pub fn new(
        classifier: Box<dyn Classifier>,
        scaler: ScalerParams,
        threshold: ThresholdConfig,
    ) -> ScanResult<Self> {
        Ok(Self {
            extractor: PacketExtractor,
            normalizer: Normalizer::new(scaler)?,
            adapter: ClassifierAdapter::new(classifier)?,
            threshold,
        })
    }

    /// Build from a validated bundle; the scaler is taken verbatim from it
    pub fn from_bundle(bundle: &ModelBundle, config: &ScanConfig) -> ScanResult<Self> {
        let threshold = config.threshold_config(bundle.threshold())?;
        let classifier = bundle.build_classifier()?;
        Self::new(classifier, bundle.scaler().clone(), threshold)
    }

    pub fn threshold(&self) -> &ThresholdConfig {
        &self.threshold
    }

    /// Read, reconcile, normalize, score and threshold, without writing
    pub fn evaluate(&self, input: ScanInput) -> ScanResult<Evaluation> {
        let (records, through_extractor) = match input {
            ScanInput::Table(path) => (TableSource::new(path).read_records()?, false),
            ScanInput::JsonLines(path) => (JsonLinesSource::new(path).read_records()?, true),
            ScanInput::Records(records) => (VecSource::new(records).read_records()?, true),
        };

        let records_read = records.len();
        let mut reconciler = SchemaReconciler::new();
        let mut rows: Vec<ReconciledRow> = Vec::with_capacity(records_read);
        let mut records_skipped = 0;

        for (position, record) in records.iter().enumerate() {
            if !through_extractor {
                rows.push(reconciler.reconcile(position, record.iter()));
                continue;
            }

            match self.extractor.extract(record) {
                Some(attrs) => {
                    let fields = attrs.fields();
                    rows.push(reconciler.reconcile(position, fields.iter().map(|(k, v)| (*k, v))));
                }
                None => {
                    log::debug!("Record {} has no usable timestamp/length, skipped", position);
                    records_skipped += 1;
                }
            }
        }

        let (vectors, matrix, normalize) = self.normalizer.normalize_batch(&rows)?;
        log::debug!("Shape of preprocessed batch: {:?}", matrix.dim());
        if let Some(first) = vectors.first() {
            log::debug!("First feature vector: {}", first.to_log_entry());
        }

        let scored = self.adapter.score(matrix.view())?;

        let positions: Vec<usize> = rows.iter().map(|r| r.position).collect();
        let verdicts = verdict::threshold(&scored.scores, &positions, &self.threshold)?;

        Ok(Evaluation {
            records_read,
            records_skipped,
            vectors,
            scores: scored.scores,
            verdicts,
            reconcile: reconciler.into_stats(),
            normalize,
            inference_time_us: scored.inference_time_us,
        })
    }

    /// Full run: evaluate, then write the result table in one step
    pub fn run(&self, input: ScanInput, output: &Path) -> ScanResult<ScanSummary> {
        let started_at = Utc::now();
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let input_name = input.describe();

        log::info!("Starting scan run_id={} input={}", run_id, input_name);

        let evaluation = self.evaluate(input)?;
        ResultWriter::new(output).write(&evaluation.verdicts)?;

        let degraded = evaluation.reconcile.is_degraded()
            || evaluation.normalize.filled_missing > 0
            || evaluation.normalize.unknown_categories > 0;

        let summary = ScanSummary {
            run_id,
            started_at,
            input: input_name,
            records_read: evaluation.records_read,
            records_skipped: evaluation.records_skipped,
            records_scored: evaluation.verdicts.len(),
            anomaly_count: evaluation.verdicts.anomaly_count,
            classifier: self.adapter.name().to_string(),
            threshold: self.threshold.base_threshold,
            reconcile: evaluation.reconcile,
            normalize: evaluation.normalize,
            degraded,
            output_path: output.to_path_buf(),
            inference_time_us: evaluation.inference_time_us,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };

        summary.log();
        Ok(summary)
    }
}

/// Orchestrator entry: load the bundle once, run one scan
pub fn run_scan(input: ScanInput, config: &ScanConfig) -> ScanResult<ScanSummary> {
    let bundle = ModelBundle::load(&config.bundle_path)?;
    let pipeline = Pipeline::from_bundle(&bundle, config)?;
    pipeline.run(input, &config.output_path)
}
