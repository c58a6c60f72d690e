use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use bpmline_audio::{AudioDecoder, AutocorrelationTempo, TempoEstimate};
use bpmline_domain::{format_time, AnalysisConfig, AudioBuffer, Timeline};

use crate::formatter::TimelineFormatter;
use crate::merger::SegmentMerger;
use crate::segmenter::SegmentEstimator;

/// Load, window, merge and format, for one recording at a time.
pub struct AnalysisPipeline {
    config: AnalysisConfig,
    segmenter: SegmentEstimator,
    merger: SegmentMerger,
    formatter: TimelineFormatter,
    tempo: Box<dyn TempoEstimate>,
}

impl AnalysisPipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self::with_estimator(config, Box::new(AutocorrelationTempo::default()))
    }

    pub fn with_estimator(config: AnalysisConfig, tempo: Box<dyn TempoEstimate>) -> Self {
        Self {
            config,
            segmenter: SegmentEstimator::new(config.window_duration),
            merger: SegmentMerger::new(config.tolerance),
            formatter: TimelineFormatter,
            tempo,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze_buffer(&self, buffer: &AudioBuffer) -> Timeline {
        let raw = self.segmenter.estimate(buffer, self.tempo.as_ref());
        let merged = self.merger.merge(&raw);
        self.formatter.build(&merged, buffer.duration())
    }

    /// Decodes `path`, naming the file in the error on failure.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<AudioBuffer> {
        let path = path.as_ref();
        let buffer = AudioDecoder::open(path)
            .with_context(|| format!("无法加载音频文件 {}", path.display()))?;
        info!(
            duration = %format_time(buffer.duration()),
            sample_rate = buffer.sample_rate(),
            "audio loaded"
        );
        Ok(buffer)
    }

    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> Result<Timeline> {
        let buffer = self.load(path)?;
        let timeline = self.analyze_buffer(&buffer);
        info!(detected = timeline.is_detected(), "analysis finished");
        Ok(timeline)
    }

    /// Text report for `path` that never fails; errors become the report.
    pub fn report_file<P: AsRef<Path>>(&self, path: P) -> String {
        let path = path.as_ref();
        if !path.exists() {
            return format!("错误: 文件 '{}' 不存在", path.display());
        }
        match self.analyze_file(path) {
            Ok(timeline) => timeline.to_string(),
            Err(err) => format!("分析失败: {err:#}"),
        }
    }
}

impl Default for AnalysisPipeline {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}
