use std::path::PathBuf;

use anyhow::Result;
use bpmline_domain::{format_time, AnalysisConfig, AnalysisProfile, AudioBuffer, Timeline};
use bpmline_timeline::AnalysisPipeline;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Profile {
    /// 10 second windows, 5 BPM tolerance
    Detailed,
    /// 15 second windows, 8 BPM tolerance
    Quick,
}

impl From<Profile> for AnalysisProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Detailed => AnalysisProfile::Detailed,
            Profile::Quick => AnalysisProfile::Quick,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Report how the tempo of a recording changes over time", long_about = None)]
struct Cli {
    /// Path to the audio file to analyze
    file_path: PathBuf,
    /// Seconds per analysis window
    #[arg(short, long)]
    segment: Option<f64>,
    /// BPM delta under which adjacent windows are merged
    #[arg(short, long)]
    tolerance: Option<f64>,
    /// Default window and tolerance settings
    #[arg(long, value_enum, default_value_t = Profile::Detailed)]
    profile: Profile,
    /// YAML or JSON file with `window_duration` and `tolerance`
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the timeline as JSON on stdout; progress goes to stderr
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::load(path)?,
            None => AnalysisProfile::from(self.profile).config(),
        };
        if let Some(window_duration) = self.segment {
            config.window_duration = window_duration;
        }
        if let Some(tolerance) = self.tolerance {
            config.tolerance = tolerance;
        }
        config.validate()?;
        Ok(config)
    }

    /// Progress text; kept off stdout when stdout carries JSON.
    fn progress(&self, line: &str) {
        if self.json {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
}

fn duration_line(buffer: &AudioBuffer) -> String {
    format!("音频时长: {}", format_time(buffer.duration()))
}

fn render(timeline: &Timeline, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(timeline)?);
    }
    Ok(format!("\n=== BPM分析结果 ===\n{timeline}"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if !cli.file_path.exists() {
        let message = format!("错误: 文件 '{}' 不存在", cli.file_path.display());
        if cli.json {
            anyhow::bail!(message);
        }
        println!("{message}");
        return Ok(());
    }

    let pipeline = AnalysisPipeline::new(cli.analysis_config()?);
    cli.progress(&format!("正在分析文件: {}", cli.file_path.display()));
    let buffer = match pipeline.load(&cli.file_path) {
        Ok(buffer) => buffer,
        Err(err) if cli.json => return Err(err),
        Err(err) => {
            println!("分析过程中出现错误: {err:#}");
            return Ok(());
        }
    };
    cli.progress(&duration_line(&buffer));
    cli.progress("正在分析BPM...");

    let timeline = pipeline.analyze_buffer(&buffer);
    println!("{}", render(&timeline, cli.json)?);
    Ok(())
}
