use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bpmline_domain::AnalysisProfile;
use bpmline_timeline::AnalysisPipeline;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "wav", "flac", "m4a", "aac", "ogg"];

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Analyze the tempo of every audio file in a directory"
)]
struct Args {
    /// Directory to scan (not recursive)
    #[arg(default_value = ".")]
    directory: PathBuf,
}

fn is_audio_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                AUDIO_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false)
}

fn find_audio_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(directory)
        .with_context(|| format!("read directory {:?}", directory))?
    {
        let path = entry?.path();
        if is_audio_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    println!("=== 批量BPM分析工具 ===\n");

    let files = find_audio_files(&args.directory)?;
    if files.is_empty() {
        println!("当前目录中没有找到音频文件");
        println!("支持的格式: MP3, WAV, FLAC, M4A, AAC, OGG");
        return Ok(());
    }

    println!("找到 {} 个音频文件:", files.len());
    for (index, file) in files.iter().enumerate() {
        println!("{}. {}", index + 1, display_name(file));
    }
    println!("\n开始分析...\n");

    let pipeline = AnalysisPipeline::new(AnalysisProfile::Quick.config());
    for (index, file) in files.iter().enumerate() {
        println!("[{}/{}] {}", index + 1, files.len(), display_name(file));
        println!("{}", "-".repeat(50));
        println!("{}", pipeline.report_file(file));
        println!();
    }
    info!(count = files.len(), "batch finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_audio_files_sorted_and_case_insensitive() {
        let dir = std::env::temp_dir().join(format!("batch-bpm-scan-{}", std::process::id()));
        fs::create_dir_all(dir.join("nested.mp3")).unwrap();
        for name in ["b.WAV", "a.mp3", "notes.txt", "c.flac", "noext"] {
            fs::write(dir.join(name), b"").unwrap();
        }

        let files = find_audio_files(&dir).unwrap();
        let names: Vec<String> = files.iter().map(|f| display_name(f)).collect();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(names, vec!["a.mp3", "b.WAV", "c.flac"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(find_audio_files(Path::new("does-not-exist-dir")).is_err());
    }
}
