use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use parking_lot::Mutex;
use serde_json::{Value, json};
use slidecast_core::ffmpeg::filter_graph::Segment;
use slidecast_core::ordering::{AUDIO_EXTENSIONS, AssetOrder, IMAGE_EXTENSIONS, collect_assets};
use slidecast_core::{
    PipelineConfig, PipelineError, ProgressCallback, ProgressEvent, Stage, plan_run, run_pipeline,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderArg {
    Lexical,
    Natural,
    Given,
}

impl From<OrderArg> for AssetOrder {
    fn from(value: OrderArg) -> Self {
        match value {
            OrderArg::Lexical => AssetOrder::Lexical,
            OrderArg::Natural => AssetOrder::Natural,
            OrderArg::Given => AssetOrder::Given,
        }
    }
}

/// Show each image for the length of its audio clip, with fades, as one MP4.
#[derive(Debug, Parser)]
#[command(name = "slidecast", version)]
struct Cli {
    /// Audio files or directories of audio files.
    #[arg(long, short = 'a', num_args = 1.., required = true)]
    audio: Vec<PathBuf>,

    /// Image files or directories of images. Needs at least one per audio file.
    #[arg(long, short = 'i', num_args = 1.., required = true)]
    images: Vec<PathBuf>,

    /// Final video path.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Directory for intermediate files; removed before and after the run.
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// JSON config file (camelCase keys); flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    order: Option<OrderArg>,

    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    #[arg(long)]
    ffprobe: Option<PathBuf>,

    /// Probe the audio, print the filter graph and exit without encoding.
    #[arg(long)]
    print_graph: bool,
}

impl Cli {
    fn flag_config(&self) -> PipelineConfig {
        PipelineConfig {
            work_dir: self.work_dir.clone(),
            output_path: self.output.clone(),
            ffmpeg_path: self.ffmpeg.clone(),
            ffprobe_path: self.ffprobe.clone(),
            order: self.order.map(AssetOrder::from),
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct CliEvent<T> {
    event: &'static str,
    payload: T,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanPayload<'a> {
    durations: &'a [f64],
    total_duration: f64,
    segments: &'a [Segment],
    filter_graph: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct DonePayload {
    output_path: String,
}

type SharedWriter = Arc<Mutex<io::Stdout>>;

fn write_json_line<T: serde::Serialize>(writer: &mut impl Write, value: &T) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, value)
        .map_err(|e| io::Error::other(format!("serialize event: {}", e)))?;
    writer.write_all(b"\n")?;
    writer.flush()
}

fn emit<T: serde::Serialize>(writer: &SharedWriter, event: &'static str, payload: T) {
    let mut guard = writer.lock();
    if let Err(e) = write_json_line(&mut *guard, &CliEvent { event, payload }) {
        log::warn!(target: "slidecast::cli", "Failed to write event: {}", e);
    }
}

fn emit_error(writer: &SharedWriter, err: &PipelineError) {
    log::error!(target: "slidecast::cli", "{}", err);
    let payload =
        serde_json::to_value(err).unwrap_or_else(|_| json!({ "summary": err.to_string() }));
    emit::<Value>(writer, "error", payload);
}

fn load_config(cli: &Cli) -> Result<PipelineConfig, PipelineError> {
    let base = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    Ok(base.overlay(cli.flag_config()))
}

fn collect(
    inputs: &[PathBuf],
    extensions: &[&str],
    order: AssetOrder,
) -> Result<Vec<PathBuf>, PipelineError> {
    collect_assets(inputs, extensions, order).map_err(PipelineError::io(Stage::Setup))
}

fn run(cli: &Cli, config: &PipelineConfig, writer: &SharedWriter) -> Result<(), PipelineError> {
    let order = config.effective_order();
    let audio = collect(&cli.audio, AUDIO_EXTENSIONS, order)?;
    let images = collect(&cli.images, IMAGE_EXTENSIONS, order)?;
    log::info!(
        target: "slidecast::cli",
        "{} audio file(s), {} image(s), order={:?}",
        audio.len(),
        images.len(),
        order
    );

    if cli.print_graph {
        let plan = plan_run(&audio, &images, config, None)?;
        emit(
            writer,
            "plan",
            PlanPayload {
                durations: &plan.durations,
                total_duration: plan.total_duration,
                segments: &plan.segments,
                filter_graph: plan.graph.to_string(),
            },
        );
        return Ok(());
    }

    let progress_writer = Arc::clone(writer);
    let progress: ProgressCallback = Arc::new(move |event: ProgressEvent| {
        emit(&progress_writer, "progress", event);
    });
    let output = run_pipeline(&audio, &images, config, Some(progress))?;
    emit(
        writer,
        "done",
        DonePayload {
            output_path: output.to_string_lossy().into_owned(),
        },
    );
    Ok(())
}

fn main() -> ExitCode {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env).init();

    let cli = Cli::parse();
    let stdout: SharedWriter = Arc::new(Mutex::new(io::stdout()));

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            emit_error(&stdout, &err);
            return ExitCode::from(2);
        }
    };

    match run(&cli, &config, &stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            emit_error(&stdout, &err);
            ExitCode::FAILURE
        }
    }
}
