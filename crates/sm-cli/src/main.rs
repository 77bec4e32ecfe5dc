//! smtool - strong-motion record processing
//!
//! Usage:
//!   smtool replay   --record R --ops OPS.json [--position N] [--out DIR]
//!   smtool rebuild  --record R --product P.acc.json
//!   smtool spectrum --record R [--limit N]
//!   smtool batch    --manifest M.json --out DIR [--threads N]
//!
//! Records are JSON `InMemoryRecord`s. Set `RUST_LOG=debug` for details.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sm_batch::{
    BatchConfig, BatchManifest, BatchProcessor, BatchWorker, JobStatus, JsonProductWriter,
    JsonRecordReader, TraceProduct,
};
use sm_core::{ProcessingConfig, RecordReader, SourceRecord};
use sm_state::{
    CommitGate, EditorSession, ScriptedOperation, WaveformState, reconstruct_from_annotations,
};

#[derive(Parser)]
#[command(name = "smtool", about = "Strong-motion record correction tools")]
struct Cli {
    /// Processing configuration (JSON); defaults apply when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded operation log against a record
    Replay {
        /// Source record
        #[arg(short, long)]
        record: PathBuf,
        /// Operation file (JSON array; absent parameters take the current settings)
        #[arg(long)]
        ops: PathBuf,
        /// Stop after this many operations
        #[arg(short, long)]
        position: Option<usize>,
        /// Write products here if the state can be committed
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Rebuild a corrected state from a product's annotations
    Rebuild {
        /// Source record
        #[arg(short, long)]
        record: PathBuf,
        /// ACC product carrying the annotations
        #[arg(short, long)]
        product: PathBuf,
    },
    /// Print the amplitude spectrum of the uncorrected record
    Spectrum {
        /// Source record
        #[arg(short, long)]
        record: PathBuf,
        /// Number of frequencies to print
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Process every channel of a station manifest
    Batch {
        /// Station manifest
        #[arg(short, long)]
        manifest: PathBuf,
        /// Product directory
        #[arg(short, long)]
        out: PathBuf,
        /// Worker threads (0 = one per core)
        #[arg(short, long, default_value_t = 0)]
        threads: usize,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.config.as_deref().map(|path| {
        log::info!("Loading processing config from {}", path.display());
        ProcessingConfig::load_from(path)
    });

    match cli.command {
        Commands::Replay {
            record,
            ops,
            position,
            out,
        } => replay(
            &record,
            &ops,
            position,
            out.as_deref(),
            config.unwrap_or_default(),
        ),
        Commands::Rebuild { record, product } => {
            rebuild(&record, &product, &config.unwrap_or_default())
        }
        Commands::Spectrum { record, limit } => spectrum(&record, limit),
        Commands::Batch {
            manifest,
            out,
            threads,
        } => batch(&manifest, &out, threads, config),
    }
}

fn read_record(path: &Path) -> Result<Arc<dyn SourceRecord>> {
    JsonRecordReader::new()
        .read(path)
        .with_context(|| format!("Failed to read record {}", path.display()))
}

fn print_state(state: &WaveformState) {
    let (low, high) = state.filter_corners();
    println!(
        "{}: {} samples @ {} s, onset {:.3} s",
        state.channel_id(),
        state.len(),
        state.delta_t(),
        state.event_onset()
    );
    println!(
        "  status {}, corrected {}, filtered {}, corners {:.3}-{:.3} Hz",
        state.status(),
        state.corrected_count(),
        state.filtered_count(),
        low,
        high
    );
    for step in state.correction_steps() {
        let fit = step.fit_window();
        let app = step.app_window();
        println!(
            "  #{} {} {} -> {} {}  fit {:.2}-{:.2} s, app {:.2}-{:.2} s",
            step.sequence_index(),
            step.source_type(),
            step.order_original(),
            step.target_type_final(),
            step.order_final(),
            fit.start,
            fit.stop,
            app.start,
            app.stop
        );
    }
}

fn replay(
    record: &Path,
    ops: &Path,
    position: Option<usize>,
    out: Option<&Path>,
    config: ProcessingConfig,
) -> Result<()> {
    let content = fs::read_to_string(ops)
        .with_context(|| format!("Failed to read operation log {}", ops.display()))?;
    let operations: Vec<ScriptedOperation> =
        serde_json::from_str(&content).context("Malformed operation log")?;

    let mut session = EditorSession::open(read_record(record)?, config)?;
    for (i, op) in operations.iter().enumerate() {
        session
            .perform_scripted(op)
            .with_context(|| format!("Operation {} ({:?}) rejected", i + 1, op.kind))?;
    }
    if let Some(position) = position {
        session.go_to(position)?;
    }

    let summary = session.recorder().summary();
    println!("Replayed {} of {} operations", summary.position, summary.total);
    print_state(session.state());

    if let Some(out) = out {
        let writer = JsonProductWriter::new(out);
        for line in session.commit(&writer)? {
            println!("{line}");
        }
    }
    Ok(())
}

fn rebuild(record: &Path, product: &Path, config: &ProcessingConfig) -> Result<()> {
    let product = TraceProduct::load(product)
        .with_context(|| format!("Failed to load product {}", product.display()))?;
    let source = read_record(record)?;
    if source.channel_code() != product.header.channel {
        bail!(
            "Product is for channel {}, record is {}",
            product.header.channel,
            source.channel_code()
        );
    }

    let mut state =
        reconstruct_from_annotations(source.as_ref(), &product.header.comments, config, None)?;
    state.apply_filter(
        product.header.low_corner,
        product.header.high_corner,
        product.header.event_onset,
        config,
    )?;
    print_state(&state);

    let trace = state.trace(product.data_type);
    let max_diff = trace
        .iter()
        .zip(&product.samples)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0_f64, f64::max);
    println!(
        "Max difference against {} product: {:.3e} (ready to commit: {})",
        product.data_type,
        max_diff,
        CommitGate::is_ready(&state)
    );
    Ok(())
}

fn spectrum(record: &Path, limit: Option<usize>) -> Result<()> {
    let record = read_record(record)?;
    let spectrum = sm_dsp::amplitude_spectrum(record.samples(), record.delta_t())?;
    println!(
        "# {} ({} bins, {:.4} Hz)",
        record.channel_code(),
        spectrum.len(),
        spectrum.resolution()
    );
    for (frequency, amplitude) in spectrum.iter().take(limit.unwrap_or(usize::MAX)) {
        println!("{frequency:.6}\t{amplitude:.6e}");
    }
    if let Some(peak) = spectrum.peak_frequency() {
        println!("# peak {peak:.4} Hz");
    }
    Ok(())
}

fn batch(
    manifest: &Path,
    out: &Path,
    threads: usize,
    config: Option<ProcessingConfig>,
) -> Result<()> {
    let manifest = BatchManifest::load(manifest)?;
    let processing = config.unwrap_or_else(|| manifest.processing.clone());
    processing.validate()?;

    let processor = BatchProcessor::new(
        BatchConfig::default()
            .with_threads(threads)
            .with_processing(processing),
        Arc::new(JsonRecordReader::new()),
        Arc::new(JsonProductWriter::new(out)),
    );
    let results = BatchWorker::spawn(processor, manifest.jobs)?.wait()?;

    let mut failed = 0;
    for result in &results {
        match result.status {
            JobStatus::Completed => println!(
                "[{}] {} ok, {} steps, {:.1} ms",
                result.job_id,
                result.channel,
                result.correction_steps,
                result.duration.as_secs_f64() * 1000.0
            ),
            _ => {
                failed += 1;
                println!(
                    "[{}] {:?}: {}",
                    result.job_id,
                    result.status,
                    result.error.as_deref().unwrap_or("")
                );
            }
        }
    }
    println!("{} of {} channels committed", results.len() - failed, results.len());
    if failed > 0 {
        bail!("{failed} channels failed");
    }
    Ok(())
}
