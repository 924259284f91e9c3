use std::io::Write as _;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use cbh2pgn::batch::{self, Database};
use cbh2pgn::cli::Args;
use cbh2pgn::config::Config;
use cbh2pgn::error::AppError;

fn main() -> ExitCode {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("cbh2pgn: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run() -> Result<(), AppError> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let mut config = config;
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    if let Some(path) = &args.error_log {
        config.error_log = Some(path.clone());
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_count())
        .build_global()
        .map_err(|e| AppError::Structural { file: "thread pool", detail: e.to_string() })?;

    let stem = args.input_stem();
    let db = Database {
        cbh: read_arc(&stem.with_extension("cbh"))?,
        cbg: read_arc(&stem.with_extension("cbg"))?,
        cbp: read_arc(&stem.with_extension("cbp"))?,
        cbt: read_arc(&stem.with_extension("cbt"))?,
    };

    let result = batch::convert(&db, &config);

    let output_path = args.output_path();
    std::fs::write(&output_path, result.pgn.as_bytes())
        .map_err(|source| AppError::Io { path: output_path.clone(), source })?;

    let error_log_path = config
        .error_log
        .clone()
        .unwrap_or_else(|| output_path.with_extension("errors.log"));
    write_error_log(&error_log_path, &result.errors)?;

    eprintln!(
        "wrote {} games ({} decode errors, {} policy skips)",
        result.counters.written,
        result.counters.decode_errors,
        result.counters.deleted_skips
            + result.counters.not_a_game_skips
            + result.counters.chess960_skips
            + result.counters.special_encoding_skips
            + result.counters.not_encoded_skips,
    );

    Ok(())
}

fn read_arc(path: &std::path::Path) -> Result<Arc<[u8]>, AppError> {
    let bytes = std::fs::read(path).map_err(|source| AppError::Io { path: path.to_path_buf(), source })?;
    Ok(Arc::from(bytes.into_boxed_slice()))
}

fn write_error_log(
    path: &std::path::Path,
    entries: &[batch::ErrorLogEntry],
) -> Result<(), AppError> {
    if entries.is_empty() {
        return Ok(());
    }
    let mut file = std::fs::File::create(path)
        .map_err(|source| AppError::Io { path: path.to_path_buf(), source })?;
    for entry in entries {
        writeln!(file, "{}\t{}\t{}", entry.record_index, entry.first_byte_of_game, entry.message)
            .map_err(|source| AppError::Io { path: path.to_path_buf(), source })?;
    }
    Ok(())
}
