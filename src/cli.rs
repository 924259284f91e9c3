//! Command-line argument parsing.

use std::path::{Path, PathBuf};

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "cbh2pgn", about = "Converts a ChessBase CBH/CBG/CBP/CBT database into PGN")]
pub struct Args {
    /// Base path to the `.cbh` file (extension optional).
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output `.pgn` path (extension appended if missing).
    #[arg(short, long)]
    pub output: PathBuf,

    /// Optional `cbh2pgn.toml` overriding worker count, FEN policy, and error-log path.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Worker concurrency override (0 = number of logical CPUs).
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Where the per-game decode-error log is written.
    #[arg(long)]
    pub error_log: Option<PathBuf>,
}

impl Args {
    /// The four input file stems, with any extension the user supplied stripped.
    pub fn input_stem(&self) -> PathBuf {
        strip_known_extension(&self.input)
    }

    /// The output path with `.pgn` appended if the user omitted it.
    pub fn output_path(&self) -> PathBuf {
        if self.output.extension().is_some() {
            self.output.clone()
        } else {
            self.output.with_extension("pgn")
        }
    }
}

fn strip_known_extension(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some("cbh") | Some("cbg") | Some("cbp") | Some("cbt") => path.with_extension(""),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(input: &str, output: &str) -> Args {
        Args {
            input: PathBuf::from(input),
            output: PathBuf::from(output),
            config: None,
            jobs: None,
            error_log: None,
        }
    }

    #[test]
    fn strips_cbh_extension_from_input() {
        let a = args("games.cbh", "out");
        assert_eq!(a.input_stem(), PathBuf::from("games"));
    }

    #[test]
    fn leaves_extensionless_input_untouched() {
        let a = args("games", "out");
        assert_eq!(a.input_stem(), PathBuf::from("games"));
    }

    #[test]
    fn appends_pgn_extension_when_missing() {
        let a = args("games", "out");
        assert_eq!(a.output_path(), PathBuf::from("out.pgn"));
    }

    #[test]
    fn keeps_explicit_output_extension() {
        let a = args("games", "out.txt");
        assert_eq!(a.output_path(), PathBuf::from("out.txt"));
    }
}
