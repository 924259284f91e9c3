//! The two error taxonomies: [`AppError`] aborts the whole batch,
//! [`GameDecodeError`] drops a single game and lets the batch continue.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::Square;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Argument(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {file}: {detail}")]
    Structural { file: &'static str, detail: String },
}

impl AppError {
    /// 1 for an argument mistake, 2 for everything else fatal.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Argument(_) => 1,
            AppError::Io { .. } | AppError::Structural { .. } => 2,
        }
    }
}

/// A single game could not be decoded. The batch logs this and drops
/// the game; it never aborts the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameDecodeError {
    #[error("unknown opcode 0x{byte:02X} at move-stream offset {offset}")]
    UnknownOpcode { byte: u8, offset: usize },

    #[error("move source square {square} is empty at move-stream offset {offset}")]
    EmptySource { square: Square, offset: usize },

    #[error("variation stack non-empty at end of move stream (offset {offset})")]
    UnterminatedVariation { offset: usize },

    #[error("setup block truncated before all 64 squares were read")]
    TruncatedSetupBlock,

    #[error("bit-stream parse failure: {detail}")]
    BitStreamParse { detail: String },
}

/// Why a CBH record produced no PGN output without it being an error:
/// recorded in batch counters, never logged as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Deleted,
    NotAGame,
    Chess960,
    SpecialEncoding,
    NotEncoded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_errors_exit_one_others_exit_two() {
        assert_eq!(AppError::Argument("bad flag".into()).exit_code(), 1);
        assert_eq!(
            AppError::Structural { file: ".cbh", detail: "short".into() }.exit_code(),
            2
        );
    }

    #[test]
    fn game_decode_error_messages_are_human_readable() {
        let err = GameDecodeError::UnknownOpcode { byte: 0xFE, offset: 12 };
        assert_eq!(err.to_string(), "unknown opcode 0xFE at move-stream offset 12");
    }
}
