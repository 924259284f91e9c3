//! The batch driver: walks every CBH record, classifies it, decodes
//! games in parallel, and serializes PGN output in CBH record order.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::cbg::GameRecordHeader;
use crate::cbh::CbhRecord;
use crate::cbp::PlayerTable;
use crate::cbt::TournamentTable;
use crate::config::Config;
use crate::decoder::MoveStreamDecoder;
use crate::error::{GameDecodeError, SkipReason};
use crate::pgn::{GameTags, PgnTreeBuilder};
use crate::startpos;

/// Read-only views over the four database files, cheaply cloned
/// across worker threads — this stands in for a memory-mapped view.
pub struct Database {
    pub cbh: Arc<[u8]>,
    pub cbg: Arc<[u8]>,
    pub cbp: Arc<[u8]>,
    pub cbt: Arc<[u8]>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BatchCounters {
    pub written: u64,
    pub deleted_skips: u64,
    pub not_a_game_skips: u64,
    pub chess960_skips: u64,
    pub special_encoding_skips: u64,
    pub not_encoded_skips: u64,
    pub decode_errors: u64,
}

pub struct ErrorLogEntry {
    pub record_index: usize,
    pub first_byte_of_game: usize,
    pub message: String,
}

pub struct BatchResult {
    pub pgn: String,
    pub counters: BatchCounters,
    pub errors: Vec<ErrorLogEntry>,
}

enum RecordOutcome {
    Skipped(SkipReason),
    Failed(usize, GameDecodeError),
    Written(String),
}

/// Converts every game record in `db` to PGN text, in CBH record order.
pub fn convert(db: &Database, config: &Config) -> BatchResult {
    let record_count = db.cbh.len() / crate::cbh::RECORD_SIZE;
    let players = PlayerTable::open(&db.cbp).ok();
    let tournaments = TournamentTable::open(&db.cbt).ok();

    // Record 0 is the database header; record 1 is reserved. Games
    // start at index 2, matching the reference exporter's scan range.
    let outcomes: Vec<RecordOutcome> = (2..record_count)
        .into_par_iter()
        .map(|index| {
            let offset = index * crate::cbh::RECORD_SIZE;
            let record = CbhRecord::parse(&db.cbh[offset..offset + crate::cbh::RECORD_SIZE]);
            convert_one(&db.cbg, &record, index, players.as_ref(), tournaments.as_ref(), config)
        })
        .collect();

    let mut counters = BatchCounters::default();
    let mut errors = Vec::new();
    let mut pgn = String::new();

    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            RecordOutcome::Skipped(reason) => {
                match reason {
                    SkipReason::Deleted => counters.deleted_skips += 1,
                    SkipReason::NotAGame => counters.not_a_game_skips += 1,
                    SkipReason::Chess960 => counters.chess960_skips += 1,
                    SkipReason::SpecialEncoding => counters.special_encoding_skips += 1,
                    SkipReason::NotEncoded => counters.not_encoded_skips += 1,
                }
            }
            RecordOutcome::Failed(first_byte, err) => {
                counters.decode_errors += 1;
                warn!(record_index = index + 2, %err, "dropping game");
                errors.push(ErrorLogEntry {
                    record_index: index + 2,
                    first_byte_of_game: first_byte,
                    message: err.to_string(),
                });
            }
            RecordOutcome::Written(text) => {
                counters.written += 1;
                pgn.push_str(&text);
                pgn.push('\n');
            }
        }
    }

    BatchResult { pgn, counters, errors }
}

fn convert_one(
    cbg: &[u8],
    record: &CbhRecord,
    index: usize,
    players: Option<&PlayerTable>,
    tournaments: Option<&TournamentTable>,
    config: &Config,
) -> RecordOutcome {
    if record.is_deleted {
        return RecordOutcome::Skipped(SkipReason::Deleted);
    }
    if !record.is_game {
        return RecordOutcome::Skipped(SkipReason::NotAGame);
    }

    let game_offset = record.game_offset as usize;
    let header = GameRecordHeader::read(cbg, game_offset);
    if !header.encoded {
        return RecordOutcome::Skipped(SkipReason::NotEncoded);
    }
    if header.special_encoding {
        return RecordOutcome::Skipped(SkipReason::SpecialEncoding);
    }
    if header.chess960 {
        return RecordOutcome::Skipped(SkipReason::Chess960);
    }

    let (initial_board, fen, black_to_move) = if header.initial_position {
        let fen = config.always_emit_fen.then(startpos::standard_start_fen);
        (startpos::standard_start(), fen, false)
    } else {
        match startpos::decode(cbg, game_offset) {
            // Non-initial starts always carry their FEN: without it the
            // movetext cannot be replayed from the right position.
            Ok(start) => (start.board, Some(start.fen.clone()), start.black_to_move),
            Err(_) => {
                return RecordOutcome::Failed(
                    game_offset,
                    GameDecodeError::TruncatedSetupBlock,
                );
            }
        }
    };

    let move_stream = header.move_stream(cbg, game_offset);
    let decoder = MoveStreamDecoder::new(move_stream);
    let decoded = match decoder.decode(initial_board, black_to_move) {
        Ok(decoded) => decoded,
        Err(err) => return RecordOutcome::Failed(game_offset, err),
    };
    debug!(record_index = index + 2, moves = decoded.tree.len() - 1, "decoded game");

    let white = players
        .and_then(|p| p.name(record.white_player_offset))
        .unwrap_or_else(|| "?".to_string());
    let black = players
        .and_then(|p| p.name(record.black_player_offset))
        .unwrap_or_else(|| "?".to_string());
    let (event, site) = tournaments
        .and_then(|t| t.info(record.tournament_offset))
        .map(|info| (info.title, info.site))
        .unwrap_or_else(|| ("?".to_string(), "?".to_string()));

    let tags = GameTags::from_record(record, event, site, white, black, fen);
    let text = PgnTreeBuilder::new(&tags, &decoded.tree).render();
    RecordOutcome::Written(text)
}
