//! A small chumsky parser for the FEN text this crate emits. Only used
//! to verify the starting-position round trip in tests: render a FEN
//! from a decoded [`crate::model::board::BoardModel`], re-parse it, and
//! compare placements.

use chumsky::error::Rich;
use chumsky::prelude::*;

use crate::model::{Color, PieceKind, Square};

/// A parsed FEN, kept deliberately shallow: piece placement by square,
/// side to move, and the four scalar trailers. Castling/en-passant
/// text is kept as-is rather than re-validated — this parser exists to
/// check placement round-trips, not to be a general FEN validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFen {
    pub placement: [[Option<PieceKind>; 8]; 8],
    pub side_to_move: Color,
    pub castling: String,
    pub en_passant: String,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

fn piece_char<'s>() -> impl Parser<'s, &'s str, PieceKind> {
    one_of("KQRBNPkqrbnp").map(|c: char| match c {
        'K' => PieceKind::WhiteKing,
        'Q' => PieceKind::WhiteQueen,
        'R' => PieceKind::WhiteRook,
        'B' => PieceKind::WhiteBishop,
        'N' => PieceKind::WhiteKnight,
        'P' => PieceKind::WhitePawn,
        'k' => PieceKind::BlackKing,
        'q' => PieceKind::BlackQueen,
        'r' => PieceKind::BlackRook,
        'b' => PieceKind::BlackBishop,
        'n' => PieceKind::BlackKnight,
        'p' => PieceKind::BlackPawn,
        _ => unreachable!("restricted to the one_of alphabet above"),
    })
}

#[derive(Debug, Clone)]
enum RankToken {
    Piece(PieceKind),
    EmptyRun(u32),
}

fn rank_token<'s>() -> impl Parser<'s, &'s str, RankToken> {
    let piece = piece_char().map(RankToken::Piece);
    let empties = one_of('1'..='8').map(|c: char| RankToken::EmptyRun(c.to_digit(10).unwrap()));
    piece.or(empties)
}

fn rank<'s>() -> impl Parser<'s, &'s str, Vec<Option<PieceKind>>> {
    rank_token().repeated().at_least(1).collect::<Vec<_>>().try_map(|tokens, span| {
        let mut squares = Vec::new();
        for token in tokens {
            match token {
                RankToken::Piece(kind) => squares.push(Some(kind)),
                RankToken::EmptyRun(n) => squares.extend(std::iter::repeat(None).take(n as usize)),
            }
        }
        if squares.len() == 8 {
            Ok(squares)
        } else {
            Err(Rich::custom(span, format!("rank has {} squares, expected 8", squares.len())))
        }
    })
}

fn placement<'s>() -> impl Parser<'s, &'s str, [[Option<PieceKind>; 8]; 8]> {
    rank()
        .separated_by(just('/'))
        .exactly(8)
        .collect::<Vec<_>>()
        .map(|ranks| {
            // FEN lists rank 8 first, descending to rank 1; our board
            // indexes rank 0 = White's first rank.
            let mut placement = [[None; 8]; 8];
            for (fen_row, squares) in ranks.iter().enumerate() {
                let rank_ix = 7 - fen_row;
                for (file_ix, kind) in squares.iter().enumerate() {
                    placement[file_ix][rank_ix] = *kind;
                }
            }
            placement
        })
}

/// Parses a standard six-field FEN string. The placement field — the
/// one part of FEN with real recursive structure (runs of digits
/// interleaved with piece letters) — goes through the [`placement`]
/// combinator; the five remaining whitespace-separated scalar fields
/// are plain tokens and are just split out.
pub fn parse(input: &str) -> Result<ParsedFen, String> {
    let mut fields = input.split_ascii_whitespace();
    let placement_field = fields.next().ok_or("missing placement field")?;
    let side_field = fields.next().ok_or("missing side-to-move field")?;
    let castling = fields.next().ok_or("missing castling field")?.to_string();
    let en_passant = fields.next().ok_or("missing en-passant field")?.to_string();
    let halfmove_field = fields.next().ok_or("missing halfmove field")?;
    let fullmove_field = fields.next().ok_or("missing fullmove field")?;

    let placement_grid = placement()
        .parse(placement_field)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))?;

    let side_to_move = match side_field {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(format!("invalid side-to-move field {other:?}")),
    };

    Ok(ParsedFen {
        placement: placement_grid,
        side_to_move,
        castling,
        en_passant,
        halfmove_clock: halfmove_field.parse().map_err(|_| "invalid halfmove field")?,
        fullmove_number: fullmove_field.parse().map_err(|_| "invalid fullmove field")?,
    })
}

/// Reads off the [`PieceKind`] at a board square from a parsed FEN.
pub fn kind_at(parsed: &ParsedFen, square: Square) -> Option<PieceKind> {
    parsed.placement[square.file as usize][square.rank as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_starting_position() {
        let parsed = parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        assert_eq!(kind_at(&parsed, Square::new(4, 0)), Some(PieceKind::WhiteKing));
        assert_eq!(kind_at(&parsed, Square::new(4, 7)), Some(PieceKind::BlackKing));
        assert_eq!(kind_at(&parsed, Square::new(0, 1)), Some(PieceKind::WhitePawn));
        assert_eq!(kind_at(&parsed, Square::new(4, 4)), None);
        assert_eq!(parsed.side_to_move, Color::White);
        assert_eq!(parsed.castling, "KQkq");
        assert_eq!(parsed.fullmove_number, 1);
    }

    #[test]
    fn parses_black_to_move_and_en_passant_square() {
        let parsed =
            parse("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e6 0 2").unwrap();
        assert_eq!(parsed.side_to_move, Color::Black);
        assert_eq!(parsed.en_passant, "e6");
        assert_eq!(parsed.halfmove_clock, 0);
        assert_eq!(parsed.fullmove_number, 2);
        assert_eq!(kind_at(&parsed, Square::new(4, 3)), Some(PieceKind::WhitePawn));
        assert_eq!(kind_at(&parsed, Square::new(4, 4)), Some(PieceKind::BlackPawn));
    }

    #[test]
    fn reparsing_a_rendered_fen_reproduces_the_board_placement() {
        use crate::startpos;
        let rendered = startpos::standard_start_fen();
        let parsed = parse(&rendered).unwrap();
        let board = startpos::standard_start();
        for file in 0..8u8 {
            for rank in 0..8u8 {
                let square = Square::new(file, rank);
                let expected = board.cell_at(square).map(|cell| cell.kind);
                assert_eq!(kind_at(&parsed, square), expected, "mismatch at {square}");
            }
        }
    }
}
