//! The parallel board representation: an 8×8 grid of cells plus a
//! piece-list keyed by piece kind and instance index.
//!
//! The grid and the piece-list are two views onto the same state and
//! must always agree with each other. All mutation is funneled through
//! [`BoardModel::apply_move`] and [`BoardModel::compact`] so the pairing
//! cannot drift, rather than letting call sites poke the grid directly.

use crate::model::{CastleSide, Color, PieceKind, Promotion, Square};

/// An occupied square: which kind of piece, and which instance of that
/// kind (`0..=7`; meaningless for kings).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub kind: PieceKind,
    pub instance: u8,
}

impl Cell {
    pub fn new(kind: PieceKind, instance: u8) -> Self {
        Cell { kind, instance }
    }
}

const KINDS: usize = 12;

/// The board model the move-stream decoder mutates in place.
///
/// `grid[file][rank]` mirrors `pieces[kind.ix()][instance]`: for every
/// occupied cell the two must agree in both directions. Kings always
/// occupy instance 0. Non-royal, non-pawn pieces keep their live
/// instances packed into a `0..n` prefix, closing gaps on capture.
/// Pawns keep the instance they were assigned at game start for their
/// whole life, capture or no capture, since their file of origin is
/// meaningful to callers even after the pawn moves off it.
#[derive(Debug, Clone)]
pub struct BoardModel {
    grid: [[Option<Cell>; 8]; 8],
    pieces: [[Option<Square>; 8]; KINDS],
}

/// Why [`BoardModel::apply_move`] refused to proceed. The move-stream
/// decoder turns this into a per-game [`crate::error::GameDecodeError`]
/// and drops the game rather than panicking — a malformed or
/// mis-decoded byte stream is expected input, not a programming bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptySource {
    pub square: Square,
}

impl BoardModel {
    pub fn empty() -> Self {
        BoardModel {
            grid: [[None; 8]; 8],
            pieces: [[None; 8]; KINDS],
        }
    }

    pub fn cell_at(&self, sq: Square) -> Option<Cell> {
        self.grid[sq.file as usize][sq.rank as usize]
    }

    pub fn square_of(&self, kind: PieceKind, instance: u8) -> Option<Square> {
        self.pieces[kind.ix()][instance as usize]
    }

    /// Places a piece directly on the board without going through
    /// `apply_move`. Used only by the start-position decoder while it
    /// is still assembling the initial position.
    pub fn place(&mut self, sq: Square, kind: PieceKind, instance: u8) {
        self.grid[sq.file as usize][sq.rank as usize] = Some(Cell::new(kind, instance));
        self.pieces[kind.ix()][instance as usize] = Some(sq);
    }

    /// Moves the piece on `src` to `dst`, closing any capture gap left
    /// in the piece list, applying an optional promotion, and — when
    /// `castle` is given — the matching rook relocation.
    ///
    /// `castle` must only be passed when the move-stream decoder has
    /// already established (from the opcode table, not from a `Δ`
    /// heuristic) that this is the designated short/long castle code
    /// for a king.
    pub fn apply_move(
        &mut self,
        src: Square,
        dst: Square,
        promotion: Option<Promotion>,
        castle: Option<CastleSide>,
    ) -> Result<(), EmptySource> {
        let Some(moving) = self.cell_at(src) else {
            return Err(EmptySource { square: src });
        };

        let victim = self.cell_at(dst);
        self.grid[src.file as usize][src.rank as usize] = None;

        if let Some(victim) = victim {
            if !victim.kind.is_king() && !victim.kind.is_pawn() {
                self.compact(victim.kind, victim.instance);
            }
        }

        match promotion {
            Some(promo) => {
                let color = moving.kind.color();
                self.pieces[moving.kind.ix()][moving.instance as usize] = None;
                let promoted_kind = promo.piece_kind(color);
                let new_instance = self.lowest_free_instance(promoted_kind);
                self.grid[dst.file as usize][dst.rank as usize] =
                    Some(Cell::new(promoted_kind, new_instance));
                self.pieces[promoted_kind.ix()][new_instance as usize] = Some(dst);
            }
            None => {
                self.grid[dst.file as usize][dst.rank as usize] = Some(moving);
                self.pieces[moving.kind.ix()][moving.instance as usize] = Some(dst);
            }
        }

        if moving.kind.is_king() {
            if let Some(side) = castle {
                self.relocate_castling_rook(moving.kind.color(), src.rank, side);
            }
        }

        Ok(())
    }

    fn lowest_free_instance(&self, kind: PieceKind) -> u8 {
        self.pieces[kind.ix()]
            .iter()
            .position(Option::is_none)
            .expect("promotion target kind has a free instance slot") as u8
    }

    fn relocate_castling_rook(&mut self, color: Color, back_rank: u8, side: CastleSide) {
        let rook_kind = PieceKind::rook_of(color);
        let (from_file, to_file) = match side {
            CastleSide::Short => (7u8, 5u8),
            CastleSide::Long => (0u8, 3u8),
        };
        let from = Square::new(from_file, back_rank);
        let to = Square::new(to_file, back_rank);
        if let Some(Cell { kind, instance }) = self.cell_at(from) {
            debug_assert_eq!(kind, rook_kind);
            self.grid[from_file as usize][back_rank as usize] = None;
            self.grid[to_file as usize][back_rank as usize] = Some(Cell::new(kind, instance));
            self.pieces[kind.ix()][instance as usize] = Some(to);
        }
    }

    /// Removes instance `removed_idx` of `kind`, shifting every later
    /// instance down by one slot and rewriting the grid cells that
    /// pointed at them, keeping the grid and piece-list in agreement.
    /// Never called for kings or pawns, whose instances are stable for
    /// the whole game.
    pub fn compact(&mut self, kind: PieceKind, removed_idx: u8) {
        debug_assert!(!kind.is_king() && !kind.is_pawn());
        let removed_idx = removed_idx as usize;
        for slot in removed_idx..7 {
            self.pieces[kind.ix()][slot] = self.pieces[kind.ix()][slot + 1];
        }
        self.pieces[kind.ix()][7] = None;

        for file in 0..8 {
            for rank in 0..8 {
                if let Some(cell) = &mut self.grid[file][rank] {
                    if cell.kind == kind && cell.instance as usize > removed_idx {
                        cell.instance -= 1;
                    }
                }
            }
        }
    }

    /// Deep copy used to snapshot state when entering a side variation,
    /// so the board can be restored byte-for-byte on return.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    #[cfg(test)]
    pub fn check_invariants(&self) {
        for file in 0..8usize {
            for rank in 0..8usize {
                if let Some(cell) = self.grid[file][rank] {
                    let sq = Square::new(file as u8, rank as u8);
                    assert_eq!(
                        self.pieces[cell.kind.ix()][cell.instance as usize],
                        Some(sq),
                        "grid/piece-list disagreement at {sq}"
                    );
                }
            }
        }
        for kind in crate::model::PieceKind::VARIANTS {
            for (idx, slot) in self.pieces[kind.ix()].iter().enumerate() {
                if let Some(sq) = slot {
                    assert_eq!(
                        self.cell_at(*sq),
                        Some(Cell::new(*kind, idx as u8)),
                        "piece-list/grid disagreement for {kind:?} #{idx}"
                    );
                }
            }
            if !kind.is_king() && !kind.is_pawn() {
                let occupied = self.pieces[kind.ix()].iter().filter(|s| s.is_some()).count();
                for (idx, slot) in self.pieces[kind.ix()].iter().enumerate() {
                    assert_eq!(
                        slot.is_some(),
                        idx < occupied,
                        "gap in packed instance list for {kind:?} at slot {idx}"
                    );
                }
            }
        }
    }
}
