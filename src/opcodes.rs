//! The sixteen dense one-byte opcode tables and the two-byte escape's
//! de-obfuscation permutation.
//!
//! These are data, not logic: every entry below is a literal
//! transcription of the binary format's obfuscation contract, keyed by
//! the de-obfuscated byte value. Transcription errors here would
//! silently corrupt every decoded game, so the tables are kept exactly
//! as wide as the format defines them and cross-checked by the
//! disjointness test at the bottom of this module.

use crate::model::CastleSide;
use static_init::Lazy;

/// Which family of piece a one-byte opcode belongs to. Combined with
/// the instance number (0, 1, 2 for officers; 0..7 for pawns, where a
/// pawn's instance is always its file of origin) this identifies
/// exactly which piece on the board the opcode moves. The same tables
/// serve both colors — the decoder resolves `Role` + instance + the
/// current side to move into a concrete `PieceKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

/// A single resolved opcode: which piece moves, by how much, and
/// whether this is one of the two designated king moves that also
/// relocates a rook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeEntry {
    pub role: Role,
    pub instance: u8,
    pub df: i8,
    pub dr: i8,
    pub castle: Option<CastleSide>,
}

type Entry = (u8, i8, i8);

const KING: [Entry; 10] = [
    (0x49, 0, 1),
    (0x39, 1, 1),
    (0xD8, 1, 0),
    (0x5D, 1, 7),
    (0xC2, 0, 7),
    (0xB1, 7, 7),
    (0xB2, 7, 0),
    (0x47, 7, 1),
    (0x76, 2, 0),
    (0xB5, -2, 0),
];

const QUEEN_1: [Entry; 28] = [
    (0xA5, 0, 2),
    (0xB8, 0, 2),
    (0xCB, 0, 3),
    (0x53, 0, 4),
    (0x7F, 0, 5),
    (0x6B, 0, 6),
    (0x8D, 0, 7),
    (0x79, 1, 0),
    (0xBE, 2, 0),
    (0xEB, 3, 0),
    (0x21, 4, 0),
    (0x99, 5, 0),
    (0xD2, 6, 0),
    (0x57, 7, 0),
    (0x4D, 1, 1),
    (0xB4, 2, 2),
    (0xBF, 3, 3),
    (0x62, 4, 4),
    (0xBD, 5, 5),
    (0x24, 6, 6),
    (0x96, 7, 7),
    (0xA7, 1, 7),
    (0x48, 2, 6),
    (0x28, 3, 5),
    (0x6E, 4, 4),
    (0x2F, 5, 3),
    (0x5A, 6, 2),
    (0x18, 7, 1),
];

const QUEEN_2: [Entry; 28] = [
    (0xE5, 0, 1),
    (0x94, 0, 2),
    (0x50, 0, 3),
    (0x11, 0, 4),
    (0xEA, 0, 5),
    (0x31, 0, 6),
    (0x01, 0, 7),
    (0x5C, 1, 0),
    (0x95, 2, 0),
    (0xCA, 3, 0),
    (0xD3, 4, 0),
    (0x1D, 5, 0),
    (0x7E, 6, 0),
    (0xEF, 7, 0),
    (0x44, 1, 1),
    (0x80, 2, 2),
    (0xA0, 3, 3),
    (0x1F, 4, 4),
    (0x83, 5, 5),
    (0x00, 6, 6),
    (0x4B, 7, 7),
    (0x67, 1, 7),
    (0x20, 2, 6),
    (0x5B, 3, 5),
    (0x2A, 4, 4),
    (0x92, 5, 3),
    (0xB6, 6, 2),
    (0x60, 7, 1),
];

const QUEEN_3: [Entry; 28] = [
    (0x1A, 0, 1),
    (0x42, 0, 2),
    (0x0F, 0, 3),
    (0x0D, 0, 4),
    (0xB0, 0, 5),
    (0xD1, 0, 6),
    (0x23, 0, 7),
    (0xF0, 1, 0),
    (0x7A, 2, 0),
    (0x54, 3, 0),
    (0x4F, 4, 0),
    (0xF4, 5, 0),
    (0xA8, 6, 0),
    (0x72, 7, 0),
    (0xE7, 1, 1),
    (0x40, 2, 2),
    (0x38, 3, 3),
    (0x59, 4, 4),
    (0x87, 5, 5),
    (0xE8, 6, 6),
    (0x6C, 7, 7),
    (0x86, 1, 7),
    (0x04, 2, 6),
    (0xF1, 3, 5),
    (0x8C, 4, 4),
    (0xCE, 5, 3),
    (0x6A, 6, 2),
    (0xDB, 7, 1),
];

const ROOK_1: [Entry; 14] = [
    (0x4E, 0, 1),
    (0xF8, 0, 2),
    (0x43, 0, 3),
    (0xD7, 0, 4),
    (0x63, 0, 5),
    (0x9C, 0, 6),
    (0xE6, 0, 7),
    (0x2E, 1, 0),
    (0xC6, 2, 0),
    (0x26, 3, 0),
    (0x88, 4, 0),
    (0x30, 5, 0),
    (0x61, 6, 0),
    (0x6F, 7, 0),
];

const ROOK_2: [Entry; 14] = [
    (0x14, 0, 1),
    (0xA9, 0, 2),
    (0x68, 0, 3),
    (0xEE, 0, 4),
    (0xFB, 0, 5),
    (0x77, 0, 6),
    (0xE2, 0, 7),
    (0xA6, 1, 0),
    (0x05, 2, 0),
    (0x8B, 3, 0),
    (0xA1, 4, 0),
    (0x98, 5, 0),
    (0x32, 6, 0),
    (0x52, 7, 0),
];

const ROOK_3: [Entry; 14] = [
    (0x81, 0, 1),
    (0x82, 0, 2),
    (0x9A, 0, 3),
    (0x1B, 0, 4),
    (0x9D, 0, 5),
    (0x0A, 0, 6),
    (0x2B, 0, 7),
    (0x8F, 1, 0),
    (0xCD, 2, 0),
    (0xED, 3, 0),
    (0x10, 4, 0),
    (0x74, 5, 0),
    (0x69, 6, 0),
    (0xD6, 7, 0),
];

const BISHOP_1: [Entry; 14] = [
    (0x02, 1, 1),
    (0x97, 2, 2),
    (0xE1, 3, 3),
    (0x41, 4, 4),
    (0xC3, 5, 5),
    (0x7C, 6, 6),
    (0xE4, 7, 7),
    (0x06, 1, 7),
    (0xB7, 2, 6),
    (0x55, 3, 5),
    (0xD9, 4, 4),
    (0x2C, 5, 3),
    (0xAE, 6, 2),
    (0x37, 7, 1),
];

const BISHOP_2: [Entry; 14] = [
    (0xF6, 1, 1),
    (0x3F, 2, 2),
    (0x08, 3, 3),
    (0x93, 4, 4),
    (0x73, 5, 5),
    (0x5E, 6, 6),
    (0x78, 7, 7),
    (0x35, 1, 7),
    (0xF2, 2, 6),
    (0x6D, 3, 5),
    (0x71, 4, 4),
    (0xA2, 5, 3),
    (0xF3, 6, 2),
    (0x16, 7, 1),
];

const BISHOP_3: [Entry; 14] = [
    (0x51, 1, 1),
    (0xB9, 2, 2),
    (0x45, 3, 3),
    (0x3B, 4, 4),
    (0x56, 5, 5),
    (0x91, 6, 6),
    (0xFD, 7, 7),
    (0xAB, 1, 7),
    (0x66, 2, 6),
    (0x3E, 3, 5),
    (0x46, 4, 4),
    (0xB3, 5, 3),
    (0xFC, 6, 2),
    (0xC8, 7, 1),
];

const KNIGHT_1: [Entry; 8] = [
    (0x58, 2, 1),
    (0x3D, 1, 2),
    (0xFA, -1, 2),
    (0xE9, -2, 1),
    (0xBA, -2, -1),
    (0xD4, -1, -2),
    (0xDD, 1, -2),
    (0x4A, 2, -1),
];

const KNIGHT_2: [Entry; 8] = [
    (0xC4, 2, 1),
    (0x0E, 1, 2),
    (0xFE, -1, 2),
    (0x5F, -2, 1),
    (0x75, -2, -1),
    (0x07, -1, -2),
    (0x89, 1, -2),
    (0x34, 2, -1),
];

const KNIGHT_3: [Entry; 8] = [
    (0x9B, 2, 1),
    (0xC0, 1, 2),
    (0xE3, -1, 2),
    (0xA3, -2, 1),
    (0xAC, -2, -1),
    (0xC9, -1, -2),
    (0xEC, 1, -2),
    (0x27, 2, -1),
];

/// One four-entry table per file of origin (a..h); a pawn's table
/// never changes across its lifetime because its instance is pinned to
/// its birth file.
const PAWN_FILES: [[Entry; 4]; 8] = [
    [(0x2D, 0, 1), (0xC1, 0, 2), (0x8E, 1, 1), (0xF5, -1, 1)],
    [(0x64, 0, 1), (0x17, 0, 2), (0x70, 1, 1), (0xA4, -1, 1)],
    [(0x7B, 0, 1), (0xDA, 0, 2), (0xE0, 1, 1), (0x85, -1, 1)],
    [(0xC5, 0, 1), (0x0B, 0, 2), (0x90, 1, 1), (0xF9, -1, 1)],
    [(0x84, 0, 2), (0xFF, 0, 1), (0x15, 1, 1), (0x36, -1, 1)],
    [(0x09, 0, 1), (0x9E, 0, 2), (0x7D, 1, 1), (0xDE, -1, 1)],
    [(0xBB, 0, 1), (0xDF, 0, 2), (0xBC, 1, 1), (0x3A, -1, 1)],
    [(0x12, 0, 1), (0x33, 0, 2), (0x13, 1, 1), (0x19, -1, 1)],
];

/// De-obfuscation permutation applied to each of the two payload bytes
/// of a two-byte escape, after counter subtraction.
pub const DEOBF2B: [u8; 256] = [
    0xA2, 0x95, 0x43, 0xF5, 0xC1, 0x3D, 0x4A, 0x6C, 0x53, 0x83, 0xCC, 0x7C, 0xFF, 0xAE, 0x68, 0xAD,
    0xD1, 0x92, 0x8B, 0x8D, 0x35, 0x81, 0x5E, 0x74, 0x26, 0x8E, 0xAB, 0xCA, 0xFD, 0x9A, 0xF3, 0xA0,
    0xA5, 0x15, 0xFC, 0xB1, 0x1E, 0xED, 0x30, 0xEA, 0x22, 0xEB, 0xA7, 0xCD, 0x4E, 0x6F, 0x2E, 0x24,
    0x32, 0x94, 0x41, 0x8C, 0x6E, 0x58, 0x82, 0x50, 0xBB, 0x02, 0x8A, 0xD8, 0xFA, 0x60, 0xDE, 0x52,
    0xBA, 0x46, 0xAC, 0x29, 0x9D, 0xD7, 0xDF, 0x08, 0x21, 0x01, 0x66, 0xA3, 0xF1, 0x19, 0x27, 0xB5,
    0x91, 0xD5, 0x42, 0x0E, 0xB4, 0x4C, 0xD9, 0x18, 0x5F, 0xBC, 0x25, 0xA6, 0x96, 0x04, 0x56, 0x6A,
    0xAA, 0x33, 0x1C, 0x2B, 0x73, 0xF0, 0xDD, 0xA4, 0x37, 0xD3, 0xC5, 0x10, 0xBF, 0x5A, 0x23, 0x34,
    0x75, 0x5B, 0xB8, 0x55, 0xD2, 0x6B, 0x09, 0x3A, 0x57, 0x12, 0xB3, 0x77, 0x48, 0x85, 0x9B, 0x0F,
    0x9E, 0xC7, 0xC8, 0xA1, 0x7F, 0x7A, 0xC0, 0xBD, 0x31, 0x6D, 0xF6, 0x3E, 0xC3, 0x11, 0x71, 0xCE,
    0x7D, 0xDA, 0xA8, 0x54, 0x90, 0x97, 0x1F, 0x44, 0x40, 0x16, 0xC9, 0xE3, 0x2C, 0xCB, 0x84, 0xEC,
    0x9F, 0x3F, 0x5C, 0xE6, 0x76, 0x0B, 0x3C, 0x20, 0xB7, 0x36, 0x00, 0xDC, 0xE7, 0xF9, 0x4F, 0xF7,
    0xAF, 0x06, 0x07, 0xE0, 0x1A, 0x0A, 0xA9, 0x4B, 0x0C, 0xD6, 0x63, 0x87, 0x89, 0x1D, 0x13, 0x1B,
    0xE4, 0x70, 0x05, 0x47, 0x67, 0x7B, 0x2F, 0xEE, 0xE2, 0xE8, 0x98, 0x0D, 0xEF, 0xCF, 0xC4, 0xF4,
    0xFB, 0xB0, 0x17, 0x99, 0x64, 0xF2, 0xD4, 0x2A, 0x03, 0x4D, 0x78, 0xC6, 0xFE, 0x65, 0x86, 0x88,
    0x79, 0x45, 0x3B, 0xE5, 0x49, 0x8F, 0x2D, 0xB9, 0xBE, 0x62, 0x93, 0x14, 0xE9, 0xD0, 0x38, 0x9C,
    0xB2, 0xC2, 0x59, 0x5D, 0xB6, 0x72, 0x51, 0xF8, 0x28, 0x7E, 0x61, 0x39, 0xE1, 0xDB, 0x69, 0x80,
];

/// The four byte values that are never ordinary opcodes: two-byte
/// escape, variation push, variation pop, and the no-op filler.
/// `0xAA` (null move) is deliberately absent — it is an ordinary
/// opcode for counter purposes even though it carries no table entry.
pub const SPECIAL_CODES: [u8; 4] = [0x29, 0xDC, 0x0C, 0x9F];

/// Opcode for the null move. Ordinary for counter purposes (it is not
/// in [`SPECIAL_CODES`]), but has no table entry: the decoder matches
/// it explicitly before falling through to table lookup.
pub const NULL_MOVE: u8 = 0xAA;

fn fill(table: &mut [Option<OpcodeEntry>; 256], entries: &[Entry], role: Role, instance: u8) {
    for &(byte, df, dr) in entries {
        let castle = match (role, byte) {
            (Role::King, 0x76) => Some(CastleSide::Short),
            (Role::King, 0xB5) => Some(CastleSide::Long),
            _ => None,
        };
        let prev = table[byte as usize].replace(OpcodeEntry { role, instance, df, dr, castle });
        assert!(prev.is_none(), "opcode 0x{byte:02X} assigned twice");
    }
}

fn build_table() -> [Option<OpcodeEntry>; 256] {
    let mut table: [Option<OpcodeEntry>; 256] = [None; 256];
    fill(&mut table, &KING, Role::King, 0);
    fill(&mut table, &QUEEN_1, Role::Queen, 0);
    fill(&mut table, &QUEEN_2, Role::Queen, 1);
    fill(&mut table, &QUEEN_3, Role::Queen, 2);
    fill(&mut table, &ROOK_1, Role::Rook, 0);
    fill(&mut table, &ROOK_2, Role::Rook, 1);
    fill(&mut table, &ROOK_3, Role::Rook, 2);
    fill(&mut table, &BISHOP_1, Role::Bishop, 0);
    fill(&mut table, &BISHOP_2, Role::Bishop, 1);
    fill(&mut table, &BISHOP_3, Role::Bishop, 2);
    fill(&mut table, &KNIGHT_1, Role::Knight, 0);
    fill(&mut table, &KNIGHT_2, Role::Knight, 1);
    fill(&mut table, &KNIGHT_3, Role::Knight, 2);
    for (file, entries) in PAWN_FILES.iter().enumerate() {
        fill(&mut table, entries, Role::Pawn, file as u8);
    }
    table
}

/// The combined lookup: de-obfuscated byte → resolved opcode, or
/// `None` for special codes, the null move, and the documented-unused
/// byte values.
pub static OPCODES: Lazy<[Option<OpcodeEntry>; 256]> = Lazy::new(build_table);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_pairwise_disjoint() {
        // build_table() itself panics on any collision; simply forcing
        // construction is the test.
        let table = &*OPCODES;
        let populated = table.iter().filter(|e| e.is_some()).count();
        assert_eq!(populated, 10 + 28 * 3 + 14 * 3 + 14 * 3 + 8 * 3 + 4 * 8);
    }

    #[test]
    fn tables_disjoint_from_special_codes_and_null_move() {
        let table = &*OPCODES;
        for byte in SPECIAL_CODES {
            assert!(table[byte as usize].is_none(), "0x{byte:02X} is a special code, not an opcode");
        }
        assert!(table[NULL_MOVE as usize].is_none(), "null move has no table entry");
    }

    #[test]
    fn castle_codes_are_marked_on_the_king_table() {
        let table = &*OPCODES;
        let short = table[0x76].unwrap();
        assert_eq!(short.castle, Some(CastleSide::Short));
        assert_eq!((short.df, short.dr), (2, 0));
        let long = table[0xB5].unwrap();
        assert_eq!(long.castle, Some(CastleSide::Long));
        assert_eq!((long.df, long.dr), (-2, 0));
    }

    #[test]
    fn deobf2b_is_a_permutation() {
        let mut seen = [false; 256];
        for &b in DEOBF2B.iter() {
            assert!(!seen[b as usize], "0x{b:02X} repeated in DEOBF2B");
            seen[b as usize] = true;
        }
    }
}
