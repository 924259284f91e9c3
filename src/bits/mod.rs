//! MSB-first bit consumption over a fixed byte slice, used to parse the
//! 24-byte piece-placement stream in a non-initial starting position.

pub mod reader;
