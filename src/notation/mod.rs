//! Parses the FEN text this crate's own writers emit, used only to
//! verify the starting-position round trip (render then re-parse).

pub mod fen;
