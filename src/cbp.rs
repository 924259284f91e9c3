//! Reads player names out of a `.cbp` file. Records are version-dispatched:
//! the byte at 0x18 of the file selects where record 0 begins, then every
//! record after it is a fixed 67 bytes.

use crate::latin1::decode_nul_terminated;

pub const RECORD_SIZE: usize = 67;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CbpError {
    UnknownVersion(u8),
    FileTooShort,
}

pub struct PlayerTable<'a> {
    bytes: &'a [u8],
    first_record_offset: usize,
}

impl<'a> PlayerTable<'a> {
    pub fn open(bytes: &'a [u8]) -> Result<Self, CbpError> {
        if bytes.len() <= 0x18 {
            return Err(CbpError::FileTooShort);
        }
        let first_record_offset = match bytes[0x18] {
            4 => 32,
            0 => 28,
            other => return Err(CbpError::UnknownVersion(other)),
        };
        Ok(PlayerTable { bytes, first_record_offset })
    }

    /// `"Last, First"`, matching the convention PGN's `White`/`Black`
    /// tags expect.
    pub fn name(&self, player_no: u32) -> Option<String> {
        let record_offset = self.first_record_offset + (player_no as usize) * RECORD_SIZE;
        let record = self.bytes.get(record_offset..record_offset + RECORD_SIZE)?;

        let last_name = decode_nul_terminated(&record[9..9 + 30]);
        let first_name = decode_nul_terminated(&record[39..39 + 20]);
        Some(format!("{last_name}, {first_name}"))
    }
}
