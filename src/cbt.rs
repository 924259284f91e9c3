//! Reads tournament title/site pairs out of a `.cbt` file. Same
//! version-dispatch convention as [`crate::cbp`], with 99-byte records.

use crate::latin1::decode_nul_terminated;

pub const RECORD_SIZE: usize = 99;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CbtError {
    UnknownVersion(u8),
    FileTooShort,
}

pub struct TournamentTable<'a> {
    bytes: &'a [u8],
    first_record_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentInfo {
    pub title: String,
    pub site: String,
}

impl<'a> TournamentTable<'a> {
    pub fn open(bytes: &'a [u8]) -> Result<Self, CbtError> {
        if bytes.len() <= 0x18 {
            return Err(CbtError::FileTooShort);
        }
        let first_record_offset = match bytes[0x18] {
            4 => 32,
            0 => 28,
            other => return Err(CbtError::UnknownVersion(other)),
        };
        Ok(TournamentTable { bytes, first_record_offset })
    }

    pub fn info(&self, tournament_no: u32) -> Option<TournamentInfo> {
        let record_offset = self.first_record_offset + (tournament_no as usize) * RECORD_SIZE;
        let record = self.bytes.get(record_offset..record_offset + RECORD_SIZE)?;

        let title = decode_nul_terminated(&record[9..9 + 40]);
        let site = decode_nul_terminated(&record[49..49 + 30]);
        Some(TournamentInfo { title, site })
    }
}
