/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

//! Byte Reader Module
//!
//! Big-endian reader for TPM2 marshalled structures. Every read checks the number of remaining
//! bytes before touching the buffer, so a truncated or crafted quote yields
//! `QuoteError::MalformedMessage` carrying the offset of the failed read instead of a panic or an
//! allocation sized by an attacker controlled length.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;
use crate::error::QuoteError;

pub struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Current reading position (byte offset)
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    /// Number of unread bytes remaining
    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.position())
    }

    fn malformed(&self, field: &str, needed: usize) -> QuoteError {
        QuoteError::MalformedMessage {
            offset: self.position(),
            reason: format!(
                "cannot read {}: need {} bytes but only {} remain",
                field,
                needed,
                self.remaining()
            ),
        }
    }

    fn ensure(&self, field: &str, needed: usize) -> Result<(), QuoteError> {
        if needed > self.remaining() {
            return Err(self.malformed(field, needed));
        }
        Ok(())
    }

    pub fn read_u8(&mut self, field: &str) -> Result<u8, QuoteError> {
        self.ensure(field, 1)?;
        self.cursor.read_u8().map_err(|_| self.malformed(field, 1))
    }

    pub fn read_u16(&mut self, field: &str) -> Result<u16, QuoteError> {
        self.ensure(field, 2)?;
        self.cursor.read_u16::<BigEndian>().map_err(|_| self.malformed(field, 2))
    }

    pub fn read_u32(&mut self, field: &str) -> Result<u32, QuoteError> {
        self.ensure(field, 4)?;
        self.cursor.read_u32::<BigEndian>().map_err(|_| self.malformed(field, 4))
    }

    pub fn read_u64(&mut self, field: &str) -> Result<u64, QuoteError> {
        self.ensure(field, 8)?;
        self.cursor.read_u64::<BigEndian>().map_err(|_| self.malformed(field, 8))
    }

    /// Read `length` bytes, checking the bound before allocating
    pub fn read_bytes(&mut self, length: usize, field: &str) -> Result<Vec<u8>, QuoteError> {
        self.ensure(field, length)?;
        let start = self.position();
        let bytes = self.cursor.get_ref()[start..start + length].to_vec();
        self.cursor.set_position((start + length) as u64);
        Ok(bytes)
    }

    /// Read a TPM2B structure: a u16 size followed by that many bytes
    pub fn read_sized_buffer(&mut self, field: &str) -> Result<Vec<u8>, QuoteError> {
        let size = self.read_u16(field)?;
        self.read_bytes(size as usize, field)
    }
}
