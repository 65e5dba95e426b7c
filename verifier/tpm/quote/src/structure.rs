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

//! TPM structures, including the TPM2.0 magic value, attestation types, clock information,
//! algorithm ids, PCR selection and the quote information carried by `TPMS_ATTEST`.
//! Layouts follow TCG TPM 2.0 Library Part 2: Structures.
//! # Examples
//! See the `deserialize` method for an example of how to use the TpmsAttest struct.
use std::convert::TryFrom;
use log::debug;
use openssl::hash::MessageDigest;
use crate::byte_reader::ByteReader;
use crate::error::QuoteError;
use crate::pcr::decode_selection;

/// TPM_GENERATED_VALUE, byte representation of "\xffTCG"
pub const TPM2_GENERATED_VALUE: u32 = 0xff544347;

/// Smallest marshalled TPMS_PCR_SELECTION: hash (2) + sizeofSelect (1)
const PCR_SELECTION_MIN_SIZE: usize = 3;

/// TPMI_ST_ATTEST
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum TpmStAttest {
    Nv = 0x8014,
    CommandAudit = 0x8015,
    SessionAudit = 0x8016,
    Certify = 0x8017,
    Quote = 0x8018,
    Time = 0x8019,
    Creation = 0x801A,
    NvDigest = 0x801C,
}

impl TryFrom<u16> for TpmStAttest {
    type Error = QuoteError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x8014 => Ok(TpmStAttest::Nv),
            0x8015 => Ok(TpmStAttest::CommandAudit),
            0x8016 => Ok(TpmStAttest::SessionAudit),
            0x8017 => Ok(TpmStAttest::Certify),
            0x8018 => Ok(TpmStAttest::Quote),
            0x8019 => Ok(TpmStAttest::Time),
            0x801A => Ok(TpmStAttest::Creation),
            0x801C => Ok(TpmStAttest::NvDigest),
            _ => Err(QuoteError::UnsupportedAttestationType(value)),
        }
    }
}

impl TpmStAttest {
    pub fn name(&self) -> &'static str {
        match self {
            TpmStAttest::Nv => "TPM_ST_ATTEST_NV",
            TpmStAttest::CommandAudit => "TPM_ST_ATTEST_COMMAND_AUDIT",
            TpmStAttest::SessionAudit => "TPM_ST_ATTEST_SESSION_AUDIT",
            TpmStAttest::Certify => "TPM_ST_ATTEST_CERTIFY",
            TpmStAttest::Quote => "TPM_ST_ATTEST_QUOTE",
            TpmStAttest::Time => "TPM_ST_ATTEST_TIME",
            TpmStAttest::Creation => "TPM_ST_ATTEST_CREATION",
            TpmStAttest::NvDigest => "TPM_ST_ATTEST_NV_DIGEST",
        }
    }
}

/// TPM clock information structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TpmsClockInfo {
    pub clock: u64,         // Milliseconds the TPM has been powered
    pub reset_count: u32,   // TPM Reset count since the last TPM2_Clear()
    pub restart_count: u32, // TPM2_Shutdown() or _TPM_Hash_Start count since the last reset
    pub safe: bool,         // No higher clock value has been reported
}

impl TpmsClockInfo {
    fn deserialize(reader: &mut ByteReader<'_>) -> Result<Self, QuoteError> {
        let clock = reader.read_u64("clock")?;
        let reset_count = reader.read_u32("reset_count")?;
        let restart_count = reader.read_u32("restart_count")?;
        let safe = reader.read_u8("safe")? != 0;

        Ok(TpmsClockInfo {
            clock,
            reset_count,
            restart_count,
            safe,
        })
    }
}

/// Hash algorithms a PCR bank may be quoted with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum AlgorithmId {
    Sha1 = 0x0004,
    Sha256 = 0x000B,
    Sha384 = 0x000C,
    Sha512 = 0x000D,
}

/// TPM_ALG_SM3_256, recognised only so it can be named in diagnostics
const TPM_ALG_SM3_256: u16 = 0x0012;

impl TryFrom<u16> for AlgorithmId {
    type Error = QuoteError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0004 => Ok(AlgorithmId::Sha1),
            0x000B => Ok(AlgorithmId::Sha256),
            0x000C => Ok(AlgorithmId::Sha384),
            0x000D => Ok(AlgorithmId::Sha512),
            _ => Err(QuoteError::UnsupportedHashAlgorithm(value)),
        }
    }
}

impl AlgorithmId {
    pub fn digest_size(&self) -> usize {
        match self {
            AlgorithmId::Sha1 => 20,
            AlgorithmId::Sha256 => 32,
            AlgorithmId::Sha384 => 48,
            AlgorithmId::Sha512 => 64,
        }
    }

    pub fn message_digest(&self) -> MessageDigest {
        match self {
            AlgorithmId::Sha1 => MessageDigest::sha1(),
            AlgorithmId::Sha256 => MessageDigest::sha256(),
            AlgorithmId::Sha384 => MessageDigest::sha384(),
            AlgorithmId::Sha512 => MessageDigest::sha512(),
        }
    }

    /// TCG name of the algorithm, e.g. `TPM_ALG_SHA256`
    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmId::Sha1 => "TPM_ALG_SHA1",
            AlgorithmId::Sha256 => "TPM_ALG_SHA256",
            AlgorithmId::Sha384 => "TPM_ALG_SHA384",
            AlgorithmId::Sha512 => "TPM_ALG_SHA512",
        }
    }

    /// Name of any TPM_ALG_ID value, including ones this crate rejects
    pub fn name_of(id: u16) -> &'static str {
        match AlgorithmId::try_from(id) {
            Ok(alg) => alg.name(),
            Err(_) if id == TPM_ALG_SM3_256 => "TPM_ALG_SM3_256",
            Err(_) => "Unknown",
        }
    }
}

/// PCR selection structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TpmsPcrSelection {
    pub hash_alg: u16,       // TPM_ALG_ID of the bank, resolved later
    pub pcr_select: Vec<u8>, // PCR selection bitmap
}

impl TpmsPcrSelection {
    fn deserialize(reader: &mut ByteReader<'_>) -> Result<Self, QuoteError> {
        let hash_alg = reader.read_u16("pcr_selection.hash")?;
        let size_of_select = reader.read_u8("pcr_selection.sizeofSelect")?;
        let pcr_select = reader.read_bytes(size_of_select as usize, "pcr_selection.pcrSelect")?;

        Ok(TpmsPcrSelection {
            hash_alg,
            pcr_select,
        })
    }

    /// Selected PCR indices in ascending order
    pub fn selected_pcrs(&self) -> Vec<u32> {
        decode_selection(&self.pcr_select)
    }

    /// Check if the specified PCR index is selected
    pub fn is_pcr_selected(&self, pcr_index: u32) -> bool {
        let byte_index = (pcr_index / 8) as usize;
        let mask = 1u8 << (pcr_index % 8);

        self.pcr_select
            .get(byte_index)
            .map_or(false, |byte| byte & mask != 0)
    }
}

/// TPMS_QUOTE_INFO
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TpmsQuoteInfo {
    pub pcr_select: Vec<TpmsPcrSelection>, // TPML_PCR_SELECTION
    pub pcr_digest: Vec<u8>,               // Digest of the selected PCRs
}

impl TpmsQuoteInfo {
    fn deserialize(reader: &mut ByteReader<'_>) -> Result<Self, QuoteError> {
        let start = reader.position();
        let count = reader.read_u32("pcr_select.count")?;

        // Each entry occupies at least three bytes, reject counts the buffer cannot hold
        let min_len = (count as u64).saturating_mul(PCR_SELECTION_MIN_SIZE as u64);
        if min_len > reader.remaining() as u64 {
            return Err(QuoteError::MalformedMessage {
                offset: start,
                reason: format!(
                    "PCR selection count {} needs at least {} bytes but only {} remain",
                    count,
                    min_len,
                    reader.remaining()
                ),
            });
        }

        let mut pcr_select = Vec::with_capacity(count as usize);
        for _ in 0..count {
            pcr_select.push(TpmsPcrSelection::deserialize(reader)?);
        }

        let pcr_digest = reader.read_sized_buffer("pcr_digest")?;

        Ok(TpmsQuoteInfo {
            pcr_select,
            pcr_digest,
        })
    }
}

/// TPMU_ATTEST, restricted to the quote arm
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attested {
    Quote(TpmsQuoteInfo),
}

impl Attested {
    pub fn attestation_type(&self) -> TpmStAttest {
        match self {
            Attested::Quote(_) => TpmStAttest::Quote,
        }
    }

    pub fn quote(&self) -> &TpmsQuoteInfo {
        match self {
            Attested::Quote(info) => info,
        }
    }
}

/// TPMS_ATTEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TpmsAttest {
    pub magic: u32,                // TPM_GENERATED_VALUE
    pub qualified_signer: Vec<u8>, // TPM2B_NAME of the signing key
    pub extra_data: Vec<u8>,       // TPM2B_DATA, the caller nonce
    pub clock_info: TpmsClockInfo,
    pub firmware_version: u64,
    pub attested: Attested,
}

impl TpmsAttest {
    /// Parse a marshalled `TPMS_ATTEST` produced by TPM2_Quote
    ///
    /// # Arguments
    /// * `data` - Raw quote message bytes, big-endian as the TPM emits them
    ///
    /// # Returns
    /// * `Result<Self, QuoteError>` - Parsed structure or error
    ///
    /// # Errors
    /// * `QuoteError::NotTpmGenerated` - The magic value is not TPM_GENERATED_VALUE
    /// * `QuoteError::UnsupportedAttestationType` - The structure is not a quote
    /// * `QuoteError::MalformedMessage` - The buffer is truncated or a length field overruns it
    ///
    /// # Example
    /// ```ignore
    /// let quote = TpmsAttest::deserialize(&message)?;
    /// println!("firmware {:x}", quote.firmware_version);
    /// ```
    pub fn deserialize(data: &[u8]) -> Result<Self, QuoteError> {
        let mut reader = ByteReader::new(data);

        let magic = reader.read_u32("magic")?;
        if magic != TPM2_GENERATED_VALUE {
            return Err(QuoteError::NotTpmGenerated(magic));
        }

        let type_ = TpmStAttest::try_from(reader.read_u16("type")?)?;
        if type_ != TpmStAttest::Quote {
            return Err(QuoteError::UnsupportedAttestationType(type_ as u16));
        }

        let qualified_signer = reader.read_sized_buffer("qualified_signer")?;
        let extra_data = reader.read_sized_buffer("extra_data")?;
        let clock_info = TpmsClockInfo::deserialize(&mut reader)?;
        let firmware_version = reader.read_u64("firmware_version")?;
        let attested = Attested::Quote(TpmsQuoteInfo::deserialize(&mut reader)?);

        if reader.remaining() > 0 {
            debug!("Ignoring {} trailing bytes after TPMS_ATTEST", reader.remaining());
        }

        Ok(TpmsAttest {
            magic,
            qualified_signer,
            extra_data,
            clock_info,
            firmware_version,
            attested,
        })
    }

    pub fn attestation_type(&self) -> TpmStAttest {
        self.attested.attestation_type()
    }

    pub fn quote_info(&self) -> &TpmsQuoteInfo {
        self.attested.quote()
    }
}
