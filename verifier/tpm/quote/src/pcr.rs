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

//! PCR values, selection decoding and digest verification.
//!
//! The selection order produced by [`decode_selection`] is the order the TPM concatenates PCR
//! values in when it computes the quote digest. Both [`PcrValues::from_raw`] and
//! [`PcrValues::calculate_digest`] rely on it.
//! # Examples
//! See the `verify_digest` method for an example of how to use the PcrValues struct.
use std::collections::BTreeMap;
use log::debug;
use crate::crypto_utils::CryptoVerifier;
use crate::error::QuoteError;
use crate::structure::AlgorithmId;

/// Decode a TPMS_PCR_SELECTION bitmap into PCR indices
///
/// Bit `b` of byte `i` selects PCR `8 * i + b`. Indices are returned in ascending byte-then-bit
/// order.
///
/// # Example
/// ```
/// use tpm_quote_verifier::decode_selection;
///
/// assert_eq!(decode_selection(&[0x03]), vec![0, 1]);
/// assert_eq!(decode_selection(&[0x80, 0x01]), vec![7, 8]);
/// ```
pub fn decode_selection(bitmap: &[u8]) -> Vec<u32> {
    let mut list = Vec::new();
    for (byte_index, byte) in bitmap.iter().enumerate() {
        for bit in 0..8u32 {
            if byte & (1 << bit) != 0 {
                list.push(byte_index as u32 * 8 + bit);
            }
        }
    }
    list
}

/// PCR values of one bank, keyed by PCR index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcrValues {
    hash_alg: AlgorithmId,
    pcr_values: BTreeMap<u32, Vec<u8>>,
}

impl PcrValues {
    /// Split a raw "values" blob into per-PCR digests
    ///
    /// The blob is the concatenation of fixed-size digests without framing. Chunk `i` belongs to
    /// `selection[i]`, whatever its numeric value.
    ///
    /// # Arguments
    /// * `raw` - Concatenated PCR digests
    /// * `selection` - PCR indices as decoded from the quote
    /// * `hash_alg` - Bank algorithm, fixes the digest size
    ///
    /// # Errors
    /// * `QuoteError::PcrLengthMismatch` - The blob does not hold exactly one digest per selected PCR
    pub fn from_raw(raw: &[u8], selection: &[u32], hash_alg: AlgorithmId) -> Result<Self, QuoteError> {
        let digest_size = hash_alg.digest_size();
        let expected = selection.len() * digest_size;
        if raw.len() % digest_size != 0 || raw.len() / digest_size != selection.len() {
            return Err(QuoteError::PcrLengthMismatch {
                expected,
                actual: raw.len(),
            });
        }

        let pcr_values = selection
            .iter()
            .zip(raw.chunks_exact(digest_size))
            .map(|(index, chunk)| (*index, chunk.to_vec()))
            .collect();

        Ok(Self { hash_alg, pcr_values })
    }

    pub fn hash_algorithm(&self) -> AlgorithmId {
        self.hash_alg
    }

    pub fn get(&self, index: u32) -> Option<&[u8]> {
        self.pcr_values.get(&index).map(Vec::as_slice)
    }

    pub fn indices(&self) -> Vec<u32> {
        self.pcr_values.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u8])> {
        self.pcr_values.iter().map(|(index, value)| (*index, value.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.pcr_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pcr_values.is_empty()
    }

    /// Hash the PCR values concatenated in selection order
    ///
    /// # Errors
    /// * `QuoteError::PcrLengthMismatch` - A selected PCR has no value in this bank
    pub fn calculate_digest(&self, selection: &[u32]) -> Result<Vec<u8>, QuoteError> {
        let mut parts: Vec<&[u8]> = Vec::with_capacity(selection.len());
        for index in selection {
            let value = self.get(*index).ok_or(QuoteError::PcrLengthMismatch {
                expected: selection.len() * self.hash_alg.digest_size(),
                actual: self.pcr_values.len() * self.hash_alg.digest_size(),
            })?;
            parts.push(value);
        }

        CryptoVerifier::digest(self.hash_alg, &parts)
    }

    /// Verify the PCR values against the digest signed in the quote
    ///
    /// # Arguments
    /// * `selection` - The same selection order used to build these values
    /// * `expected` - `pcrDigest` from the parsed quote
    ///
    /// # Errors
    /// * `QuoteError::DigestMismatch` - The recomputed digest differs from the quote digest
    ///
    /// # Example
    /// ```
    /// use tpm_quote_verifier::{AlgorithmId, CryptoVerifier, PcrValues};
    ///
    /// let raw = [[0x11u8; 32], [0x22u8; 32]].concat();
    /// let values = PcrValues::from_raw(&raw, &[0, 1], AlgorithmId::Sha256).unwrap();
    /// let digest = CryptoVerifier::digest(AlgorithmId::Sha256, &[raw.as_slice()]).unwrap();
    /// assert!(values.verify_digest(&[0, 1], &digest).is_ok());
    /// ```
    pub fn verify_digest(&self, selection: &[u32], expected: &[u8]) -> Result<(), QuoteError> {
        let calculated = self.calculate_digest(selection)?;

        if !CryptoVerifier::constant_time_eq(&calculated, expected) {
            return Err(QuoteError::DigestMismatch {
                expected: hex::encode(expected),
                calculated: hex::encode(&calculated),
            });
        }

        debug!("PCR digest verified over {} PCRs", selection.len());
        Ok(())
    }
}

/// Extend a PCR value with a measurement, as TPM2_PCR_Extend does: `H(current || measurement)`
///
/// # Errors
/// * `QuoteError::PcrLengthMismatch` - `current` is not a digest of `hash_alg`
pub fn extend(hash_alg: AlgorithmId, current: &[u8], measurement: &[u8]) -> Result<Vec<u8>, QuoteError> {
    if current.len() != hash_alg.digest_size() {
        return Err(QuoteError::PcrLengthMismatch {
            expected: hash_alg.digest_size(),
            actual: current.len(),
        });
    }
    CryptoVerifier::digest(hash_alg, &[current, measurement])
}

/// Calculates the final PCR value by extending each measurement in turn, starting from `initial`
pub fn replay<M: AsRef<[u8]>>(
    hash_alg: AlgorithmId,
    initial: &[u8],
    measurements: &[M],
) -> Result<Vec<u8>, QuoteError> {
    if initial.len() != hash_alg.digest_size() {
        return Err(QuoteError::PcrLengthMismatch {
            expected: hash_alg.digest_size(),
            actual: initial.len(),
        });
    }

    let mut current = initial.to_vec();
    for measurement in measurements {
        current = extend(hash_alg, &current, measurement.as_ref())?;
    }
    Ok(current)
}
