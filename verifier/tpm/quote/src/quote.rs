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

//! Quote verifier, verify quote signature, nonce and PCR values.
//! # Examples
//! See the `attest` function for the complete pipeline, or the `QuoteVerifier` struct to run
//! individual checks.
use std::convert::TryFrom;
use log::{debug, warn};
use crate::crypto_utils::CryptoVerifier;
use crate::error::QuoteError;
use crate::pcr::PcrValues;
use crate::structure::{AlgorithmId, TpmsAttest, TpmsPcrSelection};

/// Outcome of a successful attestation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationResult {
    pub quote: TpmsAttest,
    pub hash_alg: AlgorithmId,
    pub pcr_selection: Vec<u32>,
    pub pcr_values: PcrValues,
}

/// A parsed quote together with the raw bytes its signature covers
#[derive(Debug)]
pub struct QuoteVerifier<'a> {
    message: &'a [u8],
    quote_data: TpmsAttest,
}

impl<'a> QuoteVerifier<'a> {
    /// Create QuoteVerifier from a raw quote message
    ///
    /// # Errors
    /// * Any parse error of `TpmsAttest::deserialize`
    pub fn new(message: &'a [u8]) -> Result<Self, QuoteError> {
        let quote_data = TpmsAttest::deserialize(message)?;
        Ok(Self { message, quote_data })
    }

    pub fn quote(&self) -> &TpmsAttest {
        &self.quote_data
    }

    /// Verify the quote signature over the raw message
    pub fn verify_signature(&self, public_key_pem: &[u8], signature: &[u8]) -> Result<(), QuoteError> {
        CryptoVerifier::verify_quote_signature(public_key_pem, self.message, signature)
    }

    /// Compare the extra data of the quote with the caller nonce in constant time
    pub fn verify_nonce(&self, nonce: &[u8]) -> Result<(), QuoteError> {
        if !CryptoVerifier::constant_time_eq(&self.quote_data.extra_data, nonce) {
            return Err(QuoteError::NonceMismatch);
        }
        Ok(())
    }

    /// The single PCR selection of the quote
    ///
    /// # Errors
    /// * `QuoteError::UnsupportedPcrSelectionCount` - The quote has zero or several selections
    pub fn pcr_selection(&self) -> Result<&TpmsPcrSelection, QuoteError> {
        match self.quote_data.quote_info().pcr_select.as_slice() {
            [selection] => Ok(selection),
            selections => Err(QuoteError::UnsupportedPcrSelectionCount(selections.len() as u32)),
        }
    }

    /// Resolve the bank algorithm of the selection
    pub fn hash_algorithm(&self) -> Result<AlgorithmId, QuoteError> {
        let selection = self.pcr_selection()?;
        AlgorithmId::try_from(selection.hash_alg).map_err(|e| {
            warn!("PCR bank uses {}, which is not supported", AlgorithmId::name_of(selection.hash_alg));
            e
        })
    }

    /// Bind a raw PCR values blob to the digest signed in the quote
    ///
    /// # Arguments
    /// * `raw_pcr_values` - Concatenated PCR digests in selection order
    ///
    /// # Returns
    /// * `Result<(AlgorithmId, Vec<u32>, PcrValues), QuoteError>` - Bank algorithm, selection
    ///   order and the verified values
    pub fn verify_pcr_values(
        &self,
        raw_pcr_values: &[u8],
    ) -> Result<(AlgorithmId, Vec<u32>, PcrValues), QuoteError> {
        let selection = self.pcr_selection()?;
        let hash_alg = self.hash_algorithm()?;

        let order = selection.selected_pcrs();
        if order.is_empty() {
            warn!("Quote selects no PCRs, only the empty digest can be verified");
        }
        debug!("Quote selects PCRs {:?} in bank {}", order, hash_alg.name());

        let pcr_values = PcrValues::from_raw(raw_pcr_values, &order, hash_alg)?;
        pcr_values.verify_digest(&order, &self.quote_data.quote_info().pcr_digest)?;

        Ok((hash_alg, order, pcr_values))
    }

    /// Run every check on an already parsed quote
    ///
    /// # Arguments
    /// * `public_key_pem` - PEM encoded attestation public key
    /// * `raw_pcr_values` - Concatenated PCR digests in selection order
    /// * `signature` - Raw signature over the message
    /// * `nonce` - Nonce the quote was requested with
    pub fn verify(
        self,
        public_key_pem: &[u8],
        raw_pcr_values: &[u8],
        signature: &[u8],
        nonce: &[u8],
    ) -> Result<AttestationResult, QuoteError> {
        self.verify_signature(public_key_pem, signature)?;
        self.verify_nonce(nonce)?;
        let (hash_alg, pcr_selection, pcr_values) = self.verify_pcr_values(raw_pcr_values)?;

        Ok(AttestationResult {
            quote: self.quote_data,
            hash_alg,
            pcr_selection,
            pcr_values,
        })
    }
}

/// Verify a TPM2 quote end to end
///
/// The signature is checked before any byte of the message is parsed. Every failure short
/// circuits and no partial result is returned.
///
/// # Arguments
/// * `public_key_pem` - PEM encoded attestation public key (RSA or ECDSA)
/// * `message` - Raw `TPMS_ATTEST` bytes
/// * `raw_pcr_values` - Concatenated PCR digests in selection order
/// * `signature` - PKCS#1 v1.5 (RSA) or ASN.1 DER (ECDSA) signature over `message`
/// * `nonce` - Nonce the quote was requested with
///
/// # Example
/// ```ignore
/// let result = tpm_quote_verifier::attest(&pem, &message, &pcrs, &signature, &nonce)?;
/// for (index, value) in result.pcr_values.iter() {
///     println!("PCR{}: {}", index, hex::encode(value));
/// }
/// ```
pub fn attest(
    public_key_pem: &[u8],
    message: &[u8],
    raw_pcr_values: &[u8],
    signature: &[u8],
    nonce: &[u8],
) -> Result<AttestationResult, QuoteError> {
    let result = CryptoVerifier::verify_quote_signature(public_key_pem, message, signature)
        .and_then(|_| QuoteVerifier::new(message))
        .and_then(|verifier| {
            verifier.verify_nonce(nonce)?;
            let (hash_alg, pcr_selection, pcr_values) = verifier.verify_pcr_values(raw_pcr_values)?;
            Ok(AttestationResult {
                quote: verifier.quote_data,
                hash_alg,
                pcr_selection,
                pcr_values,
            })
        });

    match &result {
        Ok(res) => debug!("Quote attested, {} PCR values verified", res.pcr_values.len()),
        Err(e) => warn!("Quote attestation failed: {}", e),
    }
    result
}
