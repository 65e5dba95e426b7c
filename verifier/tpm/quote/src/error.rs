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

//! Error types for quote verification
//!
//! Every failure is a terminal outcome of a pure function of the inputs, so none of these
//! variants is ever worth retrying.

use thiserror::Error;

/// Errors that can occur while verifying a TPM2 quote
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    /// The public key is not a PEM encoded SubjectPublicKeyInfo
    #[error("Malformed public key: {0}")]
    MalformedKey(String),

    /// The public key is neither RSA nor ECDSA
    #[error("Unsupported public key type: {0}")]
    UnsupportedKeyType(String),

    /// The signature does not verify against the message and key
    #[error("Invalid signature: {0}")]
    SignatureInvalid(String),

    /// The magic field is not TPM_GENERATED_VALUE
    #[error("Not a TPM generated structure: magic 0x{0:08X}, expected 0xFF544347")]
    NotTpmGenerated(u32),

    /// The attestation type selector is not TPM_ST_ATTEST_QUOTE
    #[error("Unsupported attestation type: 0x{0:04X}")]
    UnsupportedAttestationType(u16),

    /// The message is truncated or a declared length overruns the buffer
    #[error("Malformed message at offset {offset}: {reason}")]
    MalformedMessage { offset: usize, reason: String },

    /// The extra data field does not match the caller nonce
    #[error("Nonce in quote does not match provided nonce")]
    NonceMismatch,

    /// The quote does not carry exactly one PCR selection
    #[error("Unsupported PCR selection count: {0}, only a single selection is supported")]
    UnsupportedPcrSelectionCount(u32),

    /// The PCR bank hash algorithm is not one of SHA-1, SHA-256, SHA-384, SHA-512
    #[error("Unsupported PCR hash algorithm: 0x{0:04X}")]
    UnsupportedHashAlgorithm(u16),

    /// The PCR values do not fit the selection and digest size
    #[error("PCR length mismatch: expected {expected} bytes, got {actual} bytes")]
    PcrLengthMismatch { expected: usize, actual: usize },

    /// The recomputed PCR digest differs from the digest in the quote
    #[error("PCR digest mismatch: quote digest {expected}, calculated {calculated}")]
    DigestMismatch { expected: String, calculated: String },

    /// OpenSSL failed for a reason unrelated to the inputs
    #[error("Internal error: {0}")]
    Internal(String),
}
