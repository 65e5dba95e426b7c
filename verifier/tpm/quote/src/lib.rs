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

//! Verification of TPM2 quotes.
//!
//! A quote is a `TPMS_ATTEST` structure signed by a TPM attestation key. [`attest`] checks the
//! signature, binds the quote to a caller nonce and proves that a blob of PCR values is exactly
//! what the TPM digested at quote time.

mod byte_reader;
mod crypto_utils;
mod error;
mod structure;
mod quote;
pub mod pcr;

pub use crypto_utils::CryptoVerifier;
pub use error::QuoteError;
pub use structure::{
    AlgorithmId, Attested, TpmStAttest, TpmsAttest, TpmsClockInfo, TpmsPcrSelection, TpmsQuoteInfo,
    TPM2_GENERATED_VALUE,
};
pub use quote::{attest, AttestationResult, QuoteVerifier};
pub use pcr::{decode_selection, extend, replay, PcrValues};
