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

//! Crypto utilities for signature verification and hash operations
//!
//! This module provides helper functions for:
//! - Loading an attestation public key from PEM
//! - RSA PKCS#1 v1.5 and ECDSA signature verification over SHA-256
//! - Hashing with a PCR bank algorithm
//! - Constant-time comparison of nonces and digests
use log::debug;
use openssl::hash::{Hasher, MessageDigest};
use openssl::memcmp;
use openssl::pkey::{Id, PKey, Public};
use openssl::sign::Verifier;
use crate::error::QuoteError;
use crate::structure::AlgorithmId;

pub struct CryptoVerifier;

impl CryptoVerifier {
    /// Load a PEM encoded SubjectPublicKeyInfo key
    ///
    /// # Errors
    /// * `QuoteError::MalformedKey` - The PEM block or the key inside it cannot be decoded
    pub fn load_public_key(public_key_pem: &[u8]) -> Result<PKey<Public>, QuoteError> {
        PKey::public_key_from_pem(public_key_pem)
            .map_err(|e| QuoteError::MalformedKey(e.to_string()))
    }

    /// Verify the quote signature with the attestation key
    ///
    /// The message is hashed with SHA-256. RSA keys verify a PKCS#1 v1.5 signature, EC keys an
    /// ASN.1 DER encoded ECDSA signature.
    ///
    /// # Arguments
    /// * `public_key_pem` - PEM encoded attestation public key
    /// * `message` - Raw quote message, the signed plaintext
    /// * `signature` - Raw signature bytes
    ///
    /// # Errors
    /// * `QuoteError::MalformedKey` - The key cannot be decoded
    /// * `QuoteError::UnsupportedKeyType` - The key is neither RSA nor EC
    /// * `QuoteError::SignatureInvalid` - The signature does not match
    pub fn verify_quote_signature(
        public_key_pem: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), QuoteError> {
        let public_key = Self::load_public_key(public_key_pem)?;
        Self::verify_signature(&public_key, message, signature)
    }

    pub fn verify_signature(
        public_key: &PKey<Public>,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), QuoteError> {
        let id = public_key.id();
        let key_type = if id == Id::RSA {
            "RSA"
        } else if id == Id::EC {
            "ECDSA"
        } else {
            return Err(QuoteError::UnsupportedKeyType(format!("{:?}", id)));
        };

        // RSA verifiers default to PKCS#1 v1.5 padding
        let mut verifier = Verifier::new(MessageDigest::sha256(), public_key)
            .map_err(|e| QuoteError::Internal(format!("Failed to create verifier: {}", e)))?;

        verifier.update(message)
            .map_err(|e| QuoteError::Internal(format!("Failed to update verifier: {}", e)))?;

        // A signature OpenSSL cannot even decode is as invalid as one that does not match
        let matched = verifier.verify(signature)
            .map_err(|e| QuoteError::SignatureInvalid(format!("{} signature rejected: {}", key_type, e)))?;

        if !matched {
            return Err(QuoteError::SignatureInvalid(
                format!("{} signature does not match data", key_type)
            ));
        }

        debug!("{} signature verification successful", key_type);
        Ok(())
    }

    /// Hash the concatenation of `parts` with the given PCR bank algorithm
    pub fn digest(alg: AlgorithmId, parts: &[&[u8]]) -> Result<Vec<u8>, QuoteError> {
        let mut hasher = Hasher::new(alg.message_digest())
            .map_err(|e| QuoteError::Internal(format!("Failed to create hasher: {}", e)))?;

        for part in parts {
            hasher.update(part)
                .map_err(|e| QuoteError::Internal(format!("Failed to update hash: {}", e)))?;
        }

        let digest = hasher.finish()
            .map_err(|e| QuoteError::Internal(format!("Failed to finalize hash calculation: {}", e)))?;

        Ok(digest.to_vec())
    }

    /// Constant-time equality; lengths are not secret and are compared first
    pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
        a.len() == b.len() && memcmp::eq(a, b)
    }
}
