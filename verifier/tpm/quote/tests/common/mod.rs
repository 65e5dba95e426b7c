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

#![allow(dead_code)]

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::sha::sha256;
use openssl::sign::Signer;

pub const TPM_ST_ATTEST_QUOTE: u16 = 0x8018;
pub const TPM_ALG_SHA1: u16 = 0x0004;
pub const TPM_ALG_SHA256: u16 = 0x000B;
pub const TPM_ALG_SM3_256: u16 = 0x0012;

// Quote taken from a TPM 2.0 with an RSA-2048 AK, selecting PCR 0-7 of the SHA-256 bank
pub const REAL_QUOTE: &str = concat!(
    "/1RDR4AYACIAC4AUbRH7b7Tx6NWCEXXAfTkXtGVl28mbdO8mgjtmLc3dABBGW/LurKot1UeCQBxSXeBv",
    "AAAACAemgS0ekmZKo0yPswG4TAdhkO8QbgAAAAEACwP/AAAAIPM1m5EaC4D9tYvMGKh/xRAgDvxo8KTn",
    "yLeNljrSeBMY"
);

// TPMT_SIGNATURE of REAL_QUOTE: TPM_ALG_RSASSA, TPM_ALG_SHA256, 256 byte signature
pub const REAL_TPMT_SIGNATURE: &str = concat!(
    "ABQACwEAMbPyNICmUBuQQNU3jNEnexOaTSLV1sXLRMEvZtxVvB9bvcRCUqkhW/5IdarIlsBoeKos+fwA",
    "tdY/rHmGkc5WJVQbuq6CiT72058oSscYV1wt7phle2ipS9sA9DNm6U6Fja3D4fdoP7BiHwMq16v0VDG1",
    "0lgbtqlqYjKMkmOsRVpaVgm06ujfOLRiATCoT7VYazOl2yYC18ErsqsSFZAuWkusdLHnm1H9z9orY37r",
    "3Ub20CTqHs7dcbUAtGXlNYQCnwl79nZcHfnHkJr5mXtxfCk0bKr8mr1FTtmcfQEYKsn90nK5I7Aa7KTI",
    "ZBtf9LRB1coblcA+ZnmdkZXV21gShQ=="
);

pub const REAL_NONCE: &str = "Rlvy7qyqLdVHgkAcUl3gbw==";

pub const REAL_AK_PUBLIC_KEY: &str = r#"-----BEGIN PUBLIC KEY-----
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEApnxF+8clLTkPJYfLThOS
L4QbLZCX1DDZTkPqkh8P6B+J0zNhc5isROiCx9Bl7m0qCj7EEEBabUdtxQMSA3dn
NDQFuLtiIJZtSRgf0YPKPXqBYaRlZ08W16vWvCfScGOas8JpmViZBSVwxKl7wcby
nVxATnQ/WFCCgY/1hB6yrK6EbYtHtvbWah3UsDKUf8k3gpo0nDFYThrDL2NL2BlY
ibAl8Xzte3ArPDG9QQbBRDKV4o5Kl0/lplD0SbY611HTPz8zw7j+AAU2feITT+hl
u1yoxHtwv8i7wrRomOW6xLbbL0Te4zteoIxrefgy5a5gTdqPLxX4WONYn4VhH6VX
SwIDAQAB
-----END PUBLIC KEY-----"#;

pub const REAL_PCR_VALUES: [&str; 8] = [
    "9d7504bb0d32f62d43310f38df37cdd5e42bdb83dd0c0592fd9b1c3b16770c35",
    "38846271e2a86d6bf43ef388be2d1cb83a89f1c0bb154fe494a1dda198da29be",
    "3d458cfe55cc03ea1f443f1562beec8df51c75e14a9fcf9a7234a13f198e7969",
    "3d458cfe55cc03ea1f443f1562beec8df51c75e14a9fcf9a7234a13f198e7969",
    "8ed12c415056362c7a4d403e6e2acadf090e78bfb4798a87b0a327c838064931",
    "66121d5bcdb8ab6d628b49827590ac8e1f2f09e26aa2d1dd1cfec5358854cd3a",
    "3d458cfe55cc03ea1f443f1562beec8df51c75e14a9fcf9a7234a13f198e7969",
    "74fa2c067892faa74bfb0cafacc4c7102dd2c9cf73efdfa41f07fdfc7c1eea1b",
];

/// Inputs of an attestation as a collaborator would read them from files
pub struct Fixture {
    pub public_key: Vec<u8>,
    pub message: Vec<u8>,
    pub pcr_values: Vec<u8>,
    pub signature: Vec<u8>,
    pub nonce: Vec<u8>,
}

impl Fixture {
    /// The captured TPM quote, with the raw signature cut out of its TPMT_SIGNATURE
    pub fn real() -> Self {
        let tpmt_signature = BASE64.decode(REAL_TPMT_SIGNATURE).unwrap();
        Self {
            public_key: REAL_AK_PUBLIC_KEY.as_bytes().to_vec(),
            message: BASE64.decode(REAL_QUOTE).unwrap(),
            pcr_values: REAL_PCR_VALUES.iter().flat_map(|v| hex::decode(v).unwrap()).collect(),
            // sigAlg (2) + hash (2) + size (2)
            signature: tpmt_signature[6..].to_vec(),
            nonce: BASE64.decode(REAL_NONCE).unwrap(),
        }
    }

    /// SHA-256 selection of PCR 0 and 1 signed by `signer`
    pub fn two_pcrs(signer: &TestSigner) -> Self {
        let pcr0 = [0x11u8; 32];
        let pcr1 = [0x22u8; 32];
        let pcr_values = [pcr0, pcr1].concat();
        let nonce = b"0123456789abcdef".to_vec();

        let message = QuoteBuilder::new(&nonce)
            .selection(TPM_ALG_SHA256, &[0x03])
            .pcr_digest(&sha256(&pcr_values))
            .build();

        Self {
            public_key: signer.public_pem(),
            signature: signer.sign(&message),
            message,
            pcr_values,
            nonce,
        }
    }

    pub fn attest(&self) -> Result<tpm_quote_verifier::AttestationResult, tpm_quote_verifier::QuoteError> {
        tpm_quote_verifier::attest(&self.public_key, &self.message, &self.pcr_values, &self.signature, &self.nonce)
    }
}

/// Marshals a TPMS_ATTEST the way TPM2_Quote does
#[derive(Clone)]
pub struct QuoteBuilder {
    pub magic: u32,
    pub type_: u16,
    pub qualified_signer: Vec<u8>,
    pub extra_data: Vec<u8>,
    pub clock: u64,
    pub reset_count: u32,
    pub restart_count: u32,
    pub safe: u8,
    pub firmware_version: u64,
    pub selections: Vec<(u16, Vec<u8>)>,
    pub pcr_digest: Vec<u8>,
}

impl QuoteBuilder {
    pub fn new(nonce: &[u8]) -> Self {
        let mut qualified_signer = vec![0x00, 0x0B];
        qualified_signer.extend_from_slice(&[0xA5; 32]);
        Self {
            magic: 0xff544347,
            type_: TPM_ST_ATTEST_QUOTE,
            qualified_signer,
            extra_data: nonce.to_vec(),
            clock: 0x0000_0008_07A6_812D,
            reset_count: 7,
            restart_count: 3,
            safe: 1,
            firmware_version: 0x2000_0000_0016_0000,
            selections: Vec::new(),
            pcr_digest: Vec::new(),
        }
    }

    pub fn selection(mut self, hash_alg: u16, bitmap: &[u8]) -> Self {
        self.selections.push((hash_alg, bitmap.to_vec()));
        self
    }

    pub fn pcr_digest(mut self, digest: &[u8]) -> Self {
        self.pcr_digest = digest.to_vec();
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.magic.to_be_bytes());
        out.extend_from_slice(&self.type_.to_be_bytes());
        out.extend_from_slice(&(self.qualified_signer.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.qualified_signer);
        out.extend_from_slice(&(self.extra_data.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.extra_data);
        out.extend_from_slice(&self.clock.to_be_bytes());
        out.extend_from_slice(&self.reset_count.to_be_bytes());
        out.extend_from_slice(&self.restart_count.to_be_bytes());
        out.push(self.safe);
        out.extend_from_slice(&self.firmware_version.to_be_bytes());
        out.extend_from_slice(&(self.selections.len() as u32).to_be_bytes());
        for (hash_alg, bitmap) in &self.selections {
            out.extend_from_slice(&hash_alg.to_be_bytes());
            out.push(bitmap.len() as u8);
            out.extend_from_slice(bitmap);
        }
        out.extend_from_slice(&(self.pcr_digest.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.pcr_digest);
        out
    }
}

/// Attestation key generated for the test run
pub struct TestSigner {
    key: PKey<Private>,
}

impl TestSigner {
    pub fn rsa() -> Self {
        let rsa = Rsa::generate(2048).unwrap();
        Self { key: PKey::from_rsa(rsa).unwrap() }
    }

    pub fn ecdsa() -> Self {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let ec = EcKey::generate(&group).unwrap();
        Self { key: PKey::from_ec_key(ec).unwrap() }
    }

    pub fn ed25519() -> Self {
        Self { key: PKey::generate_ed25519().unwrap() }
    }

    pub fn public_pem(&self) -> Vec<u8> {
        self.key.public_key_to_pem().unwrap()
    }

    /// PKCS#1 v1.5 for RSA, DER encoded for ECDSA, both over SHA-256
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let mut signer = Signer::new(MessageDigest::sha256(), &self.key).unwrap();
        signer.update(message).unwrap();
        signer.sign_to_vec().unwrap()
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
