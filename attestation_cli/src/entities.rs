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

use serde::Serialize;
use std::collections::BTreeMap;
use tpm_quote_verifier::{AttestationResult, TpmsClockInfo};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ClockInfo {
    pub clock: u64,
    pub reset_count: u32,
    pub restart_count: u32,
    pub safe: bool,
}

impl From<&TpmsClockInfo> for ClockInfo {
    fn from(info: &TpmsClockInfo) -> Self {
        ClockInfo {
            clock: info.clock,
            reset_count: info.reset_count,
            restart_count: info.restart_count,
            safe: info.safe,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PcrSelection {
    pub hash_algorithm: String,
    pub pcrs: Vec<u32>,
}

/// Verified quote as printed on stdout
#[derive(Debug, Serialize)]
pub struct AttestationReport {
    pub attestation_type: String,
    pub qualified_signer: String,
    pub extra_data: String,
    pub clock_info: ClockInfo,
    pub firmware_version: u64,
    pub pcr_selection: PcrSelection,
    pub pcr_digest: String,
    pub pcr_values: BTreeMap<String, String>,
}

impl From<&AttestationResult> for AttestationReport {
    fn from(result: &AttestationResult) -> Self {
        let quote = &result.quote;
        let pcr_values = result
            .pcr_values
            .iter()
            .map(|(index, value)| (index.to_string(), hex::encode(value)))
            .collect();

        AttestationReport {
            attestation_type: quote.attestation_type().name().to_string(),
            qualified_signer: hex::encode(&quote.qualified_signer),
            extra_data: hex::encode(&quote.extra_data),
            clock_info: ClockInfo::from(&quote.clock_info),
            firmware_version: quote.firmware_version,
            pcr_selection: PcrSelection {
                hash_algorithm: result.hash_alg.name().to_string(),
                pcrs: result.pcr_selection.clone(),
            },
            pcr_digest: hex::encode(&quote.quote_info().pcr_digest),
            pcr_values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tpm_quote_verifier::{
        AlgorithmId, Attested, PcrValues, TpmsAttest, TpmsPcrSelection, TpmsQuoteInfo, TPM2_GENERATED_VALUE,
    };

    fn sample_result() -> AttestationResult {
        let selection = vec![2, 10];
        let mut raw = vec![0x11; 20];
        raw.extend_from_slice(&[0x22; 20]);
        let pcr_values = PcrValues::from_raw(&raw, &selection, AlgorithmId::Sha1).unwrap();
        let pcr_digest = pcr_values.calculate_digest(&selection).unwrap();

        AttestationResult {
            quote: TpmsAttest {
                magic: TPM2_GENERATED_VALUE,
                qualified_signer: vec![0x00, 0x0b, 0xab],
                extra_data: b"nonce".to_vec(),
                clock_info: TpmsClockInfo { clock: 42, reset_count: 1, restart_count: 2, safe: true },
                firmware_version: 0x0102,
                attested: Attested::Quote(TpmsQuoteInfo {
                    pcr_select: vec![TpmsPcrSelection { hash_alg: 0x0004, pcr_select: vec![0x04, 0x04, 0x00] }],
                    pcr_digest,
                }),
            },
            hash_alg: AlgorithmId::Sha1,
            pcr_selection: selection,
            pcr_values,
        }
    }

    #[test]
    fn test_report_from_result() {
        let result = sample_result();
        let report = AttestationReport::from(&result);

        assert_eq!(report.attestation_type, "TPM_ST_ATTEST_QUOTE");
        assert_eq!(report.qualified_signer, "000bab");
        assert_eq!(report.extra_data, hex::encode(b"nonce"));
        assert_eq!(report.clock_info, ClockInfo { clock: 42, reset_count: 1, restart_count: 2, safe: true });
        assert_eq!(report.firmware_version, 0x0102);
        assert_eq!(report.pcr_selection.hash_algorithm, "TPM_ALG_SHA1");
        assert_eq!(report.pcr_selection.pcrs, vec![2, 10]);
        assert_eq!(report.pcr_values.get("2"), Some(&"11".repeat(20)));
        assert_eq!(report.pcr_values.get("10"), Some(&"22".repeat(20)));
    }

    #[test]
    fn test_report_json_layout() {
        let report = AttestationReport::from(&sample_result());
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["attestation_type"], "TPM_ST_ATTEST_QUOTE");
        assert_eq!(value["clock_info"]["safe"], true);
        assert_eq!(value["pcr_selection"]["pcrs"], serde_json::json!([2, 10]));
        assert_eq!(value["pcr_values"]["10"], "22".repeat(20));
        assert_eq!(value["pcr_digest"].as_str().map(str::len), Some(40));
    }
}
