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

mod entities;

use crate::entities::AttestationReport;
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[clap(author, version, about = "Verify a TPM 2.0 quote against a public key, nonce and PCR values", long_about = None)]
struct Cli {
    /// Marshalled TPMS_ATTEST produced by TPM2_Quote
    #[clap(long)]
    message_file: PathBuf,

    /// Concatenated PCR values, in selection order
    #[clap(long)]
    pcr_file: PathBuf,

    /// Attestation key public key, PEM encoded
    #[clap(long)]
    pub_key_file: PathBuf,

    /// Raw RSA PKCS#1 v1.5 or DER ECDSA signature over the message
    #[clap(long)]
    signature_file: PathBuf,

    /// Nonce the quote was requested with
    #[clap(long)]
    nonce_file: PathBuf,

    /// Pretty print the JSON report
    #[clap(long, default_value_t = true, action = clap::ArgAction::Set)]
    pretty: bool,

    /// Logging configuration file, takes precedence over --log-level
    #[clap(long)]
    log_config: Option<PathBuf>,

    /// Console log level
    #[clap(long, default_value = "warn")]
    log_level: String,
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn init_logging(cli: &Cli) -> Result<()> {
    match &cli.log_config {
        Some(path) => common_log::init_with_yaml(path.clone())
            .map_err(|e| anyhow!("failed to load logging configuration {}: {}", path.display(), e)),
        None => common_log::init_console(&cli.log_level).map_err(|e| anyhow!("failed to initialize logging: {}", e)),
    }
}

fn run(cli: &Cli) -> Result<String> {
    let message = read_file(&cli.message_file)?;
    let pcr_values = read_file(&cli.pcr_file)?;
    let public_key = read_file(&cli.pub_key_file)?;
    let signature = read_file(&cli.signature_file)?;
    let nonce = read_file(&cli.nonce_file)?;
    debug!(
        "Loaded message {} bytes, PCR values {} bytes, signature {} bytes, nonce {} bytes",
        message.len(),
        pcr_values.len(),
        signature.len(),
        nonce.len()
    );

    let result = tpm_quote_verifier::attest(&public_key, &message, &pcr_values, &signature, &nonce)?;
    info!("Quote verified, {} PCRs attested", result.pcr_selection.len());

    let report = AttestationReport::from(&result);
    let output = if cli.pretty { serde_json::to_string_pretty(&report)? } else { serde_json::to_string(&report)? };
    Ok(output)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli) {
        eprintln!("Attestation error: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(report) => {
            println!("{}", report);
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Attestation error: {:#}", e);
            ExitCode::FAILURE
        },
    }
}
