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

use crate::config::{LogConfig, LoggerConfig};
use chrono::{DateTime, Local};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger as SizeBasedTriggerPolicy;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::{
    append::rolling_file::RollingFileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    Config, Handle,
};
use std::env;

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S:%3f)} {l} [{M}:{L}] - {m}{n}";
const CONSOLE_APPENDER: &str = "console";
const ROOT_APPENDER: &str = "root_appender";

pub struct Logger {
    _handle: Handle,
}

impl Logger {
    /// Rolling file loggers, one per configured path prefix. Without a `root` entry, records
    /// outside every prefix go to stderr at info level.
    pub fn new_from_config(config: LogConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let config = Self::build_config(&config)?;
        let handle = log4rs::init_config(config)?;
        Ok(Self { _handle: handle })
    }

    /// A single stderr appender, used when no logging file is configured
    pub fn console(level: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let appender = Self::create_console_appender();
        let config = Config::builder()
            .appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(appender)))
            .build(Root::builder().appender(CONSOLE_APPENDER).build(parse_level(level)))?;
        let handle = log4rs::init_config(config)?;
        Ok(Self { _handle: handle })
    }

    pub fn build_config(config: &LogConfig) -> Result<Config, Box<dyn std::error::Error>> {
        let mut builder = Config::builder();

        for logger_config in config.loggers.iter().filter(|l| l.path_prefix != "root") {
            let appender = Self::create_appender(logger_config)?;
            let appender_name = format!("{}_appender", logger_config.path_prefix);
            builder = builder.appender(Appender::builder().build(&appender_name, Box::new(appender)));

            let logger = log4rs::config::Logger::builder()
                .appender(appender_name)
                .additive(false)
                .build(logger_config.path_prefix.clone(), parse_level(&logger_config.level));
            builder = builder.logger(logger);
        }

        let root = match config.get_root_config() {
            Some(root_config) => {
                let appender = Self::create_appender(root_config)?;
                builder = builder.appender(Appender::builder().build(ROOT_APPENDER, Box::new(appender)));
                Root::builder().appender(ROOT_APPENDER).build(parse_level(&root_config.level))
            },
            None => {
                let appender = Self::create_console_appender();
                builder = builder.appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(appender)));
                Root::builder().appender(CONSOLE_APPENDER).build(LevelFilter::Info)
            },
        };

        Ok(builder.build(root)?)
    }

    fn create_console_appender() -> ConsoleAppender {
        ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build()
    }

    fn create_appender(config: &LoggerConfig) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
        // LOG_OUTPUT_DIR may come from a .env file next to the binary
        let _ = dotenv::dotenv();
        let log_out_dir = env::var("LOG_OUTPUT_DIR").unwrap_or_else(|_| ".".to_string());
        let log_directory = format!("{}/{}", log_out_dir, config.log_directory);
        std::fs::create_dir_all(&log_directory)?;

        let now: DateTime<Local> = Local::now();
        let formatted_time = now.format("%Y%m%d%H%M%S%3f").to_string();

        let log_file = format!("{}/{}", log_directory, config.log_file_name);
        let archived_log_pattern = format!(
            "{}/{}-{{}}-{}.gz",
            log_directory, config.log_file_name, formatted_time
        );

        let size_trigger = SizeBasedTriggerPolicy::new(config.max_file_size);
        let roller = FixedWindowRoller::builder().build(&archived_log_pattern, config.max_zip_count)?;
        let compound_policy = CompoundPolicy::new(Box::new(size_trigger), Box::new(roller));

        let appender = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build(log_file, Box::new(compound_policy))?;

        Ok(appender)
    }
}

pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}
