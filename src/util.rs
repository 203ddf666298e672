// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2021-2022 Adrian <adrian.eddy at gmail>

use simplelog::{ ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger, TerminalMode, WriteLogger };

pub const LOG_FILE_NAME: &str = "focuscal.log";

pub fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Terminal logger on stderr (stdout carries command output) plus a log file in the data directory.
pub fn init_logging(level: LevelFilter) {
    let config = ConfigBuilder::new()
        .add_filter_ignore_str("walkdir")
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![
        TermLogger::new(level, config.clone(), TerminalMode::Stderr, ColorChoice::Auto)
    ];

    let log_path = focuscal_core::settings::data_dir().join(LOG_FILE_NAME);
    match std::fs::File::create(&log_path) {
        Ok(file) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, file)),
        Err(e) => eprintln!("Failed to create log file {}: {e:?}", log_path.display()),
    }

    let _ = CombinedLogger::init(loggers);
}
