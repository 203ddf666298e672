// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2021-2022 Adrian <adrian.eddy at gmail>

pub use focuscal_core as core;
pub mod util;
mod cli;

use simplelog::LevelFilter;

fn main() {
    let opts: cli::Opts = argh::from_env();

    if opts.version {
        println!("FocusCal v{}", util::get_version());
        return;
    }

    util::init_logging(if opts.verbose { LevelFilter::Debug } else { LevelFilter::Info });
    log_panics::init();
    ::log::debug!("FocusCal {}", util::get_version());

    if let Err(e) = cli::run(opts) {
        ::log::error!("{e}");
        std::process::exit(1);
    }
}
