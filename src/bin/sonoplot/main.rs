/*
 * Copyright (C) Simon Werner, 2019
 *
 * This program is free software; you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation; either version 2 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program; if not, see <http://www.gnu.org/licenses/>.
 */

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// sonoplot - turn the analyser's spectrogram bitmaps into labelled plots.
///
/// Reads `../config.toml` and the spectrogram PNGs in the current
/// directory, and writes the plot PNGs next to them.
#[derive(Parser)]
#[command(version, author = "Simon Werner <simonwerner@gmail.com>", about, long_about)]
struct Cli {}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("sonoplot=info"))
        .unwrap_or_else(|_| EnvFilter::default().add_directive(Level::INFO.into()));

    if let Err(err) = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .try_init()
    {
        eprintln!("failed to initialise logging: {err}");
    }
}

fn main() -> ExitCode {
    let _cli = Cli::parse();
    init_logging();

    match sonoplot::run(Path::new(".")) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
