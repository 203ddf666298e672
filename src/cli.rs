// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2022 Adrian <adrian.eddy at gmail>

use argh::FromArgs;
use itertools::Itertools;
use std::io::BufRead;
use std::path::PathBuf;
use focuscal_core::*;
use focuscal_core::calibration::{ self, CalibrationError };
use focuscal_core::focus_scan::{ self, FocusScanError };
use focuscal_core::optics;

const DEFAULT_FOCAL_LENGTH: f64 = 0.4;
const DEFAULT_BASE_DISTANCE: f64 = 10.0;

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error(transparent)] Optics(#[from] OpticsError),
    #[error(transparent)] Smoothing(#[from] SmoothingError),
    #[error(transparent)] Calibration(#[from] CalibrationError),
    #[error(transparent)] FocusScan(#[from] FocusScanError),
    #[error("IO error: {0:?}")] Io(#[from] std::io::Error),
    #[error("Line {line}: invalid sample {value:?}")] InvalidSample { line: usize, value: String },
    #[error("No command given, see --help")] NoCommand,
}

/** FocusCal
Lens position and object distance calibration tools
*/
#[derive(FromArgs, Debug)]
pub struct Opts {
    /// print app version
    #[argh(switch)]
    pub version: bool,

    /// verbose logging
    #[argh(switch, short = 'v')]
    pub verbose: bool,

    #[argh(subcommand)]
    pub command: Option<Command>,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
pub enum Command {
    LensPosition(LensPositionCmd),
    Distance(DistanceCmd),
    Table(TableCmd),
    Smooth(SmoothCmd),
    Scan(ScanCmd),
    Fit(FitCmd),
    Config(ConfigCmd),
}

/// lens position needed to focus at a distance
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "lens-position")]
pub struct LensPositionCmd {
    /// focal length, default: stored setting or 0.4
    #[argh(option, short = 'f')]
    focal_length: Option<f64>,

    /// distance at which the lens position is 0, default: stored setting or 10
    #[argh(option, short = 'b')]
    base_distance: Option<f64>,

    /// object distance
    #[argh(positional)]
    distance: f64,
}

/// object distance in focus at a lens position
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "distance")]
pub struct DistanceCmd {
    /// focal length, default: stored setting or 0.4
    #[argh(option, short = 'f')]
    focal_length: Option<f64>,

    /// distance at which the lens position is 0, default: stored setting or 10
    #[argh(option, short = 'b')]
    base_distance: Option<f64>,

    /// normalized lens position [0, 1)
    #[argh(positional)]
    lens_position: f64,
}

/// print lens position / distance reference tables
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "table")]
pub struct TableCmd {
    /// focal length, default: stored setting or 0.4
    #[argh(option, short = 'f')]
    focal_length: Option<f64>,

    /// distance at which the lens position is 0, default: stored setting or 10
    #[argh(option, short = 'b')]
    base_distance: Option<f64>,

    /// number of lens position steps, default: 50
    #[argh(option, short = 'n', default = "50")]
    steps: usize,

    /// comma separated distances to print lens positions for, eg. "10,20,30"
    #[argh(option, short = 'd')]
    distances: Option<String>,
}

/// smooth lens position samples, one per line (stdin if no file is given)
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "smooth")]
pub struct SmoothCmd {
    /// window size, default: stored setting or 5
    #[argh(option, short = 'p')]
    period: Option<usize>,

    /// use a plain last-N window instead of the camera app indexing
    #[argh(switch)]
    sequential: bool,

    /// input file
    #[argh(positional)]
    input: Option<PathBuf>,
}

/// print the static focus scan sequence
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "scan")]
pub struct ScanCmd {
    /// first lens position, default: 0.05
    #[argh(option, default = "focus_scan::DEFAULT_START")]
    start: f64,

    /// scanned range, default: 0.45
    #[argh(option, default = "focus_scan::DEFAULT_RANGE")]
    range: f64,

    /// step between lens positions, default: 0.05
    #[argh(option, default = "focus_scan::DEFAULT_INCREMENT")]
    increment: f64,
}

/// fit the focal length to recorded distance calibration observations
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "fit")]
pub struct FitCmd {
    /// distance at which the lens position is 0, default: stored setting or 10
    #[argh(option, short = 'b')]
    base_distance: Option<f64>,

    /// store the fitted focal length and base distance in settings
    #[argh(switch)]
    save: bool,

    /// observations file: JSON object of distance -> lens position
    #[argh(positional)]
    observations: PathBuf,
}

/// show or reset the stored settings
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "config")]
pub struct ConfigCmd {
    /// remove all stored settings
    #[argh(switch)]
    reset: bool,
}

fn optical_parameters(focal_length: Option<f64>, base_distance: Option<f64>) -> Result<OpticalParameters, OpticsError> {
    OpticalParameters::new(
        focal_length.unwrap_or_else(|| settings::get_f64("focalLength", DEFAULT_FOCAL_LENGTH)),
        base_distance.unwrap_or_else(|| settings::get_f64("baseDistance", DEFAULT_BASE_DISTANCE)),
    )
}

fn parse_distances(s: &str) -> Result<Vec<f64>, CliError> {
    s.split(',').map(str::trim).filter(|x| !x.is_empty()).enumerate().map(|(i, x)| {
        x.parse::<f64>().map_err(|_| CliError::InvalidSample { line: i + 1, value: x.to_owned() })
    }).collect()
}

pub fn format_distance_table(rows: &[(f64, f64)]) -> String {
    rows.iter().map(|(lp, d)| format!("{{{lp}, {d:.4}}},")).join("\n")
}

/// `inf` when the lens sits at the infinity stop.
pub fn format_distance(params: &OpticalParameters, lens_position: f64) -> Result<String, OpticsError> {
    match params.distance(lens_position) {
        Ok(d) => Ok(format!("{d:.4}")),
        Err(OpticsError::Singular(Singularity::AtInfinity)) => Ok("inf".into()),
        Err(e) => Err(e),
    }
}

pub fn format_lens_position_table(rows: &[(f64, f64)]) -> String {
    rows.iter().map(|(d, lp)| format!("{d}: {lp:.6}")).join("\n")
}

/// Smooths every sample read from `reader`, returning one `[rms] = raw` line per sample.
pub fn smooth_lines(reader: impl BufRead, mut window: MovingRms) -> Result<Vec<String>, CliError> {
    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }

        let value = line.parse::<f64>().map_err(|_| CliError::InvalidSample { line: i + 1, value: line.to_owned() })?;
        let rms = window.add_sample(value)?;
        out.push(format!("[{rms:1.2} ] = {value:1.2}"));
    }
    Ok(out)
}

pub fn run(opts: Opts) -> Result<(), CliError> {
    match opts.command.ok_or(CliError::NoCommand)? {
        Command::LensPosition(cmd) => {
            let params = optical_parameters(cmd.focal_length, cmd.base_distance)?;
            println!("{:.6}", params.lens_position(cmd.distance)?);
        },
        Command::Distance(cmd) => {
            let params = optical_parameters(cmd.focal_length, cmd.base_distance)?;
            println!("{}", format_distance(&params, cmd.lens_position)?);
        },
        Command::Table(cmd) => {
            let params = optical_parameters(cmd.focal_length, cmd.base_distance)?;
            log::debug!("Table for {params:?}");
            match cmd.distances {
                Some(distances) => {
                    let rows = optics::lens_position_table(&params, &parse_distances(&distances)?)?;
                    println!("{}", format_lens_position_table(&rows));
                },
                None => {
                    let rows = optics::distance_table(&params, cmd.steps)?;
                    println!("{}", format_distance_table(&rows));
                }
            }
        },
        Command::Smooth(cmd) => {
            let period = cmd.period.unwrap_or_else(|| settings::get_u64("smoothingPeriod", smoothing::DEFAULT_PERIOD as u64) as usize);
            let indexing = if cmd.sequential { WriteIndexing::Sequential } else { WriteIndexing::Legacy };
            let window = MovingRms::with_indexing(period, indexing)?;

            let lines = match cmd.input {
                Some(path) => smooth_lines(std::io::BufReader::new(std::fs::File::open(path)?), window)?,
                None => smooth_lines(std::io::stdin().lock(), window)?,
            };
            for line in lines {
                println!("{line}");
            }
        },
        Command::Scan(cmd) => {
            let seq = focus_scan::focus_scan_sequence(cmd.start, cmd.range, cmd.increment)?;
            println!("{}", seq.iter().map(|x| format!("{x:.2}")).join(","));
        },
        Command::Fit(cmd) => {
            let base_distance = cmd.base_distance.unwrap_or_else(|| settings::get_f64("baseDistance", DEFAULT_BASE_DISTANCE));
            let data = std::fs::read_to_string(&cmd.observations)?;
            let observations = calibration::distance::observations_from_json(&data)?;
            let fit = calibration::fit_focal_length(&observations, base_distance, None)?;

            for (d, r) in &fit.residuals {
                log::debug!("[{d:2}] residual {r:+.5}");
            }
            println!("focal length: {:.6}", fit.focal_length);
            println!("RMS error: {:.6}", fit.rms_error);

            if cmd.save {
                let params = fit.params(base_distance);
                settings::set("focalLength", serde_json::json!(params.focal_length));
                settings::set("baseDistance", serde_json::json!(params.base_distance));
            }
        },
        Command::Config(cmd) => {
            if cmd.reset {
                settings::clear();
                log::info!("Settings cleared");
            } else {
                let all = settings::get_all();
                for (k, v) in all.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
                    println!("{k}: {v}");
                }
            }
        },
    }
    Ok(())
}
