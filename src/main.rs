#![warn(rust_2018_idioms)]
//#![deny(warnings, missing_docs)]

//! Deadline bounded alignment of two graphs of equal size.
//! Reads both graphs from one file, matches their vertices by
//! refined colours and writes a bijection before the time runs out.

use clap::Parser;
use env_logger::{Env, Target};
use log::{error, info};
use std::{path::PathBuf, process, time::Instant};

mod alignment;
use alignment::{is_permutation, preserved_edges};

mod debug;
pub use debug::Error;

mod graph;

mod mapping;

mod output;
use output::write_permutation;

mod parser;
use parser::load_instance;

mod partition;

mod refinement;
use refinement::refine_colours;

mod scheduler;
use scheduler::{Scheduler, VelocityControl};

mod settings;
use settings::{
    Settings, DEFAULT_CAPACITY, DEFAULT_HARD_FRACTION, DEFAULT_MAX_BATCH,
    DEFAULT_REFINEMENT_ROUNDS, DEFAULT_SOFT_FRACTION, DEFAULT_TIME_LIMIT,
};

mod statistics;
use statistics::Statistics;

/// Align the vertices of two graphs within a time limit.
#[derive(Parser, Debug)]
#[command(name = "graphalign")]
#[command(about = "Deadline bounded graph alignment by colour refinement")]
struct Cli {
    /// Time allowance of the whole run in seconds
    #[arg(short, long, default_value_t = DEFAULT_TIME_LIMIT)]
    time_limit: f64,

    /// File with both graphs
    #[arg(short, long, default_value = "graphs")]
    input: PathBuf,

    /// File the permutation is written to
    #[arg(short, long, default_value = "ans")]
    output: PathBuf,

    /// Share of the time limit after which batches grow
    #[arg(long, default_value_t = DEFAULT_SOFT_FRACTION)]
    soft_fraction: f64,

    /// Share of the time limit after which matching stops
    #[arg(long, default_value_t = DEFAULT_HARD_FRACTION)]
    hard_fraction: f64,

    /// Colour refinement rounds
    #[arg(long, default_value_t = DEFAULT_REFINEMENT_ROUNDS)]
    rounds: usize,

    /// Assumed throughput in pairs per second
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: f64,

    /// Upper bound for a batch of pairs from one colour class
    #[arg(long, default_value_t = DEFAULT_MAX_BATCH)]
    max_batch: usize,

    /// Save raw statistics of the run to this file
    #[arg(long)]
    statistics: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_settings(self) -> Result<Settings, Error> {
        let settings = Settings {
            input: self.input,
            output: self.output,
            time_limit: Settings::parse_time_limit(self.time_limit)?,
            soft_fraction: self.soft_fraction,
            hard_fraction: self.hard_fraction,
            refinement_rounds: self.rounds,
            capacity: self.capacity,
            max_batch: self.max_batch,
            statistics: self.statistics,
        };
        settings.validate()?;
        Ok(settings)
    }
}

fn run(settings: Settings, start: Instant) -> Result<(), Error> {
    let mut statistics = Statistics::new(settings.statistics.clone(), start);

    time!(load_time, instance, load_instance(&settings.input)?);
    statistics.log_instance(&instance, load_time);

    time!(
        refinement_time,
        colours,
        (
            refine_colours(&instance.source, settings.refinement_rounds),
            refine_colours(&instance.target, settings.refinement_rounds),
        )
    );
    info!("Refined colours in {:?}", refinement_time);
    statistics.log_refinement(refinement_time);

    let (source_colours, target_colours) = colours;
    let deadlines = settings.deadlines(start);
    info!(
        "Matching until {:?} (batches grow after {:?})",
        deadlines.hard(),
        deadlines.soft()
    );
    let mut scheduler = Scheduler::new(
        &instance.source,
        &instance.target,
        source_colours,
        target_colours,
        deadlines,
        VelocityControl::from_settings(&settings),
    );
    time!(matching_time, _matched, scheduler.run());
    let (mapping, counters) = scheduler.into_parts();
    statistics.log_matching(counters, matching_time);

    statistics.log_completion(mapping.unmapped_count());
    let permutation = mapping.complete();
    debug_assert!(is_permutation(&permutation));

    time!(
        write_time,
        _written,
        write_permutation(&settings.output, &permutation, instance.offset)?
    );
    statistics.log_write(write_time);

    statistics.log_preserved_edges(preserved_edges(
        &instance.source,
        &instance.target,
        &permutation,
    ));
    statistics.log_end();

    info!("{}", statistics.summary());
    statistics.save_statistics()
}

#[cfg(not(tarpaulin_include))]
fn main() {
    let start = Instant::now();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .target(Target::Stderr)
        .init();

    if let Err(e) = cli.into_settings().and_then(|settings| run(settings, start)) {
        error!("{}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod test {
    use std::{fs, time::Duration};

    use super::*;

    fn settings_in(dir: &tempfile::TempDir, graphs: &str) -> Result<Settings, Error> {
        let input = dir.path().join("graphs");
        fs::write(&input, graphs)?;
        Ok(Settings {
            input,
            output: dir.path().join("ans"),
            ..Default::default()
        })
    }

    #[test]
    fn test_cli_defaults_match_settings() -> Result<(), Error> {
        let settings = Cli::parse_from(["graphalign"]).into_settings()?;
        let default = Settings::default();

        assert_eq!(default.input, settings.input);
        assert_eq!(default.output, settings.output);
        assert_eq!(default.time_limit, settings.time_limit);
        assert_eq!(default.soft_fraction, settings.soft_fraction);
        assert_eq!(default.hard_fraction, settings.hard_fraction);
        assert_eq!(default.refinement_rounds, settings.refinement_rounds);
        assert_eq!(default.capacity, settings.capacity);
        assert_eq!(default.max_batch, settings.max_batch);
        assert_eq!(None, settings.statistics);
        Ok(())
    }

    #[test]
    fn test_cli_options() -> Result<(), Error> {
        let settings = Cli::parse_from([
            "graphalign",
            "-t",
            "2.5",
            "--input",
            "in.txt",
            "-o",
            "out.txt",
            "--rounds",
            "3",
            "--max-batch",
            "7",
        ])
        .into_settings()?;

        assert_eq!(Duration::from_millis(2500), settings.time_limit);
        assert_eq!(PathBuf::from("in.txt"), settings.input);
        assert_eq!(PathBuf::from("out.txt"), settings.output);
        assert_eq!(3, settings.refinement_rounds);
        assert_eq!(7, settings.max_batch);
        Ok(())
    }

    #[test]
    fn test_cli_rejects_invalid_configuration() {
        let negative = Cli::parse_from(["graphalign", "--time-limit=-1"]).into_settings();
        assert!(matches!(negative, Err(Error::ConfigError(_))));

        let swapped = Cli::parse_from([
            "graphalign",
            "--soft-fraction",
            "0.95",
            "--hard-fraction",
            "0.9",
        ])
        .into_settings();
        assert!(matches!(swapped, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_run_four_cycle() -> Result<(), Error> {
        let dir = tempfile::tempdir()?;
        let mut settings = settings_in(&dir, "4 4\n1 2\n2 3\n3 4\n4 1\n4 4\n1 2\n2 3\n3 4\n4 1\n")?;
        settings.statistics = Some(dir.path().join("statistics.txt"));

        run(settings, Instant::now())?;
        assert_eq!("1 2 3 4\n", fs::read_to_string(dir.path().join("ans"))?);

        let saved = fs::read_to_string(dir.path().join("statistics.txt"))?;
        assert!(saved.contains("preserved_edges: 4"));
        Ok(())
    }

    #[test]
    fn test_run_mismatched_graphs() -> Result<(), Error> {
        let dir = tempfile::tempdir()?;
        let settings = settings_in(&dir, "3 1\n0 1\n3 1\n1 2\n")?;

        run(settings, Instant::now())?;
        let answer = fs::read_to_string(dir.path().join("ans"))?;
        let images = answer
            .split_whitespace()
            .map(|token| token.parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(3, images.len());
        assert_eq!(0, images[2]);
        Ok(())
    }

    #[test]
    fn test_run_malformed_input_writes_nothing() -> Result<(), Error> {
        let dir = tempfile::tempdir()?;
        let settings = settings_in(&dir, "3 2\n1 2\n2 x\n")?;

        assert!(matches!(
            run(settings, Instant::now()),
            Err(Error::ParseError(_))
        ));
        assert!(!dir.path().join("ans").exists());
        Ok(())
    }
}
