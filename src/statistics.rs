//! Statistics about the different parts of a run.

use custom_debug_derive::Debug;
use std::{
    fs::File,
    io::Write,
    path::PathBuf,
    time::{Duration, Instant},
};

use crate::debug::opt_fmt;
use crate::{parser::Instance, scheduler::SchedulerCounters, Error};

#[derive(Debug)]
pub struct Statistics {
    // Meta information
    #[debug(skip)]
    out_file: Option<PathBuf>,
    // Timings
    #[debug(skip)]
    start_time: Instant,
    #[debug(with = "opt_fmt")]
    load_time: Option<Duration>,
    #[debug(with = "opt_fmt")]
    refinement_time: Option<Duration>,
    #[debug(with = "opt_fmt")]
    matching_time: Option<Duration>,
    #[debug(with = "opt_fmt")]
    write_time: Option<Duration>,
    #[debug(with = "opt_fmt")]
    end_time: Option<Duration>,
    // Instance
    graph_size: usize,
    edge_number: usize,
    offset: i64,
    // Matching
    counters: SchedulerCounters,
    completed_pairs: usize,
    #[debug(with = "opt_fmt")]
    preserved_edges: Option<usize>,
}

impl Statistics {
    pub fn new(out_file: Option<PathBuf>, start_time: Instant) -> Self {
        Statistics {
            out_file,
            start_time,
            load_time: None,
            refinement_time: None,
            matching_time: None,
            write_time: None,
            end_time: None,
            graph_size: 0,
            edge_number: 0,
            offset: 0,
            counters: SchedulerCounters::default(),
            completed_pairs: 0,
            preserved_edges: None,
        }
    }

    pub fn log_instance(&mut self, instance: &Instance, load_time: Duration) {
        self.graph_size = instance.size();
        self.edge_number = instance.source.number_edges();
        self.offset = instance.offset;
        self.load_time = Some(load_time);
    }

    pub fn log_refinement(&mut self, duration: Duration) {
        self.refinement_time = Some(duration);
    }

    pub fn log_matching(&mut self, counters: SchedulerCounters, duration: Duration) {
        self.counters = counters;
        self.matching_time = Some(duration);
    }

    /// Pairs added by completing the mapping after matching stopped.
    pub fn log_completion(&mut self, completed_pairs: usize) {
        self.completed_pairs = completed_pairs;
    }

    pub fn log_write(&mut self, duration: Duration) {
        self.write_time = Some(duration);
    }

    pub fn log_preserved_edges(&mut self, preserved_edges: usize) {
        self.preserved_edges = Some(preserved_edges);
    }

    pub fn log_end(&mut self) {
        self.end_time = Some(self.start_time.elapsed());
    }

    pub fn summary(&self) -> String {
        let preserved = match self.preserved_edges {
            Some(preserved) => format!("{}/{}", preserved, self.edge_number),
            None => "?".to_string(),
        };

        format!(
            "n={} m={}: {} exact, {} queued, {} by degree, {} completed; \
             {} edges preserved; deadline hit: {}",
            self.graph_size,
            self.edge_number,
            self.counters.exact_pairs,
            self.counters.queue_pairs,
            self.counters.stall_pairs,
            self.completed_pairs,
            preserved,
            self.counters.deadline_hit
        )
    }

    /// Dump the raw statistics if a file was requested.
    pub fn save_statistics(&self) -> Result<(), Error> {
        if let Some(out_file) = &self.out_file {
            let mut statistics_file = File::create(out_file)?;
            write!(statistics_file, "Raw Statistics: {:#?}", self)?;
        }
        Ok(())
    }
}
