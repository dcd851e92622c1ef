//! The matching loop that turns colour classes into vertex pairs.
//!
//! Each tick resolves an exact class if there is one, otherwise the
//! smallest ambiguous class, otherwise pairs the next unmapped vertices
//! by descending degree. Every committed pair recolours the unmapped
//! neighbours of both ends with the identity of the target vertex.
//! Pairs are never taken back.

use custom_debug_derive::Debug;
use itertools::Itertools;
use log::{debug, info};
use std::{cmp::Reverse, time::Duration};

use crate::{
    graph::{Colour, Graph, VertexIndex},
    mapping::Mapping,
    partition::{PartitionIndex, Side},
    refinement::image_colour,
    settings::{Deadlines, Settings},
};

/// Ticks between two progress messages.
const PROGRESS_INTERVAL: usize = 10_000;
/// Lower bound for the time left when computing the needed rate.
const MIN_REMAINING_SECS: f64 = 0.1;
/// Below this share of the capacity pairs are resolved one at a time.
const RELAXED_LOAD: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ResolveExact,
    ResolveQueue,
    StallFallback,
    Done,
}

/// Batch sizing for ambiguous classes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityControl {
    pub capacity: f64,
    pub max_batch: usize,
}

impl VelocityControl {
    pub fn from_settings(settings: &Settings) -> Self {
        VelocityControl {
            capacity: settings.capacity,
            max_batch: settings.max_batch,
        }
    }

    /// One pair at a time while the needed rate is comfortably below
    /// the capacity, otherwise proportionally more up to `max_batch`.
    pub fn batch_size(&self, nodes_left: usize, until_soft: Duration) -> usize {
        let remaining = until_soft.as_secs_f64().max(MIN_REMAINING_SECS);
        let rate_needed = nodes_left as f64 / remaining;

        if rate_needed < self.capacity * RELAXED_LOAD {
            1
        } else {
            let batch = (rate_needed / self.capacity) as usize + 1;
            batch.min(self.max_batch)
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SchedulerCounters {
    pub ticks: usize,
    pub exact_pairs: usize,
    pub queue_pairs: usize,
    pub stall_pairs: usize,
    /// Pending pairs dropped because an end was taken earlier in the batch.
    pub skipped_pairs: usize,
    pub largest_batch: usize,
    pub deadline_hit: bool,
}

impl SchedulerCounters {
    fn log_pair(&mut self, phase: Phase) {
        match phase {
            Phase::ResolveExact => self.exact_pairs += 1,
            Phase::ResolveQueue => self.queue_pairs += 1,
            Phase::StallFallback => self.stall_pairs += 1,
            Phase::Done => (),
        }
    }
}

#[derive(Debug)]
pub struct Scheduler<'a> {
    #[debug(skip)]
    source: &'a Graph,
    #[debug(skip)]
    target: &'a Graph,
    partition: PartitionIndex,
    mapping: Mapping,
    /// Vertices by descending degree for stalls.
    #[debug(skip)]
    source_by_degree: Vec<VertexIndex>,
    #[debug(skip)]
    target_by_degree: Vec<VertexIndex>,
    source_pointer: usize,
    target_pointer: usize,
    deadlines: Deadlines,
    velocity: VelocityControl,
    counters: SchedulerCounters,
}

fn by_descending_degree(graph: &Graph) -> Vec<VertexIndex> {
    (0..graph.size())
        .sorted_by_key(|vertex| Reverse(graph.degree(*vertex)))
        .collect()
}

impl<'a> Scheduler<'a> {
    pub fn new(
        source: &'a Graph,
        target: &'a Graph,
        source_colours: Vec<Colour>,
        target_colours: Vec<Colour>,
        deadlines: Deadlines,
        velocity: VelocityControl,
    ) -> Self {
        assert_eq!(source.size(), target.size());

        Scheduler {
            source,
            target,
            partition: PartitionIndex::new(source_colours, target_colours),
            mapping: Mapping::new(source.size()),
            source_by_degree: by_descending_degree(source),
            target_by_degree: by_descending_degree(target),
            source_pointer: 0,
            target_pointer: 0,
            deadlines,
            velocity,
            counters: SchedulerCounters::default(),
        }
    }

    #[cfg(test)]
    pub fn partition(&self) -> &PartitionIndex {
        &self.partition
    }

    #[cfg(test)]
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    #[cfg(test)]
    pub fn counters(&self) -> &SchedulerCounters {
        &self.counters
    }

    pub fn into_parts(self) -> (Mapping, SchedulerCounters) {
        (self.mapping, self.counters)
    }

    /// Tick until there is nothing left to do or time is up.
    pub fn run(&mut self) {
        while self.tick() != Phase::Done {}

        info!(
            "Matching stopped after {} ticks with {}/{} vertices mapped \
             ({} exact, {} queued, {} by degree, deadline hit: {})",
            self.counters.ticks,
            self.mapping.mapped_count(),
            self.mapping.size(),
            self.counters.exact_pairs,
            self.counters.queue_pairs,
            self.counters.stall_pairs,
            self.counters.deadline_hit
        );
    }

    /// One scheduler step. Returns the phase that produced this
    /// tick's pairs, or `Done` if the loop has to stop.
    pub fn tick(&mut self) -> Phase {
        if self.mapping.is_complete() {
            return Phase::Done;
        }

        let elapsed = self.deadlines.elapsed();
        if self.deadlines.hard_expired(elapsed) {
            self.counters.deadline_hit = true;
            return Phase::Done;
        }

        self.counters.ticks += 1;
        if self.counters.ticks % PROGRESS_INTERVAL == 0 {
            debug!(
                "Tick {}: mapped {}/{} after {:?}",
                self.counters.ticks,
                self.mapping.mapped_count(),
                self.mapping.size(),
                elapsed
            );
        }

        let (phase, pending) = self.resolve_next(elapsed);
        if pending.is_empty() {
            return Phase::Done;
        }

        self.counters.largest_batch = self.counters.largest_batch.max(pending.len());
        for (source, target) in pending {
            if self.commit(source, target) {
                self.counters.log_pair(phase);
            } else {
                self.counters.skipped_pairs += 1;
            }
        }

        phase
    }

    /// Select the pairs of the next tick.
    fn resolve_next(&mut self, elapsed: Duration) -> (Phase, Vec<(VertexIndex, VertexIndex)>) {
        if let Some((_, source, target)) = self.partition.pop_exact() {
            return (Phase::ResolveExact, vec![(source, target)]);
        }

        if let Some(colour) = self.partition.pop_ambiguous() {
            let batch = self.velocity.batch_size(
                self.mapping.unmapped_count(),
                self.deadlines.until_soft(elapsed),
            );
            return (Phase::ResolveQueue, self.partition.candidates(colour, batch));
        }

        match self.next_by_degree() {
            Some(pair) => (Phase::StallFallback, vec![pair]),
            None => (Phase::Done, Vec::new()),
        }
    }

    /// Next unmapped source and unused target vertex by descending degree.
    fn next_by_degree(&mut self) -> Option<(VertexIndex, VertexIndex)> {
        while self.source_pointer < self.source_by_degree.len()
            && self
                .mapping
                .is_mapped(self.source_by_degree[self.source_pointer])
        {
            self.source_pointer += 1;
        }
        while self.target_pointer < self.target_by_degree.len()
            && self
                .mapping
                .is_used(self.target_by_degree[self.target_pointer])
        {
            self.target_pointer += 1;
        }

        let source = *self.source_by_degree.get(self.source_pointer)?;
        let target = *self.target_by_degree.get(self.target_pointer)?;
        self.source_pointer += 1;
        self.target_pointer += 1;
        Some((source, target))
    }

    /// Commit a pair and propagate its target's identity to the
    /// unmapped neighbours of both ends. Returns false if either
    /// end has been taken before.
    pub fn commit(&mut self, source: VertexIndex, target: VertexIndex) -> bool {
        if self.mapping.is_mapped(source) || self.mapping.is_used(target) {
            return false;
        }

        self.partition.remove(Side::Source, source);
        self.partition.remove(Side::Target, target);
        self.mapping.assign(source, target);

        let source_graph = self.source;
        for &neighbour in source_graph.neighbours(source) {
            if !self.mapping.is_mapped(neighbour) {
                let colour = image_colour(self.partition.colour(Side::Source, neighbour), target);
                self.partition.recolour(Side::Source, neighbour, colour);
            }
        }

        let target_graph = self.target;
        for &neighbour in target_graph.neighbours(target) {
            if !self.mapping.is_used(neighbour) {
                let colour = image_colour(self.partition.colour(Side::Target, neighbour), target);
                self.partition.recolour(Side::Target, neighbour, colour);
            }
        }

        true
    }
}
