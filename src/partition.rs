//! Colour classes of the still unmapped vertices of both graphs.
//!
//! Every colour present on both sides is either exact (one vertex
//! per side), ambiguous (queued by its combined class size) or dead.
//! Queue entries are not removed when a class changes; they are
//! checked against the live class sizes when popped instead.

use custom_debug_derive::Debug;
use rustc_hash::{FxHashMap, FxHashSet};
use std::{
    cmp::Reverse,
    collections::{BTreeSet, BinaryHeap},
};

use crate::graph::{Colour, VertexIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The graph that is mapped from (G).
    Source,
    /// The graph that is mapped onto (H).
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassState {
    /// Exactly one unmapped vertex per side.
    Exact,
    /// Both sides non-empty, combined size attached.
    Ambiguous(usize),
    /// At least one side has no unmapped vertex.
    Dead,
}

/// Buckets of one side. Vertices that got removed keep
/// their last colour but are not part of any bucket.
#[derive(Debug)]
struct Buckets {
    colours: Vec<Colour>,
    #[debug(skip)]
    present: Vec<bool>,
    members: FxHashMap<Colour, BTreeSet<VertexIndex>>,
}

impl Buckets {
    fn new(colours: Vec<Colour>) -> Self {
        let mut members: FxHashMap<Colour, BTreeSet<VertexIndex>> = FxHashMap::default();
        for (vertex, colour) in colours.iter().enumerate() {
            members.entry(*colour).or_default().insert(vertex);
        }

        Buckets {
            present: vec![true; colours.len()],
            colours,
            members,
        }
    }

    fn len(&self, colour: Colour) -> usize {
        self.members.get(&colour).map_or(0, BTreeSet::len)
    }

    fn first(&self, colour: Colour) -> Option<VertexIndex> {
        self.members
            .get(&colour)
            .and_then(|bucket| bucket.iter().next().copied())
    }

    /// Take the vertex out of its bucket and return the vacated colour.
    fn remove(&mut self, vertex: VertexIndex) -> Option<Colour> {
        if !self.present[vertex] {
            return None;
        }

        let colour = self.colours[vertex];
        if let Some(bucket) = self.members.get_mut(&colour) {
            bucket.remove(&vertex);
            if bucket.is_empty() {
                self.members.remove(&colour);
            }
        }
        self.present[vertex] = false;
        Some(colour)
    }

    fn insert(&mut self, vertex: VertexIndex, colour: Colour) {
        debug_assert!(!self.present[vertex]);

        self.colours[vertex] = colour;
        self.members.entry(colour).or_default().insert(vertex);
        self.present[vertex] = true;
    }

    #[cfg(test)]
    fn rebuilt(&self) -> FxHashMap<Colour, BTreeSet<VertexIndex>> {
        let mut members: FxHashMap<Colour, BTreeSet<VertexIndex>> = FxHashMap::default();
        for (vertex, colour) in self.colours.iter().enumerate() {
            if self.present[vertex] {
                members.entry(*colour).or_default().insert(vertex);
            }
        }
        members
    }
}

#[derive(Debug)]
pub struct PartitionIndex {
    source: Buckets,
    target: Buckets,
    exact: FxHashSet<Colour>,
    /// Pop order for `exact`, may contain colours that left the set.
    #[debug(skip)]
    exact_order: Vec<Colour>,
    #[debug(skip)]
    queue: BinaryHeap<Reverse<(usize, Colour)>>,
}

impl PartitionIndex {
    pub fn new(source_colours: Vec<Colour>, target_colours: Vec<Colour>) -> Self {
        let mut index = PartitionIndex {
            source: Buckets::new(source_colours),
            target: Buckets::new(target_colours),
            exact: FxHashSet::default(),
            exact_order: Vec::new(),
            queue: BinaryHeap::new(),
        };

        let mut shared = index
            .source
            .members
            .keys()
            .filter(|colour| index.target.members.contains_key(*colour))
            .copied()
            .collect::<Vec<Colour>>();
        shared.sort_unstable();

        for colour in shared {
            index.update(colour);
        }

        index
    }

    fn buckets(&self, side: Side) -> &Buckets {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    fn buckets_mut(&mut self, side: Side) -> &mut Buckets {
        match side {
            Side::Source => &mut self.source,
            Side::Target => &mut self.target,
        }
    }

    pub fn colour(&self, side: Side, vertex: VertexIndex) -> Colour {
        self.buckets(side).colours[vertex]
    }

    #[cfg(test)]
    pub fn class_size(&self, side: Side, colour: Colour) -> usize {
        self.buckets(side).len(colour)
    }

    pub fn class_state(&self, colour: Colour) -> ClassState {
        let source_size = self.source.len(colour);
        let target_size = self.target.len(colour);

        if source_size == 0 || target_size == 0 {
            ClassState::Dead
        } else if source_size == 1 && target_size == 1 {
            ClassState::Exact
        } else {
            ClassState::Ambiguous(source_size + target_size)
        }
    }

    /// Reclassify a colour from its live class sizes.
    pub fn update(&mut self, colour: Colour) {
        match self.class_state(colour) {
            ClassState::Exact => {
                if self.exact.insert(colour) {
                    self.exact_order.push(colour);
                }
            }
            ClassState::Ambiguous(size) => {
                self.exact.remove(&colour);
                self.queue.push(Reverse((size, colour)));
            }
            ClassState::Dead => {
                self.exact.remove(&colour);
            }
        }
    }

    /// Take a vertex out of the partition.
    pub fn remove(&mut self, side: Side, vertex: VertexIndex) {
        if let Some(vacated) = self.buckets_mut(side).remove(vertex) {
            self.update(vacated);
        }
    }

    /// Put a removed vertex back with a new colour.
    pub fn insert(&mut self, side: Side, vertex: VertexIndex, colour: Colour) {
        self.buckets_mut(side).insert(vertex, colour);
        self.update(colour);
    }

    pub fn recolour(&mut self, side: Side, vertex: VertexIndex, colour: Colour) {
        self.remove(side, vertex);
        self.insert(side, vertex, colour);
    }

    #[cfg(test)]
    pub fn has_exact(&self) -> bool {
        !self.exact.is_empty()
    }

    /// Pop an exact colour together with the unique pair it names.
    pub fn pop_exact(&mut self) -> Option<(Colour, VertexIndex, VertexIndex)> {
        while let Some(colour) = self.exact_order.pop() {
            if !self.exact.remove(&colour) {
                continue;
            }

            if self.class_state(colour) == ClassState::Exact {
                if let (Some(source), Some(target)) =
                    (self.source.first(colour), self.target.first(colour))
                {
                    return Some((colour, source, target));
                }
            }
        }

        None
    }

    /// Pop the ambiguous colour with the smallest combined class size,
    /// dropping stale queue entries on the way.
    pub fn pop_ambiguous(&mut self) -> Option<Colour> {
        while let Some(Reverse((size, colour))) = self.queue.pop() {
            if self.class_state(colour) == ClassState::Ambiguous(size) {
                return Some(colour);
            }
        }

        None
    }

    /// Up to `limit` pairs from the classes of `colour`, first with first.
    pub fn candidates(&self, colour: Colour, limit: usize) -> Vec<(VertexIndex, VertexIndex)> {
        match (self.source.members.get(&colour), self.target.members.get(&colour)) {
            (Some(sources), Some(targets)) => sources
                .iter()
                .copied()
                .zip(targets.iter().copied())
                .take(limit)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Compare the maintained state with one rebuilt from the live colours.
    #[cfg(test)]
    pub fn is_consistent(&self) -> bool {
        if self.source.rebuilt() != self.source.members
            || self.target.rebuilt() != self.target.members
        {
            return false;
        }

        if self
            .exact
            .iter()
            .any(|colour| self.class_state(*colour) != ClassState::Exact)
        {
            return false;
        }

        let queued = self
            .queue
            .iter()
            .map(|Reverse(entry)| *entry)
            .collect::<FxHashSet<(usize, Colour)>>();

        self.source.members.keys().all(|colour| {
            match self.class_state(*colour) {
                ClassState::Exact => self.exact.contains(colour),
                ClassState::Ambiguous(size) => queued.contains(&(size, *colour)),
                ClassState::Dead => true,
            }
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> PartitionIndex {
        PartitionIndex::new(vec![1, 1, 2, 3, 1], vec![1, 2, 1, 4, 5])
    }

    #[test]
    fn test_new_classifies_colours() {
        let index = sample();

        assert_eq!(ClassState::Ambiguous(5), index.class_state(1));
        assert_eq!(ClassState::Exact, index.class_state(2));
        assert_eq!(ClassState::Dead, index.class_state(3));
        assert_eq!(ClassState::Dead, index.class_state(4));
        assert_eq!(3, index.class_size(Side::Source, 1));
        assert_eq!(2, index.class_size(Side::Target, 1));
        assert!(index.has_exact());
        assert!(index.is_consistent());
    }

    #[test]
    fn test_pop_exact_names_unique_pair() {
        let mut index = sample();

        assert_eq!(Some((2, 2, 1)), index.pop_exact());
        assert_eq!(None, index.pop_exact());
        assert!(!index.has_exact());
    }

    #[test]
    fn test_pop_exact_skips_invalidated_colour() {
        let mut index = sample();

        // Colour 2 dies on the target side before it is popped.
        index.remove(Side::Target, 1);
        assert_eq!(ClassState::Dead, index.class_state(2));
        assert_eq!(None, index.pop_exact());
        assert!(index.is_consistent());
    }

    #[test]
    fn test_pop_ambiguous_discards_stale_entries() {
        let mut index = sample();

        // Shrinks colour 1 from 3 + 2 to 2 + 2, leaving a stale entry behind.
        index.remove(Side::Source, 0);
        assert_eq!(ClassState::Ambiguous(4), index.class_state(1));
        assert!(index.is_consistent());

        assert_eq!(Some(1), index.pop_ambiguous());
        // The entry with size 5 is stale and must not be handed out.
        assert_eq!(None, index.pop_ambiguous());
    }

    #[test]
    fn test_recolour_creates_exact_class() {
        let mut index = sample();

        index.recolour(Side::Source, 4, 7);
        assert_eq!(ClassState::Dead, index.class_state(7));
        index.recolour(Side::Target, 2, 7);
        assert_eq!(ClassState::Exact, index.class_state(7));
        assert_eq!(7, index.colour(Side::Source, 4));
        assert_eq!(ClassState::Ambiguous(3), index.class_state(1));
        assert!(index.is_consistent());

        let mut popped = Vec::new();
        while let Some(exact) = index.pop_exact() {
            popped.push(exact);
        }
        popped.sort_unstable();
        assert_eq!(vec![(2, 2, 1), (7, 4, 2)], popped);
    }

    #[test]
    fn test_removed_vertices_leave_all_buckets() {
        let mut index = sample();

        index.remove(Side::Source, 0);
        index.remove(Side::Source, 0);
        index.remove(Side::Source, 1);
        index.remove(Side::Target, 0);
        assert_eq!(1, index.class_size(Side::Source, 1));
        assert_eq!(1, index.class_size(Side::Target, 1));
        assert_eq!(ClassState::Exact, index.class_state(1));
        assert!(index.is_consistent());
    }

    #[test]
    fn test_candidates_in_index_order() {
        let index = sample();

        assert_eq!(vec![(0, 0), (1, 2)], index.candidates(1, 10));
        assert_eq!(vec![(0, 0)], index.candidates(1, 1));
        assert!(index.candidates(3, 10).is_empty());
    }

    #[test]
    fn test_consistency_detects_stale_exact_colour() {
        let mut index = sample();

        index.exact.insert(1);
        assert!(!index.is_consistent());
    }
}
