//! The partial mapping from source to target vertices
//! and its completion to a full permutation.

use custom_debug_derive::Debug;

use crate::graph::VertexIndex;

/// Injective, write-once assignment of target vertices to source vertices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    images: Vec<Option<VertexIndex>>,
    #[debug(skip)]
    used: Vec<bool>,
    mapped: usize,
}

impl Mapping {
    pub fn new(n: usize) -> Self {
        Mapping {
            images: vec![None; n],
            used: vec![false; n],
            mapped: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.images.len()
    }

    pub fn mapped_count(&self) -> usize {
        self.mapped
    }

    pub fn unmapped_count(&self) -> usize {
        self.size() - self.mapped
    }

    pub fn is_complete(&self) -> bool {
        self.mapped == self.size()
    }

    #[cfg(test)]
    pub fn image(&self, source: VertexIndex) -> Option<VertexIndex> {
        self.images[source]
    }

    pub fn is_mapped(&self, source: VertexIndex) -> bool {
        self.images[source].is_some()
    }

    pub fn is_used(&self, target: VertexIndex) -> bool {
        self.used[target]
    }

    /// Map `source` onto `target` unless either of them is taken already.
    pub fn assign(&mut self, source: VertexIndex, target: VertexIndex) -> bool {
        if self.is_mapped(source) || self.is_used(target) {
            return false;
        }

        self.images[source] = Some(target);
        self.used[target] = true;
        self.mapped += 1;
        true
    }

    /// Pair the remaining source vertices with the unused target
    /// vertices, both in index order, and return the permutation.
    pub fn complete(self) -> Vec<VertexIndex> {
        let size = self.size();
        let Mapping { images, used, .. } = self;
        let mut unused = used
            .into_iter()
            .enumerate()
            .filter(|(_, used)| !used)
            .map(|(target, _)| target);

        // There are as many unused targets as unmapped sources.
        let permutation = images
            .into_iter()
            .filter_map(|image| image.or_else(|| unused.next()))
            .collect::<Vec<VertexIndex>>();
        debug_assert_eq!(size, permutation.len());
        debug_assert!(unused.next().is_none());

        permutation
    }
}
