//! Quality measures of a finished alignment.

use rustc_hash::FxHashSet;

use crate::graph::{Graph, VertexIndex};

fn undirected(start: VertexIndex, end: VertexIndex) -> (VertexIndex, VertexIndex) {
    if start <= end {
        (start, end)
    } else {
        (end, start)
    }
}

/// Every value of `0..len` appears exactly once.
pub fn is_permutation(permutation: &[VertexIndex]) -> bool {
    let mut seen = vec![false; permutation.len()];
    for image in permutation {
        match seen.get_mut(*image) {
            Some(flag) if !*flag => *flag = true,
            _ => return false,
        }
    }
    true
}

/// Number of source edges whose image under `permutation` is a target edge.
pub fn preserved_edges(source: &Graph, target: &Graph, permutation: &[VertexIndex]) -> usize {
    assert_eq!(source.size(), permutation.len());

    let target_edges = target
        .iterate_edges()
        .map(|(start, end)| undirected(start, end))
        .collect::<FxHashSet<_>>();

    source
        .iterate_edges()
        .filter(|(start, end)| {
            target_edges.contains(&undirected(permutation[*start], permutation[*end]))
        })
        .count()
}
