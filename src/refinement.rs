//! Colour refinement in the style of Weisfeiler-Leman.
//!
//! Colours are combined with XXH3 over their little-endian
//! encoding so that the same input yields the same colours
//! in every process.

use xxhash_rust::xxh3::Xxh3;

use crate::graph::{Colour, Graph, VertexIndex};

/// Keeps the two combinations apart, even for equal payloads.
const NEIGHBOURHOOD_TAG: u8 = 0x4e;
const IMAGE_TAG: u8 = 0x49;

/// Combine a colour with the sorted colours of its neighbours.
pub fn neighbourhood_colour(own: Colour, sorted_neighbours: &[Colour]) -> Colour {
    debug_assert!(sorted_neighbours.windows(2).all(|pair| pair[0] <= pair[1]));

    let mut hasher = Xxh3::new();
    hasher.update(&[NEIGHBOURHOOD_TAG]);
    hasher.update(&own.to_le_bytes());
    hasher.update(&(sorted_neighbours.len() as u64).to_le_bytes());
    for colour in sorted_neighbours {
        hasher.update(&colour.to_le_bytes());
    }
    hasher.digest()
}

/// Combine a colour with the target vertex a neighbour was mapped to.
pub fn image_colour(own: Colour, image: VertexIndex) -> Colour {
    let mut hasher = Xxh3::new();
    hasher.update(&[IMAGE_TAG]);
    hasher.update(&own.to_le_bytes());
    hasher.update(&(image as u64).to_le_bytes());
    hasher.digest()
}

/// Degrees as starting colours.
pub fn initial_colours(graph: &Graph) -> Vec<Colour> {
    graph
        .degrees()
        .into_iter()
        .map(|degree| degree as Colour)
        .collect()
}

/// One refinement round over all vertices.
pub fn refinement_round(graph: &Graph, colours: &[Colour]) -> Vec<Colour> {
    let mut neighbour_colours = Vec::new();

    (0..graph.size())
        .map(|vertex| {
            neighbour_colours.clear();
            neighbour_colours.extend(graph.neighbours(vertex).iter().map(|end| colours[*end]));
            neighbour_colours.sort_unstable();
            neighbourhood_colour(colours[vertex], &neighbour_colours)
        })
        .collect()
}

/// Refine the degree colouring for a fixed number of rounds.
pub fn refine_colours(graph: &Graph, rounds: usize) -> Vec<Colour> {
    let mut colours = initial_colours(graph);
    for _ in 0..rounds {
        colours = refinement_round(graph, &colours);
    }
    colours
}

#[cfg(test)]
mod test {
    use itertools::Itertools;

    use super::*;
    use crate::graph::GraphError;

    fn graph_from_edges(
        edges: &[(VertexIndex, VertexIndex)],
        size: usize,
    ) -> Result<Graph, GraphError> {
        let mut graph = Graph::new_ordered(size);
        for (start, end) in edges {
            graph.add_edge(*start, *end)?;
        }
        Ok(graph)
    }

    #[test]
    fn test_initial_colours_are_degrees() -> Result<(), GraphError> {
        let graph = graph_from_edges(&[(0, 1), (1, 2), (1, 3)], 5)?;
        assert_eq!(vec![1, 3, 1, 1, 0], initial_colours(&graph));
        assert_eq!(initial_colours(&graph), refine_colours(&graph, 0));
        Ok(())
    }

    #[test]
    fn test_refinement_is_deterministic() -> Result<(), GraphError> {
        let graph = graph_from_edges(&[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0), (0, 2)], 5)?;
        assert_eq!(refine_colours(&graph, 8), refine_colours(&graph, 8));
        assert_eq!(image_colour(17, 3), image_colour(17, 3));
        Ok(())
    }

    #[test]
    fn test_colours_are_fixed_across_processes() -> Result<(), GraphError> {
        assert_eq!(6251618468992231180, neighbourhood_colour(5, &[]));
        assert_eq!(8951805205879378100, neighbourhood_colour(1, &[2, 3]));
        assert_eq!(14165156316496699733, image_colour(5, 0));
        assert_eq!(2138853507935111673, image_colour(7, 3));

        let path = graph_from_edges(&[(0, 1), (1, 2)], 3)?;
        assert_eq!(
            vec![1808948739684928452, 14120270439778010904, 1808948739684928452],
            refine_colours(&path, 1)
        );
        assert_eq!(
            vec![784205720026475832, 9790130200012789941, 784205720026475832],
            refine_colours(&path, 8)
        );
        Ok(())
    }

    #[test]
    fn test_refinement_ignores_neighbour_order() -> Result<(), GraphError> {
        let forward = graph_from_edges(&[(0, 1), (0, 2), (0, 3), (3, 4)], 5)?;
        let backward = graph_from_edges(&[(3, 4), (0, 3), (2, 0), (1, 0)], 5)?;
        assert_eq!(refine_colours(&forward, 8), refine_colours(&backward, 8));
        Ok(())
    }

    #[test]
    fn test_refinement_separates_positions() -> Result<(), GraphError> {
        // Path 0-1-2-3-4: ends, inner vertices and the centre differ.
        let graph = graph_from_edges(&[(0, 1), (1, 2), (2, 3), (3, 4)], 5)?;
        let colours = refine_colours(&graph, 8);

        assert_eq!(colours[0], colours[4]);
        assert_eq!(colours[1], colours[3]);
        assert_eq!(3, colours.iter().unique().count());
        Ok(())
    }

    #[test]
    fn test_relabelled_graph_has_same_colour_multiset() -> Result<(), GraphError> {
        let graph = graph_from_edges(&[(0, 1), (1, 2), (2, 3), (1, 4), (4, 5)], 6)?;
        // Relabel with the permutation i -> 5 - i.
        let relabelled = graph_from_edges(&[(5, 4), (4, 3), (3, 2), (4, 1), (1, 0)], 6)?;

        let colours = refine_colours(&graph, 8);
        let relabelled_colours = refine_colours(&relabelled, 8);
        for index in 0..6 {
            assert_eq!(colours[index], relabelled_colours[5 - index]);
        }
        Ok(())
    }

    #[test]
    fn test_image_colour_depends_on_image() {
        assert_ne!(image_colour(5, 0), image_colour(5, 1));
        assert_ne!(image_colour(5, 0), image_colour(6, 0));
        assert_ne!(image_colour(5, 0), neighbourhood_colour(5, &[0]));
    }
}
