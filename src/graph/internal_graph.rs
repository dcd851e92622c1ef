use custom_debug_derive::Debug;

use super::{GraphError, VertexIndex};

/// Fixed size undirected graph.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Graph {
    vertices: Vec<Vertex>,
    size: usize,
    #[debug(skip)]
    edges: Vec<(VertexIndex, VertexIndex)>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Vertex {
    edges_to: Vec<VertexIndex>,
}

impl Graph {
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of undirected edges, counted as given in the input.
    pub fn number_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn new_ordered(n: usize) -> Self {
        Graph {
            vertices: vec![Vertex::default(); n],
            size: n,
            edges: Vec::new(),
        }
    }

    fn check_index(&self, index: VertexIndex) -> Result<(), GraphError> {
        if index < self.size {
            Ok(())
        } else {
            Err(GraphError(index as i64))
        }
    }

    /// Add an undirected edge. Both ends are checked before
    /// anything is changed, so a failed call leaves the graph untouched.
    pub fn add_edge(&mut self, start: VertexIndex, end: VertexIndex) -> Result<(), GraphError> {
        self.check_index(start)?;
        self.check_index(end)?;

        self.vertices[start].add_edge(end);
        self.vertices[end].add_edge(start);
        self.edges.push((start, end));
        Ok(())
    }

    pub fn neighbours(&self, index: VertexIndex) -> &[VertexIndex] {
        &self.vertices[index].edges_to
    }

    pub fn degree(&self, index: VertexIndex) -> usize {
        self.vertices[index].edges_to.len()
    }

    pub fn degrees(&self) -> Vec<usize> {
        self.vertices
            .iter()
            .map(|vertex| vertex.edges_to.len())
            .collect()
    }

    /// Edges in input order, each undirected edge once.
    pub fn iterate_edges(&self) -> impl Iterator<Item = (VertexIndex, VertexIndex)> + '_ {
        self.edges.iter().copied()
    }
}

impl Vertex {
    fn add_edge(&mut self, end: VertexIndex) {
        self.edges_to.push(end);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn new_graph_default() {
        let graph = Graph::new_ordered(120);
        assert_eq!(120, graph.size());
        assert_eq!(0, graph.number_edges());
        assert!(graph.vertices.iter().all(|vertex| vertex.edges_to.is_empty()));
    }

    #[test]
    fn test_add_edge() {
        let mut graph = Graph::new_ordered(5);

        assert_eq!(Ok(()), graph.add_edge(0, 3));
        assert_eq!(Ok(()), graph.add_edge(3, 4));
        assert_eq!(2, graph.number_edges());
        assert_eq!(&[3], graph.neighbours(0));
        assert_eq!(&[0, 4], graph.neighbours(3));
        assert_eq!(vec![1, 0, 0, 2, 1], graph.degrees());

        // Index out of bounds on either end leaves the graph unchanged.
        assert_eq!(Err(GraphError(5)), graph.add_edge(5, 1));
        assert_eq!(Err(GraphError(7)), graph.add_edge(1, 7));
        assert_eq!(0, graph.degree(1));
        assert_eq!(2, graph.number_edges());
    }

    #[test]
    fn test_iterate_edges() {
        let mut graph = Graph::new_ordered(4);
        graph.add_edge(0, 1).unwrap();
        graph.add_edge(2, 1).unwrap();
        graph.add_edge(3, 3).unwrap();

        assert_eq!(&[0, 2], graph.neighbours(1));

        let edges = graph.iterate_edges().collect::<Vec<_>>();
        assert_eq!(vec![(0, 1), (2, 1), (3, 3)], edges);
        // A self loop counts twice towards the degree.
        assert_eq!(2, graph.degree(3));
    }
}
