//! Parser for the two-graph problem instance.
//! The file is a whitespace separated token stream
//! `n m` followed by `m` edges of G, an optional
//! repetition of `n m` and then `m` edges of H.

use custom_debug_derive::Debug;
use log::{info, warn};
use std::{fs, path::Path};

use crate::{
    graph::{Graph, GraphError, VertexIndex},
    Error,
};

use super::{Input, ParseResult};

type RawEdge = (i64, i64);

/// Both graphs of an instance, normalized to zero-based indices.
#[derive(Debug, Clone)]
pub struct Instance {
    pub source: Graph,
    pub target: Graph,
    /// Subtracted from every input identifier, added back on output.
    pub offset: i64,
}

impl Instance {
    pub fn size(&self) -> usize {
        self.source.size()
    }
}

/// Parse a single integer token, skipping leading whitespace.
/// The token has to end at whitespace or at the end of the input.
fn parse_token(input: Input<'_>) -> ParseResult<'_, i64> {
    use nom::{
        branch::alt,
        character::complete::{i64, multispace0, multispace1},
        combinator::{eof, peek},
        error::context,
        sequence::{preceded, terminated},
    };

    context(
        "integer token",
        preceded(multispace0, terminated(i64, peek(alt((multispace1, eof))))),
    )(input)
}

/// Parse a non-negative count.
fn parse_count(input: Input<'_>) -> ParseResult<'_, usize> {
    use nom::{combinator::map_res, error::context};

    context("non-negative count", map_res(parse_token, usize::try_from))(input)
}

/// Parse the `n m` header.
fn parse_header(input: Input<'_>) -> ParseResult<'_, (usize, usize)> {
    use nom::{error::context, sequence::pair};

    context("graph size header", pair(parse_count, parse_count))(input)
}

fn parse_edge(input: Input<'_>) -> ParseResult<'_, RawEdge> {
    use nom::{error::context, sequence::pair};

    context("edge", pair(parse_token, parse_token))(input)
}

/// Parse exactly `edge_count` edges.
fn parse_edges(edge_count: usize, mut input: Input<'_>) -> ParseResult<'_, Vec<RawEdge>> {
    // The declared count is untrusted, so the list grows as edges are read.
    let mut edges = Vec::new();

    for _ in 0..edge_count {
        let (rest, edge) = parse_edge(input)?;
        edges.push(edge);
        input = rest;
    }

    Ok((input, edges))
}

/// Skip a repetition of the `n m` header in front of the edges of H.
/// The header only counts as repeated if enough tokens remain for it
/// and all edges of H, and it matches the first header.
fn skip_repeated_header(
    size: usize,
    edge_count: usize,
    input: Input<'_>,
) -> ParseResult<'_, bool> {
    let needed = edge_count.saturating_mul(2).saturating_add(2);
    let available = input.split_whitespace().take(needed).count();

    if available >= needed {
        if let Ok((rest, header)) = parse_header(input) {
            if header == (size, edge_count) {
                return Ok((rest, true));
            }
        }
    }

    Ok((input, false))
}

fn normalize(id: i64, offset: i64) -> Result<VertexIndex, GraphError> {
    let index = id.checked_sub(offset).ok_or(GraphError(id))?;
    VertexIndex::try_from(index).map_err(|_| GraphError(index))
}

fn build_graph(size: usize, offset: i64, edges: &[RawEdge]) -> Result<Graph, GraphError> {
    let mut graph = Graph::new_ordered(size);

    for &(start, end) in edges {
        graph.add_edge(normalize(start, offset)?, normalize(end, offset)?)?;
    }

    Ok(graph)
}

fn minimum_id(edges: &[RawEdge]) -> Option<i64> {
    edges.iter().flat_map(|&(start, end)| [start, end]).min()
}

pub fn parse_instance(input: Input<'_>) -> Result<Instance, Error> {
    use nom::character::complete::multispace0;

    let (input, (size, edge_count)) = parse_header(input)?;
    let (input, source_edges) = parse_edges(edge_count, input)?;
    let (input, repeated_header) = skip_repeated_header(size, edge_count, input)?;
    let (input, target_edges) = parse_edges(edge_count, input)?;

    let (rest, _) = multispace0::<_, super::ParseError<'_>>(input)?;
    if !rest.is_empty() {
        warn!(
            "Ignoring {} tokens after the edges of the second graph",
            rest.split_whitespace().count()
        );
    }

    let offset = minimum_id(&source_edges).unwrap_or(1);
    // The second graph shares the numbering of the first one.
    if let Some(target_minimum) = minimum_id(&target_edges) {
        if target_minimum != offset {
            warn!(
                "Second graph starts at identifier {}, first graph at {}",
                target_minimum, offset
            );
        }
    }

    let source = build_graph(size, offset, &source_edges)?;
    let target = build_graph(size, offset, &target_edges)?;

    info!(
        "Loaded graphs with n={} m={} (offset {}, repeated header: {})",
        size, edge_count, offset, repeated_header
    );

    Ok(Instance {
        source,
        target,
        offset,
    })
}

pub fn load_instance<P: AsRef<Path>>(path: P) -> Result<Instance, Error> {
    let content = fs::read_to_string(path)?;
    parse_instance(&content)
}
