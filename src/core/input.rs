//! Text input for the one-shot checks
//!
//! Both formats are whitespace-separated tokens, so values may be split over
//! lines freely.
//!
//! RAG input: an edge count followed by that many `from to` label pairs.
//!
//! ```text
//! 4
//! P0 R1  R1 P1
//! P1 R2  R2 P0
//! ```
//!
//! Banker input: `n m`, then `n` rows of `m` maximum demands, then `n` rows of
//! `m` allocations, then `m` available units.

use crate::core::banker::BankerState;
use crate::core::graph::ResourceAllocationGraph;
use anyhow::{Context, Result, bail};
use std::str::SplitWhitespace;

/// Token cursor with descriptive errors
struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(input: &'a str) -> Self {
        Tokens {
            inner: input.split_whitespace(),
        }
    }

    fn next_token(&mut self, what: &str) -> Result<&'a str> {
        match self.inner.next() {
            Some(token) => Ok(token),
            None => bail!("Unexpected end of input while reading {what}"),
        }
    }

    fn next_count(&mut self, what: &str) -> Result<usize> {
        let token = self.next_token(what)?;
        token
            .parse()
            .with_context(|| format!("Invalid {what}: '{token}'"))
    }

    fn next_units(&mut self, what: &str) -> Result<i64> {
        let token = self.next_token(what)?;
        token
            .parse()
            .with_context(|| format!("Invalid {what}: '{token}'"))
    }

    fn matrix(&mut self, rows: usize, cols: usize, name: &str) -> Result<Vec<Vec<i64>>> {
        (0..rows)
            .map(|i| {
                (0..cols)
                    .map(|j| self.next_units(&format!("{name}[{i}][{j}]")))
                    .collect::<Result<Vec<_>>>()
            })
            .collect()
    }
}

/// Parse an edge list into `(from, to)` pairs
///
/// Labels are not validated; any non-whitespace token is a node name.
pub fn parse_rag_edges(input: &str) -> Result<Vec<(String, String)>> {
    let mut tokens = Tokens::new(input);
    let count = tokens.next_count("edge count")?;

    (0..count)
        .map(|i| {
            let from = tokens.next_token(&format!("source of edge {i}"))?;
            let to = tokens.next_token(&format!("target of edge {i}"))?;
            Ok((from.to_string(), to.to_string()))
        })
        .collect()
}

/// Parse an edge list straight into a graph
pub fn parse_rag(input: &str) -> Result<ResourceAllocationGraph> {
    Ok(ResourceAllocationGraph::from_edges(parse_rag_edges(input)?))
}

/// Parse `n`, `m`, the max and allocation matrices and the available vector
pub fn parse_banker_state(input: &str) -> Result<BankerState> {
    let mut tokens = Tokens::new(input);
    let n = tokens.next_count("number of processes")?;
    let m = tokens.next_count("number of resource types")?;

    let max_need = tokens.matrix(n, m, "max")?;
    let allocation = tokens.matrix(n, m, "allocation")?;
    let available = (0..m)
        .map(|j| tokens.next_units(&format!("available[{j}]")))
        .collect::<Result<Vec<_>>>()?;

    Ok(BankerState::new(max_need, allocation, available))
}
