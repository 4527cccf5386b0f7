use crate::core::types::CycleWitness;
use fxhash::FxHashMap;

/// Maps each node reached by the search to the node it was reached from
pub type ParentMap<'g> = FxHashMap<&'g str, &'g str>;

/// Rebuild the cycle closed by the back-edge `node -> ancestor`
///
/// Walks the parent chain from `node` up to `ancestor`, then reverses the
/// collected labels so the result reads in edge-traversal order:
/// `[ancestor, ..., node, ancestor]`. If the chain ends before reaching
/// `ancestor` the partial path is returned as is.
pub fn reconstruct(parents: &ParentMap<'_>, node: &str, ancestor: &str) -> CycleWitness {
    let mut cycle = vec![ancestor.to_string()];
    let mut current = node;

    while current != ancestor {
        cycle.push(current.to_string());
        match parents.get(current) {
            Some(&parent) => current = parent,
            None => break,
        }
    }

    cycle.push(ancestor.to_string());
    cycle.reverse();
    cycle
}
