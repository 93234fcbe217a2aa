//! Generic depth-first search over dependency trees
//!
//! [`search`] applies an extractor to every (sub)tree in pre-order and
//! collects whatever the extractor returns. The extractor decides what a
//! match is; the searcher only knows how to walk the tree.

use crate::tree::DepTree;

/// Search a tree, collecting the non-`None` results of `extract`
///
/// `extract` is called on the root first, then on each child subtree in
/// child order, recursively. Results come back in that (pre-)order.
pub fn search<'t, 's, R, F>(tree: &'t DepTree<'s>, extract: F) -> Vec<R>
where
    F: Fn(&'t DepTree<'s>) -> Option<R>,
{
    let mut results = Vec::new();
    search_into(tree, &extract, &mut results);
    results
}

fn search_into<'t, 's, R, F>(tree: &'t DepTree<'s>, extract: &F, results: &mut Vec<R>)
where
    F: Fn(&'t DepTree<'s>) -> Option<R>,
{
    if let Some(found) = extract(tree) {
        results.push(found);
    }

    for child in &tree.children {
        search_into(child, extract, results);
    }
}
