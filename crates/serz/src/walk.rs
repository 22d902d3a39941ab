//! Pre-order traversal of the content tree.
//!
//! A node is visited before its children, and children are visited in the
//! order their records appear in the stream (see [`Content::children`]).
//! References are visited as leaves; their targets are visited where they were
//! first materialized. The first callback error aborts the traversal and is
//! returned unchanged.

use crate::content::Content;

/// Visits `content` and every node below it.
pub fn walk<E, F>(content: &Content, callback: &mut F) -> Result<(), E>
where
    F: FnMut(&Content) -> Result<(), E>,
{
    callback(content)?;
    for child in content.children() {
        walk(child, callback)?;
    }
    Ok(())
}

/// Like [`walk`], but the callback may rewrite the node it is given.
///
/// Children are collected after the callback returns, so a rewritten node is
/// traversed in its new shape. Callbacks must not change handles or remove
/// handle-bearing nodes, or the stream will no longer re-encode consistently.
pub fn walk_mut<E, F>(content: &mut Content, callback: &mut F) -> Result<(), E>
where
    F: FnMut(&mut Content) -> Result<(), E>,
{
    callback(content)?;
    for child in content.children_mut() {
        walk_mut(child, callback)?;
    }
    Ok(())
}
