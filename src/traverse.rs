//! Depth-first traversal with six hooks.
//!
//! Consumers (the macro engine, printers, tests) implement [`Visitor`] and
//! hand it to [`walk`]; the tree type itself knows nothing about them.
//! For every node the hooks run in this order:
//!
//! ```text
//! before_node
//! before_children
//!   for each child i:
//!     before_child(parent, i)
//!     <walk child>
//!     after_child(parent, i)
//! after_children
//! after_node
//! ```
//!
//! Hooks receive the node mutably and may rewrite it, including replacing it
//! wholesale. The child count is re-read before every step, so a hook that
//! replaces a child sees the replacement's subtree walked; hooks must not
//! reorder the parent's children while the parent is iterating.
//!
//! Read-only consumers implement [`Inspector`] instead and use [`inspect`],
//! which visits a shared tree in the same order.

use std::convert::Infallible;

use crate::ast::{Ast, Kind};

/// Hook set for [`walk`]. Every hook defaults to a no-op.
///
/// `depth` is 0 for the root passed to [`walk`]. The first hook that returns
/// an error aborts the walk and the error is returned unchanged.
pub trait Visitor {
    type Error;

    fn before_node(&mut self, node: &mut Ast, depth: usize) -> Result<(), Self::Error> {
        let _ = (node, depth);
        Ok(())
    }

    fn before_children(&mut self, node: &mut Ast, depth: usize) -> Result<(), Self::Error> {
        let _ = (node, depth);
        Ok(())
    }

    /// Called on the parent before its `index`-th child is walked.
    fn before_child(
        &mut self,
        parent: &mut Ast,
        index: usize,
        depth: usize,
    ) -> Result<(), Self::Error> {
        let _ = (parent, index, depth);
        Ok(())
    }

    /// Called on the parent after its `index`-th child was walked.
    fn after_child(
        &mut self,
        parent: &mut Ast,
        index: usize,
        depth: usize,
    ) -> Result<(), Self::Error> {
        let _ = (parent, index, depth);
        Ok(())
    }

    fn after_children(&mut self, node: &mut Ast, depth: usize) -> Result<(), Self::Error> {
        let _ = (node, depth);
        Ok(())
    }

    fn after_node(&mut self, node: &mut Ast, depth: usize) -> Result<(), Self::Error> {
        let _ = (node, depth);
        Ok(())
    }
}

/// Walks `root` depth-first, invoking the six hooks of `visitor`.
pub fn walk<V: Visitor + ?Sized>(root: &mut Ast, visitor: &mut V) -> Result<(), V::Error> {
    walk_at(root, 0, visitor)
}

fn walk_at<V: Visitor + ?Sized>(
    node: &mut Ast,
    depth: usize,
    visitor: &mut V,
) -> Result<(), V::Error> {
    visitor.before_node(node, depth)?;
    visitor.before_children(node, depth)?;

    let mut index = 0;
    while index < node.children().len() {
        visitor.before_child(node, index, depth)?;
        if let Some(child) = node.children_mut().get_mut(index) {
            walk_at(child, depth + 1, visitor)?;
        }
        visitor.after_child(node, index, depth)?;
        index += 1;
    }

    visitor.after_children(node, depth)?;
    visitor.after_node(node, depth)
}

// ============================================================================
// READ-ONLY TRAVERSAL
// ============================================================================

/// The same six hooks over a shared tree, for consumers that only look
/// (printers, recorders). Hook order matches [`Visitor`].
pub trait Inspector {
    type Error;

    fn before_node(&mut self, node: &Ast, depth: usize) -> Result<(), Self::Error> {
        let _ = (node, depth);
        Ok(())
    }

    fn before_children(&mut self, node: &Ast, depth: usize) -> Result<(), Self::Error> {
        let _ = (node, depth);
        Ok(())
    }

    fn before_child(&mut self, parent: &Ast, index: usize, depth: usize) -> Result<(), Self::Error> {
        let _ = (parent, index, depth);
        Ok(())
    }

    fn after_child(&mut self, parent: &Ast, index: usize, depth: usize) -> Result<(), Self::Error> {
        let _ = (parent, index, depth);
        Ok(())
    }

    fn after_children(&mut self, node: &Ast, depth: usize) -> Result<(), Self::Error> {
        let _ = (node, depth);
        Ok(())
    }

    fn after_node(&mut self, node: &Ast, depth: usize) -> Result<(), Self::Error> {
        let _ = (node, depth);
        Ok(())
    }
}

/// Walks `root` depth-first without mutating or copying it.
pub fn inspect<I: Inspector + ?Sized>(root: &Ast, inspector: &mut I) -> Result<(), I::Error> {
    inspect_at(root, 0, inspector)
}

fn inspect_at<I: Inspector + ?Sized>(
    node: &Ast,
    depth: usize,
    inspector: &mut I,
) -> Result<(), I::Error> {
    inspector.before_node(node, depth)?;
    inspector.before_children(node, depth)?;
    for (index, child) in node.children().iter().enumerate() {
        inspector.before_child(node, index, depth)?;
        inspect_at(child, depth + 1, inspector)?;
        inspector.after_child(node, index, depth)?;
    }
    inspector.after_children(node, depth)?;
    inspector.after_node(node, depth)
}

/// Records node kinds in post-order (`after_children`).
#[derive(Debug, Default)]
pub struct KindRecorder {
    pub kinds: Vec<Kind>,
}

impl Inspector for KindRecorder {
    type Error = Infallible;

    fn after_children(&mut self, node: &Ast, _depth: usize) -> Result<(), Infallible> {
        self.kinds.push(node.kind());
        Ok(())
    }
}

/// Post-order kinds of `root`, root last.
pub fn post_order_kinds(root: &Ast) -> Vec<Kind> {
    let mut recorder = KindRecorder::default();
    if let Err(never) = inspect(root, &mut recorder) {
        match never {}
    }
    recorder.kinds
}

/// Space-separated `as_str` names of [`post_order_kinds`].
pub fn post_order_names(root: &Ast) -> String {
    post_order_kinds(root)
        .iter()
        .map(Kind::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}
