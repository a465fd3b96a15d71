use std::collections::HashMap;
use std::vec::IntoIter;

use serde::Serialize;

use crate::table::{Id, KeyHasher};

// ------------- Forest -------------
/// Sentinel parent id marking a row as a root of the forest.
pub const ROOT: Id = 0;

/// A row that points at its parent row, with [`ROOT`] meaning "no parent".
pub trait Parented {
    fn id(&self) -> Id;
    fn parent(&self) -> Id;
}

/// A row together with the rows that point at it. Serializes as the row's own
/// fields with a `children` array inlined alongside them, which is the shape
/// tree widgets want to consume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node<T> {
    #[serde(flatten)]
    pub record: T,
    pub children: Vec<Node<T>>,
}

// Detaches every descendant into a flat queue before the node itself goes, so
// tearing down a forest never nests one drop call per level.
impl<T> Drop for Node<T> {
    fn drop(&mut self) {
        let mut queue = std::mem::take(&mut self.children);
        while let Some(mut node) = queue.pop() {
            queue.append(&mut node.children);
        }
    }
}

// One node mid-assembly: the rows still waiting to hang under it and the
// children already built.
struct Frame<T> {
    record: T,
    pending: IntoIter<T>,
    children: Vec<Node<T>>,
}

impl<T: Parented> Frame<T> {
    fn open(row: T, buckets: &mut HashMap<Id, Vec<T>, KeyHasher>) -> Frame<T> {
        let pending = buckets.remove(&row.id()).unwrap_or_default().into_iter();
        Frame {
            record: row,
            children: Vec::with_capacity(pending.len()),
            pending,
        }
    }

    fn close(self) -> Node<T> {
        Node {
            record: self.record,
            children: self.children,
        }
    }
}

/// Arranges a flat list of parent-pointing rows into a forest.
///
/// Roots appear in input order, and so do the children under any one parent.
/// Every node carries a `children` vector, empty for leaves. Rows whose parent
/// chain never reaches [`ROOT`] are left out of the result entirely: a row
/// pointing at a missing parent has nowhere to hang, and rows forming a
/// parent cycle starve each other the same way.
///
/// Assembly walks an explicit frame stack, so nesting depth is bounded by
/// memory rather than the thread stack.
pub fn forest<T: Parented>(rows: Vec<T>) -> Vec<Node<T>> {
    let mut buckets: HashMap<Id, Vec<T>, KeyHasher> = HashMap::default();
    let mut roots = Vec::new();
    for row in rows {
        if row.parent() == ROOT {
            roots.push(row);
        } else {
            buckets.entry(row.parent()).or_default().push(row);
        }
    }
    let mut trees = Vec::with_capacity(roots.len());
    for root in roots {
        let mut stack = vec![Frame::open(root, &mut buckets)];
        while let Some(frame) = stack.last_mut() {
            if let Some(row) = frame.pending.next() {
                stack.push(Frame::open(row, &mut buckets));
            } else if let Some(done) = stack.pop() {
                let node = done.close();
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => trees.push(node),
                }
            }
        }
    }
    trees
}
