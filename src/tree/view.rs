//! Realized view tree.
//!
//! View nodes mirror the styled nodes a container has decided to materialize.
//! Unlike the styled tree the view tree is mutable: a forced break detaches
//! the node realized past the break point, and committing a break truncates
//! everything laid out after it.
//!
//! Extents are measured here. A node contributes its own styled extent plus
//! its realized descendants', except for *shells*: ancestors re-opened when a
//! container resumes mid-flow, whose content belongs to a previous container.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::tree::styled::StyledHandle;

/// Shared handle to a view node.
pub type ViewHandle = Rc<ViewNode>;

/// A node of the realized view tree.
#[derive(Debug)]
pub struct ViewNode {
  /// Source node this view realizes.
  pub source: StyledHandle,
  shell: Cell<bool>,
  parent: RefCell<Weak<ViewNode>>,
  children: RefCell<Vec<ViewHandle>>,
}

impl ViewNode {
  pub fn new(source: &StyledHandle) -> ViewHandle {
    Rc::new(ViewNode {
      source: Rc::clone(source),
      shell: Cell::new(false),
      parent: RefCell::new(Weak::new()),
      children: RefCell::new(Vec::new()),
    })
  }

  pub fn append(parent: &ViewHandle, child: &ViewHandle) {
    *child.parent.borrow_mut() = Rc::downgrade(parent);
    parent.children.borrow_mut().push(Rc::clone(child));
  }

  pub fn parent(&self) -> Option<ViewHandle> {
    self.parent.borrow().upgrade()
  }

  pub fn children(&self) -> Vec<ViewHandle> {
    self.children.borrow().clone()
  }

  /// Marks this view as a carried-over shell contributing no extent of its
  /// own in this container.
  pub fn set_shell(&self, shell: bool) {
    self.shell.set(shell);
  }

  pub fn is_shell(&self) -> bool {
    self.shell.get()
  }

  /// Removes this node from its parent's children.
  pub fn detach(self: &Rc<Self>) {
    if let Some(parent) = self.parent() {
      parent
        .children
        .borrow_mut()
        .retain(|child| !Rc::ptr_eq(child, self));
      *self.parent.borrow_mut() = Weak::new();
    }
  }

  /// True when the node is no longer reachable from `root`.
  pub fn is_orphan(self: &Rc<Self>, root: &ViewHandle) -> bool {
    let mut cursor = Rc::clone(self);
    loop {
      if Rc::ptr_eq(&cursor, root) {
        return false;
      }
      match cursor.parent() {
        Some(parent) => cursor = parent,
        None => return true,
      }
    }
  }

  fn own_extent(&self) -> f32 {
    if self.shell.get() {
      0.0
    } else {
      self.source.style.extent
    }
  }

  /// Block size contributed by this node's realized subtree.
  pub fn subtree_extent(&self) -> f32 {
    let mut total = self.own_extent();
    for child in self.children.borrow().iter() {
      total += child.subtree_extent();
    }
    total
  }
}

/// Block coordinate of the edge just after `target`'s subtree, measured from
/// the start of `root` in document order.
///
/// Every node entered before that edge contributes its extent: preceding
/// siblings with their subtrees, and ancestors of `target` with their own
/// extent only. Nodes realized after `target` do not count.
pub fn block_edge(root: &ViewHandle, target: &ViewHandle) -> f32 {
  let mut total = 0.0;
  edge_walk(root, target, &mut total);
  total
}

fn edge_walk(node: &ViewHandle, target: &ViewHandle, total: &mut f32) -> bool {
  *total += node.own_extent();
  if Rc::ptr_eq(node, target) {
    for child in node.children.borrow().iter() {
      *total += child.subtree_extent();
    }
    return true;
  }
  for child in node.children.borrow().iter() {
    if edge_walk(child, target, total) {
      return true;
    }
  }
  false
}

/// Detaches everything realized after `position` in document order, walking
/// following siblings off each ancestor level. With `remove_self` the node at
/// `position` is detached as well.
pub fn truncate_after(position: &ViewHandle, remove_self: bool) {
  let mut cursor = Rc::clone(position);
  loop {
    let Some(parent) = cursor.parent() else {
      break;
    };
    let following: Vec<ViewHandle> = {
      let children = parent.children.borrow();
      let mut seen = false;
      children
        .iter()
        .filter(|child| {
          if Rc::ptr_eq(child, &cursor) {
            seen = true;
            false
          } else {
            seen
          }
        })
        .cloned()
        .collect()
    };
    for node in following {
      node.detach();
    }
    cursor = parent;
  }
  if remove_self {
    position.detach();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tree::styled::StyledNodeBuilder;

  fn box_with_extent(name: &str, extent: f32) -> StyledHandle {
    StyledNodeBuilder::element(name).extent(extent).build()
  }

  fn realize_flat(extents: &[f32]) -> (ViewHandle, Vec<ViewHandle>) {
    let root = ViewNode::new(&box_with_extent("flow", 0.0));
    let children: Vec<ViewHandle> = extents
      .iter()
      .enumerate()
      .map(|(i, extent)| {
        let view = ViewNode::new(&box_with_extent(&format!("b{i}"), *extent));
        ViewNode::append(&root, &view);
        view
      })
      .collect();
    (root, children)
  }

  #[test]
  fn test_append_and_detach() {
    let (root, children) = realize_flat(&[1.0, 1.0]);
    assert_eq!(root.children().len(), 2);
    assert!(!children[0].is_orphan(&root));

    children[0].detach();
    assert_eq!(root.children().len(), 1);
    assert!(children[0].is_orphan(&root));
    assert!(children[0].parent().is_none());
  }

  #[test]
  fn test_block_edge_accumulates_in_document_order() {
    let (root, children) = realize_flat(&[1.0, 2.0, 3.0]);
    assert_eq!(block_edge(&root, &children[0]), 1.0);
    assert_eq!(block_edge(&root, &children[1]), 3.0);
    assert_eq!(block_edge(&root, &children[2]), 6.0);
    assert_eq!(root.subtree_extent(), 6.0);
  }

  #[test]
  fn test_block_edge_counts_ancestors_but_not_later_siblings() {
    // flow > wrap(0.5) > [a(1), b(2)], then c(4) after wrap
    let root = ViewNode::new(&box_with_extent("flow", 0.0));
    let wrap = ViewNode::new(&box_with_extent("wrap", 0.5));
    let a = ViewNode::new(&box_with_extent("a", 1.0));
    let b = ViewNode::new(&box_with_extent("b", 2.0));
    let c = ViewNode::new(&box_with_extent("c", 4.0));
    ViewNode::append(&root, &wrap);
    ViewNode::append(&wrap, &a);
    ViewNode::append(&wrap, &b);
    ViewNode::append(&root, &c);

    assert_eq!(block_edge(&root, &a), 1.5);
    assert_eq!(block_edge(&root, &wrap), 3.5);
    assert_eq!(block_edge(&root, &c), 7.5);
  }

  #[test]
  fn test_shells_contribute_no_extent() {
    let (root, children) = realize_flat(&[1.0, 2.0]);
    children[0].set_shell(true);
    assert_eq!(root.subtree_extent(), 2.0);
    assert_eq!(block_edge(&root, &children[1]), 2.0);
  }

  #[test]
  fn test_truncate_after_detaches_following_content() {
    // flow > [a, wrap > [b, c], d]; truncating after b removes c and d.
    let root = ViewNode::new(&box_with_extent("flow", 0.0));
    let a = ViewNode::new(&box_with_extent("a", 1.0));
    let wrap = ViewNode::new(&box_with_extent("wrap", 0.0));
    let b = ViewNode::new(&box_with_extent("b", 1.0));
    let c = ViewNode::new(&box_with_extent("c", 1.0));
    let d = ViewNode::new(&box_with_extent("d", 1.0));
    ViewNode::append(&root, &a);
    ViewNode::append(&root, &wrap);
    ViewNode::append(&wrap, &b);
    ViewNode::append(&wrap, &c);
    ViewNode::append(&root, &d);

    truncate_after(&b, false);
    assert!(!b.is_orphan(&root));
    assert!(c.is_orphan(&root));
    assert!(d.is_orphan(&root));
    assert_eq!(root.subtree_extent(), 2.0);

    truncate_after(&b, true);
    assert!(b.is_orphan(&root));
    assert_eq!(root.subtree_extent(), 1.0);
  }
}
