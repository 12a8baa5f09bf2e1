//! Styled source tree.
//!
//! The engine consumes a document tree whose cascade has already run: every
//! node carries the computed slice fragmentation reads (display category,
//! whitespace policy, break directives, resolved block extent). The tree is
//! immutable during layout; the mutable mirror realized from it lives in
//! [`crate::tree::view`].

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::breaks::BreakValue;

/// Shared handle to a styled node.
pub type StyledHandle = Rc<StyledNode>;

/// Content payload of a styled node.
#[derive(Debug, Clone)]
pub enum StyledData {
  /// An element box. The name is kept for logs and assertions; layout only
  /// reads the computed style.
  Element { name: String },
  /// A text run.
  Text { text: String },
  /// A comment or other payload that never produces a view.
  Comment { text: String },
}

/// Computed display category of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
  /// Block-level box.
  #[default]
  Block,
  /// Inline-level box.
  Inline,
  /// Generates no box; the subtree is skipped.
  None,
}

/// Computed `white-space` behavior, reduced to what decides whether a
/// whitespace-only text run may be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhiteSpace {
  /// Collapse whitespace; whitespace-only runs are ignorable.
  #[default]
  Normal,
  /// Preserve newlines; runs without a newline are still ignorable.
  PreLine,
  /// Preserve everything; only empty runs are ignorable.
  Pre,
}

/// True when a text run with the given policy may be skipped entirely.
pub fn can_ignore(text: &str, white_space: WhiteSpace) -> bool {
  match white_space {
    WhiteSpace::Normal => text.chars().all(char::is_whitespace),
    WhiteSpace::PreLine => text.chars().all(|c| c.is_whitespace() && c != '\n'),
    WhiteSpace::Pre => text.is_empty(),
  }
}

/// The computed-style slice the fragmentation engine reads.
#[derive(Debug, Clone, Default)]
pub struct NodeStyle {
  /// Display category.
  pub display: Display,
  /// Whitespace policy this element imposes on its text children.
  pub white_space: WhiteSpace,
  /// Computed `break-before` value.
  pub break_before: Option<BreakValue>,
  /// Computed `break-after` value.
  pub break_after: Option<BreakValue>,
  /// Block extent this node contributes once realized. Extents are additive:
  /// a node's realized size is its own extent plus its realized descendants'.
  pub extent: f32,
  /// Padding and border cloned onto every fragment of this box
  /// (`box-decoration-break: clone`).
  pub cloned_padding_border: f32,
}

/// A node of the styled source tree.
pub struct StyledNode {
  /// Content payload.
  pub data: StyledData,
  /// Computed style slice.
  pub style: NodeStyle,
  parent: RefCell<Weak<StyledNode>>,
  children: RefCell<Vec<StyledHandle>>,
}

impl StyledNode {
  /// True for element nodes.
  pub fn is_element(&self) -> bool {
    matches!(self.data, StyledData::Element { .. })
  }

  /// Element name, or a placeholder for non-elements.
  pub fn name(&self) -> &str {
    match &self.data {
      StyledData::Element { name } => name,
      StyledData::Text { .. } => "#text",
      StyledData::Comment { .. } => "#comment",
    }
  }

  pub fn parent(&self) -> Option<StyledHandle> {
    self.parent.borrow().upgrade()
  }

  pub fn children(&self) -> Vec<StyledHandle> {
    self.children.borrow().clone()
  }

  pub fn first_child(&self) -> Option<StyledHandle> {
    self.children.borrow().first().cloned()
  }

  /// The next sibling in document order, if any.
  pub fn next_sibling(self: &Rc<Self>) -> Option<StyledHandle> {
    let parent = self.parent()?;
    let siblings = parent.children.borrow();
    let index = siblings
      .iter()
      .position(|sibling| Rc::ptr_eq(sibling, self))?;
    siblings.get(index + 1).cloned()
  }

  /// True when `ancestor` is on this node's parent chain (a node is not its
  /// own ancestor).
  pub fn has_ancestor(self: &Rc<Self>, ancestor: &StyledHandle) -> bool {
    let mut cursor = self.parent();
    while let Some(node) = cursor {
      if Rc::ptr_eq(&node, ancestor) {
        return true;
      }
      cursor = node.parent();
    }
    false
  }
}

impl std::fmt::Debug for StyledNode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StyledNode")
      .field("name", &self.name())
      .field("style", &self.style)
      .field("children", &self.children.borrow().len())
      .finish()
  }
}

/// Builder for styled subtrees.
///
/// # Examples
///
/// ```
/// use pageflow::tree::styled::StyledNodeBuilder;
///
/// let flow = StyledNodeBuilder::element("flow")
///     .child(StyledNodeBuilder::element("p").extent(2.0).build())
///     .child(StyledNodeBuilder::element("p").extent(3.0).build())
///     .build();
/// assert_eq!(flow.children().len(), 2);
/// ```
pub struct StyledNodeBuilder {
  data: StyledData,
  style: NodeStyle,
  children: Vec<StyledHandle>,
}

impl StyledNodeBuilder {
  pub fn element(name: &str) -> Self {
    Self {
      data: StyledData::Element {
        name: name.to_string(),
      },
      style: NodeStyle::default(),
      children: Vec::new(),
    }
  }

  pub fn text(text: &str) -> Self {
    Self {
      data: StyledData::Text {
        text: text.to_string(),
      },
      style: NodeStyle {
        display: Display::Inline,
        ..NodeStyle::default()
      },
      children: Vec::new(),
    }
  }

  pub fn comment(text: &str) -> Self {
    Self {
      data: StyledData::Comment {
        text: text.to_string(),
      },
      style: NodeStyle::default(),
      children: Vec::new(),
    }
  }

  pub fn display(mut self, display: Display) -> Self {
    self.style.display = display;
    self
  }

  pub fn white_space(mut self, white_space: WhiteSpace) -> Self {
    self.style.white_space = white_space;
    self
  }

  pub fn break_before(mut self, value: BreakValue) -> Self {
    self.style.break_before = Some(value);
    self
  }

  pub fn break_after(mut self, value: BreakValue) -> Self {
    self.style.break_after = Some(value);
    self
  }

  pub fn extent(mut self, extent: f32) -> Self {
    self.style.extent = extent;
    self
  }

  pub fn cloned_padding_border(mut self, amount: f32) -> Self {
    self.style.cloned_padding_border = amount;
    self
  }

  pub fn child(mut self, child: StyledHandle) -> Self {
    self.children.push(child);
    self
  }

  /// Finalizes the node and wires up parent links of its children.
  pub fn build(self) -> StyledHandle {
    let node = Rc::new(StyledNode {
      data: self.data,
      style: self.style,
      parent: RefCell::new(Weak::new()),
      children: RefCell::new(self.children),
    });
    for child in node.children.borrow().iter() {
      *child.parent.borrow_mut() = Rc::downgrade(&node);
    }
    node
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_builder_wires_parents_and_siblings() {
    let root = StyledNodeBuilder::element("flow")
      .child(StyledNodeBuilder::element("a").build())
      .child(StyledNodeBuilder::element("b").build())
      .build();

    let children = root.children();
    assert_eq!(children.len(), 2);
    assert!(Rc::ptr_eq(&children[0].parent().unwrap(), &root));

    let sibling = children[0].next_sibling().unwrap();
    assert!(Rc::ptr_eq(&sibling, &children[1]));
    assert!(children[1].next_sibling().is_none());
    assert!(children[0].has_ancestor(&root));
    assert!(!root.has_ancestor(&children[0]));
  }

  #[test]
  fn test_can_ignore_follows_whitespace_policy() {
    assert!(can_ignore("  \n\t ", WhiteSpace::Normal));
    assert!(!can_ignore(" x ", WhiteSpace::Normal));

    assert!(can_ignore("  \t ", WhiteSpace::PreLine));
    assert!(!can_ignore(" \n ", WhiteSpace::PreLine));

    assert!(can_ignore("", WhiteSpace::Pre));
    assert!(!can_ignore(" ", WhiteSpace::Pre));
  }

  #[test]
  fn test_node_names() {
    assert_eq!(StyledNodeBuilder::element("sec").build().name(), "sec");
    assert_eq!(StyledNodeBuilder::text("hi").build().name(), "#text");
    assert_eq!(StyledNodeBuilder::comment("x").build().name(), "#comment");
  }
}
