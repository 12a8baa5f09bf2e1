//! Break values and their combination rules.
//!
//! For fragmentation purposes the `break-before`/`break-after` family reduces
//! to three strengths per edge: no opinion, a soft opportunity, and a forced
//! break with a target kind. Crossing several box edges at the same flow
//! position merges their values; forced wins over soft, soft wins over none.

/// Target of a forced break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcedBreakKind {
  /// Break to the next page.
  Page,
  /// Break to the next column.
  Column,
  /// Break to the next region.
  Region,
  /// Break until the next left page.
  Left,
  /// Break until the next right page.
  Right,
  /// Break until the next recto page.
  Recto,
  /// Break until the next verso page.
  Verso,
}

impl ForcedBreakKind {
  /// True for kinds that may have to skip a page to land on the demanded side
  /// of a spread.
  pub fn is_spread(self) -> bool {
    matches!(self, Self::Left | Self::Right | Self::Recto | Self::Verso)
  }
}

/// Strength of a break opportunity at a box edge.
///
/// The absence of a value (`None` at the use sites) means the edge expresses
/// no opinion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakValue {
  /// A soft break opportunity.
  Allowed,
  /// A mandatory break of the given kind.
  Forced(ForcedBreakKind),
}

/// True when the value demands a break.
pub fn is_forced_break_value(value: Option<&BreakValue>) -> bool {
  matches!(value, Some(BreakValue::Forced(_)))
}

/// Merges the value accumulated so far with the value of a newly crossed edge.
///
/// Forced dominates allowed dominates none, so the resulting strength does not
/// depend on the order edges are crossed in. Between two forced values the
/// newly crossed kind wins: the kind reflects the most recent demand.
pub fn resolve_effective_break_value(
  accumulated: Option<BreakValue>,
  crossed: Option<BreakValue>,
) -> Option<BreakValue> {
  match (accumulated, crossed) {
    (None, crossed) => crossed,
    (accumulated, None) => accumulated,
    (_, Some(forced @ BreakValue::Forced(_))) => Some(forced),
    (Some(forced @ BreakValue::Forced(_)), _) => Some(forced),
    (Some(BreakValue::Allowed), Some(BreakValue::Allowed)) => Some(BreakValue::Allowed),
  }
}
