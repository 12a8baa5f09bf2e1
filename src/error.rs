//! Error types for pageflow
//!
//! Fragmentation outcomes (overflow, forced breaks, constraint violations) are
//! ordinary state inspected by the driving logic, not errors. The types here
//! cover the cases where a collaborator genuinely fails: a layout context that
//! cannot realize a view, or a resume position that does not belong to the
//! flow being laid out.
//!
//! All errors use the `thiserror` crate for minimal boilerplate and proper
//! error trait implementations. Every error is `Clone` so failures can travel
//! through shared task results.

use thiserror::Error;

/// Result type alias for pageflow operations
///
/// This is a convenience type that uses our Error type as the error variant.
///
/// # Examples
///
/// ```
/// use pageflow::Result;
///
/// fn advance_flow() -> Result<()> {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for pageflow
///
/// Each variant wraps a more specific error type for that subsystem.
///
/// # Examples
///
/// ```
/// use pageflow::Error;
/// use pageflow::error::LayoutError;
///
/// fn open_views() -> Result<(), Error> {
///     Err(Error::Layout(LayoutError::MissingViewRoot))
/// }
/// ```
#[derive(Error, Debug, Clone)]
pub enum Error {
  /// Layout error
  #[error("Layout error: {0}")]
  Layout(#[from] LayoutError),

  /// Generic error for miscellaneous issues
  #[error("{0}")]
  Other(String),
}

/// Errors that occur while realizing or navigating the view tree
///
/// These surface from `LayoutContext` implementations when a flow cannot be
/// opened or advanced, and terminate the layout run that triggered them.
#[derive(Error, Debug, Clone)]
pub enum LayoutError {
  /// The layout context failed to realize a view node
  #[error("cannot realize view: {message}")]
  ViewMaterialization { message: String },

  /// A resume position does not belong to the flow being laid out
  #[error("position not in flow: {message}")]
  PositionNotFound { message: String },

  /// The container was asked to lay out without a realized view root
  #[error("container has no view root")]
  MissingViewRoot,
}
