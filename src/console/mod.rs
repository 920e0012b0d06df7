//! Remote console: expression parsing and evaluation.
//!
//! ```text
//! "localStorage.getItem('theme')"
//!     │ parse_command
//!     ▼
//! [Property localStorage, Call getItem("theme")]
//!     │ evaluate(root: Arc<dyn Inspectable>)
//!     ▼
//! ConsoleResult { result: "dark" }
//! ```
//!
//! Evaluation is not sandboxed. It reaches exactly what the host's
//! [`Inspectable`] root exposes, and should only be wired to a trusted
//! inspector.

// ============================================================================
// Submodules
// ============================================================================

/// Expression grammar.
pub mod parser;

/// Step evaluation.
pub mod eval;

// ============================================================================
// Re-exports
// ============================================================================

pub use eval::{CommandError, DEFAULT_PARSE_DEPTH, Inspectable, Member, evaluate, snapshot};
pub use parser::{CommandStep, StepKind, parse_command};
