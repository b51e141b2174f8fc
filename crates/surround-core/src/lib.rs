//! `surround-core` resolves which delimiter pairs (brackets, quotes, block
//! and line comments, triple quotes) enclose a cursor position in a block of
//! text, in nesting order, honoring per-kind priority, escape sequences,
//! line scope and balanced delimiters whose open and close tokens are
//! identical.
//!
//! ## Examples
//!
//! ```rust
//! use surround_core::{Catalog, Engine, Position};
//!
//! let engine = Engine::serial(Catalog::default());
//! let target = engine.catalog().kind_of("(").unwrap();
//!
//! let lines = ["fn main() {", "    (unclosed"];
//! let found = engine
//!     .resolve(&lines, target, Position::new(1, 10))
//!     .unwrap();
//! let tokens: Vec<&str> = found
//!     .iter()
//!     .map(|occ| occ.token(engine.catalog()))
//!     .collect();
//!
//! assert_eq!(tokens, vec!["{", "("]);
//! ```
mod arena;
mod catalog;
mod engine;
mod error;
mod merge;
mod pool;
mod range;
mod reduce;
mod scanner;

pub use arena::{Arena, ArenaId};
pub use catalog::{Catalog, DelimiterKind, KindId};
pub use engine::{Engine, resolve_enclosing_delimiters};
pub use error::ResolveError;
pub use pool::ThreadPool;
pub use range::{Position, Range};
pub use scanner::occurrence::{OccId, Occurrence};
pub use scanner::{LinePlan, ParseRequest, scan_line};

pub type ResolveResult = Result<Vec<Occurrence>, ResolveError>;
