//! Query construction: filter validation, bounds parsing and query text.

mod bounds;
mod builder;
mod condition;

pub use bounds::{Bounds, DEFAULT_BOUNDS};
pub use builder::{build_query, QueryPlan};
pub use condition::{is_simple_filter, sanitize_condition, PERMISSIVE_CONDITION};
