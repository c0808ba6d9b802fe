//! # Sprig Router
//!
//! Location matching for client-side navigation:
//! - Literal routes (`/about`) in a hash map, checked first
//! - Parameterized routes (`/users/:id`) and wildcards (`/docs/*`, `/files/*rest`)
//!   compiled to regexes and checked in registration order
//! - A not-found fallback route (`/404` by default); without one, an
//!   unmatched path is a [`RouteError::NotFound`]
//!
//! ## Path Normalization
//!
//! Every registered pattern and every looked-up location is normalized first:
//! - Trailing slashes: `/path/` → `/path` (root stays `/`)
//! - Double slashes: `/path//to` → `/path/to`
//! - Backslashes: `\path\to` → `/path/to`
//!
//! ## Example
//!
//! ```
//! use sprig_router::RouteTable;
//!
//! let mut table = RouteTable::new();
//! table.register("/about", "about").unwrap();
//! table.register("/users/:id", "user").unwrap();
//!
//! let m = table.match_path("/users/42/").unwrap();
//! assert_eq!(m.handler, "user");
//! assert_eq!(m.params.get("id").map(String::as_str), Some("42"));
//! assert_eq!(m.path, "/users/42");
//! ```

use thiserror::Error;

pub mod path;
pub mod pattern;
mod table;

pub use path::{is_valid_path, normalize_path};
pub use pattern::{is_dynamic, CompiledPattern};
pub use table::{Route, RouteMatch, RouteTable, DEFAULT_NOT_FOUND_PATH};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Nothing matched and no not-found route is registered
    #[error("no route found for \"{0}\" and no not-found route is registered")]
    NotFound(String),

    #[error("invalid route pattern \"{pattern}\": {reason}")]
    InvalidPattern { pattern: String, reason: String },
}
