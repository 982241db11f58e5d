//! # Router Module
//!
//! Path matching and route resolution.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling registered templates (`/users/:id`) into per-position shapes
//! - Keeping the route table in registration order
//! - Matching an incoming method + path to the first compatible route
//! - Extracting path parameters from the matched route
//!
//! ## Architecture
//!
//! 1. **Compilation**: at registration time each template is split into
//!    [`Segment::Literal`] and [`Segment::Param`] positions. Literal texts are
//!    also collected into the router-wide [`StaticSegmentSet`].
//!
//! 2. **Matching**: for each request the table is scanned in registration
//!    order. A route is a candidate only if its method and segment count
//!    agree with the request. The first candidate whose positions all accept
//!    the incoming segments wins; there is no specificity ranking.
//!
//! ## Example
//!
//! ```rust
//! use junction::router::Router;
//! use http::Method;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut router = Router::new();
//! router.get("/items/:id", |ctx, res| {
//!     res.status(200).json(serde_json::json!({ "id": ctx.param("id") }))
//! })?;
//!
//! let m = router.match_route(&Method::GET, "/items/42?verbose=1").unwrap();
//! assert_eq!(m.get_param("id"), Some("42"));
//! # Ok(())
//! # }
//! ```

mod core;
mod pattern;
#[cfg(test)]
mod tests;

pub use core::{
    strip_query, MatchMode, ParamVec, Route, RouteMatch, Router, StaticSegmentSet,
    MAX_INLINE_PARAMS,
};
pub use pattern::{
    compile, is_supported_method, split_segments, CompiledPattern, Segment, PARAM_MARKER,
};
