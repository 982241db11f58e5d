//! Route template compilation.
//!
//! A template such as `/users/:id/posts` is split on `/` (empty pieces are
//! dropped, so leading, trailing and doubled slashes do not matter) and each
//! piece becomes either a [`Segment::Literal`] or a [`Segment::Param`]. The
//! compiled shape is computed once at registration time and never changes.

use http::Method;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::RouteError;

/// Prefix marking a parameter segment in a route template.
pub const PARAM_MARKER: char = ':';

/// Split a path into its non-empty `/`-delimited segments.
#[inline]
pub fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Whether `method` can be registered.
#[must_use]
pub fn is_supported_method(method: &Method) -> bool {
    [Method::GET, Method::POST, Method::PUT, Method::DELETE].contains(method)
}

/// One position of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Must equal the incoming segment exactly (case-sensitive).
    Literal(Arc<str>),
    /// Binds the incoming segment to this name.
    Param(Arc<str>),
}

impl Segment {
    /// The segment text with the parameter marker stripped.
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Segment::Literal(t) | Segment::Param(t) => t,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_param(&self) -> bool {
        matches!(self, Segment::Param(_))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(t) => f.write_str(t),
            Segment::Param(name) => write!(f, "{PARAM_MARKER}{name}"),
        }
    }
}

/// Output of [`compile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    /// Lower-case method followed by the marker-stripped template,
    /// e.g. `get/users/id`. The method root is `get/`.
    pub pattern_id: String,
    /// Per-position shape, in path order.
    pub segments: Vec<Segment>,
    /// Parameter names in segment order; one per [`Segment::Param`].
    pub param_names: Vec<Arc<str>>,
    /// Literal segment texts this template contributes to the router's
    /// static segment set.
    pub literals: BTreeSet<Arc<str>>,
}

impl CompiledPattern {
    /// Number of segments. Zero for the method root.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Canonical template text, e.g. `/users/:id`.
    #[must_use]
    pub fn template(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments.iter().fold(String::new(), |mut acc, seg| {
            acc.push('/');
            acc.push_str(&seg.to_string());
            acc
        })
    }

    /// Same literals at the same positions and parameters at the same
    /// positions. Parameter names are ignored: `/a/:x` and `/a/:y` have the
    /// same shape.
    #[must_use]
    pub fn same_shape(&self, other: &CompiledPattern) -> bool {
        self.len() == other.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Param(_), Segment::Param(_)) => true,
                    _ => false,
                })
    }

    /// Whether some concrete path could match both patterns.
    #[must_use]
    pub fn overlaps(&self, other: &CompiledPattern) -> bool {
        self.len() == other.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    _ => true,
                })
    }
}

/// Compile `template` registered under `method`.
///
/// # Errors
///
/// - [`RouteError::UnsupportedMethod`] for anything but GET, POST, PUT, DELETE
/// - [`RouteError::EmptyParamName`] for a bare `:` segment
/// - [`RouteError::DuplicateParam`] when a name is declared twice
pub fn compile(method: &Method, template: &str) -> Result<CompiledPattern, RouteError> {
    if !is_supported_method(method) {
        return Err(RouteError::UnsupportedMethod {
            method: method.clone(),
            template: template.to_string(),
        });
    }

    let mut segments = Vec::new();
    let mut param_names: Vec<Arc<str>> = Vec::new();
    let mut literals = BTreeSet::new();

    for (position, raw) in split_segments(template).enumerate() {
        match raw.strip_prefix(PARAM_MARKER) {
            Some("") => {
                return Err(RouteError::EmptyParamName {
                    template: template.to_string(),
                    position,
                });
            }
            Some(name) => {
                if param_names.iter().any(|n| n.as_ref() == name) {
                    return Err(RouteError::DuplicateParam {
                        template: template.to_string(),
                        name: name.to_string(),
                    });
                }
                let name: Arc<str> = Arc::from(name);
                param_names.push(Arc::clone(&name));
                segments.push(Segment::Param(name));
            }
            None => {
                let text: Arc<str> = Arc::from(raw);
                literals.insert(Arc::clone(&text));
                segments.push(Segment::Literal(text));
            }
        }
    }

    let mut pattern_id = method.as_str().to_ascii_lowercase();
    pattern_id.push('/');
    let stripped: Vec<&str> = segments.iter().map(Segment::text).collect();
    pattern_id.push_str(&stripped.join("/"));

    Ok(CompiledPattern {
        pattern_id,
        segments,
        param_names,
        literals,
    })
}
