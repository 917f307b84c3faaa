//! URL handling module for Threadweave
//!
//! This module provides URL normalization, base-domain matching and path glob
//! matching. Every URL entering the work queue or the visited set has passed
//! through [`normalize_url`] or [`normalize_parsed`].

mod domain;
mod matcher;
mod normalize;

pub use domain::{is_same_domain, netloc};
pub use matcher::matches_path_glob;
pub use normalize::{normalize_parsed, normalize_url};
