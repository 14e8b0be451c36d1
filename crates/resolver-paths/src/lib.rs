//! Crate `resolver_paths`: where the content resolver keeps its settings and index.

mod errors;
mod fs_utils;
mod paths;

pub use errors::Error;
pub use fs_utils::{check_writable, ensure_dir};
pub use paths::{ENV_BASE_DIR, ResolverPaths};
