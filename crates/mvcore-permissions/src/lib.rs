//! Permissions for the Multiverse command surface
//!
//! Provides OR/AND permission expressions parsed once from their string form,
//! the capability-check seam the host authorization system plugs into, and an
//! in-memory grant table with wildcard support.

pub mod error;
pub mod glob_matcher;
pub mod grants;
pub mod issuer;
pub mod permission;

pub use error::{Error, Result};
pub use glob_matcher::GlobMatcher;
pub use grants::{GrantConfig, GrantTable};
pub use issuer::{Issuer, IssuerId, IssuerKind};
pub use permission::{CapabilityCheck, PermissionChecker, PermissionExpression, AND_PREFIX};
