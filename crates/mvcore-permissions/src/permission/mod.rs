//! Permission expression module

pub mod checker;
pub mod expression;

pub use checker::{CapabilityCheck, PermissionChecker};
pub use expression::{PermissionExpression, AND_PREFIX};
