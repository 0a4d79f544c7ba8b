//! Small shared utilities.

pub(crate) mod lock;
