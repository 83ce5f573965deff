//! # Controller
//!
//! Core decision logic of the Vault Namespace Controller.
//!
//! - `matcher`: Regular expression matching of namespace names
//! - `policy`: Which cluster namespaces are synchronized
//! - `path`: Vault namespace path derivation
//! - `reconciler`: Idempotent create/delete protocol and error classification

pub mod matcher;
pub mod path;
pub mod policy;
pub mod reconciler;
