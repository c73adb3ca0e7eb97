//! Core data models for the file gateway.
//!
//! The gateway keeps no metadata store: an [`object_key::ObjectKey`] plus the
//! fixed [`extension::ExtensionPolicy`] is everything it knows about a stored
//! object.

pub mod extension;
pub mod mail;
pub mod object;
pub mod object_key;
