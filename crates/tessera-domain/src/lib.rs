//! Domain types shared across Tessera services.
//!
//! This crate contains only pure types and functions with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; never in `infra/` or `handlers/`.

pub mod id;
pub mod masking;
pub mod pagination;
