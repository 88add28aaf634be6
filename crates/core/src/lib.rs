//! Vaporwise Core - Domain types and pure logic.
//!
//! This crate provides the types and rules shared by every Vaporwise component:
//! - `storefront` - Server-rendered quiz, explore feed and product pages
//! - `cli` - Offline tooling (legacy scorer, fixture checks)
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no templates. Everything here can be tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, email addresses and prices
//! - [`vaporizer`] - Vaporizer records as served by the remote API
//! - [`quiz`] - Quiz schema, answers and submission validation
//! - [`explore`] - Community templates and the explore feed query
//! - [`preferences`] - Legacy quiz preferences
//! - [`scoring`] - Legacy weighted-sum recommendation scorer
//! - [`controls`] - State transitions for form controls (checkboxes, rank order, sliders)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod controls;
pub mod explore;
pub mod preferences;
pub mod quiz;
pub mod scoring;
pub mod types;
pub mod vaporizer;

pub use types::*;
