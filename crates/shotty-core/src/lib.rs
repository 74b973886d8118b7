//! shotty core library
//!
//! Capture-strategy resolution for desktop screenshots: three desktop
//! adapters (XDG portal, GNOME Shell extension, screenshot utilities), a
//! window registry that normalizes their listings, a capture orchestrator
//! that falls back across them and restores focus, and a result encoder
//! that keeps every artifact inside one screenshot directory.
//!
//! # Modules
//!
//! - [`capture`] - adapters, registry, orchestrator and encoder
//! - [`config`] - defaults and `SHOTTY_*` environment overrides
//! - [`error`] - error taxonomy with cause chains and remediation hints
//! - [`model`] - shared data types
//! - [`util`] - session detection, screenshot store, cropping

pub mod capture;
pub mod config;
pub mod error;
pub mod model;
pub mod util;
