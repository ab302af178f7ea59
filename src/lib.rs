//! tabsound — coordinates which browser tabs are playing audio.
//!
//! One coordinator instance owns the truth: a registry of tabs believed to
//! be producing audio, reconciled from push reports, periodic agent polls,
//! and the host's coarse audible hint, plus a dispatcher for remote
//! playback commands. This library crate exposes all modules for use by
//! the binaries and integration tests.

pub mod app;
pub mod managers;
pub mod rpc_handler;
pub mod services;
pub mod types;
