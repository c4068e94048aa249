//! Update & rollback orchestrator for the ClawDeck admin panel.
//!
//! ClawDeck is an administrative web panel operating a chat-bot gateway
//! whose runtime is managed by the external `openclaw` CLI. This crate is
//! the panel's update core: it detects newer releases of the bot and of
//! the panel itself, stages panel releases as immutable artifacts,
//! applies a staged release by atomically replacing the live installation
//! and restarting the owning service, and drives the bot's CLI-based
//! upgrade/rollback with defensive parsing of its text output.
//!
//! # Architecture
//!
//! Leaves first:
//!
//! - [`version`] - pure tag normalization and `openclaw update status`
//!   table parsing.
//! - [`release`] - release-hosting API client: metadata resolution and
//!   artifact download.
//! - [`process`] - the injectable command runner all `openclaw`
//!   invocations go through.
//! - [`bot`] - check/upgrade/rollback driver for the bot.
//! - [`panel`] - marker files, staging, and the detached apply procedure
//!   for the panel itself.
//! - [`lock`] - per-target file locks serializing mutations.
//! - [`cli`] - the operator-facing command surface.
//!
//! Check operations never fail for recoverable conditions; they degrade
//! to a `warning` on the returned [`core::UpdateStatus`]. Mutations
//! always resolve to a [`core::MutationResult`] so callers render success
//! and failure uniformly.

pub mod bot;
pub mod cli;
pub mod config;
pub mod core;
pub mod lock;
pub mod panel;
pub mod process;
pub mod release;
pub mod utils;
pub mod version;
