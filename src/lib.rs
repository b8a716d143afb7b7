//! # Panelforge Core Library
//!
//! Core of the Panelforge configuration editor: describe how buttons,
//! switches, rotary encoders, and MAX7219 seven-segment displays wired to an
//! Arduino-class board map onto pins and keyboard-emulation actions, persist
//! that description as a project file, and keep track of the boards currently
//! plugged into the host.
//!
//! Presentation layers (desktop UI, CLI) sit on top of two independent
//! subsystems that never call each other directly:
//!
//! - **Discovery** (`discovery`): a background service that periodically
//!   enumerates serial-capable hardware, classifies candidates against known
//!   USB signatures, probes port availability without holding ports open,
//!   and reconciles each snapshot into discrete connect/disconnect events
//!   plus one aggregate list-changed notification.
//! - **Configuration** (`model`, `validation`, `store`, `settings`): the
//!   project entity graph with its pin-uniqueness invariant, JSON
//!   persistence with recent-file bookkeeping, and typed change
//!   notifications.
//!
//! ## Crate Structure
//!
//! - **`board`**: board kinds, their pin sets and reserved SPI bus pins, and
//!   the USB hardware signature table.
//! - **`discovery`**: port probing, enumeration, snapshot reconciliation,
//!   and the 2-second monitoring service with on-demand refresh.
//! - **`model`**: the persisted project entity graph and derived views.
//! - **`validation`**: the structural validation pass (version presence,
//!   global pin uniqueness).
//! - **`store`**: single-owner configuration store with load/save, dirty
//!   tracking, mutation API, and detached auto-save.
//! - **`settings`**: per-user persisted settings and the recent-files list.
//! - **`error`**: the `PanelError` type shared by both subsystems.
//!
//! Services are constructed explicitly at composition time and passed by
//! handle; the crate defines no global state.

pub mod board;
pub mod discovery;
pub mod error;
pub mod model;
pub mod settings;
pub mod store;
pub mod validation;

pub use error::{AppResult, PanelError};
