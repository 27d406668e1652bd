//! # gatewatch - live allow/block view of HAProxy connection tables
//!
//! gatewatch polls a stick table on the HAProxy admin socket, classifies
//! every source address against an allow list and a deny list, and keeps an
//! auto-refreshing HTML page with two bounded tables: allowed connections
//! and blocked connection attempts.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        gatewatch                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)          run, once, check, config, version      │
//! │  Config (serde_yaml)                                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Monitor (tokio interval)                                   │
//! │    Fetcher ──► Snapshot parser ──► Engine ──► Renderer      │
//! │    (admin socket)                   │          (atomic      │
//! │                                     │           rewrite)    │
//! │              Debouncer ◄────────────┤                       │
//! │              Classifier (ipnet) ◄───┤                       │
//! │              Label annotator ◄──────┤                       │
//! │              Display tables (indexmap)                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use chrono::Local;
//! use gatewatch::classifier::Classifier;
//! use gatewatch::engine::{Engine, EngineSettings};
//! use gatewatch::labels::NoLabels;
//! use gatewatch::lists::NetworkList;
//! use gatewatch::snapshot::parse_snapshot;
//! use std::time::Instant;
//!
//! let classifier = Classifier::new(
//!     NetworkList::parse("10.0.0.0/24\n"),
//!     NetworkList::parse("10.0.0.66/32\n"),
//! );
//! let mut engine = Engine::new(EngineSettings::default(), classifier, Box::new(NoLabels));
//!
//! let samples = parse_snapshot(
//!     "# table: vpn, type: ip, size:102400, used:1\n\
//!      0x1: key=10.0.0.5 use=0 exp=0 conn_cnt=10 conn_cur=3\n",
//! );
//! engine.reconcile(&samples, Instant::now(), Local::now());
//!
//! assert_eq!(engine.allowed().len(), 1);
//! assert!(engine.render().contains("10.0.0.5"));
//! ```
//!
//! ## Modules
//!
//! - [`classifier`] - Deny-first, default-deny address classification
//! - [`cli`] - Command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration parsing and validation
//! - [`debounce`] - Per-address debouncing
//! - [`engine`] - Reconciliation engine owning all mutable state
//! - [`fetcher`] - Admin socket client
//! - [`fs_abstraction`] - Filesystem seam for tests
//! - [`labels`] - Country labels for addresses
//! - [`lists`] - Allow/deny network lists
//! - [`lock`] - Single-writer lock on the output
//! - [`monitor`] - The poll loop
//! - [`render`] - HTML page rendering
//! - [`snapshot`] - `show table` output parser
//! - [`state`] - Table persistence across restarts
//! - [`table`] - Bounded, ordered display tables

pub mod classifier;
pub mod cli;
pub mod commands;
pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod fs_abstraction;
pub mod labels;
pub mod lists;
pub mod lock;
pub mod monitor;
pub mod render;
pub mod snapshot;
pub mod state;
pub mod table;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::WatchError;
