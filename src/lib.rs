//! # Recaller
//!
//! **Ranked shell-history and filesystem search with instant command
//! documentation.**
//!
//! Recaller ingests your shell history into an in-memory ranked command
//! store, maintains a persistent binary index of filesystem paths you have
//! touched, and fetches help text for any command from the best available
//! documentation source. All three retrieval paths rank their results by a
//! combined frequency/recency score.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌────────────────┐
//! │ Shell history│──▶│ Command store │──▶│ Ranked results │
//! │  (zsh/bash)  │   │  (AVL tree)   │   │ (score + sort) │
//! └──────────────┘   └───────────────┘   └───────┬────────┘
//!                                                │
//! ┌──────────────┐   ┌───────────────┐           ▼
//! │  Directory   │──▶│  Path index   │──▶┌───────────────┐
//! │    walk      │   │ bloom + sketch│   │      CLI      │
//! └──────────────┘   └───────┬───────┘   └───────┬───────┘
//!                            │                   │
//!                  .recaller_fs_index.bin        ▼
//!                                        ┌───────────────┐
//!                                        │ Help dispatch │
//!                                        │ docs→tools→man│
//!                                        └───────────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. **History ingestion** ([`history`]) parses zsh or bash history records
//!    and aggregates per-command frequency and most-recent timestamp into the
//!    [`store::CommandStore`].
//! 2. **Filesystem indexing** ([`index`]) walks directories ([`walker`]),
//!    recording each path in a fixed-size binary record table with a bloom
//!    filter membership oracle and a count-min sketch frequency estimator.
//!    The index persists to `~/.recaller_fs_index.bin`.
//! 3. **Search** queries either store by prefix or substring, scores every
//!    hit with the shared frequency/recency formula ([`score`]), and returns
//!    a descending, stably sorted list.
//! 4. **Documentation** ([`help`]) resolves a command to help text through an
//!    ordered set of strategies (documentation site, tool-specific help
//!    commands, man pages, generic `--help`), caching results for 30 minutes.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`error`] | Core error kinds shared across the crate |
//! | [`store`] | Balanced ordered command store with ranked search |
//! | [`history`] | Shell-history adapters and store population |
//! | [`index`] | Persistent binary path index with bloom filter and count-min sketch |
//! | [`walker`] | Recursive directory traversal with ignore patterns |
//! | [`score`] | Frequency/recency scoring shared by both search paths |
//! | [`help`] | Help-text cache, strategy dispatcher, and process runner |
//! | [`progress`] | Progress reporting for long-running index operations |

pub mod config;
pub mod error;
pub mod help;
pub mod history;
pub mod index;
pub mod progress;
pub mod score;
pub mod store;
pub mod timefmt;
pub mod walker;
