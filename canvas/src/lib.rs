//! Board synchronization and timeline engine for the shared pixel canvas.
//!
//! This crate holds the ordered log of pixel placements and everything derived
//! from it: board snapshots at any point in history, the merge of realtime
//! pushes, optimistic local submissions with rate-limit retries, and the
//! per-author leaderboard. It also maps pointer input to board cells under
//! pan and zoom. It performs no I/O; hosts feed it wire records and forward
//! the returned [`engine::Action`]s to the network and the page.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`log`] | Append-only placement log with tombstones |
//! | [`snapshot`] | Prefix snapshots and the checkpoint cache |
//! | [`history`] | Live / scrubbing cursor over the log |
//! | [`queue`] | Optimistic submission queue |
//! | [`leaderboard`] | Per-author counts for a prefix |
//! | [`camera`] | Pan/zoom viewport and coordinate conversions |
//! | [`placement`] | Cells, colors, authors, and boundary validation |
//! | [`palette`] | Color palette with a custom slot |
//! | [`input`] | Input event types and key commands |
//! | [`render`] | Canvas painting |
//! | [`config`] | Board dimensions and tuning |
//! | [`consts`] | Shared constants (palette, zoom limits, etc.) |

pub mod camera;
pub mod config;
pub mod consts;
pub mod engine;
pub mod history;
pub mod input;
pub mod leaderboard;
pub mod log;
pub mod palette;
pub mod placement;
pub mod queue;
pub mod render;
pub mod snapshot;
