//! # Loupe
//!
//! Client-side IPC correlation layer for long-lived editor analysis
//! workers (autocomplete, replacement suggestions, highlighting).
//!
//! The crate owns the client half of the conversation: collision-free
//! correlation ids, at-most-one-live-request-per-command semantics,
//! non-blocking response draining, and worker lifecycle supervision.
//! The worker's analysis algorithms are out of scope; it is any process
//! that speaks the NDJSON protocol in [`protocol`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  Host application (editor)                   │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                  IpcClient (facade)                    │  │
//! │  │   IdAllocator ─ stamps each message with a fresh id    │  │
//! │  │   Correlator  ─ one live request per command;          │  │
//! │  │                 stale/superseded answers dropped       │  │
//! │  │   FileMirror  ─ authoritative file contents, replayed  │  │
//! │  │                 to every freshly spawned worker        │  │
//! │  │   Supervisor  ─ child process + channels; respawns     │  │
//! │  │                 transparently on crash                 │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │               stdin (NDJSON) │ stdout (NDJSON)               │
//! └──────────────────────────────┼───────────────────────────────┘
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │          Analysis worker (long-running child process)        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use loupe::{IpcClient, RequestContext, Settings};
//!
//! let mut client = IpcClient::spawn(Settings::for_worker("./analysis-worker")).await?;
//! client.update_file("main.py", "x = 1\n").await?;
//! client.request("autocomplete", "main.py", RequestContext::default()).await?;
//!
//! // Later, on the editor's own schedule:
//! if let Some(response) = client.get_response("autocomplete").await? {
//!     // render suggestions from response.result
//! }
//! ```

pub mod client;
pub mod config;
pub mod correlator;
pub mod error;
pub mod id;
pub mod mirror;
pub mod protocol;
pub mod supervisor;

pub use client::IpcClient;
pub use config::{Settings, SettingsError, WorkerSettings};
pub use error::{IpcError, IpcResult};
pub use protocol::{Command, Message, RequestContext, RequestId, Response, TextRange};
