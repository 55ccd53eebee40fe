//! # relink-core
//!
//! Rewrite a base URL across database payloads without breaking serialized
//! values.
//!
//! Many applications store structured settings as a legacy length-prefixed
//! serialization (`a:1:{s:3:"url";s:15:"https://a.com/x";}`). A literal
//! search-and-replace on such a payload leaves every `s:<len>` prefix stale
//! and the value no longer decodes. This crate decodes those payloads,
//! rewrites only their string leaves, and encodes them again with fresh
//! lengths. Plain text gets an ordinary literal replacement.
//!
//! ## Quick start
//!
//! ```rust
//! use relink_core::process;
//!
//! let raw = br#"a:1:{s:3:"url";s:15:"https://a.com/x";}"#;
//! let updated = process(raw, b"https://a.com", b"https://bb.com").unwrap();
//! assert_eq!(updated, br#"a:1:{s:3:"url";s:16:"https://bb.com/x";}"#.to_vec());
//!
//! // Nothing to change: no write needed.
//! assert!(process(b"plain text", b"https://a.com", b"https://bb.com").is_none());
//! ```
//!
//! ## Modules
//!
//! - [`decoder`] - payload bytes → [`Value`] tree
//! - [`encoder`] - [`Value`] tree → payload bytes
//! - [`classify`] - serialized value or opaque text?
//! - [`rewrite`] - literal replacement on bytes and across a tree
//! - [`engine`] - per-field entry point with the change gate
//! - [`migrate`] - batch runner over a record source and sink
//! - [`jsonl`] - JSON Lines source and sink
//! - [`error`] - error types
//! - [`types`] - the [`Value`] tree

pub mod classify;
pub mod decoder;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod jsonl;
pub mod migrate;
pub mod rewrite;
pub mod types;

pub use classify::is_encoded;
pub use decoder::decode;
pub use encoder::encode;
pub use engine::{
    like_pattern, normalize_base_url, process, process_detailed, FieldOutcome, PayloadKind,
};
pub use error::{DecodeError, RelinkError};
pub use migrate::{run, CancelToken, Record, RecordSink, RecordSource, Report, RunConfig};
pub use rewrite::{replace_all, replace_all_counted, rewrite, rewrite_counted};
pub use types::{Key, Value};
