//! flowfit - Repair engine for eBike FIT activity exports
//!
//! Some eBike apps export FIT activities with duplicated records, no timer
//! events and lap/session summaries that ignore pauses. flowfit rebuilds a
//! consistent message stream through a deterministic pipeline:
//! classification → record consolidation → pause segmentation → intensity
//! estimation → energy distribution → summary rewriting → assembly.
//!
//! ## Modules
//!
//! - **Pipeline**: Repair decoded message lists (`FlowFitConverter`)
//! - **Codec**: Byte-level decoding and encoding behind `MessageCodec`

pub mod assembler;
pub mod classifier;
pub mod codec;
pub mod config;
pub mod consolidator;
pub mod energy;
pub mod error;
pub mod intensity;
pub mod pipeline;
pub mod profile;
pub mod segmenter;
pub mod summary;
pub mod timer;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use codec::{JsonCodec, MessageCodec};
pub use config::ConvertOptions;
pub use error::ConvertError;
pub use pipeline::{convert_bytes, convert_json, convert_messages, FlowFitConverter};
pub use profile::RecordField;
pub use types::{Message, Record};

/// flowfit version
pub const FLOWFIT_VERSION: &str = env!("CARGO_PKG_VERSION");
