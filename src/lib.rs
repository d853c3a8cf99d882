//! Saver Library
//!
//! Saves text content as a downloaded file with a chosen filename, on hosts
//! that share no single reliable way of doing so. A [`Saver`] holds an
//! ordered chain of save strategies and tries them one after another until
//! one works; when none does, the user is told through the host.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`saver`] - Fallback orchestrator and public entry point
//! - [`strategy`] - The three save mechanisms and their common trait
//! - [`host`] - Document surface the strategies drive, plus bundled hosts
//! - [`normalize`] - Content and filename normalization
//! - [`data_uri`] - Plain text data URI encoding and decoding
//! - [`config`] - JSON/environment configuration
//!
//! # Example
//!
//! ```no_run
//! use saver::{DirectoryHost, SaverConfig, build_default_saver};
//!
//! let host = DirectoryHost::new("./downloads");
//! let saver = build_default_saver(host, &SaverConfig::default())?;
//! let outcome = saver.save_text("hello", "hello.txt");
//! println!("{outcome:?}");
//! # Ok::<(), saver::SaveError>(())
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod data_uri;
pub mod error;
pub mod host;
pub mod normalize;
pub mod saver;
pub mod strategy;

// Re-export commonly used types
pub use config::{FilenameConfig, SaverConfig};
pub use data_uri::{build_text_data_uri, decode_text_data_uri, encode_uri_component};
pub use error::{HostError, SaveError};
pub use host::{
    DirectoryHost, ElementId, ElementKind, Host, HostCall, HostCapabilities, RecordingHost,
    SharedElements,
};
pub use normalize::{normalize_content, normalize_filename};
pub use saver::{SaveOutcome, Saver, build_default_saver};
pub use strategy::{
    AnchorDownloadStrategy, ExecCommandStrategy, FrameDataUriStrategy, SaveRequest, Strategy,
    StrategyKind,
};
