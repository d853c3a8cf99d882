//! Save strategies tried by the fallback chain.
//!
//! Each strategy is one self-contained way of getting text onto the user's
//! disk through the host, with a side-effect-free support probe and an
//! execution routine that reports whether the save went through.
//!
//! # Architecture
//!
//! - [`Strategy`] - Trait that individual save mechanisms implement
//! - [`StrategyKind`] - Serializable tag naming a built-in strategy
//! - [`SaveRequest`] - Normalized content and filename handed to strategies
//! - [`AnchorDownloadStrategy`] - Data URI link with the `download` attribute
//! - [`FrameDataUriStrategy`] - Hidden frame navigated to a data URI
//! - [`ExecCommandStrategy`] - Legacy `SaveAs` command on a frame document

mod anchor;
mod exec_command;
mod frame;

pub use anchor::AnchorDownloadStrategy;
pub use exec_command::ExecCommandStrategy;
pub use frame::FrameDataUriStrategy;

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::FilenameConfig;
use crate::error::SaveError;
use crate::host::{Host, SharedElements};
use crate::normalize::{normalize_content, normalize_filename};

/// Normalized inputs of one save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    /// Text to save.
    pub content: String,
    /// Suggested filename, already sanitized.
    pub filename: String,
}

impl SaveRequest {
    /// Normalizes loosely typed inputs into a request.
    #[must_use]
    pub fn normalize(
        content: Option<&Value>,
        filename: Option<&Value>,
        config: &FilenameConfig,
    ) -> Self {
        Self {
            filename: normalize_filename(filename, config),
            content: normalize_content(content),
        }
    }
}

/// Trait that all save strategies implement.
///
/// `execute` checks support itself and returns `Ok(false)` when the host
/// lacks the capability, so callers only ever inspect its result. An `Err`
/// means the host failed mid-attempt and is treated as a failed attempt.
pub trait Strategy {
    /// Returns the strategy's name (e.g. `"anchor_download"`).
    fn name(&self) -> &str;

    /// Returns true if the host offers what this strategy needs.
    fn is_supported(&self, host: &dyn Host) -> bool;

    /// Attempts the save.
    ///
    /// # Errors
    ///
    /// Returns `SaveError::Host` if a host call fails during the attempt.
    fn execute(&self, host: &dyn Host, request: &SaveRequest) -> Result<bool, SaveError>;
}

/// Built-in strategies, in their default priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// [`AnchorDownloadStrategy`]
    AnchorDownload,
    /// [`FrameDataUriStrategy`]
    FrameDataUri,
    /// [`ExecCommandStrategy`]
    ExecCommand,
}

impl StrategyKind {
    /// Most modern first, most compatible last.
    pub const DEFAULT_ORDER: [Self; 3] = [Self::AnchorDownload, Self::FrameDataUri, Self::ExecCommand];

    /// Returns the strategy name used in config and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AnchorDownload => AnchorDownloadStrategy::NAME,
            Self::FrameDataUri => FrameDataUriStrategy::NAME,
            Self::ExecCommand => ExecCommandStrategy::NAME,
        }
    }

    /// Builds the strategy, sharing the saver's hidden elements.
    #[must_use]
    pub fn build(self, shared: &Rc<SharedElements>) -> Box<dyn Strategy> {
        match self {
            Self::AnchorDownload => Box::new(AnchorDownloadStrategy::new(Rc::clone(shared))),
            Self::FrameDataUri => Box::new(FrameDataUriStrategy::new(Rc::clone(shared))),
            Self::ExecCommand => Box::new(ExecCommandStrategy::new(Rc::clone(shared))),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = SaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::DEFAULT_ORDER
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                SaveError::invalid_config(
                    "strategies",
                    format!(
                        "unknown strategy '{s}', expected one of: anchor_download, frame_data_uri, exec_command"
                    ),
                )
            })
    }
}
