//! Data URI through a hidden frame.
//!
//! For hosts without the `download` attribute that can still navigate an
//! embedded frame to a data URI. The host picks the filename.

use std::rc::Rc;

use tracing::debug;

use crate::data_uri::build_text_data_uri;
use crate::error::SaveError;
use crate::host::{Host, SharedElements};

use super::{SaveRequest, Strategy};

/// Saves by navigating the hidden frame to a data URI.
#[derive(Debug)]
pub struct FrameDataUriStrategy {
    shared: Rc<SharedElements>,
}

impl FrameDataUriStrategy {
    /// Name used in config and logs.
    pub const NAME: &'static str = "frame_data_uri";

    /// Creates the strategy over the saver's shared elements.
    #[must_use]
    pub fn new(shared: Rc<SharedElements>) -> Self {
        Self { shared }
    }
}

impl Strategy for FrameDataUriStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_supported(&self, host: &dyn Host) -> bool {
        host.supports_data_uri_navigation()
    }

    #[tracing::instrument(skip_all, fields(strategy = "frame_data_uri"))]
    fn execute(&self, host: &dyn Host, request: &SaveRequest) -> Result<bool, SaveError> {
        if !self.is_supported(host) {
            debug!("Data URI navigation not available");
            return Ok(false);
        }
        let fail = |e| SaveError::host(Self::NAME, e);

        let frame = self.shared.attached_frame(host).map_err(fail)?;
        let data_uri = build_text_data_uri(&request.content);
        host.navigate_frame(frame, &data_uri).map_err(fail)?;
        debug!(
            filename = %request.filename,
            "Frame navigation cannot carry a filename; host picks one"
        );
        Ok(true)
    }
}
