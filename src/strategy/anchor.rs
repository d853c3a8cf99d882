//! Anchor with `download` attribute.
//!
//! The preferred mechanism on modern hosts: point a hidden link at a data
//! URI, mark it for download under the requested name, and click it.

use std::rc::Rc;

use tracing::debug;

use crate::data_uri::build_text_data_uri;
use crate::error::SaveError;
use crate::host::{Host, SharedElements};

use super::{SaveRequest, Strategy};

/// Saves by clicking a hidden data URI link carrying the `download` attribute.
#[derive(Debug)]
pub struct AnchorDownloadStrategy {
    shared: Rc<SharedElements>,
}

impl AnchorDownloadStrategy {
    /// Name used in config and logs.
    pub const NAME: &'static str = "anchor_download";

    /// Creates the strategy over the saver's shared elements.
    #[must_use]
    pub fn new(shared: Rc<SharedElements>) -> Self {
        Self { shared }
    }
}

impl Strategy for AnchorDownloadStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_supported(&self, host: &dyn Host) -> bool {
        host.supports_download_attribute()
    }

    #[tracing::instrument(skip_all, fields(strategy = "anchor_download"))]
    fn execute(&self, host: &dyn Host, request: &SaveRequest) -> Result<bool, SaveError> {
        if !self.is_supported(host) {
            debug!("Download attribute not available");
            return Ok(false);
        }
        let fail = |e| SaveError::host(Self::NAME, e);

        let anchor = self.shared.anchor(host).map_err(fail)?;
        let data_uri = build_text_data_uri(&request.content);
        host.set_attribute(anchor, "href", &data_uri).map_err(fail)?;
        host.set_attribute(anchor, "download", &request.filename)
            .map_err(fail)?;
        host.dispatch_click(anchor).map_err(fail)?;
        Ok(true)
    }
}
