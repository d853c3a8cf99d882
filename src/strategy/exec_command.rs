//! Legacy `SaveAs` document command.
//!
//! Older hosts expose a document-level `SaveAs` command. The content is
//! written into the hidden frame's nested document and the command is run
//! against that document with the requested filename. Only text survives.

use std::rc::Rc;

use tracing::debug;

use crate::error::SaveError;
use crate::host::{Host, SharedElements};

use super::{SaveRequest, Strategy};

/// Saves by running `SaveAs` on the hidden frame's document.
#[derive(Debug)]
pub struct ExecCommandStrategy {
    shared: Rc<SharedElements>,
}

impl ExecCommandStrategy {
    /// Name used in config and logs.
    pub const NAME: &'static str = "exec_command";

    /// Creates the strategy over the saver's shared elements.
    #[must_use]
    pub fn new(shared: Rc<SharedElements>) -> Self {
        Self { shared }
    }
}

impl Strategy for ExecCommandStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_supported(&self, host: &dyn Host) -> bool {
        host.supports_exec_command()
    }

    #[tracing::instrument(skip_all, fields(strategy = "exec_command"))]
    fn execute(&self, host: &dyn Host, request: &SaveRequest) -> Result<bool, SaveError> {
        if !self.is_supported(host) {
            debug!("SaveAs command not available");
            return Ok(false);
        }
        let fail = |e| SaveError::host(Self::NAME, e);

        let frame = self.shared.attached_frame(host).map_err(fail)?;
        host.open_frame_document(frame).map_err(fail)?;
        host.write_frame_document(frame, &request.content)
            .map_err(fail)?;
        host.close_frame_document(frame).map_err(fail)?;

        let saved = host
            .exec_command_save_as(frame, &request.filename)
            .map_err(fail)?;
        debug!(saved, "SaveAs command returned");
        Ok(saved)
    }
}
