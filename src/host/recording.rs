//! Scriptable host that records every call.
//!
//! [`RecordingHost`] keeps a real element table, so strategies behave as
//! they would against a document, while capabilities, the `SaveAs` result
//! and injected failures are set up front by the test.

use std::cell::RefCell;

use crate::error::HostError;

use super::elements::ElementStore;
use super::{ElementId, ElementKind, Host, HostCapabilities};

/// One recorded host interaction. Capability probes are not recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    /// `create_element`
    CreateElement(ElementKind),
    /// `append_to_body`
    AppendToBody(ElementId),
    /// `set_attribute`
    SetAttribute {
        /// Target element
        element: ElementId,
        /// Attribute name
        name: String,
        /// Attribute value
        value: String,
    },
    /// `dispatch_click`
    DispatchClick(ElementId),
    /// `navigate_frame`
    NavigateFrame {
        /// Target frame
        frame: ElementId,
        /// Navigation target
        uri: String,
    },
    /// `open_frame_document`
    OpenFrameDocument(ElementId),
    /// `write_frame_document`
    WriteFrameDocument {
        /// Target frame
        frame: ElementId,
        /// Written text
        content: String,
    },
    /// `close_frame_document`
    CloseFrameDocument(ElementId),
    /// `exec_command_save_as`
    ExecCommandSaveAs {
        /// Target frame
        frame: ElementId,
        /// Suggested filename
        filename: String,
    },
    /// `alert`
    Alert(String),
}

/// A fake [`Host`] for exercising strategies and the fallback chain.
#[derive(Debug)]
pub struct RecordingHost {
    capabilities: HostCapabilities,
    exec_command_result: bool,
    failing_operation: Option<&'static str>,
    elements: ElementStore,
    calls: RefCell<Vec<HostCall>>,
}

impl RecordingHost {
    /// Creates a host with the given capabilities.
    ///
    /// When `exec_command` is supported the command reports success unless
    /// changed with [`RecordingHost::with_exec_command_result`].
    #[must_use]
    pub fn new(capabilities: HostCapabilities) -> Self {
        Self {
            capabilities,
            exec_command_result: true,
            failing_operation: None,
            elements: ElementStore::default(),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Sets the value `SaveAs` reports when invoked.
    #[must_use]
    pub fn with_exec_command_result(mut self, result: bool) -> Self {
        self.exec_command_result = result;
        self
    }

    /// Makes the named host operation (e.g. `"dispatch_click"`) fail.
    #[must_use]
    pub fn failing_on(mut self, operation: &'static str) -> Self {
        self.failing_operation = Some(operation);
        self
    }

    /// Returns every recorded call, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.borrow().clone()
    }

    /// Returns the messages of every alert shown.
    #[must_use]
    pub fn alerts(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                HostCall::Alert(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns how many elements of `kind` were created.
    #[must_use]
    pub fn created_count(&self, kind: ElementKind) -> usize {
        self.elements.count(kind)
    }

    /// Returns the current value of an element attribute.
    #[must_use]
    pub fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.elements.attribute(element, name)
    }

    /// Returns true if the element was appended to the body.
    #[must_use]
    pub fn is_attached(&self, element: ElementId) -> bool {
        self.elements.is_attached(element)
    }

    /// Returns the text of a frame's nested document, if it has one.
    #[must_use]
    pub fn frame_document(&self, frame: ElementId) -> Option<String> {
        self.elements.document(frame)
    }

    fn record(&self, operation: &'static str, call: HostCall) -> Result<(), HostError> {
        self.calls.borrow_mut().push(call);
        if self.failing_operation == Some(operation) {
            return Err(HostError::operation_failed(operation, "injected failure"));
        }
        Ok(())
    }
}

impl Host for RecordingHost {
    fn create_element(&self, kind: ElementKind) -> Result<ElementId, HostError> {
        self.record("create_element", HostCall::CreateElement(kind))?;
        Ok(self.elements.create(kind))
    }

    fn append_to_body(&self, element: ElementId) -> Result<(), HostError> {
        self.record("append_to_body", HostCall::AppendToBody(element))?;
        self.elements.attach(element)
    }

    fn set_attribute(
        &self,
        element: ElementId,
        name: &str,
        value: &str,
    ) -> Result<(), HostError> {
        self.record(
            "set_attribute",
            HostCall::SetAttribute {
                element,
                name: name.to_string(),
                value: value.to_string(),
            },
        )?;
        self.elements.set_attribute(element, name, value)
    }

    fn supports_download_attribute(&self) -> bool {
        self.capabilities.download_attribute
    }

    fn supports_data_uri_navigation(&self) -> bool {
        self.capabilities.data_uri_navigation
    }

    fn supports_exec_command(&self) -> bool {
        self.capabilities.exec_command
    }

    fn dispatch_click(&self, element: ElementId) -> Result<(), HostError> {
        self.record("dispatch_click", HostCall::DispatchClick(element))?;
        self.elements
            .require_kind(element, ElementKind::Anchor, "receive a click")
    }

    fn navigate_frame(&self, frame: ElementId, uri: &str) -> Result<(), HostError> {
        self.record(
            "navigate_frame",
            HostCall::NavigateFrame {
                frame,
                uri: uri.to_string(),
            },
        )?;
        self.elements
            .require_kind(frame, ElementKind::Frame, "navigate")?;
        self.elements.set_attribute(frame, "src", uri)
    }

    fn open_frame_document(&self, frame: ElementId) -> Result<(), HostError> {
        self.record("open_frame_document", HostCall::OpenFrameDocument(frame))?;
        self.elements.open_document(frame)
    }

    fn write_frame_document(&self, frame: ElementId, content: &str) -> Result<(), HostError> {
        self.record(
            "write_frame_document",
            HostCall::WriteFrameDocument {
                frame,
                content: content.to_string(),
            },
        )?;
        self.elements.write_document(frame, content)
    }

    fn close_frame_document(&self, frame: ElementId) -> Result<(), HostError> {
        self.record("close_frame_document", HostCall::CloseFrameDocument(frame))?;
        self.elements.close_document(frame)
    }

    fn exec_command_save_as(&self, frame: ElementId, filename: &str) -> Result<bool, HostError> {
        self.record(
            "exec_command_save_as",
            HostCall::ExecCommandSaveAs {
                frame,
                filename: filename.to_string(),
            },
        )?;
        self.elements
            .require_kind(frame, ElementKind::Frame, "run SaveAs")?;
        Ok(self.capabilities.exec_command && self.exec_command_result)
    }

    fn alert(&self, message: &str) -> Result<(), HostError> {
        self.record("alert", HostCall::Alert(message.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_host_reports_capabilities() {
        let host = RecordingHost::new(HostCapabilities {
            download_attribute: true,
            data_uri_navigation: false,
            exec_command: true,
        });
        assert!(host.supports_download_attribute());
        assert!(!host.supports_data_uri_navigation());
        assert!(host.supports_exec_command());
    }

    #[test]
    fn test_recording_host_records_calls_in_order() {
        let host = RecordingHost::new(HostCapabilities::ALL);
        let anchor = host.create_element(ElementKind::Anchor).unwrap();
        host.set_attribute(anchor, "href", "data:charset=utf-8,x")
            .unwrap();
        host.dispatch_click(anchor).unwrap();

        assert_eq!(
            host.calls(),
            vec![
                HostCall::CreateElement(ElementKind::Anchor),
                HostCall::SetAttribute {
                    element: anchor,
                    name: "href".to_string(),
                    value: "data:charset=utf-8,x".to_string(),
                },
                HostCall::DispatchClick(anchor),
            ]
        );
    }

    #[test]
    fn test_recording_host_injected_failure_still_records() {
        let host = RecordingHost::new(HostCapabilities::ALL).failing_on("alert");
        assert!(host.alert("boom").is_err());
        assert_eq!(host.alerts(), vec!["boom".to_string()]);
    }

    #[test]
    fn test_recording_host_exec_command_result() {
        let host = RecordingHost::new(HostCapabilities::ALL).with_exec_command_result(false);
        let frame = host.create_element(ElementKind::Frame).unwrap();
        assert!(!host.exec_command_save_as(frame, "a.txt").unwrap());

        let host = RecordingHost::new(HostCapabilities::ALL);
        let frame = host.create_element(ElementKind::Frame).unwrap();
        assert!(host.exec_command_save_as(frame, "a.txt").unwrap());
    }

    #[test]
    fn test_recording_host_navigation_updates_src() {
        let host = RecordingHost::new(HostCapabilities::ALL);
        let frame = host.create_element(ElementKind::Frame).unwrap();
        host.navigate_frame(frame, "data:charset=utf-8,hi").unwrap();
        assert_eq!(
            host.attribute(frame, "src").as_deref(),
            Some("data:charset=utf-8,hi")
        );
    }

    #[test]
    fn test_recording_host_rejects_click_on_frame() {
        let host = RecordingHost::new(HostCapabilities::ALL);
        let frame = host.create_element(ElementKind::Frame).unwrap();
        let err = host.dispatch_click(frame).unwrap_err();
        assert!(matches!(err, HostError::WrongElementKind { .. }));
    }
}
