//! Host platform surface used by save strategies.
//!
//! The document the strategies drive (elements, attributes, click events,
//! frame navigation, the legacy `SaveAs` command, modal alerts) is an
//! external collaborator reached only through the [`Host`] trait. Keeping
//! the surface this narrow lets the fallback chain run against a browser
//! binding, the on-disk [`DirectoryHost`], or the scriptable
//! [`RecordingHost`] used in tests.
//!
//! # Architecture
//!
//! - [`Host`] - Trait a platform binding implements
//! - [`SharedElements`] - Lazily created hidden anchor and frame, shared by strategies
//! - [`HostCapabilities`] - Capability switches for the bundled hosts
//! - [`RecordingHost`] - Fake host that records every call
//! - [`DirectoryHost`] - Headless host that writes downloads into a directory

mod directory;
mod elements;
mod recording;

pub use directory::{DEFAULT_DOWNLOAD_NAME, DirectoryHost};
pub use recording::{HostCall, RecordingHost};

use std::cell::Cell;

use tracing::debug;

use crate::error::HostError;

/// Id given to the hidden frame.
pub const FRAME_ELEMENT_ID: &str = "saverFrame";

/// Initial navigation target of the hidden frame.
pub const BLANK_PAGE: &str = "about:blank";

/// Opaque handle to an element created by a [`Host`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(u64);

impl ElementId {
    /// Wraps a raw host handle.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw host handle.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Kinds of element the strategies create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// A link element (`<a>`).
    Anchor,
    /// An embedded frame (`<iframe>`).
    Frame,
}

impl ElementKind {
    /// Returns the HTML tag name for this kind.
    #[must_use]
    pub const fn tag_name(self) -> &'static str {
        match self {
            Self::Anchor => "a",
            Self::Frame => "iframe",
        }
    }
}

/// Capability switches for the bundled hosts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Anchors expose the `download` attribute.
    pub download_attribute: bool,
    /// Frames can be navigated to `data:` URIs.
    pub data_uri_navigation: bool,
    /// Documents implement the legacy `SaveAs` command.
    pub exec_command: bool,
}

impl HostCapabilities {
    /// A host that supports nothing.
    pub const NONE: Self = Self {
        download_attribute: false,
        data_uri_navigation: false,
        exec_command: false,
    };

    /// A host that supports every strategy.
    pub const ALL: Self = Self {
        download_attribute: true,
        data_uri_navigation: true,
        exec_command: true,
    };
}

/// The document surface consumed by save strategies.
///
/// Hosts are single-threaded and use interior mutability, like the
/// document objects they stand in for. Capability probes must be free of
/// side effects.
pub trait Host {
    /// Creates a detached element.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the host cannot create elements.
    fn create_element(&self, kind: ElementKind) -> Result<ElementId, HostError>;

    /// Attaches an element to the document body.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the element is unknown.
    fn append_to_body(&self, element: ElementId) -> Result<(), HostError>;

    /// Sets an attribute on an element.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the element is unknown.
    fn set_attribute(&self, element: ElementId, name: &str, value: &str)
    -> Result<(), HostError>;

    /// Returns true if anchors expose the `download` attribute.
    fn supports_download_attribute(&self) -> bool;

    /// Returns true if frames can be navigated to `data:` URIs.
    fn supports_data_uri_navigation(&self) -> bool;

    /// Returns true if documents implement the `SaveAs` command.
    fn supports_exec_command(&self) -> bool;

    /// Dispatches a synthesized, trusted-equivalent click on an element.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the element is unknown or the click handler fails.
    fn dispatch_click(&self, element: ElementId) -> Result<(), HostError>;

    /// Navigates a frame to `uri`.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the element is not a frame or the target is refused.
    fn navigate_frame(&self, frame: ElementId, uri: &str) -> Result<(), HostError>;

    /// Opens a fresh write stream into the frame's nested document.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the frame is not attached, so has no document.
    fn open_frame_document(&self, frame: ElementId) -> Result<(), HostError>;

    /// Writes into the frame's open document stream.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if no stream is open.
    fn write_frame_document(&self, frame: ElementId, content: &str) -> Result<(), HostError>;

    /// Closes the frame's document stream.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if no stream is open.
    fn close_frame_document(&self, frame: ElementId) -> Result<(), HostError>;

    /// Runs the `SaveAs` command against the frame's document.
    ///
    /// Returns the command's own success flag.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the frame has no document.
    fn exec_command_save_as(&self, frame: ElementId, filename: &str) -> Result<bool, HostError>;

    /// Shows a blocking, user-visible notification.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the host cannot notify the user.
    fn alert(&self, message: &str) -> Result<(), HostError>;
}

/// The hidden anchor and frame shared by every strategy of one saver.
///
/// Each element is created on first request and reused afterwards; nothing
/// is ever torn down. Creation is only cached once the element is fully
/// configured, so a failed setup is retried on the next save.
#[derive(Debug, Default)]
pub struct SharedElements {
    anchor: Cell<Option<ElementId>>,
    frame: Cell<Option<ElementId>>,
    frame_attached: Cell<bool>,
}

impl SharedElements {
    /// Creates an empty set; elements are created lazily.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the hidden anchor, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the host fails to create the element.
    pub fn anchor(&self, host: &dyn Host) -> Result<ElementId, HostError> {
        if let Some(anchor) = self.anchor.get() {
            return Ok(anchor);
        }
        let anchor = host.create_element(ElementKind::Anchor)?;
        debug!(element = anchor.raw(), "Created hidden anchor");
        self.anchor.set(Some(anchor));
        Ok(anchor)
    }

    /// Returns the hidden frame, creating and configuring it on first use.
    ///
    /// The frame is zero-sized, not rendered, and starts at `about:blank`.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the host fails to create or configure the element.
    pub fn frame(&self, host: &dyn Host) -> Result<ElementId, HostError> {
        if let Some(frame) = self.frame.get() {
            return Ok(frame);
        }
        let frame = host.create_element(ElementKind::Frame)?;
        host.set_attribute(frame, "id", FRAME_ELEMENT_ID)?;
        host.set_attribute(frame, "height", "0")?;
        host.set_attribute(frame, "width", "0")?;
        host.set_attribute(frame, "style", "display:none")?;
        host.set_attribute(frame, "src", BLANK_PAGE)?;
        debug!(element = frame.raw(), "Created hidden frame");
        self.frame.set(Some(frame));
        Ok(frame)
    }

    /// Returns the hidden frame, attached to the document body.
    ///
    /// A frame's nested document only exists once it is in the document.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if creating or attaching the frame fails.
    pub fn attached_frame(&self, host: &dyn Host) -> Result<ElementId, HostError> {
        let frame = self.frame(host)?;
        if !self.frame_attached.get() {
            host.append_to_body(frame)?;
            self.frame_attached.set(true);
        }
        Ok(frame)
    }

    /// Returns the anchor if it has been created.
    #[must_use]
    pub fn existing_anchor(&self) -> Option<ElementId> {
        self.anchor.get()
    }

    /// Returns the frame if it has been created.
    #[must_use]
    pub fn existing_frame(&self) -> Option<ElementId> {
        self.frame.get()
    }
}
