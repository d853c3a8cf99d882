//! Element bookkeeping shared by the bundled hosts.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::HostError;

use super::{ElementId, ElementKind};

#[derive(Debug)]
struct ElementRecord {
    kind: ElementKind,
    attributes: HashMap<String, String>,
    attached: bool,
    document: Option<String>,
    document_open: bool,
}

/// In-memory element table with a minimal nested-document model for frames.
#[derive(Debug, Default)]
pub(crate) struct ElementStore {
    elements: RefCell<Vec<ElementRecord>>,
}

impl ElementStore {
    pub(crate) fn create(&self, kind: ElementKind) -> ElementId {
        let mut elements = self.elements.borrow_mut();
        elements.push(ElementRecord {
            kind,
            attributes: HashMap::new(),
            attached: false,
            document: None,
            document_open: false,
        });
        ElementId::new(u64::try_from(elements.len()).unwrap_or(u64::MAX))
    }

    pub(crate) fn count(&self, kind: ElementKind) -> usize {
        self.elements
            .borrow()
            .iter()
            .filter(|record| record.kind == kind)
            .count()
    }

    pub(crate) fn require_kind(
        &self,
        id: ElementId,
        kind: ElementKind,
        operation: &'static str,
    ) -> Result<(), HostError> {
        self.with_record(id, |record| {
            if record.kind == kind {
                Ok(())
            } else {
                Err(HostError::WrongElementKind {
                    id: id.raw(),
                    operation,
                    expected: kind.tag_name(),
                })
            }
        })
    }

    pub(crate) fn attach(&self, id: ElementId) -> Result<(), HostError> {
        self.with_record(id, |record| {
            record.attached = true;
            Ok(())
        })
    }

    pub(crate) fn is_attached(&self, id: ElementId) -> bool {
        self.with_record(id, |record| Ok(record.attached))
            .unwrap_or(false)
    }

    pub(crate) fn set_attribute(
        &self,
        id: ElementId,
        name: &str,
        value: &str,
    ) -> Result<(), HostError> {
        self.with_record(id, |record| {
            record
                .attributes
                .insert(name.to_string(), value.to_string());
            Ok(())
        })
    }

    pub(crate) fn attribute(&self, id: ElementId, name: &str) -> Option<String> {
        self.with_record(id, |record| Ok(record.attributes.get(name).cloned()))
            .ok()
            .flatten()
    }

    /// Starts a fresh document in an attached frame, discarding the old one.
    pub(crate) fn open_document(&self, id: ElementId) -> Result<(), HostError> {
        self.require_kind(id, ElementKind::Frame, "open a document")?;
        self.with_record(id, |record| {
            if !record.attached {
                return Err(HostError::operation_failed(
                    "open_frame_document",
                    "frame is not attached to the document, so it has no content document",
                ));
            }
            record.document = Some(String::new());
            record.document_open = true;
            Ok(())
        })
    }

    pub(crate) fn write_document(&self, id: ElementId, content: &str) -> Result<(), HostError> {
        self.with_record(id, |record| match record.document.as_mut() {
            Some(document) if record.document_open => {
                document.push_str(content);
                Ok(())
            }
            _ => Err(HostError::operation_failed(
                "write_frame_document",
                "document stream is not open",
            )),
        })
    }

    pub(crate) fn close_document(&self, id: ElementId) -> Result<(), HostError> {
        self.with_record(id, |record| {
            if !record.document_open {
                return Err(HostError::operation_failed(
                    "close_frame_document",
                    "document stream is not open",
                ));
            }
            record.document_open = false;
            Ok(())
        })
    }

    pub(crate) fn document(&self, id: ElementId) -> Option<String> {
        self.with_record(id, |record| Ok(record.document.clone()))
            .ok()
            .flatten()
    }

    fn with_record<T>(
        &self,
        id: ElementId,
        f: impl FnOnce(&mut ElementRecord) -> Result<T, HostError>,
    ) -> Result<T, HostError> {
        let mut elements = self.elements.borrow_mut();
        let record = usize::try_from(id.raw())
            .ok()
            .and_then(|raw| raw.checked_sub(1))
            .and_then(|index| elements.get_mut(index))
            .ok_or(HostError::UnknownElement { id: id.raw() })?;
        f(record)
    }
}
