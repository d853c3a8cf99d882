//! Headless host that materializes downloads into a directory.
//!
//! [`DirectoryHost`] plays the part of a browser's download manager for
//! environments without one: a clicked download anchor, a frame navigated
//! to a data URI, or a `SaveAs` command each end up as a file in the
//! target directory. Existing files are never overwritten.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use url::Url;

use crate::config::MAX_FILENAME_BYTES;
use crate::data_uri::decode_text_data_uri;
use crate::error::HostError;
use crate::normalize::{is_usable_filename, numbered_variant, strip_illegal_characters};

use super::elements::ElementStore;
use super::{ElementId, ElementKind, Host, HostCapabilities};

/// Name used when the save mechanism cannot convey a filename.
pub const DEFAULT_DOWNLOAD_NAME: &str = "download";

/// A [`Host`] that writes saved content to files under one directory.
#[derive(Debug)]
pub struct DirectoryHost {
    dir: PathBuf,
    capabilities: HostCapabilities,
    elements: ElementStore,
    saved: RefCell<Vec<PathBuf>>,
    alerts: RefCell<Vec<String>>,
}

impl DirectoryHost {
    /// Creates a host saving into `dir` with every capability enabled.
    ///
    /// The directory is created on the first save if missing.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            capabilities: HostCapabilities::ALL,
            elements: ElementStore::default(),
            saved: RefCell::new(Vec::new()),
            alerts: RefCell::new(Vec::new()),
        }
    }

    /// Restricts the capabilities this host reports.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: HostCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Returns the download directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the paths written so far, oldest first.
    #[must_use]
    pub fn saved_files(&self) -> Vec<PathBuf> {
        self.saved.borrow().clone()
    }

    /// Returns every notification shown to the user.
    #[must_use]
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }

    fn materialize(&self, filename: &str, content: &str) -> Result<PathBuf, HostError> {
        fs::create_dir_all(&self.dir).map_err(|source| HostError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = resolve_unique_path(&self.dir, filename);
        fs::write(&path, content).map_err(|source| HostError::Io {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), bytes = content.len(), "Saved download");
        self.saved.borrow_mut().push(path.clone());
        Ok(path)
    }
}

impl Host for DirectoryHost {
    fn create_element(&self, kind: ElementKind) -> Result<ElementId, HostError> {
        Ok(self.elements.create(kind))
    }

    fn append_to_body(&self, element: ElementId) -> Result<(), HostError> {
        self.elements.attach(element)
    }

    fn set_attribute(
        &self,
        element: ElementId,
        name: &str,
        value: &str,
    ) -> Result<(), HostError> {
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
        self.elements
            .require_kind(element, ElementKind::Anchor, "receive a click")?;
        let href = self.elements.attribute(element, "href").ok_or_else(|| {
            HostError::operation_failed("dispatch_click", "anchor has no href")
        })?;
        let Some(filename) = self.elements.attribute(element, "download") else {
            debug!(element = element.raw(), "Anchor has no download attribute, click ignored");
            return Ok(());
        };
        if !self.capabilities.download_attribute {
            debug!(element = element.raw(), "Download attribute unsupported, click ignored");
            return Ok(());
        }
        let content = decode_text_data_uri(&href)
            .map_err(|e| HostError::invalid_target(&href, &e.to_string()))?;
        self.materialize(&filename, &content)?;
        Ok(())
    }

    fn navigate_frame(&self, frame: ElementId, uri: &str) -> Result<(), HostError> {
        self.elements
            .require_kind(frame, ElementKind::Frame, "navigate")?;
        let target = Url::parse(uri).map_err(|e| HostError::invalid_target(uri, &e.to_string()))?;
        match target.scheme() {
            "about" => self.elements.set_attribute(frame, "src", uri),
            "data" => {
                if !self.capabilities.data_uri_navigation {
                    return Err(HostError::operation_failed(
                        "navigate_frame",
                        "frames cannot be navigated to data: URIs on this host",
                    ));
                }
                let content = decode_text_data_uri(uri)
                    .map_err(|e| HostError::invalid_target(uri, &e.to_string()))?;
                self.elements.set_attribute(frame, "src", uri)?;
                self.materialize(DEFAULT_DOWNLOAD_NAME, &content)?;
                Ok(())
            }
            other => Err(HostError::invalid_target(
                uri,
                &format!("'{other}:' targets are not supported offline"),
            )),
        }
    }

    fn open_frame_document(&self, frame: ElementId) -> Result<(), HostError> {
        self.elements.open_document(frame)
    }

    fn write_frame_document(&self, frame: ElementId, content: &str) -> Result<(), HostError> {
        self.elements.write_document(frame, content)
    }

    fn close_frame_document(&self, frame: ElementId) -> Result<(), HostError> {
        self.elements.close_document(frame)
    }

    fn exec_command_save_as(&self, frame: ElementId, filename: &str) -> Result<bool, HostError> {
        self.elements
            .require_kind(frame, ElementKind::Frame, "run SaveAs")?;
        if !self.capabilities.exec_command {
            return Ok(false);
        }
        let document = self.elements.document(frame).ok_or_else(|| {
            HostError::operation_failed("exec_command_save_as", "frame has no document")
        })?;
        self.materialize(filename, &document)?;
        Ok(true)
    }

    fn alert(&self, message: &str) -> Result<(), HostError> {
        warn!(notification = message, "User notification");
        self.alerts.borrow_mut().push(message.to_string());
        Ok(())
    }
}

/// Resolves a path under `dir` that is not taken yet.
///
/// The name is sanitized again so nothing can escape `dir`. A taken name
/// gets the first free `_<n>` suffix before its extension.
fn resolve_unique_path(dir: &Path, filename: &str) -> PathBuf {
    let sanitized = strip_illegal_characters(filename, MAX_FILENAME_BYTES);
    let filename = if is_usable_filename(&sanitized) {
        sanitized
    } else {
        DEFAULT_DOWNLOAD_NAME.to_string()
    };

    let mut candidate = dir.join(&filename);
    let mut n = 0;
    while candidate.exists() {
        n += 1;
        candidate = dir.join(numbered_variant(&filename, n));
    }
    candidate
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Component;

    use tempfile::TempDir;

    use super::*;
    use crate::data_uri::build_text_data_uri;

    fn clicked_anchor(host: &DirectoryHost, content: &str, filename: &str) -> ElementId {
        let anchor = host.create_element(ElementKind::Anchor).unwrap();
        host.set_attribute(anchor, "href", &build_text_data_uri(content))
            .unwrap();
        host.set_attribute(anchor, "download", filename).unwrap();
        host.dispatch_click(anchor).unwrap();
        anchor
    }

    #[test]
    fn test_click_with_download_attribute_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let host = DirectoryHost::new(temp_dir.path());

        clicked_anchor(&host, "hello, wörld", "greeting.txt");

        let path = temp_dir.path().join("greeting.txt");
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello, wörld");
        assert_eq!(host.saved_files(), vec![path]);
    }

    #[test]
    fn test_click_without_download_attribute_saves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let host = DirectoryHost::new(temp_dir.path());
        let anchor = host.create_element(ElementKind::Anchor).unwrap();
        host.set_attribute(anchor, "href", &build_text_data_uri("x"))
            .unwrap();

        host.dispatch_click(anchor).unwrap();

        assert!(host.saved_files().is_empty());
    }

    #[test]
    fn test_repeated_saves_do_not_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let host = DirectoryHost::new(temp_dir.path());

        clicked_anchor(&host, "one", "notes.txt");
        clicked_anchor(&host, "two", "notes.txt");
        clicked_anchor(&host, "three", "notes.txt");

        let dir = temp_dir.path();
        assert_eq!(fs::read_to_string(dir.join("notes.txt")).unwrap(), "one");
        assert_eq!(fs::read_to_string(dir.join("notes_1.txt")).unwrap(), "two");
        assert_eq!(fs::read_to_string(dir.join("notes_2.txt")).unwrap(), "three");
    }

    #[test]
    fn test_frame_navigation_to_data_uri_uses_default_name() {
        let temp_dir = TempDir::new().unwrap();
        let host = DirectoryHost::new(temp_dir.path());
        let frame = host.create_element(ElementKind::Frame).unwrap();

        host.navigate_frame(frame, &build_text_data_uri("framed"))
            .unwrap();

        let path = temp_dir.path().join(DEFAULT_DOWNLOAD_NAME);
        assert_eq!(fs::read_to_string(path).unwrap(), "framed");
    }

    #[test]
    fn test_frame_navigation_to_about_blank_saves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let host = DirectoryHost::new(temp_dir.path());
        let frame = host.create_element(ElementKind::Frame).unwrap();

        host.navigate_frame(frame, "about:blank").unwrap();

        assert!(host.saved_files().is_empty());
    }

    #[test]
    fn test_frame_navigation_rejects_network_targets() {
        let temp_dir = TempDir::new().unwrap();
        let host = DirectoryHost::new(temp_dir.path());
        let frame = host.create_element(ElementKind::Frame).unwrap();

        let err = host
            .navigate_frame(frame, "https://example.com/file.txt")
            .unwrap_err();
        assert!(matches!(err, HostError::InvalidTarget { .. }));
    }

    #[test]
    fn test_frame_navigation_refused_without_capability() {
        let temp_dir = TempDir::new().unwrap();
        let host = DirectoryHost::new(temp_dir.path()).with_capabilities(HostCapabilities::NONE);
        let frame = host.create_element(ElementKind::Frame).unwrap();

        assert!(host.navigate_frame(frame, &build_text_data_uri("x")).is_err());
        assert!(host.saved_files().is_empty());
    }

    #[test]
    fn test_exec_command_saves_frame_document() {
        let temp_dir = TempDir::new().unwrap();
        let host = DirectoryHost::new(temp_dir.path());
        let frame = host.create_element(ElementKind::Frame).unwrap();
        host.append_to_body(frame).unwrap();
        host.open_frame_document(frame).unwrap();
        host.write_frame_document(frame, "legacy text").unwrap();
        host.close_frame_document(frame).unwrap();

        assert!(host.exec_command_save_as(frame, "legacy.txt").unwrap());

        let path = temp_dir.path().join("legacy.txt");
        assert_eq!(fs::read_to_string(path).unwrap(), "legacy text");
    }

    #[test]
    fn test_exec_command_reports_false_without_capability() {
        let temp_dir = TempDir::new().unwrap();
        let host = DirectoryHost::new(temp_dir.path()).with_capabilities(HostCapabilities::NONE);
        let frame = host.create_element(ElementKind::Frame).unwrap();

        assert!(!host.exec_command_save_as(frame, "legacy.txt").unwrap());
        assert!(host.saved_files().is_empty());
    }

    #[test]
    fn test_alert_is_recorded() {
        let temp_dir = TempDir::new().unwrap();
        let host = DirectoryHost::new(temp_dir.path());
        host.alert("Couldn't download").unwrap();
        assert_eq!(host.alerts(), vec!["Couldn't download".to_string()]);
    }

    #[test]
    fn test_missing_directory_is_created() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let host = DirectoryHost::new(&nested);

        clicked_anchor(&host, "deep", "deep.txt");

        assert!(nested.join("deep.txt").exists());
    }

    #[test]
    fn test_resolve_unique_path_stays_under_dir() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        for malicious in ["../../etc/passwd", "..", "a/\\b\\c", "/"] {
            let path = resolve_unique_path(base, malicious);
            assert!(path.starts_with(base), "escaped: {}", path.display());
            assert!(
                !path.components().any(|c| c == Component::ParentDir),
                "parent component in {}",
                path.display()
            );
        }
    }

    #[test]
    fn test_resolve_unique_path_without_extension() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("download"), b"x").unwrap();
        let path = resolve_unique_path(temp_dir.path(), "download");
        assert_eq!(path, temp_dir.path().join("download_1"));
    }

    #[test]
    fn test_resolve_unique_path_skips_taken_suffixes() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("report.txt"), b"x").unwrap();
        fs::write(temp_dir.path().join("report_1.txt"), b"x").unwrap();
        let path = resolve_unique_path(temp_dir.path(), "report.txt");
        assert_eq!(path, temp_dir.path().join("report_2.txt"));
    }
}
