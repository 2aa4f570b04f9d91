//! Host-facing notifications.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::RwLock;

use crate::types::{HostStatus, VariableValues};

/// Receives everything the weather service publishes.
pub trait HostSink: Send {
    fn status_changed(&mut self, status: HostStatus, message: Option<&str>);

    fn variables_updated(&mut self, values: &VariableValues, is_day: Option<bool>);

    /// `png` is already scaled to the host icon size
    fn icon_ready(&mut self, code: &str, png: &[u8]);

    fn icon_unavailable(&mut self, code: &str);
}

/// Latest published state
#[derive(Debug, Clone, Default)]
pub struct HostView {
    pub status: Option<HostStatus>,
    pub status_message: Option<String>,
    pub values: VariableValues,
    pub is_day: Option<bool>,
    /// Code and PNG of the icon currently shown
    pub icon: Option<(String, Vec<u8>)>,
}

/// A [`HostSink`] that keeps the latest state behind a shared lock, so
/// readers on other threads can poll it.
#[derive(Debug, Clone, Default)]
pub struct SharedView {
    inner: Arc<RwLock<HostView>>,
}

impl SharedView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> HostView {
        self.inner.read().clone()
    }

    pub fn status(&self) -> Option<HostStatus> {
        self.inner.read().status
    }

    pub fn status_message(&self) -> Option<String> {
        self.inner.read().status_message.clone()
    }

    /// Display text for one variable, empty when unknown
    pub fn display(&self, key: &str) -> String {
        self.inner.read().values.display(key)
    }

    pub fn values(&self) -> VariableValues {
        self.inner.read().values.clone()
    }

    pub fn is_day(&self) -> Option<bool> {
        self.inner.read().is_day
    }

    pub fn icon_code(&self) -> Option<String> {
        self.inner.read().icon.as_ref().map(|(code, _)| code.clone())
    }

    /// Current icon as base64 PNG, the form hosts embed in markup
    pub fn icon_base64(&self) -> Option<String> {
        self.inner
            .read()
            .icon
            .as_ref()
            .map(|(_, png)| STANDARD.encode(png))
    }
}

impl HostSink for SharedView {
    fn status_changed(&mut self, status: HostStatus, message: Option<&str>) {
        tracing::info!(?status, message, "Host status changed");
        let mut view = self.inner.write();
        view.status = Some(status);
        view.status_message = message.map(str::to_string);
    }

    fn variables_updated(&mut self, values: &VariableValues, is_day: Option<bool>) {
        let mut view = self.inner.write();
        view.values = values.clone();
        view.is_day = is_day;
    }

    fn icon_ready(&mut self, code: &str, png: &[u8]) {
        self.inner.write().icon = Some((code.to_string(), png.to_vec()));
    }

    fn icon_unavailable(&mut self, code: &str) {
        tracing::debug!(code, "No icon to show");
        self.inner.write().icon = None;
    }
}
