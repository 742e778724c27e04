//! Extension negotiation.
//!
//! An [`ExtensionRequest`] lists the extensions an application must have and
//! the ones it can live without. [`ExtensionRequest::negotiate`] checks them
//! against what the implementation reports and yields the set to enable.

use std::ffi::{c_char, CStr, CString};

use crate::error::LoaderError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionRequest {
    required: Vec<CString>,
    optional: Vec<CString>,
}

impl ExtensionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, name: &CStr) -> Self {
        self.add_required(name);
        self
    }

    pub fn request(mut self, name: &CStr) -> Self {
        self.add_optional(name);
        self
    }

    pub fn add_required(&mut self, name: &CStr) {
        self.optional.retain(|n| n.as_c_str() != name);
        if !self.required.iter().any(|n| n.as_c_str() == name) {
            self.required.push(name.to_owned());
        }
    }

    /// Adds an optional extension. Ignored if it is already required.
    pub fn add_optional(&mut self, name: &CStr) {
        let known = self.required.iter().chain(&self.optional).any(|n| n.as_c_str() == name);
        if !known {
            self.optional.push(name.to_owned());
        }
    }

    pub fn required(&self) -> impl Iterator<Item = &CStr> {
        self.required.iter().map(CString::as_c_str)
    }

    pub fn optional(&self) -> impl Iterator<Item = &CStr> {
        self.optional.iter().map(CString::as_c_str)
    }

    /// The same request with every optional extension dropped.
    pub fn without_optional(&self) -> Self {
        Self { required: self.required.clone(), optional: Vec::new() }
    }

    /// Matches the request against `available`.
    ///
    /// Fails with [`LoaderError::MissingExtensions`] listing every missing
    /// required extension. Missing optional extensions are logged and left
    /// out.
    pub fn negotiate<'a, I>(&self, available: I) -> Result<EnabledExtensions, LoaderError>
    where
        I: IntoIterator<Item = &'a CStr>,
    {
        let available: Vec<&CStr> = available.into_iter().collect();
        let has = |name: &CStr| available.contains(&name);

        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|n| !has(n))
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        if !missing.is_empty() {
            log::warn!("missing required extensions: {}", missing.join(", "));
            return Err(LoaderError::MissingExtensions(missing));
        }

        let mut names = self.required.clone();
        for name in &self.optional {
            if has(name) {
                names.push(name.clone());
            } else {
                log::info!("optional extension {} not available, skipping", name.to_string_lossy());
            }
        }

        log::debug!("enabling {} extensions", names.len());
        Ok(EnabledExtensions { names })
    }
}

/// Outcome of a successful negotiation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnabledExtensions {
    names: Vec<CString>,
}

impl EnabledExtensions {
    pub fn names(&self) -> impl Iterator<Item = &CStr> {
        self.names.iter().map(CString::as_c_str)
    }

    pub fn contains(&self, name: &CStr) -> bool {
        self.names.iter().any(|n| n.as_c_str() == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Pointer array for a create-info struct. Valid while `self` is.
    pub fn as_ptrs(&self) -> Vec<*const c_char> {
        self.names.iter().map(|n| n.as_ptr()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AVAILABLE: [&CStr; 3] = [c"VK_KHR_surface", c"VK_KHR_xlib_surface", c"VK_EXT_debug_utils"];

    #[test]
    fn required_and_available_optional_are_enabled() {
        let request = ExtensionRequest::new()
            .require(c"VK_KHR_surface")
            .request(c"VK_EXT_debug_utils")
            .request(c"VK_EXT_debug_report");

        let enabled = request.negotiate(AVAILABLE).unwrap();
        assert_eq!(enabled.names().collect::<Vec<_>>(), vec![c"VK_KHR_surface", c"VK_EXT_debug_utils"]);
        assert!(!enabled.contains(c"VK_EXT_debug_report"));
        assert_eq!(enabled.as_ptrs().len(), 2);
    }

    #[test]
    fn missing_required_lists_every_name() {
        let request = ExtensionRequest::new()
            .require(c"VK_KHR_surface")
            .require(c"VK_KHR_win32_surface")
            .require(c"VK_KHR_wayland_surface");

        assert_eq!(
            request.negotiate(AVAILABLE),
            Err(LoaderError::MissingExtensions(vec![
                "VK_KHR_win32_surface".to_string(),
                "VK_KHR_wayland_surface".to_string(),
            ]))
        );
    }

    #[test]
    fn requiring_promotes_an_optional_name() {
        let request = ExtensionRequest::new()
            .request(c"VK_KHR_surface")
            .require(c"VK_KHR_surface")
            .request(c"VK_KHR_surface");
        assert_eq!(request.required().count(), 1);
        assert_eq!(request.optional().count(), 0);
    }

    #[test]
    fn without_optional_keeps_required() {
        let request = ExtensionRequest::new().require(c"VK_KHR_surface").request(c"VK_EXT_debug_utils");
        let stripped = request.without_optional();
        assert_eq!(stripped.required().collect::<Vec<_>>(), vec![c"VK_KHR_surface"]);
        assert_eq!(stripped.optional().count(), 0);
    }
}
