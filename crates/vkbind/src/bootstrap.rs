//! Instance creation on top of a [`LoaderManager`].
//!
//! [`InstanceBootstrap::run`] drives a fresh manager through both phases:
//! it resolves the global functions, lists what the implementation offers,
//! negotiates extensions, creates the instance and binds it as the context.
//! Functions of core and of every enabled extension must then be resolved.

use std::ffi::{c_char, CStr, CString};
use std::fmt;
use std::ptr;

use vkbind_core::extensions::{EnabledExtensions, ExtensionRequest};
use vkbind_core::loader::{FunctionLoader, LoaderManager, LoaderSet, ProcResolver, Scope};
use vkbind_core::LoaderError;

use crate::enumerate;
use crate::result::VkResult;
use crate::surface::SurfaceAdapter;
use crate::vk;

pub const EXT_DEBUG_REPORT: &CStr = c"VK_EXT_debug_report";

/// Parameters for creating an instance.
#[derive(Debug, Clone)]
pub struct InstanceBootstrap {
    pub application_name: CString,
    pub application_version: u32,
    pub engine_name: CString,
    pub engine_version: u32,

    /// Highest API version the application uses.
    pub api_version: u32,

    /// Debug reporting is requested as optional by default.
    pub extensions: ExtensionRequest,

    /// Layers to enable when present. Missing layers are skipped.
    pub layers: Vec<CString>,
}

impl Default for InstanceBootstrap {
    fn default() -> Self {
        Self {
            application_name: c"vkbind".to_owned(),
            application_version: 1,
            engine_name: c"vkbind".to_owned(),
            engine_version: 1,
            api_version: vk::API_VERSION_1_0,
            extensions: ExtensionRequest::new().request(EXT_DEBUG_REPORT),
            layers: Vec::new(),
        }
    }
}

impl InstanceBootstrap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn application(mut self, name: &CStr, version: u32) -> Self {
        self.application_name = name.to_owned();
        self.application_version = version;
        self
    }

    pub fn engine(mut self, name: &CStr, version: u32) -> Self {
        self.engine_name = name.to_owned();
        self.engine_version = version;
        self
    }

    pub fn api_version(mut self, version: u32) -> Self {
        self.api_version = version;
        self
    }

    pub fn require_extension(mut self, name: &CStr) -> Self {
        self.extensions.add_required(name);
        self
    }

    pub fn request_extension(mut self, name: &CStr) -> Self {
        self.extensions.add_optional(name);
        self
    }

    pub fn layer(mut self, name: &CStr) -> Self {
        if !self.layers.iter().any(|l| l.as_c_str() == name) {
            self.layers.push(name.to_owned());
        }
        self
    }

    /// Requires every instance extension `adapter` needs for its surfaces.
    pub fn with_surface<A: SurfaceAdapter + ?Sized>(mut self, adapter: &A) -> Self {
        for name in adapter.required_instance_extensions() {
            self.extensions.add_required(&name);
        }
        self
    }

    /// Creates the instance and binds it to `manager`.
    ///
    /// `manager` must be fresh and its set must contain a
    /// [`vk::VulkanLoader`]. If core or enabled-extension functions are
    /// missing once bound, the instance is destroyed again and the manager
    /// is left bound to a dead handle; drop it.
    ///
    /// # Safety
    ///
    /// The manager's resolver must hand out pointers with the signatures of
    /// the symbols it is asked for.
    pub unsafe fn run<R, L>(&self, manager: &mut LoaderManager<R, L>) -> Result<BootstrappedInstance, BootstrapError>
    where
        R: ProcResolver,
        L: LoaderSet,
    {
        manager.load_globals()?;
        let missing = manager.unresolved(Scope::Global);
        if !missing.is_empty() {
            return Err(BootstrapError::UnavailableFunctions(missing));
        }
        let vulkan = manager.loader::<vk::VulkanLoader>().ok_or(BootstrapError::MissingLoader)?;

        let layers = unsafe { enumerate::instance_layers(vulkan) }
            .map_err(|result| BootstrapError::vk("vkEnumerateInstanceLayerProperties", result))?;
        let extensions = unsafe { enumerate::instance_extensions(vulkan) }
            .map_err(|result| BootstrapError::vk("vkEnumerateInstanceExtensionProperties", result))?;

        let layer_names: Vec<&CStr> = layers.iter().filter_map(vk::LayerProperties::name).collect();
        let extension_names: Vec<&CStr> = extensions.iter().filter_map(vk::ExtensionProperties::name).collect();
        log::debug!("{} instance layers, {} instance extensions available", layer_names.len(), extension_names.len());
        for name in &extension_names {
            log::trace!("available extension {}", name.to_string_lossy());
        }

        let enabled_layers = self.available_layers(&layer_names);
        let enabled = self.extensions.negotiate(extension_names.iter().copied())?;

        let (instance, enabled) = match self.create_instance(vulkan, &enabled, &enabled_layers) {
            Err(vk::Result::ERROR_EXTENSION_NOT_PRESENT) if self.extensions.optional().next().is_some() => {
                log::warn!("instance creation rejected the extension set, retrying without optional extensions");
                let fallback = self.extensions.without_optional().negotiate(extension_names.iter().copied())?;
                let instance = self
                    .create_instance(vulkan, &fallback, &enabled_layers)
                    .map_err(|result| BootstrapError::vk("vkCreateInstance", result))?;
                (instance, fallback)
            }
            result => (result.map_err(|result| BootstrapError::vk("vkCreateInstance", result))?, enabled),
        };
        log::info!("created instance {instance:?} with {} extensions", enabled.len());

        manager.set_context(instance.as_raw())?;

        let checked = |ext: &str| {
            ext == vk::VulkanLoader::EXTENSION || enabled.names().any(|n| n.to_bytes() == ext.as_bytes())
        };
        let missing: Vec<String> = manager
            .loaders()
            .unresolved(Scope::Context)
            .into_iter()
            .filter(|(ext, _)| checked(ext))
            .map(|(ext, f)| format!("{ext}::{}", f.name))
            .collect();
        if !missing.is_empty() {
            log::error!("instance is missing functions: {}", missing.join(", "));
            if let Some(vulkan) = manager.loader::<vk::VulkanLoader>().filter(|v| v.is_loaded("DestroyInstance")) {
                unsafe { vulkan.DestroyInstance(instance, ptr::null()) };
            }
            return Err(BootstrapError::UnavailableFunctions(missing));
        }

        Ok(BootstrappedInstance { instance, extensions: enabled, layers: enabled_layers })
    }

    fn available_layers(&self, available: &[&CStr]) -> Vec<CString> {
        self.layers
            .iter()
            .filter(|layer| {
                let present = available.contains(&layer.as_c_str());
                if !present {
                    log::warn!("layer {} not available, skipping", layer.to_string_lossy());
                }
                present
            })
            .cloned()
            .collect()
    }

    fn create_instance(
        &self,
        vulkan: &vk::VulkanLoader,
        extensions: &EnabledExtensions,
        layers: &[CString],
    ) -> VkResult<vk::Instance> {
        let application = vk::ApplicationInfo {
            p_application_name: self.application_name.as_ptr(),
            application_version: self.application_version,
            p_engine_name: self.engine_name.as_ptr(),
            engine_version: self.engine_version,
            api_version: self.api_version,
            ..Default::default()
        };
        let extension_ptrs = extensions.as_ptrs();
        let layer_ptrs: Vec<*const c_char> = layers.iter().map(|l| l.as_ptr()).collect();
        let info = vk::InstanceCreateInfo {
            p_application_info: &application,
            enabled_layer_count: layer_ptrs.len() as u32,
            pp_enabled_layer_names: layer_ptrs.as_ptr(),
            enabled_extension_count: extension_ptrs.len() as u32,
            pp_enabled_extension_names: extension_ptrs.as_ptr(),
            ..Default::default()
        };

        let mut instance = vk::Instance::null();
        // SAFETY: the global functions were checked resolved; every pointer in
        // `info` outlives the call.
        unsafe { vulkan.CreateInstance(&info, ptr::null(), &mut instance) }.result()?;
        Ok(instance)
    }
}

/// A created instance and what was enabled on it.
#[derive(Debug)]
pub struct BootstrappedInstance {
    pub instance: vk::Instance,
    pub extensions: EnabledExtensions,
    pub layers: Vec<CString>,
}

impl BootstrappedInstance {
    pub fn has_extension(&self, name: &CStr) -> bool {
        self.extensions.contains(name)
    }

    /// # Safety
    ///
    /// Every object created from the instance must already be destroyed.
    pub unsafe fn destroy(self, vulkan: &vk::VulkanLoader) {
        unsafe { vulkan.DestroyInstance(self.instance, ptr::null()) };
        log::debug!("destroyed instance {:?}", self.instance);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapError {
    Loader(LoaderError),
    /// The loader set has no [`vk::VulkanLoader`].
    MissingLoader,
    /// Required extensions the implementation does not offer.
    MissingExtensions(Vec<String>),
    /// Functions that resolved to null, as `extension::Name`.
    UnavailableFunctions(Vec<String>),
    Vk { call: &'static str, result: vk::Result },
}

impl BootstrapError {
    fn vk(call: &'static str, result: vk::Result) -> Self {
        Self::Vk { call, result }
    }
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loader(err) => write!(f, "{err}"),
            Self::MissingLoader => f.write_str("loader set has no core wrapper"),
            Self::MissingExtensions(names) => write!(f, "required extensions not available: {}", names.join(", ")),
            Self::UnavailableFunctions(names) => write!(f, "functions not available: {}", names.join(", ")),
            Self::Vk { call, result } => write!(f, "{call} failed: {result}"),
        }
    }
}

impl std::error::Error for BootstrapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Loader(err) => Some(err),
            Self::Vk { result, .. } => Some(result),
            _ => None,
        }
    }
}

impl From<LoaderError> for BootstrapError {
    fn from(err: LoaderError) -> Self {
        match err {
            LoaderError::MissingExtensions(names) => Self::MissingExtensions(names),
            other => Self::Loader(other),
        }
    }
}
