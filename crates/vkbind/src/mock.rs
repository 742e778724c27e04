//! A resolver standing in for the driver in tests.
//!
//! Every name resolves to a no-op function unless overridden. Queries are
//! recorded per scope and a second query for the same name panics, as does a
//! context query against anything but [`INSTANCE`].

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::ffi::{c_char, c_void, CStr, CString};
use std::ptr::NonNull;
use std::rc::Rc;

use vkbind_core::abi::force_cast;
use vkbind_core::loader::{ProcResolver, UntypedFnptr};

use crate::vk;

/// Handle value the mock driver hands out for its instance.
pub(crate) const INSTANCE: usize = 0x1000;

pub(crate) fn instance() -> vk::Instance {
    vk::Instance::from_raw(INSTANCE as *mut c_void)
}

/// The only physical device the mock instance lists.
pub(crate) fn physical_device() -> vk::PhysicalDevice {
    vk::PhysicalDevice::from_raw((INSTANCE + 0x100) as *mut c_void)
}

/// Erases the signature of a mock entry point.
pub(crate) fn untyped<F: Copy>(f: F) -> UntypedFnptr {
    // SAFETY: `F` is always a non-null `extern "system"` function type here.
    unsafe { force_cast::<UntypedFnptr, F>(f) }
}

unsafe extern "system" fn default_function() {}

#[derive(Debug, Default)]
pub(crate) struct Queries {
    pub global: Vec<String>,
    pub context: Vec<String>,
}

pub(crate) struct MockDriver {
    queries: Rc<RefCell<Queries>>,
    overrides: HashMap<CString, UntypedFnptr>,
    missing: HashSet<CString>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self { queries: Rc::default(), overrides: HashMap::new(), missing: HashSet::new() }
    }

    /// A driver whose instance-level entry points behave per [`driver`].
    pub fn vulkan() -> Self {
        Self::new()
            .with(c"vkEnumerateInstanceExtensionProperties", untyped(
                enumerate_instance_extensions
                    as unsafe extern "system" fn(*const c_char, *mut u32, *mut vk::ExtensionProperties) -> vk::Result,
            ))
            .with(c"vkEnumerateInstanceLayerProperties", untyped(
                enumerate_instance_layers as unsafe extern "system" fn(*mut u32, *mut vk::LayerProperties) -> vk::Result,
            ))
            .with(c"vkCreateInstance", untyped(
                create_instance
                    as unsafe extern "system" fn(
                        *const vk::InstanceCreateInfo,
                        *const vk::AllocationCallbacks,
                        *mut vk::Instance,
                    ) -> vk::Result,
            ))
            .with(c"vkDestroyInstance", untyped(
                destroy_instance as unsafe extern "system" fn(vk::Instance, *const vk::AllocationCallbacks),
            ))
            .with(c"vkEnumeratePhysicalDevices", untyped(
                enumerate_physical_devices
                    as unsafe extern "system" fn(vk::Instance, *mut u32, *mut vk::PhysicalDevice) -> vk::Result,
            ))
            .with(c"vkEnumerateDeviceLayerProperties", untyped(
                enumerate_device_layers
                    as unsafe extern "system" fn(
                        vk::PhysicalDevice,
                        *mut u32,
                        *mut vk::LayerProperties,
                    ) -> vk::Result,
            ))
            .with(c"vkGetPhysicalDeviceProperties", untyped(
                get_physical_device_properties
                    as unsafe extern "system" fn(vk::PhysicalDevice, *mut vk::PhysicalDeviceProperties),
            ))
    }

    pub fn with(mut self, symbol: &CStr, function: UntypedFnptr) -> Self {
        self.overrides.insert(symbol.to_owned(), function);
        self
    }

    /// Makes `symbol` resolve to null.
    pub fn without(mut self, symbol: &CStr) -> Self {
        self.missing.insert(symbol.to_owned());
        self
    }

    pub fn queries(&self) -> Rc<RefCell<Queries>> {
        Rc::clone(&self.queries)
    }
}

impl ProcResolver for MockDriver {
    fn resolve(&mut self, context: Option<NonNull<c_void>>, name: &CStr) -> UntypedFnptr {
        let name_str = name.to_string_lossy().into_owned();
        let mut queries = self.queries.borrow_mut();
        let list = match context {
            None => &mut queries.global,
            Some(ctx) => {
                assert_eq!(ctx.as_ptr() as usize, INSTANCE, "{name_str} queried with a foreign context");
                &mut queries.context
            }
        };
        assert!(!list.contains(&name_str), "{name_str} queried twice in the same scope");
        list.push(name_str);

        if self.missing.contains(name) {
            return None;
        }
        match self.overrides.get(name) {
            Some(&function) => function,
            None => Some(default_function),
        }
    }
}

// ── Driver state ──────────────────────────────────────────────────────────

/// What the instance-level mock functions report and record.
#[derive(Debug, Default)]
pub(crate) struct DriverState {
    /// Listed by `vkEnumerateInstanceExtensionProperties`.
    pub extensions: Vec<CString>,
    pub layers: Vec<CString>,
    /// `vkCreateInstance` fails with `ERROR_EXTENSION_NOT_PRESENT` if any
    /// of these is enabled.
    pub rejected: Vec<CString>,
    /// Enabled extensions of every `vkCreateInstance` call.
    pub created_with: Vec<Vec<CString>>,
    pub application_name: Option<CString>,
    pub destroyed: usize,
}

thread_local! {
    static DRIVER: RefCell<DriverState> = RefCell::default();
}

pub(crate) fn driver<T>(f: impl FnOnce(&mut DriverState) -> T) -> T {
    DRIVER.with_borrow_mut(f)
}

pub(crate) fn extension(name: &CStr) -> vk::ExtensionProperties {
    let mut props = vk::ExtensionProperties::default();
    copy_name(&mut props.extension_name, name);
    props.spec_version = 1;
    props
}

pub(crate) fn layer(name: &CStr) -> vk::LayerProperties {
    let mut props = vk::LayerProperties::default();
    copy_name(&mut props.layer_name, name);
    props
}

fn copy_name(dst: &mut [c_char], name: &CStr) {
    for (d, &s) in dst.iter_mut().zip(name.to_bytes()) {
        *d = s as c_char;
    }
}

/// Writes `items` through a two-call pair of pointers.
unsafe fn fill<T: Copy>(items: &[T], count: *mut u32, data: *mut T) -> vk::Result {
    unsafe {
        if data.is_null() {
            *count = items.len() as u32;
            return vk::Result::SUCCESS;
        }
        let written = (*count as usize).min(items.len());
        std::ptr::copy_nonoverlapping(items.as_ptr(), data, written);
        *count = written as u32;
        if written < items.len() { vk::Result::INCOMPLETE } else { vk::Result::SUCCESS }
    }
}

unsafe extern "system" fn enumerate_instance_extensions(
    _layer: *const c_char,
    count: *mut u32,
    data: *mut vk::ExtensionProperties,
) -> vk::Result {
    let items: Vec<_> = driver(|d| d.extensions.iter().map(|n| extension(n)).collect());
    unsafe { fill(&items, count, data) }
}

unsafe extern "system" fn enumerate_instance_layers(count: *mut u32, data: *mut vk::LayerProperties) -> vk::Result {
    let items: Vec<_> = driver(|d| d.layers.iter().map(|n| layer(n)).collect());
    unsafe { fill(&items, count, data) }
}

unsafe extern "system" fn create_instance(
    info: *const vk::InstanceCreateInfo,
    _allocator: *const vk::AllocationCallbacks,
    out: *mut vk::Instance,
) -> vk::Result {
    let info = unsafe { &*info };
    let enabled: Vec<CString> = (0..info.enabled_extension_count as usize)
        .map(|i| unsafe { CStr::from_ptr(*info.pp_enabled_extension_names.add(i)) }.to_owned())
        .collect();
    let app_name = unsafe { info.p_application_info.as_ref() }
        .filter(|app| !app.p_application_name.is_null())
        .map(|app| unsafe { CStr::from_ptr(app.p_application_name) }.to_owned());

    driver(|d| {
        let rejected = enabled.iter().any(|n| d.rejected.contains(n));
        d.created_with.push(enabled);
        d.application_name = app_name;
        if rejected {
            return vk::Result::ERROR_EXTENSION_NOT_PRESENT;
        }
        unsafe { *out = instance() };
        vk::Result::SUCCESS
    })
}

unsafe extern "system" fn destroy_instance(handle: vk::Instance, _allocator: *const vk::AllocationCallbacks) {
    assert_eq!(handle, instance());
    driver(|d| d.destroyed += 1);
}

unsafe extern "system" fn enumerate_physical_devices(
    handle: vk::Instance,
    count: *mut u32,
    data: *mut vk::PhysicalDevice,
) -> vk::Result {
    assert_eq!(handle, instance());
    unsafe { fill(&[physical_device()], count, data) }
}

unsafe extern "system" fn enumerate_device_layers(
    device: vk::PhysicalDevice,
    count: *mut u32,
    data: *mut vk::LayerProperties,
) -> vk::Result {
    assert_eq!(device, physical_device());
    let items: Vec<_> = driver(|d| d.layers.iter().map(|n| layer(n)).collect());
    unsafe { fill(&items, count, data) }
}

unsafe extern "system" fn get_physical_device_properties(
    device: vk::PhysicalDevice,
    out: *mut vk::PhysicalDeviceProperties,
) {
    assert_eq!(device, physical_device());
    let mut props = vk::PhysicalDeviceProperties::default();
    props.api_version = vk::API_VERSION_1_0;
    props.device_type = vk::PhysicalDeviceType::DISCRETE_GPU;
    copy_name(&mut props.device_name, c"vkbind mock device");
    props.limits.max_image_dimension2_d = 16384;
    unsafe { *out = props };
}

