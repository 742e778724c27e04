//! Window-system integration.
//!
//! A windowing library that can create Vulkan surfaces plugs in through
//! [`SurfaceAdapter`]. It supplies the resolver used to build the
//! [`LoaderManager`](vkbind_core::loader::LoaderManager), the instance
//! extensions its surfaces need and the surface creation itself. Window and
//! display handles travel as `raw-window-handle` values.

use std::ffi::{CStr, CString};
use std::fmt;

use raw_window_handle::{HandleError, HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};
use vkbind_core::loader::ProcResolver;

use crate::enumerate::enumerate;
use crate::result::VkResult;
use crate::vk;

pub const KHR_SURFACE: &CStr = c"VK_KHR_surface";

pub trait SurfaceAdapter {
    type Resolver: ProcResolver;

    /// Lookup function of the library's Vulkan loader.
    fn resolver(&self) -> Self::Resolver;

    /// Instance extensions surfaces of this library depend on.
    fn required_instance_extensions(&self) -> Vec<CString>;

    /// Whether `queue_family` of `physical_device` can present to windows of
    /// this library.
    ///
    /// # Safety
    ///
    /// `instance` must be live and own `physical_device`.
    unsafe fn presentation_support(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
        queue_family: u32,
    ) -> bool;

    /// # Safety
    ///
    /// `instance` must be live and created with
    /// [`required_instance_extensions`](Self::required_instance_extensions)
    /// enabled. Both handles must refer to a live window.
    unsafe fn create_surface(
        &self,
        instance: vk::Instance,
        display: RawDisplayHandle,
        window: RawWindowHandle,
        allocator: *const vk::AllocationCallbacks,
    ) -> VkResult<vk::SurfaceKHR>;
}

/// `VK_KHR_surface` plus the platform extension for `display`, or `None`
/// for display kinds Vulkan has no surface extension for.
pub fn surface_extensions(display: RawDisplayHandle) -> Option<[&'static CStr; 2]> {
    let platform = match display {
        RawDisplayHandle::Windows(_) => c"VK_KHR_win32_surface",
        RawDisplayHandle::Xlib(_) => c"VK_KHR_xlib_surface",
        RawDisplayHandle::Xcb(_) => c"VK_KHR_xcb_surface",
        RawDisplayHandle::Wayland(_) => c"VK_KHR_wayland_surface",
        RawDisplayHandle::Android(_) => c"VK_KHR_android_surface",
        RawDisplayHandle::AppKit(_) | RawDisplayHandle::UiKit(_) => c"VK_EXT_metal_surface",
        _ => return None,
    };
    Some([KHR_SURFACE, platform])
}

#[derive(Debug)]
pub enum SurfaceError {
    /// The window or display handle could not be obtained.
    Handle(HandleError),
    /// Surface creation failed.
    Vk(vk::Result),
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handle(err) => write!(f, "window handle unavailable: {err}"),
            Self::Vk(result) => write!(f, "surface creation failed: {result}"),
        }
    }
}

impl std::error::Error for SurfaceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Handle(err) => Some(err),
            Self::Vk(result) => Some(result),
        }
    }
}

impl From<HandleError> for SurfaceError {
    fn from(err: HandleError) -> Self {
        Self::Handle(err)
    }
}

impl From<vk::Result> for SurfaceError {
    fn from(result: vk::Result) -> Self {
        Self::Vk(result)
    }
}

/// Creates a surface for `window` through `adapter`.
///
/// # Safety
///
/// Same contract as [`SurfaceAdapter::create_surface`]. The surface must be
/// destroyed before `window` is.
pub unsafe fn create_window_surface<A, W>(
    adapter: &A,
    instance: vk::Instance,
    window: &W,
    allocator: Option<&vk::AllocationCallbacks>,
) -> Result<vk::SurfaceKHR, SurfaceError>
where
    A: SurfaceAdapter + ?Sized,
    W: HasDisplayHandle + HasWindowHandle + ?Sized,
{
    let display = window.display_handle()?.as_raw();
    let raw_window = window.window_handle()?.as_raw();
    let allocator = allocator.map_or(std::ptr::null(), |a| a as *const _);

    let surface = unsafe { adapter.create_surface(instance, display, raw_window, allocator) }?;
    log::debug!("created surface {surface:?}");
    Ok(surface)
}

/// # Safety
///
/// `loader` must be bound to the instance owning `device` and `surface`.
pub unsafe fn surface_formats(
    loader: &vk::KhrSurfaceLoader,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
    enumerate(|count, data| unsafe { loader.GetPhysicalDeviceSurfaceFormatsKHR(device, surface, count, data) })
}

/// # Safety
///
/// `loader` must be bound to the instance owning `device` and `surface`.
pub unsafe fn present_modes(
    loader: &vk::KhrSurfaceLoader,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
) -> VkResult<Vec<vk::PresentModeKHR>> {
    enumerate(|count, data| unsafe { loader.GetPhysicalDeviceSurfacePresentModesKHR(device, surface, count, data) })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::Cell;
    use std::ffi::c_void;
    use std::num::NonZeroIsize;
    use std::ptr::NonNull;

    use raw_window_handle::{
        DisplayHandle, WaylandDisplayHandle, Win32WindowHandle, WindowHandle, WindowsDisplayHandle,
        XlibDisplayHandle,
    };
    use vkbind_core::loader::{LoaderManager, UntypedFnptr};

    use super::*;
    use crate::mock::{self, MockDriver};

    /// Adapter that accepts Win32 windows only and records what it saw.
    pub(crate) struct TestAdapter {
        pub created: Cell<usize>,
    }

    impl TestAdapter {
        pub fn new() -> Self {
            Self { created: Cell::new(0) }
        }
    }

    impl SurfaceAdapter for TestAdapter {
        type Resolver = MockDriver;

        fn resolver(&self) -> MockDriver {
            MockDriver::vulkan()
        }

        fn required_instance_extensions(&self) -> Vec<CString> {
            let display = RawDisplayHandle::Windows(WindowsDisplayHandle::new());
            surface_extensions(display).into_iter().flatten().map(CStr::to_owned).collect()
        }

        unsafe fn presentation_support(&self, instance: vk::Instance, _: vk::PhysicalDevice, queue_family: u32) -> bool {
            instance == mock::instance() && queue_family == 0
        }

        unsafe fn create_surface(
            &self,
            instance: vk::Instance,
            display: RawDisplayHandle,
            window: RawWindowHandle,
            allocator: *const vk::AllocationCallbacks,
        ) -> VkResult<vk::SurfaceKHR> {
            assert_eq!(instance, mock::instance());
            assert!(allocator.is_null());
            match (display, window) {
                (RawDisplayHandle::Windows(_), RawWindowHandle::Win32(handle)) => {
                    self.created.set(self.created.get() + 1);
                    Ok(vk::SurfaceKHR::from_raw(handle.hwnd.get() as u64))
                }
                _ => Err(vk::Result::ERROR_INITIALIZATION_FAILED),
            }
        }
    }

    struct Window {
        display: Option<RawDisplayHandle>,
        window: RawWindowHandle,
    }

    impl HasDisplayHandle for Window {
        fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
            let raw = self.display.ok_or(HandleError::Unavailable)?;
            Ok(unsafe { DisplayHandle::borrow_raw(raw) })
        }
    }

    impl HasWindowHandle for Window {
        fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
            Ok(unsafe { WindowHandle::borrow_raw(self.window) })
        }
    }

    fn win32_window(hwnd: isize) -> Window {
        let handle = Win32WindowHandle::new(NonZeroIsize::new(hwnd).unwrap());
        Window {
            display: Some(RawDisplayHandle::Windows(WindowsDisplayHandle::new())),
            window: RawWindowHandle::Win32(handle),
        }
    }

    // ── platform extensions ───────────────────────────────────────────────

    #[test]
    fn platform_extensions_follow_the_display() {
        let wayland = WaylandDisplayHandle::new(NonNull::<c_void>::dangling());
        assert_eq!(
            surface_extensions(RawDisplayHandle::Wayland(wayland)),
            Some([c"VK_KHR_surface", c"VK_KHR_wayland_surface"])
        );
        let xlib = XlibDisplayHandle::new(None, 0);
        assert_eq!(surface_extensions(RawDisplayHandle::Xlib(xlib)).map(|e| e[1]), Some(c"VK_KHR_xlib_surface"));
        assert_eq!(
            surface_extensions(RawDisplayHandle::Windows(WindowsDisplayHandle::new())).map(|e| e[1]),
            Some(c"VK_KHR_win32_surface")
        );
    }

    // ── surface creation ──────────────────────────────────────────────────

    #[test]
    fn window_handles_reach_the_adapter() {
        let adapter = TestAdapter::new();
        let surface = unsafe { create_window_surface(&adapter, mock::instance(), &win32_window(0x42), None) }.unwrap();
        assert_eq!(surface, vk::SurfaceKHR::from_raw(0x42));
        assert_eq!(adapter.created.get(), 1);
        assert!(unsafe { adapter.presentation_support(mock::instance(), vk::PhysicalDevice::null(), 0) });
    }

    #[test]
    fn missing_display_is_a_handle_error() {
        let adapter = TestAdapter::new();
        let window = Window { display: None, ..win32_window(1) };
        let err = unsafe { create_window_surface(&adapter, mock::instance(), &window, None) }.unwrap_err();
        assert!(matches!(err, SurfaceError::Handle(HandleError::Unavailable)));
        assert_eq!(adapter.created.get(), 0);

        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source, Some(HandleError::Unavailable.to_string()));
        assert!(err.to_string().starts_with("window handle unavailable: "));
    }

    #[test]
    fn adapter_failures_surface_as_vk_errors() {
        let adapter = TestAdapter::new();
        let window = Window {
            display: Some(RawDisplayHandle::Xlib(XlibDisplayHandle::new(None, 0))),
            ..win32_window(1)
        };
        let err = unsafe { create_window_surface(&adapter, mock::instance(), &window, None) }.unwrap_err();
        assert!(matches!(err, SurfaceError::Vk(vk::Result::ERROR_INITIALIZATION_FAILED)));
        assert_eq!(err.to_string(), "surface creation failed: ERROR_INITIALIZATION_FAILED (-3)");
    }

    // ── surface queries ───────────────────────────────────────────────────

    unsafe extern "system" fn present_modes_mock(
        _: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        count: *mut u32,
        data: *mut vk::PresentModeKHR,
    ) -> vk::Result {
        assert_eq!(surface, vk::SurfaceKHR::from_raw(9));
        let modes = [vk::PresentModeKHR::FIFO_KHR, vk::PresentModeKHR::MAILBOX_KHR];
        unsafe {
            if !data.is_null() {
                std::ptr::copy_nonoverlapping(modes.as_ptr(), data, modes.len());
            }
            *count = modes.len() as u32;
        }
        vk::Result::SUCCESS
    }

    #[test]
    fn present_modes_use_two_calls() {
        type PresentModes =
            unsafe extern "system" fn(vk::PhysicalDevice, vk::SurfaceKHR, *mut u32, *mut vk::PresentModeKHR) -> vk::Result;
        let modes: UntypedFnptr = mock::untyped(present_modes_mock as PresentModes);
        let driver = MockDriver::new().with(c"vkGetPhysicalDeviceSurfacePresentModesKHR", modes);

        let mut manager = LoaderManager::new(driver, vk::KhrSurfaceLoader::new());
        manager.load_globals().unwrap();
        manager.set_context(mock::instance().as_raw()).unwrap();

        let found = unsafe { present_modes(&manager, vk::PhysicalDevice::null(), vk::SurfaceKHR::from_raw(9)) };
        assert_eq!(found, Ok(vec![vk::PresentModeKHR::FIFO_KHR, vk::PresentModeKHR::MAILBOX_KHR]));
    }
}
