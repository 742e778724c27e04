//! # vkbind
//!
//! Typed Vulkan bindings generated at build time from the descriptors in
//! `descriptors/`, together with the helpers an application needs to get
//! from a lookup function to a live instance.
//!
//! | Module | Contents |
//! |---|---|
//! | [`vk`] | Generated types and one wrapper per extension |
//! | [`bootstrap`] | [`InstanceBootstrap`](bootstrap::InstanceBootstrap): negotiate extensions, create and bind an instance |
//! | [`enumerate`] | Two-call enumeration helpers |
//! | [`surface`] | [`SurfaceAdapter`](surface::SurfaceAdapter) for windowing libraries |
//!
//! Wrappers start out null. A [`LoaderManager`](loader::LoaderManager)
//! fills them in two phases, globals first and the instance-level functions
//! once an instance is bound:
//!
//! ```no_run
//! use vkbind::loader::{LoaderManager, ProcAddrFn};
//! use vkbind::{vk, Loaders};
//!
//! # fn get_proc_addr() -> vkbind::loader::GetProcAddr { unimplemented!() }
//! let resolver = unsafe { ProcAddrFn::new(get_proc_addr()) };
//! let mut manager = LoaderManager::new(resolver, Loaders::default());
//! let created = unsafe { vkbind::bootstrap::InstanceBootstrap::new().run(&mut manager) }?;
//!
//! let vulkan = manager.loader::<vk::VulkanLoader>().unwrap();
//! let devices = unsafe { vkbind::enumerate::physical_devices(vulkan, created.instance) }?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Flags combine only with flags of their own type:
//!
//! ```
//! use vkbind::vk;
//!
//! let queues = vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE;
//! assert!(queues.get().contains(vk::QueueFlags::COMPUTE));
//! assert_eq!(format!("{:?}", queues.get()), "GRAPHICS | COMPUTE");
//! ```
//!
//! ```compile_fail
//! use vkbind::vk;
//!
//! let mixed = vk::QueueFlags::GRAPHICS | vk::MemoryPropertyFlags::HOST_VISIBLE;
//! ```

pub mod vk {
    include!(concat!(env!("OUT_DIR"), "/bindings.rs"));
}

pub mod bootstrap;
pub mod enumerate;
mod result;
pub mod surface;

#[cfg(test)]
mod mock;

pub use result::VkResult;
pub use vkbind_core::{abi, bitmask, extensions, loader, logging, LoaderError};

/// Every wrapper this crate generates, in load order.
pub type Loaders = (vk::VulkanLoader, vk::KhrSurfaceLoader, vk::KhrSwapchainLoader, vk::ExtDebugReportLoader);

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::ffi::c_void;
    use std::ptr;

    use crate::loader::{FunctionLoader, LoaderManager, LoaderState, Scope};
    use crate::mock::{self, MockDriver};

    use super::*;

    fn bound(driver: MockDriver) -> LoaderManager<MockDriver, Loaders> {
        let mut manager = LoaderManager::new(driver, Loaders::default());
        manager.load_globals().unwrap();
        manager.set_context(mock::instance().as_raw()).unwrap();
        manager
    }

    // ── resolution ────────────────────────────────────────────────────────

    #[test]
    fn globals_are_queried_once_without_context() {
        let driver = MockDriver::new();
        let queries = driver.queries();
        let mut manager = LoaderManager::new(driver, Loaders::default());
        manager.load_globals().unwrap();

        let queries = queries.borrow();
        let mut global = queries.global.clone();
        global.sort();
        assert_eq!(
            global,
            [
                "vkCreateInstance",
                "vkEnumerateInstanceExtensionProperties",
                "vkEnumerateInstanceLayerProperties"
            ]
        );
        assert!(queries.context.is_empty());
    }

    #[test]
    fn context_functions_are_queried_once_after_binding() {
        let driver = MockDriver::new();
        let queries = driver.queries();
        let manager = bound(driver);

        let queries = queries.borrow();
        assert_eq!(queries.global.len(), 3);
        assert!(queries.context.len() > 100, "only {} context queries", queries.context.len());
        for name in [
            "vkCmdPushConstants",
            "vkGetPhysicalDeviceProperties",
            "vkEnumerateDeviceLayerProperties",
            "vkCreateImageView",
            "vkCreateRenderPass",
            "vkCreateGraphicsPipelines",
        ] {
            assert!(queries.context.iter().any(|n| n == name), "{name} was not queried");
        }
        assert!(queries.context.iter().any(|n| n == "vkDebugReportMessageEXT"));
        assert!(queries.context.iter().any(|n| n == "vkQueuePresentKHR"));
        assert!(!queries.context.iter().any(|n| n == "vkCreateInstance"));
        assert_eq!(manager.table().queried(Scope::Context), queries.context.len());
    }

    #[test]
    fn scopes_split_between_phases() {
        let mut manager = LoaderManager::new(MockDriver::new(), Loaders::default());
        assert_eq!(manager.state(), LoaderState::Unresolved);

        manager.load_globals().unwrap();
        let vulkan = manager.loader::<vk::VulkanLoader>().unwrap();
        assert!(vulkan.is_loaded("CreateInstance"));
        assert!(!vulkan.is_loaded("DestroyInstance"));

        manager.set_context(mock::instance().as_raw()).unwrap();
        let vulkan = manager.loader::<vk::VulkanLoader>().unwrap();
        assert!(vulkan.is_loaded("CreateInstance"));
        assert!(vulkan.is_loaded("DestroyInstance"));
        assert!(manager.unresolved(Scope::Context).is_empty());
    }

    #[test]
    fn shared_functions_get_the_same_pointer() {
        let driver = MockDriver::new();
        let queries = driver.queries();
        let mut manager = LoaderManager::new(driver, (vk::VulkanLoader::new(), vk::VulkanLoader::new()));
        manager.load_globals().unwrap();
        manager.set_context(mock::instance().as_raw()).unwrap();

        let (first, second) = manager.loaders();
        for name in ["CreateInstance", "DestroyInstance", "CmdPushConstants"] {
            let a = first.function_pointer(name).map(|f| f as usize);
            let b = second.function_pointer(name).map(|f| f as usize);
            assert!(a.is_some());
            assert_eq!(a, b, "{name}");
        }
        assert_eq!(queries.borrow().global.len(), 3);
    }

    #[test]
    fn null_context_is_rejected() {
        let mut manager = LoaderManager::new(MockDriver::new(), Loaders::default());
        manager.load_globals().unwrap();
        assert_eq!(manager.set_context(ptr::null_mut()), Err(LoaderError::NullContext));
        assert_eq!(manager.state(), LoaderState::GlobalsResolved);
    }

    #[test]
    fn missing_symbols_stay_null() {
        let manager = bound(MockDriver::new().without(c"vkQueuePresentKHR"));
        let swapchain = manager.loader::<vk::KhrSwapchainLoader>().unwrap();
        assert!(!swapchain.is_loaded("QueuePresentKHR"));
        assert_eq!(manager.unresolved(Scope::Context), ["VK_KHR_swapchain::QueuePresentKHR"]);
    }

    // ── typed calls ───────────────────────────────────────────────────────

    thread_local! {
        static BEGIN_ARGS: Cell<Option<(usize, usize)>> = const { Cell::new(None) };
        static DESTROY_ARGS: Cell<Option<(usize, u64, usize)>> = const { Cell::new(None) };
    }

    unsafe extern "system" fn begin_command_buffer(
        command_buffer: vk::CommandBuffer,
        begin_info: *const vk::CommandBufferBeginInfo,
    ) -> vk::Result {
        BEGIN_ARGS.set(Some((command_buffer.as_raw() as usize, begin_info as usize)));
        vk::Result::INCOMPLETE
    }

    unsafe extern "system" fn destroy_debug_report_callback(
        instance: vk::Instance,
        callback: vk::DebugReportCallbackEXT,
        allocator: *const vk::AllocationCallbacks,
    ) {
        DESTROY_ARGS.set(Some((instance.as_raw() as usize, callback.as_raw(), allocator as usize)));
    }

    #[test]
    fn calls_forward_arguments_and_results() {
        type BeginCommandBuffer =
            unsafe extern "system" fn(vk::CommandBuffer, *const vk::CommandBufferBeginInfo) -> vk::Result;
        let driver = MockDriver::new()
            .with(c"vkBeginCommandBuffer", mock::untyped(begin_command_buffer as BeginCommandBuffer));
        let manager = bound(driver);
        let vulkan = manager.loader::<vk::VulkanLoader>().unwrap();

        let command_buffer = vk::CommandBuffer::from_raw(0x2000 as *mut c_void);
        let begin_info = vk::CommandBufferBeginInfo {
            flags: vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
            ..Default::default()
        };
        let result = unsafe { vulkan.BeginCommandBuffer(command_buffer, &begin_info) };

        assert_eq!(result, vk::Result::INCOMPLETE);
        assert_eq!(BEGIN_ARGS.get(), Some((0x2000, &begin_info as *const _ as usize)));
    }

    #[test]
    fn extension_calls_forward_handles() {
        type DestroyCallback =
            unsafe extern "system" fn(vk::Instance, vk::DebugReportCallbackEXT, *const vk::AllocationCallbacks);
        let driver = MockDriver::new().with(
            c"vkDestroyDebugReportCallbackEXT",
            mock::untyped(destroy_debug_report_callback as DestroyCallback),
        );
        let manager = bound(driver);
        let debug_report = manager.loader::<vk::ExtDebugReportLoader>().unwrap();

        let callback = vk::DebugReportCallbackEXT::from_raw(42);
        unsafe { debug_report.DestroyDebugReportCallbackEXT(mock::instance(), callback, ptr::null()) };

        assert_eq!(DESTROY_ARGS.get(), Some((mock::INSTANCE, 42, 0)));
    }

    // ── generated types ───────────────────────────────────────────────────

    #[test]
    fn bitmask_operators_stay_typed() {
        let mut flags = vk::MemoryPropertyFlags::HOST_VISIBLE;
        flags |= vk::MemoryPropertyFlags::HOST_COHERENT;
        assert!(flags.contains((vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT).get()));
        assert!(!flags.contains(vk::MemoryPropertyFlags::DEVICE_LOCAL));

        let cleared: vk::MemoryPropertyFlags = (flags & !vk::MemoryPropertyFlags::HOST_VISIBLE).into();
        assert_eq!(cleared, vk::MemoryPropertyFlags::HOST_COHERENT);
        assert!((flags ^ flags).is_empty());
        assert_eq!(flags.as_raw(), 0b110);
    }

    #[test]
    fn bitmask_debug_names_bits() {
        let flags = vk::DebugReportFlagsEXT::ERROR_EXT | vk::DebugReportFlagsEXT::WARNING_EXT;
        assert_eq!(format!("{:?}", flags.get()), "WARNING_EXT | ERROR_EXT");
        assert_eq!(format!("{:?}", vk::QueueFlags::empty()), "(empty)");
        assert_eq!(format!("{:?}", vk::QueueFlags::from_raw(0x41)), "GRAPHICS | 0x40");
        assert_eq!(
            format!("{:?}", vk::ShaderStageFlags::ALL_GRAPHICS),
            "VERTEX | TESSELLATION_CONTROL | TESSELLATION_EVALUATION | GEOMETRY | FRAGMENT"
        );
    }

    #[test]
    fn enum_debug_names_values() {
        assert_eq!(format!("{:?}", vk::Result::ERROR_EXTENSION_NOT_PRESENT), "ERROR_EXTENSION_NOT_PRESENT");
        assert_eq!(format!("{:?}", vk::Result::ERROR_OUT_OF_DATE_KHR), "ERROR_OUT_OF_DATE_KHR");
        assert_eq!(format!("{:?}", vk::StructureType::from_raw(-5)), "StructureType(-5)");
    }

    #[test]
    fn extension_values_are_numbered_by_extension() {
        assert_eq!(vk::StructureType::SWAPCHAIN_CREATE_INFO_KHR.as_raw(), 1_000_001_000);
        assert_eq!(vk::StructureType::PRESENT_INFO_KHR.as_raw(), 1_000_001_001);
        assert_eq!(vk::Result::ERROR_OUT_OF_DATE_KHR.as_raw(), -1_000_001_004);
        assert_eq!(vk::ImageLayout::PRESENT_SRC_KHR.as_raw(), 1_000_001_002);
        assert_eq!(format!("{:?}", vk::ImageLayout::PRESENT_SRC_KHR), "PRESENT_SRC_KHR");
        assert_eq!(vk::StructureType::DEBUG_REPORT_CALLBACK_CREATE_INFO_EXT.as_raw(), 1_000_011_000);
    }

    #[test]
    fn struct_defaults_carry_their_structure_type() {
        assert_eq!(vk::InstanceCreateInfo::default().s_type, vk::StructureType::INSTANCE_CREATE_INFO);
        assert_eq!(vk::SwapchainCreateInfoKHR::default().s_type, vk::StructureType::SWAPCHAIN_CREATE_INFO_KHR);
        assert_eq!(
            vk::GraphicsPipelineCreateInfo::default().s_type,
            vk::StructureType::GRAPHICS_PIPELINE_CREATE_INFO
        );
        assert_eq!(vk::ImageViewCreateInfo::default().s_type, vk::StructureType::IMAGE_VIEW_CREATE_INFO);
        let info = vk::CommandBufferBeginInfo::default();
        assert!(info.p_next.is_null());
        assert!(info.flags.is_empty());
        assert_eq!(vk::Extent2D::default().width, 0);
    }

    #[test]
    fn handles_default_to_null() {
        assert!(vk::Instance::default().is_null());
        assert!(vk::Fence::default().is_null());
        assert_eq!(vk::SurfaceKHR::from_raw(7).as_raw(), 7);
        assert_eq!(format!("{:?}", vk::Fence::from_raw(0x10)), "Fence(0x10)");
    }
}
