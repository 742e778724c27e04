//! Two-call enumeration.
//!
//! Vulkan lists are read by calling once with a null array to learn the count
//! and again to fill an array of that size. The list can grow in between, in
//! which case the second call reports `INCOMPLETE` and the sequence restarts.

use std::ffi::{c_char, CStr};
use std::ptr;

use crate::result::VkResult;
use crate::vk;

/// Runs a two-call enumeration that reports a [`vk::Result`].
pub fn enumerate<T, F>(mut call: F) -> VkResult<Vec<T>>
where
    T: Copy + Default,
    F: FnMut(*mut u32, *mut T) -> vk::Result,
{
    loop {
        let mut count = 0u32;
        call(&mut count, ptr::null_mut()).into_result()?;

        let mut items = vec![T::default(); count as usize];
        let result = call(&mut count, items.as_mut_ptr());
        if result == vk::Result::INCOMPLETE {
            log::debug!("enumeration grew from {} entries, retrying", items.len());
            continue;
        }
        result.into_result()?;

        items.truncate(count as usize);
        return Ok(items);
    }
}

/// Two-call enumeration for queries that cannot fail.
pub fn enumerate_infallible<T, F>(mut call: F) -> Vec<T>
where
    T: Copy + Default,
    F: FnMut(*mut u32, *mut T),
{
    let mut count = 0u32;
    call(&mut count, ptr::null_mut());
    let mut items = vec![T::default(); count as usize];
    call(&mut count, items.as_mut_ptr());
    items.truncate(count as usize);
    items
}

/// Extensions offered by the implementation and implicit layers.
///
/// # Safety
///
/// The global functions of `vulkan` must be resolved.
pub unsafe fn instance_extensions(vulkan: &vk::VulkanLoader) -> VkResult<Vec<vk::ExtensionProperties>> {
    enumerate(|count, data| unsafe { vulkan.EnumerateInstanceExtensionProperties(ptr::null(), count, data) })
}

/// # Safety
///
/// The global functions of `vulkan` must be resolved.
pub unsafe fn instance_layers(vulkan: &vk::VulkanLoader) -> VkResult<Vec<vk::LayerProperties>> {
    enumerate(|count, data| unsafe { vulkan.EnumerateInstanceLayerProperties(count, data) })
}

/// # Safety
///
/// `vulkan` must be bound to `instance`.
pub unsafe fn physical_devices(vulkan: &vk::VulkanLoader, instance: vk::Instance) -> VkResult<Vec<vk::PhysicalDevice>> {
    enumerate(|count, data| unsafe { vulkan.EnumeratePhysicalDevices(instance, count, data) })
}

/// # Safety
///
/// `vulkan` must be bound to the instance owning `device`.
pub unsafe fn queue_families(vulkan: &vk::VulkanLoader, device: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties> {
    enumerate_infallible(|count, data| unsafe { vulkan.GetPhysicalDeviceQueueFamilyProperties(device, count, data) })
}

/// # Safety
///
/// `vulkan` must be bound to the instance owning `device`.
pub unsafe fn device_extensions(
    vulkan: &vk::VulkanLoader,
    device: vk::PhysicalDevice,
) -> VkResult<Vec<vk::ExtensionProperties>> {
    enumerate(|count, data| unsafe { vulkan.EnumerateDeviceExtensionProperties(device, ptr::null(), count, data) })
}

/// Device layers are the instance layers on every current loader; they are
/// still listed for older implementations.
///
/// # Safety
///
/// `vulkan` must be bound to the instance owning `device`.
pub unsafe fn device_layers(
    vulkan: &vk::VulkanLoader,
    device: vk::PhysicalDevice,
) -> VkResult<Vec<vk::LayerProperties>> {
    enumerate(|count, data| unsafe { vulkan.EnumerateDeviceLayerProperties(device, count, data) })
}

/// The NUL-terminated prefix of a fixed-size name field.
fn fixed_name(chars: &[c_char]) -> Option<&CStr> {
    CStr::from_bytes_until_nul(bytemuck::cast_slice(chars)).ok()
}

impl vk::ExtensionProperties {
    /// `None` when the implementation filled the whole field without a NUL.
    pub fn name(&self) -> Option<&CStr> {
        fixed_name(&self.extension_name)
    }
}

impl vk::LayerProperties {
    pub fn name(&self) -> Option<&CStr> {
        fixed_name(&self.layer_name)
    }

    pub fn description(&self) -> Option<&CStr> {
        fixed_name(&self.description)
    }
}

impl vk::PhysicalDeviceProperties {
    pub fn name(&self) -> Option<&CStr> {
        fixed_name(&self.device_name)
    }
}
