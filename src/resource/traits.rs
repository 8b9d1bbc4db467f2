use crate::traits::Destructible;
use anyhow::Result;

/// Every resource in Vulkan is expected to have a lifetime + debuggable
pub trait Resource<'a>: Destructible + Sized {
    /// Necessary create info
    type CreateInfo: 'a;
    /// Type of the underlying VkObject the struct is representing
    type HandleType;

    /// Attempt to create a new resource given the [`Self::CreateInfo`] struct
    fn new(create_info: Self::CreateInfo) -> Result<Self>
    where
        Self: Sized;

    /// Get a reference to the underlying VkObject.
    fn get_handle(&self) -> &Self::HandleType;

    /// Get a copy to the underlying VkObject
    fn handle(&self) -> Self::HandleType;

    /// Get the device the resource was created against
    fn get_device(&self) -> &crate::device::LogicalDevice;

    /// Get the debug name of the resource, if any
    fn get_name(&self) -> Option<&str>;
}

/// Implemented by any Vulkan object which can be tagged with a debug name via
/// `VK_EXT_debug_utils`
pub trait Nameable {
    const OBJECT_TYPE: ash::vk::ObjectType;

    fn set_name(&mut self, debug_utils: &ash::ext::debug_utils::Device, name: &str) -> Result<()>;
}

/// Shared implementation for [`Nameable::set_name`]: tags the raw handle with `name` via the
/// debug utils extension.
pub fn name_nameable<T: Nameable>(
    debug_utils: &ash::ext::debug_utils::Device,
    handle: u64,
    name: &str,
) -> Result<()> {
    use std::ffi::CString;

    let name = CString::new(name)?;
    let name_info = ash::vk::DebugUtilsObjectNameInfoEXT {
        s_type: ash::vk::StructureType::DEBUG_UTILS_OBJECT_NAME_INFO_EXT,
        p_next: std::ptr::null(),
        object_type: T::OBJECT_TYPE,
        object_handle: handle,
        p_object_name: name.as_ptr(),
        _marker: Default::default(),
    };
    unsafe {
        debug_utils.set_debug_utils_object_name(&name_info)?;
    }
    Ok(())
}
