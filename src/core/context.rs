/// Bundles the instance, physical device and logical device a task graph runs against
#[derive(Debug)]
pub struct Context {
    pub instance: crate::core::Instance,
    pub physical_device: crate::device::PhysicalDevice,
    pub device: crate::device::LogicalDevice,
}