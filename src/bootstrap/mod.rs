pub mod app_info;
pub mod init;
pub mod instance;
pub mod logical_device;
/// Set of utilities structs and methods which streamline the Vulkan initialization process
/// Inspired heavily by [vk-bootstrap](https://github.com/charles-lunarg/vk-bootstrap)
pub mod physical_device;
pub mod queue;
pub mod swapchain;

pub use app_info::AppSettings;
pub use init::{ContextInit, WindowedContext, WindowlessContext};
pub use instance::InstanceBuilder;
pub use logical_device::LogicalDeviceBuilder;
pub use physical_device::PhysicalDevice;
pub use physical_device::PhysicalDeviceSelector;
pub use physical_device::QueueAllocation;
pub use queue::QueueRequest;
pub use swapchain::SwapchainBuilder;
