use std::ptr;
use std::sync::Arc;

use ash::vk;

/// Aggregates every queue carved out of a device so callers (chiefly the task graph's compile
/// step) can resolve a single queue by the flags a batch of tasks collectively requires.
#[derive(Debug, Clone)]
pub struct ExecutionManager {
    device: crate::device::LogicalDevice,
    queues: Arc<[crate::device::Queue]>,
}

impl ExecutionManager {
    pub fn from_queues(
        device: crate::device::LogicalDevice,
        queues: Vec<crate::device::Queue>,
    ) -> Self {
        Self {
            device,
            queues: queues.into(),
        }
    }

    /// Works like [`Self::from_queues`], but enumerates every queue the device has active
    pub fn from_device(
        device: crate::device::LogicalDevice,
        physical_device: &crate::device::PhysicalDevice,
    ) -> Self {
        let queues = physical_device
            .get_active_queues()
            .iter()
            .map(|q| {
                device.get_queue(
                    &vk::DeviceQueueInfo2 {
                        s_type: vk::StructureType::DEVICE_QUEUE_INFO_2,
                        p_next: ptr::null(),
                        flags: Default::default(),
                        queue_family_index: q.family_index,
                        queue_index: q.index,
                        _marker: Default::default(),
                    },
                    q.queue_flags,
                    q.strict,
                    q.can_present,
                )
            })
            .collect::<Vec<crate::device::Queue>>();
        Self::from_queues(device, queues)
    }

    pub fn get_device(&self) -> &crate::device::LogicalDevice {
        &self.device
    }

    pub fn queues(&self) -> &[crate::device::Queue] {
        &self.queues
    }

    /// Resolve the first queue whose family advertises every flag in `flags`
    pub fn find_queue(&self, flags: vk::QueueFlags) -> Option<crate::device::Queue> {
        self.queues
            .iter()
            .find(|queue| queue.get_queue_flags().contains(flags))
            .copied()
    }

    /// Acquire a queue capable of presenting to a surface
    pub fn acquire_present_queue(&self) -> Option<crate::device::Queue> {
        self.queues
            .iter()
            .find(|queue| queue.can_present())
            .copied()
    }
}
