use ash::vk;

/// Quick easy abstraction over queues

/// Describes how a [`Queue`] was carved out of a physical device's queue families.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QueueInfo {
    pub family_index: u32,
    pub index: u32,
    /// Flags the family this queue belongs to was selected for
    pub queue_flags: vk::QueueFlags,
    /// Whether the queue is reserved exclusively for this purpose
    pub strict: bool,
    /// Whether the queue family supports presentation
    pub can_present: bool,
}

/// Represents a [`vk::Queue`] and the information used to acquire it
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Queue {
    /// Handle to [`vk::Queue`]
    handle: vk::Queue,
    info: QueueInfo,
}

impl Queue {
    pub fn new(handle: vk::Queue, info: QueueInfo) -> Self {
        Self { handle, info }
    }

    /// Get the underlying reference to [`VkQueue`](vk::Queue)
    pub fn get_handle(&self) -> &vk::Queue {
        &self.handle
    }

    /// Get the underlying copy of [`VkQueue`](vk::Queue)
    pub fn handle(&self) -> vk::Queue {
        self.handle
    }

    pub fn get_index(&self) -> u32 {
        self.info.index
    }

    pub fn get_family_index(&self) -> u32 {
        self.info.family_index
    }

    pub fn get_queue_flags(&self) -> vk::QueueFlags {
        self.info.queue_flags
    }

    pub fn is_strict(&self) -> bool {
        self.info.strict
    }

    pub fn can_present(&self) -> bool {
        self.info.can_present
    }

    pub fn info(&self) -> QueueInfo {
        self.info
    }
}
