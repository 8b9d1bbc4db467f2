pub mod descriptor_pool;
pub mod descriptor_set;
pub mod descriptor_set_layout;
pub mod descriptor_set_layout_builder;
pub mod slot_allocator;

pub use descriptor_pool::{DescriptorPool, PoolSize, PoolSizeRatio};
pub use descriptor_set::{
    DescriptorSet, DescriptorSetCreateInfo, DescriptorType, DescriptorWriteInfo,
};
pub use descriptor_set_layout::DescriptorSetLayout;
pub use descriptor_set_layout_builder::DescriptorSetLayoutBuilder;
pub use slot_allocator::{DescriptorSlotAllocator, Slot};