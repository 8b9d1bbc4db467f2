#![allow(unused_imports)]

pub use crate::command::{CommandBuffer, CommandList, CommandPool};
pub use crate::core::{Context, Instance};
pub use crate::descriptor::{DescriptorSlotAllocator, Slot};
pub use crate::device::{ExecutionManager, LogicalDevice, PhysicalDevice, Queue, QueueInfo};
pub use crate::error::GraphError;
pub use crate::pipelines::{PipelineHandle, PipelineManager, ShaderUniform};
pub use crate::resource::{BufferHandle, ImageHandle, ResourceManager, ResourceUsage};
pub use crate::task_graph::{FrameGraph, SimulationState, TaskDesc, TaskGraph};
pub use crate::traits::*;

#[cfg(feature = "gpu-allocator")]
pub use gpu_allocator;
#[cfg(feature = "winit")]
pub use winit;
