use std::collections::HashMap;

use anyhow::Result;
use ash::vk;
use tracing::warn;

use crate::allocators::{Allocator, ArcAllocator, SlotMapMemoryAllocator};
use crate::descriptor::descriptor_set::{DescriptorInfo, DescriptorType};
use crate::descriptor::{DescriptorSet, DescriptorSlotAllocator};
use crate::resource::traits::Resource;
use crate::resource::usage::{BoundSlot, ResourceRef, ResourceUsage};
use crate::resource::{Buffer, BufferCreateInfo, Image, ImageView};
use crate::traits::Destructible;

/// Opaque handle to a buffer owned by a [`ResourceManager`]. Only valid for the manager that
/// issued it; carries its own generation so stale handles are rejected rather than silently
/// aliasing a reused slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    index: u32,
    version: u64,
}

/// Opaque handle to an image owned by a [`ResourceManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle {
    index: u32,
    version: u64,
}

struct BufferEntry<A: Allocator> {
    buffer: Buffer<A>,
    version: u64,
    slot: Option<crate::descriptor::Slot>,
}

struct ImageEntry<A: Allocator> {
    image: Image<A>,
    version: u64,
    views: HashMap<ResourceUsage, (ImageView, BoundSlot)>,
}

/// Binding-index layout for the bindless descriptor set. Stable across the process lifetime.
const BINDING_STORAGE_BUFFER: u32 = 0;
const BINDING_STORAGE_IMAGE: u32 = 1;
const BINDING_SAMPLED_IMAGE: u32 = 2;

fn image_layout_barrier(
    image: vk::Image,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
) -> vk::ImageMemoryBarrier2 {
    vk::ImageMemoryBarrier2 {
        s_type: vk::StructureType::IMAGE_MEMORY_BARRIER_2,
        p_next: std::ptr::null(),
        src_stage_mask: vk::PipelineStageFlags2::ALL_COMMANDS,
        src_access_mask: vk::AccessFlags2::MEMORY_WRITE,
        dst_stage_mask: vk::PipelineStageFlags2::ALL_COMMANDS,
        dst_access_mask: vk::AccessFlags2::MEMORY_WRITE | vk::AccessFlags2::MEMORY_READ,
        old_layout,
        new_layout,
        src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
        dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
        image,
        subresource_range: vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: vk::REMAINING_MIP_LEVELS,
            base_array_layer: 0,
            layer_count: vk::REMAINING_ARRAY_LAYERS,
        },
        _marker: Default::default(),
    }
}

fn record_barrier(
    device: &crate::device::LogicalDevice,
    cmd: &crate::command::CommandBufferRecording,
    barrier: vk::ImageMemoryBarrier2,
) {
    let dependency_info = vk::DependencyInfo {
        s_type: vk::StructureType::DEPENDENCY_INFO,
        p_next: std::ptr::null(),
        dependency_flags: vk::DependencyFlags::empty(),
        memory_barrier_count: 0,
        p_memory_barriers: std::ptr::null(),
        buffer_memory_barrier_count: 0,
        p_buffer_memory_barriers: std::ptr::null(),
        image_memory_barrier_count: 1,
        p_image_memory_barriers: &barrier,
        _marker: Default::default(),
    };
    unsafe {
        device
            .get_handle()
            .cmd_pipeline_barrier2(cmd.handle(), &dependency_info);
    }
}

/// Owns every GPU-side buffer and image a task graph touches, and the bindless descriptor table
/// that exposes them to shaders by slot index. Resources are addressed by opaque, versioned
/// handles rather than pointers so a cyclic reference between two tasks never borrows across the
/// manager.
pub struct ResourceManager<A: Allocator> {
    device: crate::device::LogicalDevice,
    allocator: ArcAllocator<A>,
    image_allocator: SlotMapMemoryAllocator<A>,
    descriptor_set: DescriptorSet,
    storage_buffers: DescriptorSlotAllocator,
    storage_images: DescriptorSlotAllocator,
    sampled_images: DescriptorSlotAllocator,
    buffers: Vec<Option<BufferEntry<A>>>,
    images: Vec<Option<ImageEntry<A>>>,
    free_buffers: Vec<u32>,
    free_images: Vec<u32>,
    buffer_versions: Vec<u64>,
    image_versions: Vec<u64>,
    /// Usages declared by the task currently being bound, used to detect a resource declared
    /// twice within one task.
    in_flight_usages: Vec<ResourceUsage>,
}

impl<A: Allocator> ResourceManager<A> {
    pub fn new(
        device: crate::device::LogicalDevice,
        allocator: A,
        descriptor_set: DescriptorSet,
        buffer_capacity: u32,
        image_capacity: u32,
    ) -> Self {
        Self {
            device,
            allocator: ArcAllocator::new(allocator.clone()),
            image_allocator: SlotMapMemoryAllocator::new(allocator),
            descriptor_set,
            storage_buffers: DescriptorSlotAllocator::new(
                BINDING_STORAGE_BUFFER,
                DescriptorType::StorageBuffer,
                buffer_capacity,
            ),
            storage_images: DescriptorSlotAllocator::new(
                BINDING_STORAGE_IMAGE,
                DescriptorType::StorageImage,
                image_capacity,
            ),
            sampled_images: DescriptorSlotAllocator::new(
                BINDING_SAMPLED_IMAGE,
                DescriptorType::SampledImage,
                image_capacity,
            ),
            buffers: Vec::new(),
            images: Vec::new(),
            free_buffers: Vec::new(),
            free_images: Vec::new(),
            buffer_versions: Vec::new(),
            image_versions: Vec::new(),
            in_flight_usages: Vec::new(),
        }
    }

    pub fn create_buffer(
        &mut self,
        name: Option<String>,
        size: vk::DeviceSize,
        memory_type: crate::allocators::MemoryLocation,
        usage_flags: vk::BufferUsageFlags,
    ) -> Result<BufferHandle> {
        let buffer = Buffer::new(BufferCreateInfo::NewEmptyBuffer {
            device: self.device.clone(),
            name,
            allocator: &mut self.allocator,
            size,
            memory_type,
            usage_flags,
        })?;

        let index = match self.free_buffers.pop() {
            Some(index) => {
                self.buffers[index as usize] = Some(BufferEntry {
                    buffer,
                    version: self.buffer_versions[index as usize],
                    slot: None,
                });
                index
            }
            None => {
                let index = self.buffers.len() as u32;
                self.buffer_versions.push(1);
                self.buffers.push(Some(BufferEntry {
                    buffer,
                    version: 1,
                    slot: None,
                }));
                index
            }
        };

        Ok(BufferHandle {
            index,
            version: self.buffer_versions[index as usize],
        })
    }

    pub fn create_image(
        &mut self,
        name: Option<String>,
        image_ci: vk::ImageCreateInfo,
        memory_type: crate::allocators::MemoryLocation,
    ) -> Result<ImageHandle> {
        let image = Image::new(crate::resource::image::ImageCreateInfo::NewAllocated {
            device: self.device.clone(),
            allocator: &mut self.image_allocator,
            location: memory_type,
            image_ci,
            name,
        })?;

        let index = match self.free_images.pop() {
            Some(index) => {
                self.images[index as usize] = Some(ImageEntry {
                    image,
                    version: self.image_versions[index as usize],
                    views: HashMap::new(),
                });
                index
            }
            None => {
                let index = self.images.len() as u32;
                self.image_versions.push(1);
                self.images.push(Some(ImageEntry {
                    image,
                    version: 1,
                    views: HashMap::new(),
                }));
                index
            }
        };

        Ok(ImageHandle {
            index,
            version: self.image_versions[index as usize],
        })
    }

    pub fn get_buffer(&self, handle: BufferHandle) -> Result<&Buffer<A>> {
        self.buffer_entry(handle).map(|entry| &entry.buffer)
    }

    pub fn get_image(&self, handle: ImageHandle) -> Result<&Image<A>> {
        self.image_entry(handle).map(|entry| &entry.image)
    }

    pub fn free_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        let index = handle.index as usize;
        let mut entry = self
            .buffers
            .get_mut(index)
            .and_then(Option::take)
            .ok_or(crate::GraphError::UnknownHandle)?;
        if let Some(slot) = entry.slot.take() {
            self.storage_buffers.free(slot.index);
        }
        entry.buffer.destroy();
        self.buffer_versions[index] += 1;
        self.free_buffers.push(handle.index);
        Ok(())
    }

    pub fn free_image(&mut self, handle: ImageHandle) -> Result<()> {
        let index = handle.index as usize;
        let mut entry = self
            .images
            .get_mut(index)
            .and_then(Option::take)
            .ok_or(crate::GraphError::UnknownHandle)?;
        for (_, (mut view, slot)) in entry.views.drain() {
            self.storage_images.free(slot.slot);
            self.sampled_images.free(slot.slot);
            view.destroy();
        }
        entry.image.destroy();
        self.image_versions[index] += 1;
        self.free_images.push(handle.index);
        Ok(())
    }

    /// Uploads `data` into a host-visible buffer at `offset_bytes`.
    pub fn upload_to_buffer<T: Sized>(
        &mut self,
        handle: BufferHandle,
        offset_bytes: vk::DeviceSize,
        data: &[T],
    ) -> Result<()> {
        let entry = self
            .buffers
            .get_mut(handle.index as usize)
            .and_then(Option::as_mut)
            .filter(|entry| entry.version == handle.version)
            .ok_or(crate::GraphError::UnknownHandle)?;
        if entry.buffer.mapped_ptr().is_none() {
            return Err(anyhow::Error::from(crate::GraphError::NoHostAccess));
        }
        entry.buffer.write(offset_bytes, data)
    }

    /// Reads `count` elements of `T` back out of a host-visible buffer at `offset_bytes`.
    pub fn read_from_buffer<T: Copy>(
        &self,
        handle: BufferHandle,
        offset_bytes: vk::DeviceSize,
        count: usize,
    ) -> Result<Vec<T>> {
        let entry = self.buffer_entry(handle)?;
        let mapped = entry
            .buffer
            .mapped_ptr()
            .ok_or(crate::GraphError::NoHostAccess)?;
        unsafe {
            let base = (mapped.as_ptr() as *const u8).add(offset_bytes as usize) as *const T;
            Ok(std::slice::from_raw_parts(base, count).to_vec())
        }
    }

    /// Uploads `data` into `handle` via a transient host-visible staging buffer and a one-shot
    /// transfer: undefined -> transfer-dst, copy, transfer-dst -> general.
    pub fn upload_to_image(
        &mut self,
        handle: ImageHandle,
        queue: crate::device::Queue,
        data: &[u8],
    ) -> Result<()> {
        let (image_handle, extent) = {
            let entry = self.image_entry(handle)?;
            (entry.image.handle(), entry.image.extent())
        };

        let mut staging = Buffer::new(BufferCreateInfo::NewEmptyBuffer {
            device: self.device.clone(),
            name: None,
            allocator: &mut self.allocator,
            size: data.len() as vk::DeviceSize,
            memory_type: crate::allocators::MemoryLocation::CpuToGpu,
            usage_flags: vk::BufferUsageFlags::TRANSFER_SRC,
        })?;
        staging.write(0, data)?;
        let staging_handle = staging.handle();

        let immediate = crate::util::immediate_submit::ImmediateSubmit::new(self.device.clone(), queue)?;
        immediate.submit(|ctx| {
            let barrier_to_dst = image_layout_barrier(
                image_handle,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            );
            record_barrier(&self.device, ctx.cmd, barrier_to_dst);

            let region = vk::BufferImageCopy {
                buffer_offset: 0,
                buffer_row_length: 0,
                buffer_image_height: 0,
                image_subresource: vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                },
                image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
                image_extent: extent,
            };
            unsafe {
                self.device.get_handle().cmd_copy_buffer_to_image(
                    ctx.cmd.handle(),
                    staging_handle,
                    image_handle,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[region],
                );
            }

            let barrier_to_general = image_layout_barrier(
                image_handle,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::ImageLayout::GENERAL,
            );
            record_barrier(&self.device, ctx.cmd, barrier_to_general);
        });

        staging.destroy();
        Ok(())
    }

    /// Reads `handle` back via a transient host-visible staging buffer. Assumes the image is
    /// already in a copyable (general) layout.
    pub fn read_from_image(
        &mut self,
        handle: ImageHandle,
        queue: crate::device::Queue,
        byte_len: usize,
    ) -> Result<Vec<u8>> {
        let (image_handle, extent) = {
            let entry = self.image_entry(handle)?;
            (entry.image.handle(), entry.image.extent())
        };

        let mut staging = Buffer::new(BufferCreateInfo::NewEmptyBuffer {
            device: self.device.clone(),
            name: None,
            allocator: &mut self.allocator,
            size: byte_len as vk::DeviceSize,
            memory_type: crate::allocators::MemoryLocation::GpuToCpu,
            usage_flags: vk::BufferUsageFlags::TRANSFER_DST,
        })?;
        let staging_handle = staging.handle();

        let immediate = crate::util::immediate_submit::ImmediateSubmit::new(self.device.clone(), queue)?;
        immediate.submit(|ctx| {
            let region = vk::BufferImageCopy {
                buffer_offset: 0,
                buffer_row_length: 0,
                buffer_image_height: 0,
                image_subresource: vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                },
                image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
                image_extent: extent,
            };
            unsafe {
                self.device.get_handle().cmd_copy_image_to_buffer(
                    ctx.cmd.handle(),
                    image_handle,
                    vk::ImageLayout::GENERAL,
                    staging_handle,
                    &[region],
                );
            }
        });

        let mapped = staging
            .mapped_ptr()
            .ok_or(crate::GraphError::NoHostAccess)?;
        let out = unsafe {
            std::slice::from_raw_parts(mapped.as_ptr() as *const u8, byte_len).to_vec()
        };
        staging.destroy();
        Ok(out)
    }

    /// Records that `usage` is about to be bound for the task currently compiling. Returns an
    /// error if the same resource was already used by this task under a different usage -- or
    /// the same one twice, which is almost certainly a declaration bug.
    pub fn validate_access(&mut self, usage: ResourceUsage) -> Result<()> {
        if self
            .in_flight_usages
            .iter()
            .any(|existing| existing.resource == usage.resource)
        {
            return Err(anyhow::Error::from(crate::GraphError::DuplicateResourceUsage));
        }
        self.in_flight_usages.push(usage);
        Ok(())
    }

    pub fn clear_in_flight(&mut self) {
        self.in_flight_usages.clear();
    }

    /// Binds `usage` to a slot in the bindless descriptor table, creating or reusing a cached
    /// image view as needed, and returns the slot the shader should index with.
    pub fn bind_resource(&mut self, usage: ResourceUsage) -> Result<BoundSlot> {
        match usage.resource {
            ResourceRef::Buffer(handle) => {
                let index = handle.index as usize;
                let buffer_handle = {
                    let entry = self
                        .buffers
                        .get(index)
                        .and_then(Option::as_ref)
                        .filter(|entry| entry.version == handle.version)
                        .ok_or(crate::GraphError::UnknownHandle)?;
                    entry.buffer.handle()
                };
                let entry = self.buffers[index].as_mut().unwrap();
                if let Some(slot) = entry.slot {
                    if self.storage_buffers.is_valid(slot) {
                        return Ok(BoundSlot {
                            view: None,
                            slot: slot.index,
                            version: slot.version,
                        });
                    }
                }
                let descriptor = DescriptorInfo::Buffer(vk::DescriptorBufferInfo {
                    buffer: buffer_handle,
                    offset: 0,
                    range: vk::WHOLE_SIZE,
                });
                let slot = self
                    .storage_buffers
                    .allocate(descriptor)
                    .ok_or(crate::GraphError::SlotExhausted)?;
                entry.slot = Some(slot);
                Ok(BoundSlot {
                    view: None,
                    slot: slot.index,
                    version: slot.version,
                })
            }
            ResourceRef::Image(handle) => {
                let index = handle.index as usize;
                if self
                    .images
                    .get(index)
                    .and_then(Option::as_ref)
                    .filter(|entry| entry.version == handle.version)
                    .is_none()
                {
                    return Err(anyhow::Error::from(crate::GraphError::UnknownHandle));
                }
                if let Some((_, slot)) = self.images[index].as_ref().unwrap().views.get(&usage) {
                    let allocator = if usage.layout == vk::ImageLayout::GENERAL {
                        &self.storage_images
                    } else {
                        &self.sampled_images
                    };
                    if allocator.is_valid(crate::descriptor::Slot {
                        index: slot.slot,
                        version: slot.version,
                    }) {
                        return Ok(*slot);
                    }
                }

                let image_handle = self.images[index].as_ref().unwrap().image.handle();
                let format = self.images[index].as_ref().unwrap().image.format();
                let view = ImageView::new(crate::resource::image_view::ImageViewCreateInfo::FromCreateInfo {
                    device: self.device.clone(),
                    create_info: vk::ImageViewCreateInfo {
                        s_type: vk::StructureType::IMAGE_VIEW_CREATE_INFO,
                        p_next: std::ptr::null(),
                        flags: vk::ImageViewCreateFlags::empty(),
                        image: image_handle,
                        view_type: usage.view_type,
                        format,
                        components: vk::ComponentMapping::default(),
                        subresource_range: usage.subresource_range(),
                        _marker: Default::default(),
                    },
                })?;

                let descriptor = DescriptorInfo::Image(vk::DescriptorImageInfo {
                    sampler: vk::Sampler::null(),
                    image_view: view.handle(),
                    image_layout: usage.layout,
                });
                let is_storage = usage.layout == vk::ImageLayout::GENERAL;
                let slot = if is_storage {
                    self.storage_images.allocate(descriptor)
                } else {
                    self.sampled_images.allocate(descriptor)
                }
                .ok_or(crate::GraphError::SlotExhausted)?;

                let bound = BoundSlot {
                    view: Some(view.handle()),
                    slot: slot.index,
                    version: slot.version,
                };
                self.images[index]
                    .as_mut()
                    .unwrap()
                    .views
                    .insert(usage, (view, bound));
                Ok(bound)
            }
        }
    }

    /// Pushes every pending descriptor write into the bindless set. Must run before any command
    /// buffer that references a slot allocated since the last flush is submitted.
    pub fn flush_descriptors(&mut self) {
        self.storage_buffers.flush(&self.descriptor_set);
        self.storage_images.flush(&self.descriptor_set);
        self.sampled_images.flush(&self.descriptor_set);
    }

    pub fn descriptor_set(&self) -> &DescriptorSet {
        &self.descriptor_set
    }

    fn buffer_entry(&self, handle: BufferHandle) -> Result<&BufferEntry<A>> {
        self.buffers
            .get(handle.index as usize)
            .and_then(Option::as_ref)
            .filter(|entry| entry.version == handle.version)
            .ok_or_else(|| anyhow::Error::from(crate::GraphError::UnknownHandle))
    }

    fn image_entry(&self, handle: ImageHandle) -> Result<&ImageEntry<A>> {
        self.images
            .get(handle.index as usize)
            .and_then(Option::as_ref)
            .filter(|entry| entry.version == handle.version)
            .ok_or_else(|| anyhow::Error::from(crate::GraphError::UnknownHandle))
    }
}

impl<A: Allocator> Destructible for ResourceManager<A> {
    fn destroy(&mut self) {
        for entry in self.buffers.iter_mut().flatten() {
            entry.buffer.destroy();
        }
        for entry in self.images.iter_mut().flatten() {
            for (_, (mut view, _)) in entry.views.drain() {
                view.destroy();
            }
            entry.image.destroy();
        }
    }
}

/// Emitted by [`crate::task_graph::TaskGraph::execute`] after every task body runs, as an
/// advisory (non-fatal) check that every resource the task declared was actually touched by the
/// bound pipeline.
pub fn warn_unbound_usage(resource_name: &str) {
    warn!("{resource_name} was not bound by any pipeline");
}

/// Human-readable identifier for a `(task, usage)` pair, used only in the warning above.
pub fn resource_name(task_name: &str, usage: &ResourceUsage) -> String {
    format!("{task_name}:{:?}", usage.resource)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::resource::usage::ResourceUsageKind;

    #[test]
    fn handles_compare_by_index_and_version() {
        let a = BufferHandle { index: 3, version: 1 };
        let b = BufferHandle { index: 3, version: 1 };
        let c = BufferHandle { index: 3, version: 2 };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn image_handle_distinguishes_index() {
        let a = ImageHandle { index: 0, version: 1 };
        let b = ImageHandle { index: 1, version: 1 };
        assert_ne!(a, b);
    }

    #[test]
    fn usage_make_is_pure() {
        let handle = BufferHandle { index: 0, version: 1 };
        let a = ResourceUsage::make(ResourceRef::Buffer(handle), ResourceUsageKind::ComputeStorageReadWrite);
        let b = ResourceUsage::make(ResourceRef::Buffer(handle), ResourceUsageKind::ComputeStorageReadWrite);
        assert_eq!(a, b);
    }

    #[test]
    fn usage_make_differs_by_kind() {
        let handle = BufferHandle { index: 0, version: 1 };
        let read = ResourceUsage::make(ResourceRef::Buffer(handle), ResourceUsageKind::ComputeStorageRead);
        let write = ResourceUsage::make(ResourceRef::Buffer(handle), ResourceUsageKind::ComputeStorageWrite);
        assert_ne!(read, write);
        assert_eq!(read.layout, vk::ImageLayout::GENERAL);
        assert_eq!(write.stages, vk::PipelineStageFlags2::COMPUTE_SHADER);
    }

    #[test]
    fn resource_name_includes_task_and_resource() {
        let handle = ImageHandle { index: 2, version: 5 };
        let usage = ResourceUsage::make(ResourceRef::Image(handle), ResourceUsageKind::ColorAttachmentWrite);
        let name = resource_name("blit", &usage);
        assert!(name.starts_with("blit:"));
    }
}
