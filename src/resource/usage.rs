use ash::vk;

/// Which resource an access intent targets. Carried inside [`ResourceUsage`] rather than
/// keyed externally so a single value is enough to validate and cache a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    Buffer(crate::resource::manager::BufferHandle),
    Image(crate::resource::manager::ImageHandle),
}

/// Enumerates every access pattern the runtime knows how to translate into Vulkan stage/access/
/// layout bits. See the mapping table in [`ResourceUsage::make`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceUsageKind {
    ComputeStorageRead,
    ComputeStorageWrite,
    ComputeStorageReadWrite,
    ComputeSampledRead,
    FragmentSampledRead,
    FragmentStorageRead,
    VertexShaderSampledRead,
    VertexBufferRead,
    IndexBufferRead,
    ColorAttachmentWrite,
    ColorAttachmentReadWrite,
    DepthStencilAttachmentWrite,
    DepthStencilAttachmentRead,
    TransferSrc,
    TransferDst,
    Present,
    Undefined,
}

/// A fully specified GPU access intent. Two usages are equivalent exactly when every field is
/// equal, which makes this type double as the cache key for bound descriptor slots and image
/// views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceUsage {
    pub resource: ResourceRef,
    pub kind: ResourceUsageKind,
    pub stages: vk::PipelineStageFlags2,
    pub access_mask: vk::AccessFlags2,
    pub layout: vk::ImageLayout,
    pub view_type: vk::ImageViewType,
    pub base_mip: u32,
    pub mip_count: u32,
    pub base_layer: u32,
    pub layer_count: u32,
    pub aspect: vk::ImageAspectFlags,
}

impl ResourceUsage {
    /// Builds a [`ResourceUsage`] from a resource reference and an access kind via the
    /// authoritative, pure mapping table. Mip/layer sub-ranges default to the full resource;
    /// callers who need a sub-range should adjust the returned value before using it as a key.
    pub fn make(resource: ResourceRef, kind: ResourceUsageKind) -> Self {
        use ResourceUsageKind::*;
        let (stages, access_mask, layout, aspect) = match kind {
            ComputeStorageRead => (
                vk::PipelineStageFlags2::COMPUTE_SHADER,
                vk::AccessFlags2::SHADER_STORAGE_READ,
                vk::ImageLayout::GENERAL,
                vk::ImageAspectFlags::COLOR,
            ),
            ComputeStorageWrite => (
                vk::PipelineStageFlags2::COMPUTE_SHADER,
                vk::AccessFlags2::SHADER_STORAGE_WRITE,
                vk::ImageLayout::GENERAL,
                vk::ImageAspectFlags::COLOR,
            ),
            ComputeStorageReadWrite => (
                vk::PipelineStageFlags2::COMPUTE_SHADER,
                vk::AccessFlags2::SHADER_STORAGE_READ | vk::AccessFlags2::SHADER_STORAGE_WRITE,
                vk::ImageLayout::GENERAL,
                vk::ImageAspectFlags::COLOR,
            ),
            ComputeSampledRead => (
                vk::PipelineStageFlags2::COMPUTE_SHADER,
                vk::AccessFlags2::SHADER_SAMPLED_READ,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                vk::ImageAspectFlags::COLOR,
            ),
            FragmentSampledRead => (
                vk::PipelineStageFlags2::FRAGMENT_SHADER,
                vk::AccessFlags2::SHADER_SAMPLED_READ,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                vk::ImageAspectFlags::COLOR,
            ),
            FragmentStorageRead => (
                vk::PipelineStageFlags2::FRAGMENT_SHADER,
                vk::AccessFlags2::SHADER_STORAGE_READ,
                vk::ImageLayout::GENERAL,
                vk::ImageAspectFlags::COLOR,
            ),
            VertexShaderSampledRead => (
                vk::PipelineStageFlags2::VERTEX_SHADER,
                vk::AccessFlags2::SHADER_SAMPLED_READ,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                vk::ImageAspectFlags::COLOR,
            ),
            VertexBufferRead => (
                vk::PipelineStageFlags2::VERTEX_ATTRIBUTE_INPUT,
                vk::AccessFlags2::VERTEX_ATTRIBUTE_READ,
                vk::ImageLayout::UNDEFINED,
                vk::ImageAspectFlags::empty(),
            ),
            IndexBufferRead => (
                vk::PipelineStageFlags2::INDEX_INPUT,
                vk::AccessFlags2::INDEX_READ,
                vk::ImageLayout::UNDEFINED,
                vk::ImageAspectFlags::empty(),
            ),
            ColorAttachmentWrite => (
                vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
                vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
                vk::ImageAspectFlags::COLOR,
            ),
            ColorAttachmentReadWrite => (
                vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
                vk::AccessFlags2::COLOR_ATTACHMENT_READ | vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
                vk::ImageAspectFlags::COLOR,
            ),
            DepthStencilAttachmentWrite => (
                vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS
                    | vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS,
                vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE,
                vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL,
                vk::ImageAspectFlags::DEPTH,
            ),
            DepthStencilAttachmentRead => (
                vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS
                    | vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS,
                vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ,
                vk::ImageLayout::DEPTH_READ_ONLY_OPTIMAL,
                vk::ImageAspectFlags::DEPTH,
            ),
            TransferSrc => (
                vk::PipelineStageFlags2::TRANSFER,
                vk::AccessFlags2::TRANSFER_READ,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                vk::ImageAspectFlags::COLOR,
            ),
            TransferDst => (
                vk::PipelineStageFlags2::TRANSFER,
                vk::AccessFlags2::TRANSFER_WRITE,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::ImageAspectFlags::COLOR,
            ),
            Present => (
                vk::PipelineStageFlags2::BOTTOM_OF_PIPE,
                vk::AccessFlags2::empty(),
                vk::ImageLayout::PRESENT_SRC_KHR,
                vk::ImageAspectFlags::COLOR,
            ),
            Undefined => (
                vk::PipelineStageFlags2::TOP_OF_PIPE,
                vk::AccessFlags2::empty(),
                vk::ImageLayout::UNDEFINED,
                vk::ImageAspectFlags::COLOR,
            ),
        };
        Self {
            resource,
            kind,
            stages,
            access_mask,
            layout,
            view_type: vk::ImageViewType::TYPE_2D,
            base_mip: 0,
            mip_count: vk::REMAINING_MIP_LEVELS,
            base_layer: 0,
            layer_count: vk::REMAINING_ARRAY_LAYERS,
            aspect,
        }
    }

    pub fn subresource_range(&self) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: self.aspect,
            base_mip_level: self.base_mip,
            level_count: self.mip_count,
            base_array_layer: self.base_layer,
            layer_count: self.layer_count,
        }
    }
}

/// A cached binding of a [`ResourceUsage`] to a slot in a [`crate::descriptor::DescriptorSlotAllocator`].
///
/// Valid iff `version` still matches the allocator's `versions[slot]`; `view` is populated only
/// for image usages, since the underlying image view is created lazily per-usage.
#[derive(Debug, Clone, Copy)]
pub struct BoundSlot {
    pub view: Option<vk::ImageView>,
    pub slot: u32,
    pub version: u64,
}
