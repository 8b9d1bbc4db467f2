use std::ffi::CString;
use std::ptr;

use anyhow::Result;
use ash::vk;
use tracing::error;

use crate::allocators::Allocator;
use crate::pipelines::dynamic_rendering::rendering_info;
use crate::pipelines::{PipelineHandle, PipelineManager, ShaderUniform};
use crate::resource::manager::{BufferHandle, ImageHandle, ResourceManager};
use crate::resource::usage::ResourceUsage;
use crate::shader::ShaderCompiler;
use crate::task_graph::SimulationState;
use crate::GraphError;

/// Either side of a [`ShaderUniform`] that addresses a bindless resource rather than a plain
/// value. Routed through [`ResourceManager::bind_resource`] before it reaches the GPU.
#[derive(Debug, Clone, Copy)]
pub enum ResourceHandle {
    Buffer(BufferHandle),
    Image(ImageHandle),
}

#[derive(Debug, Clone, Copy)]
pub enum DynamicState {
    Viewport(vk::Viewport),
    Scissor(vk::Rect2D),
}

#[derive(Debug, Clone, Copy)]
pub struct ColorAttachmentInfo {
    pub image: ImageHandle,
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub clear_value: vk::ClearValue,
}

#[derive(Debug, Clone, Copy)]
pub struct DepthAttachmentInfo {
    pub image: ImageHandle,
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub clear_value: vk::ClearValue,
}

#[derive(Debug, Clone)]
pub struct RenderPassInfo {
    pub extent: vk::Extent2D,
    pub colors: Vec<ColorAttachmentInfo>,
    pub depth: Option<DepthAttachmentInfo>,
}

/// Task-facing recorder handed to a [`crate::task_graph::TaskDesc::execute_fn`]. Wraps the single
/// primary command buffer the enclosing [`crate::task_graph::TaskGraph`] owns for the frame, plus
/// the resource/pipeline managers needed to resolve bindless slots as the task records work.
pub struct CommandList<'a, A: Allocator, C: ShaderCompiler> {
    cmd: vk::CommandBuffer,
    device: crate::device::LogicalDevice,
    resources: &'a mut ResourceManager<A>,
    pipelines: &'a mut PipelineManager<C>,
    state: SimulationState,
    render_pass_open: bool,
    marker_depth: u32,
    bound_pipelines: Vec<PipelineHandle>,
}

impl<'a, A: Allocator, C: ShaderCompiler> CommandList<'a, A, C> {
    pub fn new(
        cmd: vk::CommandBuffer,
        device: crate::device::LogicalDevice,
        resources: &'a mut ResourceManager<A>,
        pipelines: &'a mut PipelineManager<C>,
        state: SimulationState,
        name: &str,
    ) -> Result<Self> {
        let mut list = Self {
            cmd,
            device,
            resources,
            pipelines,
            state,
            render_pass_open: false,
            marker_depth: 0,
            bound_pipelines: Vec::new(),
        };
        list.begin_debug_marker(name)?;
        Ok(list)
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Every pipeline handle bound through this list so far, in bind order. Used by the task
    /// graph's post-task validator.
    pub fn bound_pipelines(&self) -> &[PipelineHandle] {
        &self.bound_pipelines
    }

    pub fn resources_mut(&mut self) -> &mut ResourceManager<A> {
        self.resources
    }

    pub fn pipelines_mut(&mut self) -> &mut PipelineManager<C> {
        self.pipelines
    }

    /// Binds `handle` to the command buffer and returns a scope through which every subsequent
    /// uniform write, dynamic state change, dispatch, or draw for this pipeline must flow. Fails
    /// immediately if `handle` names a compute pipeline and a render pass is currently open.
    pub fn bind_pipeline(&mut self, handle: PipelineHandle) -> Result<BoundPipelineScope<'_, 'a, A, C>> {
        let is_graphics = self.pipelines.is_graphics_pipeline(handle)?;
        if !is_graphics && self.render_pass_open {
            error!("cannot bind compute pipeline inside render pass");
            return Err(anyhow::Error::from(GraphError::DispatchInsideRenderPass));
        }
        let pipeline = self.pipelines.pipeline_handle(handle)?;
        let bind_point = if is_graphics {
            vk::PipelineBindPoint::GRAPHICS
        } else {
            vk::PipelineBindPoint::COMPUTE
        };
        unsafe {
            self.device
                .get_handle()
                .cmd_bind_pipeline(self.cmd, bind_point, pipeline);
        }
        self.pipelines.clear_bound_resources(handle)?;
        self.bound_pipelines.push(handle);
        let render_pass_was_open = self.render_pass_open;
        Ok(BoundPipelineScope {
            list: self,
            handle,
            is_graphics,
            render_pass_was_open,
        })
    }

    /// Resolves every attachment through the resource manager, then opens a dynamic-rendering
    /// pass. Fails if a render pass is already open.
    pub fn begin_renderpass(&mut self, info: RenderPassInfo) -> Result<()> {
        if self.render_pass_open {
            return Err(anyhow::Error::from(GraphError::RenderPassAlreadyOpen));
        }

        let mut color_infos = Vec::with_capacity(info.colors.len());
        for color in &info.colors {
            let usage = ResourceUsage::make(
                crate::resource::usage::ResourceRef::Image(color.image),
                crate::resource::usage::ResourceUsageKind::ColorAttachmentWrite,
            );
            let bound = self.resources.bind_resource(usage)?;
            color_infos.push(vk::RenderingAttachmentInfo {
                s_type: vk::StructureType::RENDERING_ATTACHMENT_INFO,
                p_next: ptr::null(),
                image_view: bound.view.unwrap_or(vk::ImageView::null()),
                image_layout: usage.layout,
                resolve_mode: vk::ResolveModeFlags::NONE,
                resolve_image_view: vk::ImageView::null(),
                resolve_image_layout: vk::ImageLayout::UNDEFINED,
                load_op: color.load_op,
                store_op: color.store_op,
                clear_value: color.clear_value,
                _marker: Default::default(),
            });
        }

        let depth_info = match info.depth {
            None => None,
            Some(depth) => {
                let usage = ResourceUsage::make(
                    crate::resource::usage::ResourceRef::Image(depth.image),
                    crate::resource::usage::ResourceUsageKind::DepthStencilAttachmentWrite,
                );
                let bound = self.resources.bind_resource(usage)?;
                Some(vk::RenderingAttachmentInfo {
                    s_type: vk::StructureType::RENDERING_ATTACHMENT_INFO,
                    p_next: ptr::null(),
                    image_view: bound.view.unwrap_or(vk::ImageView::null()),
                    image_layout: usage.layout,
                    resolve_mode: vk::ResolveModeFlags::NONE,
                    resolve_image_view: vk::ImageView::null(),
                    resolve_image_layout: vk::ImageLayout::UNDEFINED,
                    load_op: depth.load_op,
                    store_op: depth.store_op,
                    clear_value: depth.clear_value,
                    _marker: Default::default(),
                })
            }
        };

        let rendering_info = rendering_info(info.extent, &color_infos, depth_info.as_ref());
        unsafe {
            self.device.get_handle().cmd_begin_rendering(self.cmd, &rendering_info);
        }
        self.render_pass_open = true;
        Ok(())
    }

    pub fn end_renderpass(&mut self) -> Result<()> {
        if !self.render_pass_open {
            return Err(anyhow::Error::from(GraphError::RenderPassNotOpen));
        }
        unsafe {
            self.device.get_handle().cmd_end_rendering(self.cmd);
        }
        self.render_pass_open = false;
        Ok(())
    }

    /// Direct pass-through, used by the task graph to insert a barrier between two tasks.
    pub fn pipeline_barrier(&self, dependency_info: &vk::DependencyInfo) {
        unsafe {
            self.device
                .get_handle()
                .cmd_pipeline_barrier2(self.cmd, dependency_info);
        }
    }

    pub fn begin_debug_marker(&mut self, name: &str) -> Result<()> {
        if let Some(debug_utils) = self.device.get_debug_utils() {
            let label_name = CString::new(name)?;
            let label = vk::DebugUtilsLabelEXT {
                s_type: vk::StructureType::DEBUG_UTILS_LABEL_EXT,
                p_next: ptr::null(),
                p_label_name: label_name.as_ptr(),
                color: [0.0; 4],
                _marker: Default::default(),
            };
            unsafe {
                debug_utils.cmd_begin_debug_utils_label(self.cmd, &label);
            }
        }
        self.marker_depth += 1;
        Ok(())
    }

    pub fn end_debug_marker(&mut self) -> Result<()> {
        if self.marker_depth == 0 {
            error!("cannot end more markers than began");
            return Err(anyhow::Error::from(GraphError::MarkerImbalance));
        }
        self.marker_depth -= 1;
        if let Some(debug_utils) = self.device.get_debug_utils() {
            unsafe {
                debug_utils.cmd_end_debug_utils_label(self.cmd);
            }
        }
        Ok(())
    }
}

impl<'a, A: Allocator, C: ShaderCompiler> Drop for CommandList<'a, A, C> {
    fn drop(&mut self) {
        if self.render_pass_open {
            error!("command list dropped with a render pass still open, force-ending it");
            unsafe {
                self.device.get_handle().cmd_end_rendering(self.cmd);
            }
            self.render_pass_open = false;
        }
        while self.marker_depth > 0 {
            self.marker_depth -= 1;
            if let Some(debug_utils) = self.device.get_debug_utils() {
                unsafe {
                    debug_utils.cmd_end_debug_utils_label(self.cmd);
                }
            }
        }
    }
}

/// Scope produced by [`CommandList::bind_pipeline`]. Captures, at bind time, whether the pipeline
/// is graphics and whether a render pass was open -- both checked again at `dispatch`/`draw` time
/// against the captured values rather than the list's live state.
pub struct BoundPipelineScope<'cmd, 'a, A: Allocator, C: ShaderCompiler> {
    list: &'cmd mut CommandList<'a, A, C>,
    handle: PipelineHandle,
    is_graphics: bool,
    render_pass_was_open: bool,
}

impl<'cmd, 'a, A: Allocator, C: ShaderCompiler> BoundPipelineScope<'cmd, 'a, A, C> {
    /// Records a plain-old-data uniform write as a push constant at the offset resolved by
    /// [`PipelineManager::get_uniform`].
    pub fn set_uniform<T: Copy>(&mut self, uniform: ShaderUniform<T>) {
        let layout = self.list.pipelines.pipeline_layout();
        let bytes = unsafe {
            std::slice::from_raw_parts(
                &uniform.value as *const T as *const u8,
                std::mem::size_of::<T>(),
            )
        };
        unsafe {
            self.list.device.get_handle().cmd_push_constants(
                self.list.cmd,
                layout,
                vk::ShaderStageFlags::ALL,
                uniform.offset as u32,
                bytes,
            );
        }
    }

    /// Routes `uniform`'s handle through [`ResourceManager::bind_resource`], records `usage`
    /// against the bound pipeline, and writes the resulting bindless slot as the uniform's value.
    pub fn set_resource_uniform(
        &mut self,
        uniform: ShaderUniform<ResourceHandle>,
        usage: ResourceUsage,
    ) -> Result<()> {
        let bound = self.list.resources.bind_resource(usage)?;
        self.list.pipelines.record_bound_resource(self.handle, usage)?;
        self.set_uniform(uniform.with_value(bound.slot));
        Ok(())
    }

    pub fn set_dynamic_state(&mut self, state: DynamicState) -> Result<()> {
        match state {
            DynamicState::Viewport(viewport) => unsafe {
                self.list
                    .device
                    .get_handle()
                    .cmd_set_viewport(self.list.cmd, 0, &[viewport]);
            },
            DynamicState::Scissor(scissor) => unsafe {
                self.list
                    .device
                    .get_handle()
                    .cmd_set_scissor(self.list.cmd, 0, &[scissor]);
            },
        }
        Ok(())
    }

    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        if self.is_graphics || self.render_pass_was_open {
            error!("cannot bind compute pipeline inside render pass");
            return Err(anyhow::Error::from(GraphError::DispatchInsideRenderPass));
        }
        unsafe {
            self.list.device.get_handle().cmd_dispatch(self.list.cmd, x, y, z);
        }
        Ok(())
    }

    pub fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) -> Result<()> {
        if !self.is_graphics || !self.render_pass_was_open {
            error!("Cannot draw outside of a render pass");
            return Err(anyhow::Error::from(GraphError::DrawOutsideRenderPass));
        }
        unsafe {
            self.list.device.get_handle().cmd_draw(
                self.list.cmd,
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            );
        }
        Ok(())
    }

    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()> {
        if !self.is_graphics || !self.render_pass_was_open {
            error!("Cannot draw outside of a render pass");
            return Err(anyhow::Error::from(GraphError::DrawOutsideRenderPass));
        }
        unsafe {
            self.list.device.get_handle().cmd_draw_indexed(
                self.list.cmd,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            );
        }
        Ok(())
    }
}
