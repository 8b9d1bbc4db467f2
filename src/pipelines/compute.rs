use crate::traits::Destructible;
use ash::vk;
use std::ffi::c_char;
use std::ptr;

#[derive(Debug, Clone)]
pub struct ComputePipeline {
    device: crate::device::LogicalDevice,
    handle: vk::Pipeline,
    layout: vk::PipelineLayout,
}

impl Destructible for ComputePipeline {
    fn destroy(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkPipelineLayout {:p}", self.layout);
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkPipeline {:p}", self.handle);

        unsafe {
            self.device
                .get_handle()
                .destroy_pipeline_layout(self.layout, None);
            self.device.get_handle().destroy_pipeline(self.handle, None);
        }
    }
}

impl super::Pipeline for ComputePipeline {
    fn handle(&self) -> vk::Pipeline {
        self.handle
    }

    fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

#[derive(Debug, Default)]
pub struct ComputePipelineBuilder {
    shader: Option<crate::shader::Shader>,
    layout: Option<vk::PipelineLayout>,
}

impl super::PipelineBuilder for ComputePipelineBuilder {
    type BuildTo = ComputePipeline;

    fn replace_layout(mut self, layout: vk::PipelineLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    fn replace_shader(mut self, shader: crate::shader::Shader, _stage: vk::ShaderStageFlags) -> Self {
        if let Some(mut shader) = self.shader.replace(shader) {
            shader.destroy();
        }
        self
    }

    fn build(mut self, device: crate::device::LogicalDevice) -> anyhow::Result<Self::BuildTo> {
        let shader = self.shader.take().expect("compute pipeline needs a shader bound");
        let layout = self.layout.expect("compute pipeline needs a layout bound");
        let stage = vk::PipelineShaderStageCreateInfo {
            s_type: vk::StructureType::PIPELINE_SHADER_STAGE_CREATE_INFO,
            p_next: ptr::null(),
            flags: vk::PipelineShaderStageCreateFlags::empty(),
            stage: vk::ShaderStageFlags::COMPUTE,
            module: shader.handle(),
            p_name: "main\0".as_ptr() as *const c_char,
            p_specialization_info: ptr::null(),
            _marker: Default::default(),
        };
        let pipeline_info = vk::ComputePipelineCreateInfo {
            s_type: vk::StructureType::COMPUTE_PIPELINE_CREATE_INFO,
            p_next: ptr::null(),
            flags: vk::PipelineCreateFlags::empty(),
            stage,
            layout,
            base_pipeline_handle: vk::Pipeline::null(),
            base_pipeline_index: 0,
            _marker: Default::default(),
        };
        let handle = unsafe {
            device
                .get_handle()
                .create_compute_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
                .map_err(|(_, err)| err)?
        }
        .pop()
        .unwrap();

        let mut shader = shader;
        shader.destroy();

        Ok(Self::BuildTo {
            device,
            handle,
            layout,
        })
    }
}
