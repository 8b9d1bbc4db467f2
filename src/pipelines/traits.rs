use crate::traits::Destructible;
use anyhow::Result;
use ash::vk;

pub trait Pipeline: Destructible {
    /// Get the underlying [`vk::Pipeline`]
    fn handle(&self) -> vk::Pipeline;

    /// Get the pipeline's layout
    fn layout(&self) -> vk::PipelineLayout;
}

pub trait PipelineBuilder: Default {
    type BuildTo: Pipeline;

    fn replace_layout(self, layout: vk::PipelineLayout) -> Self;

    fn replace_shader(self, shader: crate::shader::Shader, stage: vk::ShaderStageFlags) -> Self;

    fn build(self, device: crate::device::LogicalDevice) -> Result<Self::BuildTo>;
}
