pub mod compute;
pub mod dynamic_rendering;
pub mod graphics;
pub mod manager;
pub mod pipeline_layout;
pub mod pipeline_layout_builder;
pub mod traits;

pub use compute::{ComputePipeline, ComputePipelineBuilder};
pub use graphics::{GraphicsPipeline, GraphicsPipelineBuilder};
pub use manager::{ComputeInfo, GraphicsInfo, PipelineHandle, PipelineManager, ShaderUniform};
pub use pipeline_layout::PipelineLayout;
pub use pipeline_layout_builder::PipelineLayoutBuilder;
pub use traits::{Pipeline, PipelineBuilder};
