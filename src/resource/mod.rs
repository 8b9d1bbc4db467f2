pub mod buffer;
pub mod image;
pub mod image_view;
pub mod manager;
pub mod sampler;
pub mod traits;
pub mod usage;

pub use buffer::{Buffer, BufferCreateInfo};
pub use image::Image;
pub use image_view::ImageView;
pub use manager::{BufferHandle, ImageHandle, ResourceManager};
pub use sampler::Sampler;
pub use usage::{BoundSlot, ResourceUsage, ResourceUsageKind};