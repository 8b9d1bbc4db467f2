use ash::vk;
use ash::vk::Handle;

use crate::resource::traits::{Nameable, Resource};
use crate::traits::AsRaw;

#[derive(Debug)]
pub struct PipelineLayout {
    handle: vk::PipelineLayout,
    device: crate::device::LogicalDevice,
    name: Option<String>,
}

pub enum PipelineLayoutCreateInfo<'a> {
    FromVk {
        layout: vk::PipelineLayout,
        device: crate::device::LogicalDevice,
    },
    CreateInfo {
        create_info: vk::PipelineLayoutCreateInfo<'a>,
        name: Option<&'a str>,
        device: crate::device::LogicalDevice,
    },
}

impl crate::traits::Destructible for PipelineLayout {
    fn destroy(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkPipelineLayout {:p}", self.handle);
        unsafe {
            self.device
                .get_handle()
                .destroy_pipeline_layout(self.handle, None);
        }
    }
}

#[cfg(feature = "raii")]
impl Drop for PipelineLayout {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<'a> Resource<'a> for PipelineLayout {
    type CreateInfo = PipelineLayoutCreateInfo<'a>;
    type HandleType = vk::PipelineLayout;

    fn new(create_info: Self::CreateInfo) -> anyhow::Result<Self>
    where
        Self: Sized,
    {
        let handle = match create_info {
            PipelineLayoutCreateInfo::CreateInfo {
                create_info,
                name,
                device,
            } => {
                let handle = unsafe {
                    device
                        .get_handle()
                        .create_pipeline_layout(&create_info, None)
                }?;
                let mut handle = Self { handle, device, name: None };
                if let Some(name) = name {
                    if let Some(debug_utils) = handle.device.clone().get_debug_utils() {
                        handle.set_name(debug_utils, name)?;
                    }
                }
                handle
            }
            PipelineLayoutCreateInfo::FromVk {
                layout: pipeline,
                device,
            } => Self {
                handle: pipeline,
                device,
                name: None,
            },
        };

        Ok(handle)
    }

    fn get_handle(&self) -> &Self::HandleType {
        &self.handle
    }

    fn handle(&self) -> Self::HandleType {
        self.handle
    }

    fn get_device(&self) -> &crate::device::LogicalDevice {
        &self.device
    }

    fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl AsRaw for PipelineLayout {
    type RawType = vk::PipelineLayout;

    unsafe fn as_raw(&self) -> &Self::RawType {
        &self.handle
    }

    unsafe fn as_raw_mut(&mut self) -> &mut Self::RawType {
        &mut self.handle
    }

    unsafe fn raw(self) -> Self::RawType {
        self.handle
    }
}

impl Nameable for PipelineLayout {
    const OBJECT_TYPE: vk::ObjectType = vk::ObjectType::PIPELINE_LAYOUT;

    fn set_name(
        &mut self,
        debug_utils: &ash::ext::debug_utils::Device,
        name: &str,
    ) -> anyhow::Result<()> {
        crate::resource::traits::name_nameable::<Self>(debug_utils, self.handle.as_raw(), name)
    }
}
