use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use ash::vk;
use tracing::{debug, warn};

use crate::pipelines::{
    ComputePipeline, ComputePipelineBuilder, GraphicsPipeline, GraphicsPipelineBuilder, Pipeline,
    PipelineBuilder,
};
use crate::shader::glsl_preprocessor::IncludeContext;
use crate::shader::{Shader, ShaderCompiler, ShaderKind};
use crate::traits::Destructible;

/// Opaque, versioned handle to a pipeline owned by a [`PipelineManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineHandle {
    index: u32,
    version: u64,
}

/// A value carrier addressing a push-constant offset inside a specific pipeline. Obtained through
/// [`PipelineManager::get_uniform`], which resolves a name to this triple via the pipeline's
/// reflected layout; `value` is then filled in before the carrier is passed to
/// [`crate::command::command_list::BoundPipelineScope::set_uniform`].
#[derive(Debug, Clone, Copy)]
pub struct ShaderUniform<T> {
    pub pipeline: PipelineHandle,
    pub offset: u64,
    pub value: T,
}

impl<T> ShaderUniform<T> {
    /// Returns an equivalent carrier holding `value` in place of the current payload.
    pub fn with_value<U>(self, value: U) -> ShaderUniform<U> {
        ShaderUniform {
            pipeline: self.pipeline,
            offset: self.offset,
            value,
        }
    }
}

/// Byte offset and size of a single reflected uniform member, as found inside a `push_constant`
/// block in the compiled source.
#[derive(Debug, Clone, Copy)]
struct UniformInfo {
    offset: u64,
    size: u64,
}

/// Source + preprocessor defines for a compute pipeline.
#[derive(Debug, Clone)]
pub struct ComputeInfo {
    pub source: PathBuf,
    pub defines: HashMap<String, String>,
}

impl ComputeInfo {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            defines: HashMap::new(),
        }
    }
}

/// Source + preprocessor defines for a graphics pipeline's vertex/fragment pair.
#[derive(Debug, Clone)]
pub struct GraphicsInfo {
    pub vertex_source: PathBuf,
    pub fragment_source: PathBuf,
    pub color_format: vk::Format,
    pub depth_format: Option<vk::Format>,
    pub defines: HashMap<String, String>,
}

impl GraphicsInfo {
    pub fn new(vertex_source: impl Into<PathBuf>, fragment_source: impl Into<PathBuf>, color_format: vk::Format) -> Self {
        Self {
            vertex_source: vertex_source.into(),
            fragment_source: fragment_source.into(),
            color_format,
            depth_format: None,
            defines: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
enum PipelineSource {
    Compute(ComputeInfo),
    Graphics(GraphicsInfo),
}

enum PipelineObject {
    Compute(ComputePipeline),
    Graphics(GraphicsPipeline),
}

impl PipelineObject {
    fn handle(&self) -> vk::Pipeline {
        match self {
            PipelineObject::Compute(p) => p.handle(),
            PipelineObject::Graphics(p) => p.handle(),
        }
    }

    fn destroy(&mut self) {
        match self {
            PipelineObject::Compute(p) => p.destroy(),
            PipelineObject::Graphics(p) => p.destroy(),
        }
    }
}

struct PipelineEntry {
    source: PipelineSource,
    object: PipelineObject,
    version: u64,
    spirv: Vec<Vec<u32>>,
    bound_resources: Vec<crate::resource::ResourceUsage>,
    uniform_layout: HashMap<String, UniformInfo>,
}

/// Identifies a pipeline by the inputs that determine its compiled output, independent of
/// defines. Two `compile_*` calls with the same key return the same [`PipelineHandle`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PipelineKey {
    Compute(PathBuf),
    Graphics(PathBuf, PathBuf),
}

/// Compiles, caches, and rebinds GPU pipelines by stable handle. Recompilation is explicit: a
/// [`Self::set_define`] call only takes effect once [`Self::compile_pipeline`] (or an equivalent
/// recompile entry point) runs again, bumping the handle's version.
pub struct PipelineManager<C: ShaderCompiler> {
    device: crate::device::LogicalDevice,
    compiler: C,
    include_context: IncludeContext,
    pipeline_layout: vk::PipelineLayout,
    entries: Vec<Option<PipelineEntry>>,
    free_list: Vec<u32>,
    keys: HashMap<PipelineKey, u32>,
}

impl<C: ShaderCompiler> PipelineManager<C> {
    pub fn new(device: crate::device::LogicalDevice, pipeline_layout: vk::PipelineLayout) -> Self {
        Self {
            device,
            compiler: C::new(),
            include_context: IncludeContext::new(),
            pipeline_layout,
            entries: Vec::new(),
            free_list: Vec::new(),
            keys: HashMap::new(),
        }
    }

    /// Registers a synthetic source file the compiler resolves before the filesystem, for use as
    /// a main source or as the target of an `#include`.
    pub fn set_virtual_file(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.include_context.set_virtual_file(path, contents);
    }

    /// Compiles a compute pipeline and returns a handle to it. A second call keyed by the same
    /// source path reuses the existing handle in place, bumping its version instead of allocating
    /// a new one.
    pub fn compile_compute(&mut self, info: ComputeInfo) -> Result<PipelineHandle> {
        let key = PipelineKey::Compute(info.source.clone());
        let (spirv, content) = self.compile_stage(&info.source, &info.defines, ShaderKind::Compute)?;
        let uniform_layout = reflect_uniform_layout(&[content]);
        let shader = Shader::from_spirv_words(self.device.clone(), &spirv)?;
        let object = ComputePipelineBuilder::default()
            .replace_layout(self.pipeline_layout)
            .replace_shader(shader, vk::ShaderStageFlags::COMPUTE)
            .build(self.device.clone())?;

        self.insert_or_update(
            key,
            PipelineSource::Compute(info),
            PipelineObject::Compute(object),
            vec![spirv],
            uniform_layout,
        )
    }

    /// Compiles a graphics pipeline (vertex + fragment) and returns a handle to it. A second call
    /// keyed by the same vertex/fragment source pair reuses the existing handle in place.
    pub fn compile_graphics(&mut self, info: GraphicsInfo) -> Result<PipelineHandle> {
        let key = PipelineKey::Graphics(info.vertex_source.clone(), info.fragment_source.clone());
        let (vertex_spirv, vertex_content) =
            self.compile_stage(&info.vertex_source, &info.defines, ShaderKind::Vertex)?;
        let (fragment_spirv, fragment_content) =
            self.compile_stage(&info.fragment_source, &info.defines, ShaderKind::Fragment)?;
        let uniform_layout = reflect_uniform_layout(&[vertex_content, fragment_content]);

        let vertex_shader = Shader::from_spirv_words(self.device.clone(), &vertex_spirv)?;
        let fragment_shader = Shader::from_spirv_words(self.device.clone(), &fragment_spirv)?;

        let mut builder = GraphicsPipelineBuilder::default()
            .replace_layout(self.pipeline_layout)
            .replace_shader(vertex_shader, vk::ShaderStageFlags::VERTEX)
            .replace_shader(fragment_shader, vk::ShaderStageFlags::FRAGMENT)
            .set_input_topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .set_polygon_mode(vk::PolygonMode::FILL)
            .set_cull_mode(vk::CullModeFlags::NONE, vk::FrontFace::CLOCKWISE)
            .set_multisampling_none()
            .disable_blending()
            .set_color_attachment(info.color_format);
        builder = match info.depth_format {
            Some(format) => builder.set_depth_format(format).enable_depth_test(vk::TRUE, vk::CompareOp::LESS),
            None => builder.disable_depth_test(),
        };

        let object = builder.build(self.device.clone())?;

        self.insert_or_update(
            key,
            PipelineSource::Graphics(info),
            PipelineObject::Graphics(object),
            vec![vertex_spirv, fragment_spirv],
            uniform_layout,
        )
    }

    /// Sets (or clears, if `value` is `None`) a preprocessor define on the pipeline's source. The
    /// pipeline is not rebuilt until the matching `recompile_*` call runs.
    pub fn set_define(&mut self, handle: PipelineHandle, key: &str, value: Option<&str>) -> Result<()> {
        let entry = self.entry_mut(handle)?;
        match (&mut entry.source, value) {
            (PipelineSource::Compute(info), Some(value)) => {
                info.defines.insert(key.to_string(), value.to_string());
            }
            (PipelineSource::Compute(info), None) => {
                info.defines.remove(key);
            }
            (PipelineSource::Graphics(info), Some(value)) => {
                info.defines.insert(key.to_string(), value.to_string());
            }
            (PipelineSource::Graphics(info), None) => {
                info.defines.remove(key);
            }
        }
        Ok(())
    }

    /// Recompiles `handle` in place against its current defines, bumping its version.
    pub fn recompile(&mut self, handle: PipelineHandle) -> Result<()> {
        let source = self.entry_mut(handle)?.source.clone();
        let (object, spirv, uniform_layout) = match source {
            PipelineSource::Compute(ref info) => {
                let (spirv, content) = self.compile_stage(&info.source, &info.defines, ShaderKind::Compute)?;
                let uniform_layout = reflect_uniform_layout(&[content]);
                let shader = Shader::from_spirv_words(self.device.clone(), &spirv)?;
                let object = ComputePipelineBuilder::default()
                    .replace_layout(self.pipeline_layout)
                    .replace_shader(shader, vk::ShaderStageFlags::COMPUTE)
                    .build(self.device.clone())?;
                (PipelineObject::Compute(object), vec![spirv], uniform_layout)
            }
            PipelineSource::Graphics(ref info) => {
                let (vertex_spirv, vertex_content) =
                    self.compile_stage(&info.vertex_source, &info.defines, ShaderKind::Vertex)?;
                let (fragment_spirv, fragment_content) =
                    self.compile_stage(&info.fragment_source, &info.defines, ShaderKind::Fragment)?;
                let uniform_layout = reflect_uniform_layout(&[vertex_content, fragment_content]);
                let vertex_shader = Shader::from_spirv_words(self.device.clone(), &vertex_spirv)?;
                let fragment_shader = Shader::from_spirv_words(self.device.clone(), &fragment_spirv)?;
                let mut builder = GraphicsPipelineBuilder::default()
                    .replace_layout(self.pipeline_layout)
                    .replace_shader(vertex_shader, vk::ShaderStageFlags::VERTEX)
                    .replace_shader(fragment_shader, vk::ShaderStageFlags::FRAGMENT)
                    .set_input_topology(vk::PrimitiveTopology::TRIANGLE_LIST)
                    .set_polygon_mode(vk::PolygonMode::FILL)
                    .set_cull_mode(vk::CullModeFlags::NONE, vk::FrontFace::CLOCKWISE)
                    .set_multisampling_none()
                    .disable_blending()
                    .set_color_attachment(info.color_format);
                builder = match info.depth_format {
                    Some(format) => builder.set_depth_format(format).enable_depth_test(vk::TRUE, vk::CompareOp::LESS),
                    None => builder.disable_depth_test(),
                };
                let object = builder.build(self.device.clone())?;
                (PipelineObject::Graphics(object), vec![vertex_spirv, fragment_spirv], uniform_layout)
            }
        };

        let entry = self.entry_mut(handle)?;
        entry.object.destroy();
        entry.object = object;
        entry.spirv = spirv;
        entry.uniform_layout = uniform_layout;
        entry.version += 1;
        debug!("recompiled pipeline {} to version {}", handle.index, entry.version);
        Ok(())
    }

    /// Resolves `name` to an offset via `pipeline`'s reflected push-constant layout. Fails soft:
    /// an unknown name, or a `T` whose size disagrees with the reflected member, logs
    /// [`crate::GraphError::UnknownUniform`] and returns an offset of 0 rather than an error.
    pub fn get_uniform<T: Default>(&self, pipeline: PipelineHandle, name: &str) -> Result<ShaderUniform<T>> {
        let entry = self.entry(pipeline)?;
        match entry.uniform_layout.get(name) {
            Some(info) if info.size == std::mem::size_of::<T>() as u64 => Ok(ShaderUniform {
                pipeline,
                offset: info.offset,
                value: T::default(),
            }),
            Some(info) => {
                warn!(
                    uniform = name,
                    reflected_size = info.size,
                    requested_size = std::mem::size_of::<T>(),
                    error = %crate::GraphError::UnknownUniform,
                    "uniform type size disagrees with reflected layout, defaulting to offset 0"
                );
                Ok(ShaderUniform { pipeline, offset: 0, value: T::default() })
            }
            None => {
                warn!(uniform = name, error = %crate::GraphError::UnknownUniform, "unknown uniform name, defaulting to offset 0");
                Ok(ShaderUniform { pipeline, offset: 0, value: T::default() })
            }
        }
    }

    pub fn get_pipeline_version(&self, handle: PipelineHandle) -> Result<u64> {
        Ok(self.entry(handle)?.version)
    }

    pub fn get_pipeline_spirv(&self, handle: PipelineHandle) -> Result<&[Vec<u32>]> {
        Ok(self.entry(handle)?.spirv.as_slice())
    }

    pub fn is_graphics_pipeline(&self, handle: PipelineHandle) -> Result<bool> {
        Ok(matches!(self.entry(handle)?.source, PipelineSource::Graphics(_)))
    }

    pub fn pipeline_handle(&self, handle: PipelineHandle) -> Result<vk::Pipeline> {
        Ok(self.entry(handle)?.object.handle())
    }

    pub fn pipeline_layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }

    /// Records that `usage` was bound while `handle` was the active pipeline. Cleared every time
    /// the task graph begins compiling, and inspected afterwards to flag usages nothing bound.
    pub fn record_bound_resource(&mut self, handle: PipelineHandle, usage: crate::resource::ResourceUsage) -> Result<()> {
        self.entry_mut(handle)?.bound_resources.push(usage);
        Ok(())
    }

    pub fn get_bound_resources(&self, handle: PipelineHandle) -> Result<&[crate::resource::ResourceUsage]> {
        Ok(self.entry(handle)?.bound_resources.as_slice())
    }

    pub fn clear_bound_resources(&mut self, handle: PipelineHandle) -> Result<()> {
        self.entry_mut(handle)?.bound_resources.clear();
        Ok(())
    }

    /// Expands `#include`s and defines, compiles the result, and returns the compiled SPIR-V
    /// alongside the expanded GLSL text (used for push-constant reflection).
    fn compile_stage(
        &mut self,
        source: &std::path::Path,
        defines: &HashMap<String, String>,
        kind: ShaderKind,
    ) -> Result<(Vec<u32>, String)> {
        let mut content = String::new();
        for line in self.include_context.read(source)?.lines() {
            if let Some(rest) = line.trim_start().strip_prefix("#include") {
                let include_path = rest.trim().trim_matches(|c| c == '"' || c == '<' || c == '>');
                let resolved = self.include_context.resolve_include(
                    source.to_path_buf(),
                    source.with_file_name(include_path),
                )?;
                content.push_str(&resolved.content);
                content.push('\n');
            } else {
                content.push_str(line);
                content.push('\n');
            }
        }
        for (key, value) in defines {
            content = format!("#define {key} {value}\n{content}");
        }
        let spirv = self.compiler.compile(&content, kind, &source.to_string_lossy())?;
        Ok((spirv, content))
    }

    /// Inserts a freshly compiled pipeline under `key`, or, if `key` already names an entry,
    /// updates it in place and bumps its version -- recompiling the same source always returns
    /// the same handle.
    fn insert_or_update(
        &mut self,
        key: PipelineKey,
        source: PipelineSource,
        object: PipelineObject,
        spirv: Vec<Vec<u32>>,
        uniform_layout: HashMap<String, UniformInfo>,
    ) -> Result<PipelineHandle> {
        if let Some(&index) = self.keys.get(&key) {
            let entry = self.entries[index as usize]
                .as_mut()
                .expect("key map points at a live entry");
            entry.object.destroy();
            entry.source = source;
            entry.object = object;
            entry.spirv = spirv;
            entry.uniform_layout = uniform_layout;
            entry.version += 1;
            return Ok(PipelineHandle { index, version: entry.version });
        }

        let entry = PipelineEntry {
            source,
            object,
            version: 1,
            spirv,
            bound_resources: Vec::new(),
            uniform_layout,
        };
        let index = match self.free_list.pop() {
            Some(index) => {
                self.entries[index as usize] = Some(entry);
                index
            }
            None => {
                let index = self.entries.len() as u32;
                self.entries.push(Some(entry));
                index
            }
        };
        self.keys.insert(key, index);
        Ok(PipelineHandle {
            index,
            version: self.entries[index as usize].as_ref().unwrap().version,
        })
    }

    fn entry(&self, handle: PipelineHandle) -> Result<&PipelineEntry> {
        self.entries
            .get(handle.index as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| anyhow::Error::from(crate::GraphError::UnknownHandle))
    }

    fn entry_mut(&mut self, handle: PipelineHandle) -> Result<&mut PipelineEntry> {
        self.entries
            .get_mut(handle.index as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| anyhow::Error::from(crate::GraphError::UnknownHandle))
    }
}

impl<C: ShaderCompiler> Destructible for PipelineManager<C> {
    fn destroy(&mut self) {
        for entry in self.entries.iter_mut().flatten() {
            entry.object.destroy();
        }
    }
}

/// Scans the member declarations of every `layout(push_constant) uniform` block across `sources`
/// and computes a name -> offset/size table using `std430`-ish scalar sizes. Good enough to
/// resolve uniform names; a member this doesn't recognize falls back to 4 bytes.
fn reflect_uniform_layout(sources: &[String]) -> HashMap<String, UniformInfo> {
    let mut layout = HashMap::new();
    for source in sources {
        let mut in_block = false;
        let mut offset: u64 = 0;
        for line in source.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("layout") && trimmed.contains("push_constant") {
                in_block = true;
                offset = 0;
                continue;
            }
            if !in_block {
                continue;
            }
            if trimmed.starts_with('}') {
                in_block = false;
                continue;
            }
            if trimmed.is_empty() || trimmed.starts_with("//") {
                continue;
            }
            if let Some((ty, name)) = parse_member_decl(trimmed) {
                let size = glsl_type_size(&ty);
                layout.entry(name).or_insert(UniformInfo { offset, size });
                offset += size;
            }
        }
    }
    layout
}

/// Splits `int foo[4];` into `("int", "foo")`, dropping any array suffix from the name.
fn parse_member_decl(decl: &str) -> Option<(String, String)> {
    let decl = decl.trim_end_matches(';').trim();
    let mut parts = decl.split_whitespace();
    let ty = parts.next()?.to_string();
    let name = parts.next()?.split('[').next()?.to_string();
    Some((ty, name))
}

fn glsl_type_size(ty: &str) -> u64 {
    match ty {
        "float" | "int" | "uint" | "bool" => 4,
        "vec2" | "ivec2" | "uvec2" => 8,
        "vec3" | "ivec3" | "uvec3" => 12,
        "vec4" | "ivec4" | "uvec4" => 16,
        "mat3" => 48,
        "mat4" => 64,
        _ => 4,
    }
}
