use anyhow::Result;

/// Which shader stage a piece of GLSL source targets. Determines the `shaderc` compile profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Compute,
    Vertex,
    Fragment,
    Geometry,
}

/// Responsible for turning GLSL source into SPIR-V words.
pub trait ShaderCompiler {
    /// Creates a new compiler
    fn new() -> Self;

    /// Compiles `in_path` to `out_path` if `out_path` is missing or older than `in_path`.
    fn compile_file(
        &self,
        in_path: std::path::PathBuf,
        out_path: std::path::PathBuf,
        shader_kind: ShaderKind,
    ) -> Result<()>;

    /// Compiles GLSL source directly, returning SPIR-V words.
    fn compile(&self, content: &str, shader_kind: ShaderKind, shader_name: &str) -> Result<Vec<u32>>;
}

/// True if `in_path` does not exist in compiled form, or `out_path` is missing or stale relative
/// to it.
pub fn is_file_newer(in_path: std::path::PathBuf, out_path: std::path::PathBuf) -> Result<bool> {
    if !out_path.exists() {
        return Ok(true);
    }
    let in_modified = std::fs::metadata(in_path)?.modified()?;
    let out_modified = std::fs::metadata(out_path)?.modified()?;
    Ok(in_modified > out_modified)
}