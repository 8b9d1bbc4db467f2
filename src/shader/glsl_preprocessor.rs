use anyhow::Result;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

/// Handles pre-processing GLSL shaders

/// Result
pub struct ResolvedInclude {
    /// Name of the resolved include file (Should be absolute)
    pub resolved_name: String,

    /// Contents of the resolve include file
    pub content: String,
}

/// Handles #include directives into glsl
#[derive(Debug, Clone, Default)]
pub struct IncludeContext {
    included_files: HashSet<PathBuf>,
    include_stack: VecDeque<PathBuf>,
    virtual_files: HashMap<PathBuf, String>,
}

impl IncludeContext {
    pub fn new() -> Self {
        Self {
            included_files: HashSet::new(),
            include_stack: VecDeque::new(),
            virtual_files: HashMap::new(),
        }
    }

    /// Registers a synthetic source file resolved before the filesystem search, keyed by exactly
    /// the path used to reference it (as a main source or as an `#include` target).
    pub fn set_virtual_file(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.virtual_files.insert(path.into(), contents.into());
    }

    /// Reads `path`, consulting the virtual-file table before the filesystem.
    pub fn read(&self, path: &Path) -> Result<String> {
        match self.virtual_files.get(path) {
            Some(content) => Ok(content.clone()),
            None => Ok(fs::read_to_string(path)?),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.virtual_files.contains_key(path) || path.exists()
    }

    pub fn resolve_include(
        &mut self,
        source_path: PathBuf,
        include_path: PathBuf,
    ) -> Result<ResolvedInclude> {
        if self.include_stack.contains(&include_path) {
            return Err(anyhow::anyhow!(format!(
                "Invalid #include usage found in {:?}. Trying to include {:?}",
                &source_path, &include_path
            )));
        } else if self.included_files.contains(&include_path) {
            // double include
            return Ok(ResolvedInclude {
                resolved_name: include_path.to_string_lossy().to_string(),
                content: String::new(),
            });
        }
        self.include_stack.push_back(include_path.clone());

        let res = if self.exists(&include_path) {
            let content = self.read(&include_path)?;
            self.included_files.insert(include_path.clone());
            Ok(ResolvedInclude {
                resolved_name: include_path.to_string_lossy().to_string(),
                content,
            })
        } else {
            Err(anyhow::anyhow!(format!(
                "Tried to #include for {:?} in {:?}. Does not exist.",
                &include_path, &source_path
            )))
        };
        self.include_stack.pop_back();
        res
    }
}
