use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::error::{Error, Result};

/// A destination for collecting and writing generated wrapper source lines.
///
/// `Destination` is the last step of the pipeline: it accumulates the lines produced by
/// [`crate::Generator::generate`] and writes them to a file.
///
/// # Usage
///
/// ```rust,no_run
/// use boostgen::{Destination, Generator};
///
/// # fn run(generator: Generator) -> boostgen::Result<()> {
/// let destination: Destination = generator.generate()?.into_iter().collect();
/// let written = destination.write("vulkan_boost.das")?;
/// # Ok(())
/// # }
/// ```
///
/// # File Writing
///
/// The [`write`](Self::write) method resolves the path:
/// - Relative paths are resolved against the `OUT_DIR` environment variable when it is
///   set (inside `build.rs`), otherwise against the current directory
/// - Absolute paths are used as-is
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Destination {
    lines: Vec<String>,
}

impl FromIterator<String> for Destination {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}

impl Destination {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The file content: every line terminated by a newline
    pub fn content(&self) -> String {
        let mut content = self.lines.join("\n");
        content.push('\n');
        content
    }

    /// Write the collected lines to a file and return the path written.
    ///
    /// Missing parent directories are created.
    pub fn write<P: AsRef<Path>>(&self, filename: P) -> Result<PathBuf> {
        let filename = filename.as_ref();
        let file_path = match env::var_os("OUT_DIR") {
            Some(out_dir) if filename.is_relative() => PathBuf::from(out_dir).join(filename),
            _ => filename.to_path_buf(),
        };
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(&file_path, self.content()).map_err(|e| Error::io(&file_path, e))?;
        log::info!("wrote {} lines to {}", self.lines.len(), file_path.display());
        Ok(file_path)
    }
}
