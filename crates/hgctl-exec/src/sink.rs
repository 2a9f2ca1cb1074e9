use std::io;
use std::path::Path;
use std::process::Stdio;

use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;

/// Combined stdout/stderr capture backed by a temporary file.
///
/// Both streams are handed duplicates of the same file handle, so writes land
/// in the order the process made them. The backing file is deleted when the
/// sink is dropped.
pub(crate) struct CaptureSink {
    file: NamedTempFile,
}

impl CaptureSink {
    /// Create the backing file in `dir`, or the system temp dir when `None`
    pub(crate) fn new_in(dir: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("hg_cmd");
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(Self { file })
    }

    /// Stdio handles for the child's stdout and stderr
    pub(crate) fn stdio(&self) -> io::Result<(Stdio, Stdio)> {
        let stdout = self.file.as_file().try_clone()?;
        let stderr = self.file.as_file().try_clone()?;
        Ok((Stdio::from(stdout), Stdio::from(stderr)))
    }

    /// Read everything captured so far from the start of the file
    pub(crate) async fn read(&self) -> io::Result<String> {
        let mut file = tokio::fs::File::from_std(self.file.reopen()?);
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).await?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &std::path::Path {
        self.file.path()
    }
}
