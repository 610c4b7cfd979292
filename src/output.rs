use std::{
    ffi::OsStr,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use flate2::{Compression, write::GzEncoder};
use tempfile::NamedTempFile;

/// Output stream staged in a temporary file next to its destination.
///
/// Nothing appears at the destination until [`StagedOutput::commit`]; dropping
/// the stream removes the temporary file.
pub struct StagedOutput {
    sink: Sink,
    destination: PathBuf,
}

enum Sink {
    Plain(BufWriter<NamedTempFile>),
    Gzip(GzEncoder<BufWriter<NamedTempFile>>),
}

impl StagedOutput {
    /// Output paths ending in `.gz` are gzip-compressed.
    pub fn create(destination: &Path) -> Result<Self> {
        let directory = destination
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut builder = tempfile::Builder::new();
        builder.prefix(".diploid2haploid_").suffix(".tmp");
        // Same mode as a freshly created file, still subject to the umask.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }
        let temp = builder
            .tempfile_in(directory)
            .with_context(|| {
                format!(
                    "failed to create temporary output in {}",
                    directory.display()
                )
            })?;

        let writer = BufWriter::new(temp);
        let sink = if is_gzip_path(destination) {
            Sink::Gzip(GzEncoder::new(writer, Compression::default()))
        } else {
            Sink::Plain(writer)
        };

        Ok(Self {
            sink,
            destination: destination.to_path_buf(),
        })
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Flush everything and move the temporary file over the destination.
    pub fn commit(self) -> Result<()> {
        let writer = match self.sink {
            Sink::Plain(writer) => writer,
            Sink::Gzip(encoder) => encoder.finish().context("failed to finish gzip stream")?,
        };
        let temp = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .context("failed to flush output")?;
        temp.persist(&self.destination)
            .map_err(|e| e.error)
            .with_context(|| format!("failed to write output {}", self.destination.display()))?;
        Ok(())
    }
}

impl Write for StagedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.sink {
            Sink::Plain(writer) => writer.write(buf),
            Sink::Gzip(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.sink {
            Sink::Plain(writer) => writer.flush(),
            Sink::Gzip(writer) => writer.flush(),
        }
    }
}

fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}
