//! External document compiler.
//!
//! Each compile gets its own `tempfile` directory. The `TempDir` guard removes
//! it when `compile` returns, whichever path it returns by, so concurrent
//! requests never share a working directory and failures leave no residue.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

const SOURCE_FILE: &str = "resume.tex";
const OUTPUT_FILE: &str = "resume.pdf";
const WORK_DIR_PREFIX: &str = "rb-";
/// Bytes of compiler stderr kept for the log on failure.
const STDERR_TAIL: usize = 2048;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("working directory I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to start compiler '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("compiler timed out after {0:?}")]
    Timeout(Duration),

    #[error("compiler exited with {status}")]
    Failed { status: String },

    #[error("compiler produced no output file")]
    MissingOutput,
}

/// Turns LaTeX source into PDF bytes.
///
/// Carried in `AppState` as `Arc<dyn Compiler>`.
#[async_trait]
pub trait Compiler: Send + Sync {
    async fn compile(&self, source: &str) -> Result<Bytes, RenderError>;
}

/// Runs `tectonic -X compile <file> --outdir <dir>` in a fresh temp directory.
#[derive(Debug, Clone)]
pub struct TectonicCompiler {
    program: PathBuf,
    timeout: Duration,
    work_root: PathBuf,
}

impl TectonicCompiler {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration, work_root: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout,
            work_root: work_root.into(),
        }
    }

    fn command(&self, tex_path: &Path, out_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-X")
            .arg("compile")
            .arg(tex_path)
            .arg("--outdir")
            .arg(out_dir)
            .current_dir(out_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Compiler for TectonicCompiler {
    async fn compile(&self, source: &str) -> Result<Bytes, RenderError> {
        let work_dir = tempfile::Builder::new()
            .prefix(WORK_DIR_PREFIX)
            .tempdir_in(&self.work_root)?;
        let tex_path = work_dir.path().join(SOURCE_FILE);
        tokio::fs::write(&tex_path, source).await?;
        debug!("Compiling {} bytes in {}", source.len(), work_dir.path().display());

        let started = Instant::now();
        let mut child = self
            .command(&tex_path, work_dir.path())
            .spawn()
            .map_err(|source| RenderError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        // Drain stderr concurrently so a chatty compiler cannot block on a full pipe.
        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut pipe) = stderr {
                let _ = pipe.read_to_end(&mut buf).await;
            }
            buf
        });

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                // Reap before the work dir is removed.
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed-out compiler: {e}");
                }
                warn!("Compiler timed out after {:?}", self.timeout);
                return Err(RenderError::Timeout(self.timeout));
            }
        };
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            warn!(
                "Compiler exited with {status} after {:?}: {}",
                started.elapsed(),
                tail(&stderr)
            );
            return Err(RenderError::Failed {
                status: status.to_string(),
            });
        }

        let pdf = match tokio::fs::read(work_dir.path().join(OUTPUT_FILE)).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => return Err(RenderError::MissingOutput),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RenderError::MissingOutput)
            }
            Err(e) => return Err(e.into()),
        };

        debug!("Compiled {} byte PDF in {:?}", pdf.len(), started.elapsed());
        Ok(Bytes::from(pdf))
    }
}

fn tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}
