use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::task::JoinHandle;

use crate::error::WorkerError;

pub fn pump_stdout<R>(rd: R, silent: bool) -> JoinHandle<Result<Vec<u8>, WorkerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    pump(rd, tokio::io::stdout(), "stdout", silent)
}

pub fn pump_stderr<R>(rd: R, silent: bool) -> JoinHandle<Result<Vec<u8>, WorkerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    pump(rd, tokio::io::stderr(), "stderr", silent)
}

/// Drain `rd` to EOF, keeping every byte in the returned buffer and,
/// unless `silent`, forwarding the same bytes to `wr` for live
/// visibility. Exact byte content is preserved in both destinations.
fn pump<R, W>(
    mut rd: R,
    mut wr: W,
    label: &'static str,
    silent: bool,
) -> JoinHandle<Result<Vec<u8>, WorkerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
    W: tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 16 * 1024];
        let mut captured: Vec<u8> = Vec::with_capacity(8 * 1024);

        loop {
            let n = rd.read(&mut buf).await.map_err(|e| WorkerError::StreamIo {
                stream: label,
                source: e,
            })?;
            if n == 0 {
                break;
            }

            captured.extend_from_slice(&buf[..n]);

            if !silent {
                wr.write_all(&buf[..n])
                    .await
                    .map_err(|e| WorkerError::StreamIo {
                        stream: label,
                        source: e,
                    })?;
            }
        }

        if !silent {
            let _ = wr.flush().await;
        }

        Ok(captured)
    })
}
