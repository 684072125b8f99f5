//! Streaming upload body with progress accounting.

use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use tokio::fs::File;
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc;

use najie_core::types::UploadProgress;

pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Receives one [`UploadProgress`] per chunk handed to the transport.
pub type ProgressSender = mpsc::UnboundedSender<UploadProgress>;

pub fn progress_channel() -> (ProgressSender, mpsc::UnboundedReceiver<UploadProgress>) {
    mpsc::unbounded_channel()
}

/// A local file read in fixed-size chunks, never held in memory whole.
///
/// Yields exactly `content_length` bytes; a file that shrinks mid-upload is an
/// `UnexpectedEof` error. Dropping the body closes the file.
pub struct UploadBody {
    file: File,
    buf: Vec<u8>,
    loaded: u64,
    total: u64,
    progress: Option<ProgressSender>,
}

impl UploadBody {
    pub async fn open(path: &Path, progress: Option<ProgressSender>) -> io::Result<Self> {
        let file = File::open(path).await?;
        let total = file.metadata().await?.len();
        Ok(Self::new(file, total, progress))
    }

    pub fn new(file: File, total: u64, progress: Option<ProgressSender>) -> Self {
        Self {
            file,
            buf: vec![0u8; UPLOAD_CHUNK_SIZE],
            loaded: 0,
            total,
            progress,
        }
    }

    pub fn content_length(&self) -> u64 {
        self.total
    }

    pub fn loaded(&self) -> u64 {
        self.loaded
    }

    fn report(&self) {
        if let Some(tx) = &self.progress {
            // A dropped receiver just means nobody is watching.
            let _ = tx.send(UploadProgress::new(self.loaded, self.total));
        }
    }
}

impl Stream for UploadBody {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.loaded >= this.total {
            return Poll::Ready(None);
        }

        let remaining = usize::try_from(this.total - this.loaded).unwrap_or(usize::MAX);
        let want = this.buf.len().min(remaining);
        let mut read_buf = ReadBuf::new(&mut this.buf[..want]);

        match Pin::new(&mut this.file).poll_read(cx, &mut read_buf) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(e)) => Poll::Ready(Some(Err(e))),
            Poll::Ready(Ok(())) => {
                let filled = read_buf.filled();
                if filled.is_empty() {
                    return Poll::Ready(Some(Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "file shrank during upload",
                    ))));
                }
                let chunk = Bytes::copy_from_slice(filled);
                this.loaded += chunk.len() as u64;
                this.report();
                Poll::Ready(Some(Ok(chunk)))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total.saturating_sub(self.loaded);
        let chunks = remaining.div_ceil(UPLOAD_CHUNK_SIZE as u64);
        let chunks = usize::try_from(chunks).unwrap_or(usize::MAX);
        (0, Some(chunks))
    }
}

impl std::fmt::Debug for UploadBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadBody")
            .field("loaded", &self.loaded)
            .field("total", &self.total)
            .finish()
    }
}
