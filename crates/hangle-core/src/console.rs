//! Operator-facing output.

use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

/// Shared writer for text the operator reads: command results, engine
/// log notices and usage errors.
///
/// Kept separate from `tracing` output, which goes to stderr.
#[derive(Clone)]
pub struct Console {
    writer: Arc<Mutex<BufWriter<Box<dyn AsyncWrite + Send + Unpin>>>>,
    crlf: bool,
}

impl Console {
    /// Create a console over a writer.
    #[must_use]
    pub fn new(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            writer: Arc::new(Mutex::new(BufWriter::new(Box::new(writer)))),
            crlf: false,
        }
    }

    /// Console over the process stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }

    /// Terminate lines with `\r\n`, for terminals in raw mode.
    #[must_use]
    pub const fn with_crlf(mut self, crlf: bool) -> Self {
        self.crlf = crlf;
        self
    }

    /// Print a line.
    ///
    /// # Errors
    /// Returns error if write fails.
    pub async fn print_line(&self, text: &str) -> Result<(), std::io::Error> {
        let mut guard = self.writer.lock().await;
        if self.crlf {
            for (i, line) in text.split('\n').enumerate() {
                if i > 0 {
                    guard.write_all(b"\r\n").await?;
                }
                guard.write_all(line.as_bytes()).await?;
            }
            guard.write_all(b"\r\n").await?;
        } else {
            guard.write_all(text.as_bytes()).await?;
            guard.write_all(b"\n").await?;
        }
        guard.flush().await?;
        Ok(())
    }

    /// Print a line, logging instead of failing.
    pub async fn say(&self, text: &str) {
        if let Err(e) = self.print_line(text).await {
            tracing::error!("Failed to write to console: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    #[tokio::test]
    async fn test_print_line() {
        let (writer, mut reader) = tokio::io::duplex(256);
        let console = Console::new(writer);
        console.print_line("hello").await.unwrap();

        let mut buf = vec![0; 6];
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, b"hello\n");
    }

    #[tokio::test]
    async fn test_crlf_translation() {
        let (writer, mut reader) = tokio::io::duplex(256);
        let console = Console::new(writer).with_crlf(true);
        console.say("a\nb").await;

        let mut buf = vec![0; 6];
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, b"a\r\nb\r\n");
    }
}
