//! Complete-frame source abstraction over a device byte stream

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};

/// A lazy sequence of complete status-report frames
///
/// One source is built per session and discarded on reconnect. The concrete
/// framing strategy is selected per device capability; all current monitors
/// speak the newline-delimited variant.
#[async_trait]
pub trait FrameSource: Send {
    /// Read the next complete frame
    ///
    /// Returns `Ok(None)` when the peer closed the stream cleanly.
    async fn next_frame(&mut self) -> io::Result<Option<String>>;
}

/// Newline-delimited framing over any async byte stream
pub struct LineFrames<R> {
    lines: Lines<BufReader<R>>,
}

impl<R: AsyncRead + Unpin + Send> LineFrames<R> {
    pub fn new(stream: R) -> Self {
        Self {
            lines: BufReader::new(stream).lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> FrameSource for LineFrames<R> {
    async fn next_frame(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_line_frames_split_on_newlines() {
        let stream: &[u8] = b"v=120.0&n=A\nt_2=71.0\n";
        let mut source = LineFrames::new(stream);

        assert_eq!(source.next_frame().await.unwrap(), Some("v=120.0&n=A".to_string()));
        assert_eq!(source.next_frame().await.unwrap(), Some("t_2=71.0".to_string()));
        assert_eq!(source.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_line_frames_without_trailing_newline() {
        let stream: &[u8] = b"v=120.0";
        let mut source = LineFrames::new(stream);

        assert_eq!(source.next_frame().await.unwrap(), Some("v=120.0".to_string()));
        assert_eq!(source.next_frame().await.unwrap(), None);
    }
}
