//! Length-prefixed framing for the daemon wire protocol.
//!
//! Every message on both the Broadcast and Command channels is one frame:
//! a 4-byte big-endian length followed by exactly that many bytes of UTF-8
//! payload. A frame is never split or merged once emitted.
//!
//! Reading is all-or-nothing: a connection that closes before a whole frame
//! arrives yields end-of-stream, never a partial payload.

use std::io::ErrorKind;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size in bytes of the length prefix.
pub const HEADER_LEN: usize = 4;

/// Errors that can occur while reading or writing frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The underlying connection failed.
    #[error("frame I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The payload was not valid UTF-8.
    #[error("frame payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// The payload did not arrive within the allowed time.
    #[error("timed out after {0:?} waiting for frame payload")]
    Timeout(Duration),

    /// The payload is larger than a `u32` length prefix can describe.
    #[error("payload of {0} bytes does not fit in a frame")]
    TooLarge(usize),
}

/// Encodes `payload` as one frame.
///
/// Fails with [`FrameError::TooLarge`] when the payload length does not fit
/// the `u32` prefix.
///
/// # Example
///
/// ```
/// let bytes = varwatch::frame::encode("hi").unwrap();
/// assert_eq!(bytes, vec![0, 0, 0, 2, b'h', b'i']);
/// ```
pub fn encode(payload: &str) -> Result<Vec<u8>, FrameError> {
    let body = payload.as_bytes();
    let len = length_prefix(body.len())?;
    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(body);
    Ok(out)
}

fn length_prefix(len: usize) -> Result<u32, FrameError> {
    u32::try_from(len).map_err(|_| FrameError::TooLarge(len))
}

/// Writes one frame and flushes the writer.
pub async fn write_frame<W>(writer: &mut W, payload: &str) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = encode(payload)?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one complete frame.
///
/// Returns `Ok(None)` when the connection ends before a full frame is
/// available (either inside the header or inside the payload).
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<String>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let Some(len) = read_header(reader).await? else {
        return Ok(None);
    };
    read_payload(reader, len).await
}

/// Reads one frame, waiting indefinitely for the header but bounding the
/// payload read by `body_timeout`.
///
/// Idle connections are allowed; a peer that stalls halfway through a frame
/// is not.
pub async fn read_frame_within<R>(
    reader: &mut R,
    body_timeout: Duration,
) -> Result<Option<String>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let Some(len) = read_header(reader).await? else {
        return Ok(None);
    };
    match tokio::time::timeout(body_timeout, read_payload(reader, len)).await {
        Ok(result) => result,
        Err(_) => Err(FrameError::Timeout(body_timeout)),
    }
}

async fn read_header<R>(reader: &mut R) -> Result<Option<u32>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    match reader.read_exact(&mut header).await {
        Ok(_) => Ok(Some(u32::from_be_bytes(header))),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn read_payload<R>(reader: &mut R, len: u32) -> Result<Option<String>, FrameError>
where
    R: AsyncRead + Unpin,
{
    // Grow with the data actually received instead of trusting the header
    // for the allocation size.
    let mut body = Vec::new();
    let read = (&mut *reader).take(u64::from(len)).read_to_end(&mut body).await?;
    if read < len as usize {
        return Ok(None);
    }
    Ok(Some(String::from_utf8(body)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    async fn round_trip(payload: &str) -> Option<String> {
        let bytes = encode(payload).unwrap();
        let mut reader = bytes.as_slice();
        read_frame(&mut reader).await.expect("decode should succeed")
    }

    #[test]
    fn test_encode_prefixes_big_endian_length() {
        let bytes = encode("abc").unwrap();
        assert_eq!(&bytes[..4], &[0, 0, 0, 3]);
        assert_eq!(&bytes[4..], b"abc");
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_length_beyond_u32_is_too_large() {
        assert_eq!(length_prefix(u32::MAX as usize).unwrap(), u32::MAX);
        let oversized = u32::MAX as usize + 1;
        assert!(matches!(
            length_prefix(oversized),
            Err(FrameError::TooLarge(len)) if len == oversized
        ));
    }

    #[test]
    fn test_encode_length_counts_bytes_not_chars() {
        let bytes = encode("é").unwrap();
        assert_eq!(&bytes[..4], &[0, 0, 0, 2]);
    }

    #[tokio::test]
    async fn test_round_trip_payloads() {
        for payload in ["", "x", "<code>a = 1\nb = 2", "naïve ✓ 变量", &"z".repeat(70_000)] {
            assert_eq!(round_trip(payload).await.as_deref(), Some(payload));
        }
    }

    #[tokio::test]
    async fn test_empty_stream_is_end_of_stream() {
        let mut reader: &[u8] = &[];
        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_short_header_is_end_of_stream() {
        let mut reader: &[u8] = &[0, 0];
        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_short_payload_is_end_of_stream() {
        let mut bytes = encode("hello").unwrap();
        bytes.truncate(7);
        let mut reader = bytes.as_slice();
        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_consecutive_frames_are_not_merged() {
        let mut bytes = encode("first").unwrap();
        bytes.extend(encode("").unwrap());
        bytes.extend(encode("third").unwrap());
        let mut reader = bytes.as_slice();
        assert_eq!(read_frame(&mut reader).await.unwrap().as_deref(), Some("first"));
        assert_eq!(read_frame(&mut reader).await.unwrap().as_deref(), Some(""));
        assert_eq!(read_frame(&mut reader).await.unwrap().as_deref(), Some("third"));
        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_an_error() {
        let bytes = [0u8, 0, 0, 2, 0xff, 0xfe];
        let mut reader = &bytes[..];
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, FrameError::InvalidUtf8(_)));
    }

    #[tokio::test]
    async fn test_read_blocks_until_frame_complete() {
        let (mut client, mut server) = duplex(64);
        let reader = tokio::spawn(async move { read_frame(&mut server).await });

        let bytes = encode("split").unwrap();
        client.write_all(&bytes[..3]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!reader.is_finished(), "reader returned before frame was complete");
        client.write_all(&bytes[3..]).await.unwrap();

        let result = reader.await.unwrap().unwrap();
        assert_eq!(result.as_deref(), Some("split"));
    }

    #[tokio::test]
    async fn test_write_frame_round_trip_over_duplex() {
        let (mut client, mut server) = duplex(1024);
        write_frame(&mut client, "<TEST>").await.unwrap();
        drop(client);
        assert_eq!(read_frame(&mut server).await.unwrap().as_deref(), Some("<TEST>"));
        assert!(read_frame(&mut server).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_frame_within_times_out_on_stalled_payload() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&[0, 0, 0, 10, b'a']).await.unwrap();
        let err = read_frame_within(&mut server, Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(err, FrameError::Timeout(_)));
        drop(client);
    }

    #[tokio::test]
    async fn test_read_frame_within_allows_idle_header_wait() {
        let (mut client, mut server) = duplex(64);
        let reader = tokio::spawn(async move {
            read_frame_within(&mut server, Duration::from_millis(30)).await
        });
        tokio::time::sleep(Duration::from_millis(60)).await;
        write_frame(&mut client, "late").await.unwrap();
        assert_eq!(reader.await.unwrap().unwrap().as_deref(), Some("late"));
    }
}
