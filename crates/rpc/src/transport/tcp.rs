//! Newline-delimited JSON over TCP.
//!
//! Each line a client writes is one request frame; each reply is written back
//! as one line on the same connection, in request order. A frame that is not
//! UTF-8 or is longer than the configured limit gets an error reply and the
//! connection stays open.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use catalog_products::ProductStore;

use crate::router::MessageRouter;

use super::TransportError;

/// Accept connections until `shutdown` resolves.
///
/// Connections already open keep being served by their own tasks; only the
/// accept loop stops.
pub async fn serve<S, F>(
    listener: TcpListener,
    router: Arc<MessageRouter<S>>,
    max_frame_bytes: usize,
    shutdown: F,
) -> Result<(), TransportError>
where
    S: ProductStore + 'static,
    F: Future<Output = ()>,
{
    info!(addr = %listener.local_addr()?, max_frame_bytes, "tcp transport listening");
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let router = Arc::clone(&router);
                    tokio::spawn(async move {
                        let served = serve_connection(stream, peer, router, max_frame_bytes).await;
                        if let Err(e) = served {
                            warn!(%peer, error = %e, "connection closed with error");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "failed to accept connection"),
            },
            () = &mut shutdown => {
                info!("tcp transport stopping");
                return Ok(());
            }
        }
    }
}

/// One line read off the socket.
enum Frame {
    Line(Vec<u8>),
    /// The line ran past the limit; its remainder has been discarded.
    Oversized,
    Eof,
}

async fn serve_connection<S>(
    stream: TcpStream,
    peer: SocketAddr,
    router: Arc<MessageRouter<S>>,
    max_frame_bytes: usize,
) -> std::io::Result<()>
where
    S: ProductStore,
{
    debug!(%peer, "connection opened");
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    loop {
        let handled = match read_frame(&mut reader, max_frame_bytes).await? {
            Frame::Eof => break,
            Frame::Oversized => {
                router.reject(None, format!("frame exceeds {max_frame_bytes} bytes"))
            }
            Frame::Line(bytes) => match String::from_utf8(bytes) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => router.handle_raw(&line).await,
                Err(e) => {
                    let reason = format!("frame is not valid UTF-8: {}", e.utf8_error());
                    let lossy = String::from_utf8_lossy(e.as_bytes()).into_owned();
                    router.reject(Some(&lossy), reason)
                }
            },
        };
        writer.write_all(handled.reply.to_line().as_bytes()).await?;
    }

    debug!(%peer, "connection closed");
    Ok(())
}

/// Read up to and including the next `\n`, holding at most `max_frame_bytes`
/// of payload in memory.
async fn read_frame<R>(reader: &mut R, max_frame_bytes: usize) -> std::io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    let limit = (max_frame_bytes as u64).saturating_add(1);
    let mut buf = Vec::new();

    let read = (&mut *reader).take(limit).read_until(b'\n', &mut buf).await?;
    if read == 0 {
        return Ok(Frame::Eof);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        return Ok(Frame::Line(buf));
    }
    if buf.len() <= max_frame_bytes {
        // Final frame without a trailing newline.
        return Ok(Frame::Line(buf));
    }

    loop {
        buf.clear();
        let read = (&mut *reader).take(limit).read_until(b'\n', &mut buf).await?;
        if read == 0 || buf.last() == Some(&b'\n') {
            return Ok(Frame::Oversized);
        }
    }
}
