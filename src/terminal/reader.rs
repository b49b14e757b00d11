use std::io::{self, Read};
use std::sync::mpsc::{Receiver, channel};
use std::thread;

/// Read PTY output on a background thread.
///
/// The thread ends at EOF, on a read error or once the receiver is dropped.
pub(crate) fn spawn_reader<R: Read + Send + 'static>(
    mut reader: R,
) -> io::Result<Receiver<Vec<u8>>> {
    let (tx, rx) = channel();

    thread::Builder::new()
        .name("reeltty-pty-reader".into())
        .spawn(move || {
            let mut buffer = [0u8; 4096];
            loop {
                match reader.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buffer[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        tracing::debug!("pty reader stopped: {error}");
                        break;
                    }
                }
            }
        })?;

    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    #[test]
    fn test_reader_forwards_chunks_until_eof() {
        let rx = spawn_reader(Cursor::new(b"hello from the pty".to_vec())).unwrap();
        let mut out = Vec::new();
        while let Ok(chunk) = rx.recv_timeout(Duration::from_secs(2)) {
            out.extend(chunk);
        }
        assert_eq!(out, b"hello from the pty");
    }
}
