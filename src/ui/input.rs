//! Keypress detection through a dedicated reader thread.
//!
//! Any byte read from the input ends playback. End-of-input is not a
//! keypress: with stdin redirected from an empty file the loop keeps running
//! until the stream ends.

use std::io::Read;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use tracing::debug;

pub struct KeyWatcher {
    rx: Receiver<u8>,
}

impl KeyWatcher {
    /// Watch standard input.
    pub fn stdin() -> Self {
        Self::spawn(std::io::stdin())
    }

    /// Watch an arbitrary byte source.
    pub fn spawn<R: Read + Send + 'static>(mut reader: R) -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let mut byte = [0u8; 1];
            loop {
                match reader.read(&mut byte) {
                    Ok(0) => break,
                    Ok(_) => {
                        if tx.send(byte[0]).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        debug!("Input reader stopped: {}", e);
                        break;
                    }
                }
            }
        });

        Self { rx }
    }

    /// Non-blocking check: has any byte arrived since the last call?
    pub fn pressed(&self) -> bool {
        match self.rx.try_recv() {
            Ok(_) => true,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    fn wait_for_press(watcher: &KeyWatcher) -> bool {
        let start = Instant::now();
        while start.elapsed() < Duration::from_millis(500) {
            if watcher.pressed() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_any_byte_is_a_press() {
        let watcher = KeyWatcher::spawn(Cursor::new(b"x".to_vec()));
        assert!(wait_for_press(&watcher));
    }

    #[test]
    fn test_end_of_input_is_not_a_press() {
        let watcher = KeyWatcher::spawn(Cursor::new(Vec::new()));
        assert!(!wait_for_press(&watcher));
    }
}
