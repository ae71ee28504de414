//! Progress indicators for long-running operations
//!
//! Uses `linya` for allocation-free progress bars

use linya::{Bar, Progress};
use std::io::{self, Read};

/// Progress bar for an artifact download of known size
pub struct DownloadProgress {
  progress: Progress,
  bar: Bar,
}

impl DownloadProgress {
  pub fn new(total_bytes: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total_bytes, label.into());
    Self { progress, bar }
  }

  /// Advance by `n` bytes
  pub fn inc(&mut self, n: usize) {
    self.progress.inc_and_draw(&self.bar, n);
  }
}

/// Read `reader` to the end, drawing a bar when the length is known
pub fn read_with_progress(mut reader: impl Read, total: Option<usize>, label: &str) -> io::Result<Vec<u8>> {
  let mut buf = Vec::with_capacity(total.unwrap_or(0));
  let Some(total) = total.filter(|t| *t > 0) else {
    reader.read_to_end(&mut buf)?;
    return Ok(buf);
  };

  let mut bar = DownloadProgress::new(total, label);
  let mut chunk = [0u8; 64 * 1024];
  loop {
    let n = reader.read(&mut chunk)?;
    if n == 0 {
      break;
    }
    buf.extend_from_slice(&chunk[..n]);
    bar.inc(n);
  }
  Ok(buf)
}
