use std::path::Path;

/// Last `limit` bytes of `bytes`.
pub fn tail_bytes(bytes: &[u8], limit: usize) -> &[u8] {
    if bytes.len() > limit {
        &bytes[bytes.len() - limit..]
    } else {
        bytes
    }
}

/// Last `limit` bytes rendered as a lossy UTF-8 string. The cut is a
/// byte boundary, so a leading multi-byte character may come out as a
/// replacement character.
pub fn tail_lossy(bytes: &[u8], limit: usize) -> String {
    String::from_utf8_lossy(tail_bytes(bytes, limit)).into_owned()
}

/// Tail of a file on disk. Missing or unreadable files yield an empty
/// string: the capture files legitimately do not exist when a failure
/// happened before the task ran.
pub async fn read_tail(path: &Path, limit: usize) -> String {
    match tokio::fs::read(path).await {
        Ok(bytes) => tail_lossy(&bytes, limit),
        Err(_) => String::new(),
    }
}
