mod tail;

pub use tail::{read_tail, tail_bytes, tail_lossy};
