/// Accumulates `(meta-line, payload-line)` pairs of a bulk request into one
/// or more NDJSON buffers, rolling to a new buffer whenever the next pair
/// would push the current one past the byte budget.
#[derive(Debug)]
pub struct BufferSlice {
    buffers: Vec<String>,
    max_size: usize,
}

impl BufferSlice {
    pub fn new(max_size: usize) -> Self {
        BufferSlice {
            buffers: Vec::new(),
            max_size,
        }
    }

    /// Appends one operation: the metadata line and its payload line.
    pub fn put_data(&mut self, meta: &str, payload: &str) {
        let entry_len = meta.len() + payload.len() + 2;
        let buffer = self.buffer_with_room(entry_len);
        buffer.push_str(meta);
        buffer.push('\n');
        buffer.push_str(payload);
        buffer.push('\n');
    }

    /// Appends a metadata-only operation (deletes carry no payload line).
    pub fn put_meta(&mut self, meta: &str) {
        let buffer = self.buffer_with_room(meta.len() + 1);
        buffer.push_str(meta);
        buffer.push('\n');
    }

    fn buffer_with_room(&mut self, entry_len: usize) -> &mut String {
        let needs_new = match self.buffers.last() {
            None => true,
            Some(current) => !current.is_empty() && current.len() + entry_len > self.max_size,
        };
        if needs_new {
            self.buffers.push(String::new());
        }
        self.buffers.last_mut().expect("just pushed")
    }

    pub fn buffers(&self) -> &[String] {
        &self.buffers
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.iter().all(String::is_empty)
    }
}
