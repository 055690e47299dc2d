use serde_json::Value;

/// Holds ICE candidates that arrive before the remote description. The two
/// peers' message streams are independently ordered, so candidates racing
/// ahead of the offer is normal; they must be applied later, never dropped.
#[derive(Debug, Default)]
pub struct CandidateBuffer {
    pending: Vec<Value>,
    remote_description_set: bool,
}

impl CandidateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the candidate when it can be applied right away, or buffers
    /// it until the remote description lands.
    pub fn accept(&mut self, candidate: Value) -> Option<Value> {
        if self.remote_description_set {
            Some(candidate)
        } else {
            self.pending.push(candidate);
            None
        }
    }

    /// Marks the remote description as set and drains buffered candidates
    /// in arrival order.
    pub fn remote_description_set(&mut self) -> Vec<Value> {
        self.remote_description_set = true;
        std::mem::take(&mut self.pending)
    }

    /// Back to buffering, e.g. after the peer connection is torn down.
    pub fn reset(&mut self) {
        self.remote_description_set = false;
        self.pending.clear();
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn early_candidates_are_buffered_then_flushed_in_order() {
        let mut buffer = CandidateBuffer::new();

        assert_eq!(buffer.accept(json!({"candidate": "a"})), None);
        assert_eq!(buffer.accept(json!({"candidate": "b"})), None);
        assert_eq!(buffer.pending_len(), 2);

        let flushed = buffer.remote_description_set();
        assert_eq!(flushed, vec![json!({"candidate": "a"}), json!({"candidate": "b"})]);
        assert_eq!(buffer.pending_len(), 0);
    }

    #[test]
    fn candidates_after_remote_description_pass_through() {
        let mut buffer = CandidateBuffer::new();
        buffer.remote_description_set();

        assert_eq!(
            buffer.accept(json!({"candidate": "c"})),
            Some(json!({"candidate": "c"}))
        );
    }

    #[test]
    fn reset_returns_to_buffering() {
        let mut buffer = CandidateBuffer::new();
        buffer.remote_description_set();
        buffer.reset();

        assert_eq!(buffer.accept(json!({"candidate": "d"})), None);
    }
}
