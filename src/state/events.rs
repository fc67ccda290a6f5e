use crate::EngineEvent;
use tracing::info;

/// Append-only audit trail read by the external indexer.
///
/// Cursors are positions in the log; `since(cursor)` returns everything
/// appended at or after that position.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<EngineEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: EngineEvent) {
        info!(target: "intent_wallet::events", event = ?event, "Event emitted");
        self.events.push(event);
    }

    pub fn since(&self, cursor: usize) -> &[EngineEvent] {
        self.events.get(cursor..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::Address;

    #[test]
    fn test_cursor_reads() {
        let mut log = EventLog::new();
        let by = Address::repeat_byte(1);
        log.emit(EngineEvent::Paused { by });
        log.emit(EngineEvent::Unpaused { by });

        assert_eq!(log.since(0).len(), 2);
        assert_eq!(log.since(1), &[EngineEvent::Unpaused { by }]);
        assert!(log.since(2).is_empty());
        // Past the end is empty rather than a panic
        assert!(log.since(10).is_empty());
    }
}
