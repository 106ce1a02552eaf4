use std::sync::Arc;

use tracing::{debug, error};

use crate::codec::MessageCodec;
use crate::connection::ConnectionManager;
use crate::events::DisplayEvent;

/// Thin adapter from lifecycle events to the wire: encode, then hand to the
/// connection manager. No state of its own; events produced while the
/// channel is down are dropped by `send`.
pub struct EventReporter {
    connection: Arc<ConnectionManager>,
    codec: MessageCodec,
}

impl EventReporter {
    pub fn new(connection: Arc<ConnectionManager>, codec: MessageCodec) -> Self {
        Self { connection, codec }
    }

    pub async fn emit(&self, event: &DisplayEvent) {
        match self.codec.encode(event) {
            Ok(payload) => {
                debug!(event = event.event_type(), "-> monitor");
                self.connection.send(payload).await;
            }
            Err(err) => error!(error = %err, "failed to encode event"),
        }
    }
}
