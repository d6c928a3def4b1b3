// consent-store/src/events.rs
use actix::prelude::*;
use common::models::consent::ConsentType;

/// Broadcast whenever the visitor's consent decision changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Message)]
#[rtype(result = "()")]
pub struct ConsentChanged {
    pub consent: ConsentType,
}

/// Fire-and-forget fan-out to passive listeners. No ordering between
/// listeners and no way for a listener to veto the change.
#[derive(Default)]
pub struct ConsentBroadcaster {
    subscribers: Vec<Recipient<ConsentChanged>>,
}

impl ConsentBroadcaster {
    pub fn subscribe(&mut self, recipient: Recipient<ConsentChanged>) {
        self.subscribers.push(recipient);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn broadcast(&mut self, consent: ConsentType) {
        // Listeners that stopped are dropped rather than reported
        self.subscribers.retain(|r| r.connected());

        for recipient in &self.subscribers {
            recipient.do_send(ConsentChanged { consent });
        }

        tracing::debug!(
            "Consent change {:?} sent to {} listener(s)",
            consent,
            self.subscribers.len()
        );
    }
}
