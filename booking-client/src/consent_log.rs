// booking-client/src/consent_log.rs
use actix::{Actor, Context, Handler, Message};
use consent_store::ConsentChanged;

/// Passive listener that records consent changes in the log
#[derive(Debug, Default)]
pub struct ConsentLogger {
    logged: usize,
}

impl Actor for ConsentLogger {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::debug!("ConsentLogger started");
    }
}

impl Handler<ConsentChanged> for ConsentLogger {
    type Result = ();

    fn handle(&mut self, msg: ConsentChanged, _ctx: &mut Self::Context) {
        self.logged += 1;
        tracing::info!("Consent changed: {:?}", msg.consent);
    }
}

/// Answered once every change queued before it has been logged.
/// Returns how many changes were logged so far.
#[derive(Message)]
#[rtype(result = "usize")]
pub struct Flush;

impl Handler<Flush> for ConsentLogger {
    type Result = usize;

    fn handle(&mut self, _msg: Flush, _ctx: &mut Self::Context) -> usize {
        self.logged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::consent::ConsentType;

    #[actix::test]
    async fn test_flush_waits_for_queued_changes() {
        let logger = ConsentLogger::default().start();
        let recipient = logger.clone().recipient::<ConsentChanged>();

        recipient.do_send(ConsentChanged { consent: ConsentType::NecessaryOnly });
        recipient.do_send(ConsentChanged { consent: ConsentType::Undecided });

        assert_eq!(logger.send(Flush).await.unwrap(), 2);
    }
}
