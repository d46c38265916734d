use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, trace, warn};

use crate::{config::ProlabConfig, webhooks::Event};

mod gitlab;
pub use gitlab::handle_gitlab_event;

pub(crate) mod utils;

/// Turns decoded deliveries into one-line announcements.
pub struct Announcer {
    config: ProlabConfig,
}

impl Announcer {
    pub fn new(config: ProlabConfig) -> Self {
        Self { config }
    }

    /// Announces events until every [`EventSender`](crate::webhooks::EventSender) is dropped.
    pub async fn run(&self, mut events: UnboundedReceiver<Event>) {
        debug!("running...");

        loop {
            let event = match events.recv().await {
                Some(event) => event,
                None => {
                    info!("all channel senders were dropped, exiting receive loop");
                    break;
                }
            };
            debug!("received event: {:?}", event);

            match self.handle_event(event) {
                Ok(Some(message)) => info!("{}", message),
                // event doesn't need an announcement
                Ok(None) => trace!("event didn't need to be announced"),
                Err(e) => warn!("encountered error while handling event: {}", e),
            }
        }
    }

    pub fn handle_event(&self, event: Event) -> anyhow::Result<Option<String>> {
        match event {
            Event::GitLab(delivery) => {
                if !self.config.events.is_enabled(delivery.object_kind()) {
                    trace!("{} events are disabled", delivery.object_kind());
                    return Ok(None);
                }
                handle_gitlab_event(&delivery, self.config.gitlab_url.as_ref())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::unbounded_channel;

    use crate::{
        config::EventToggles,
        webhooks::{gitlab::Delivery, EventSender},
    };

    use super::*;

    const PUSH: &[u8] = br#"{
        "after": "c1",
        "ref": "refs/heads/master",
        "user_name": "John Smith",
        "repository": {"name": "diaspora", "url": "git@localhost:diaspora.git"},
        "commits": [{"id": "c1", "message": "fixed readme"}]
    }"#;

    #[test]
    fn disabled_kinds_are_not_announced() {
        let announcer = Announcer::new(ProlabConfig {
            events: EventToggles {
                push_events: false,
                ..Default::default()
            },
            gitlab_url: None,
        });

        let delivery = Delivery::decode(PUSH).unwrap();
        assert_eq!(announcer.handle_event(Event::GitLab(delivery)).unwrap(), None);
    }

    #[test]
    fn enabled_kinds_are_announced() {
        let announcer = Announcer::new(ProlabConfig::default());

        let delivery = Delivery::decode(PUSH).unwrap();
        assert_eq!(
            announcer.handle_event(Event::GitLab(delivery)).unwrap(),
            Some("[diaspora] John Smith pushed 1 commit to master: fixed readme".to_owned())
        );
    }

    #[tokio::test]
    async fn run_stops_when_senders_are_dropped() {
        let (sender, receiver) = unbounded_channel();
        let sender = EventSender(sender);
        sender
            .0
            .send(Event::GitLab(Delivery::decode(PUSH).unwrap()))
            .unwrap();
        drop(sender);

        Announcer::new(ProlabConfig::default()).run(receiver).await;
    }
}
