use tokio::sync::mpsc::UnboundedSender;

pub mod gitlab;
pub use gitlab::{gitlab_webhook, Delivery, GitLabEvent};

pub struct EventSender(pub UnboundedSender<Event>);

#[derive(Debug)]
pub enum Event {
    GitLab(Delivery),
}
