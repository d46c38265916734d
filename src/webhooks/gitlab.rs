use std::io;

use anyhow::anyhow;
use rocket::{
    data::{ByteUnit, FromData, Outcome},
    http::Status,
    Data, Request, State,
};
use tracing::{debug, info, trace, warn};

pub mod error;
pub mod events;
pub mod kind;

pub use error::{AccessError, DecodeError, ParseError, UnknownKindError, ValidationError};
pub use events::*;
pub use kind::{ObjectKind, LEGACY_DEFAULT_KIND};

use crate::webhooks::{Event, EventSender};

const X_GITLAB_EVENT: &str = "X-Gitlab-Event";

/// Reads only the discriminator of a delivery, applying the same legacy rule as [`Delivery::decode`].
pub fn sniff_kind(payload: &[u8]) -> Result<ObjectKind, DecodeError> {
    kind::Envelope::open(payload).map(|envelope| envelope.kind)
}

#[rocket::post("/api/webhooks/gitlab", data = "<payload>")]
pub fn gitlab_webhook(payload: GitLabPayload, sender: &State<EventSender>) -> (Status, String) {
    let delivery = match Delivery::decode(payload.0.as_bytes()) {
        Ok(delivery) => delivery,
        Err(DecodeError::UnknownKind(e)) => {
            warn!("ignoring delivery: {}", e);
            debug!("unknown delivery:\n{}", e.payload);
            return (Status::Accepted, "ignored".to_owned());
        }
        Err(e @ DecodeError::Validation(_)) => {
            warn!("rejecting delivery: {}", e);
            return (Status::UnprocessableEntity, e.to_string());
        }
        Err(e @ DecodeError::Parse(_)) => {
            warn!("rejecting delivery: {}", e);
            return (Status::BadRequest, e.to_string());
        }
    };

    info!("received {} delivery", delivery.object_kind());

    if sender.0.send(Event::GitLab(delivery)).is_err() {
        warn!("event channel was closed, dropping delivery");
        return (Status::ServiceUnavailable, "not accepting events".to_owned());
    }

    (Status::Ok, "OK".to_owned())
}

/// Raw body of a GitLab delivery.
pub struct GitLabPayload(pub String);

const LIMIT: ByteUnit = ByteUnit::Mebibyte(1);

#[rocket::async_trait]
impl<'r> FromData<'r> for GitLabPayload {
    type Error = anyhow::Error;

    async fn from_data(request: &'r Request<'_>, data: Data<'r>) -> Outcome<'r, Self> {
        trace!("received payload on GitLab webhook endpoint: {:?}", request);

        if !request.content_type().map_or(false, |ct| ct.is_json()) {
            trace!(
                "content type `{:?}` wasn't json, stopping here...",
                request.content_type()
            );
            return Outcome::Error((Status::BadRequest, anyhow!("wrong content type")));
        }

        // informative only, the payload says what it is
        if let Some(event) = request.headers().get_one(X_GITLAB_EVENT) {
            trace!("{} header: {}", X_GITLAB_EVENT, event);
        }

        let size_limit = request.limits().get("json").unwrap_or(LIMIT);
        let content = match data.open(size_limit).into_string().await {
            Ok(s) if s.is_complete() => s.into_inner(),
            Ok(_) => {
                let eof = io::ErrorKind::UnexpectedEof;
                trace!("payload was too big");
                return Outcome::Error((
                    Status::PayloadTooLarge,
                    io::Error::new(eof, "data limit exceeded").into(),
                ));
            }
            Err(e) => return Outcome::Error((Status::BadRequest, e.into())),
        };

        Outcome::Success(GitLabPayload(content))
    }
}

#[cfg(test)]
mod tests {
    use rocket::{http::ContentType, local::blocking::Client, routes};
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    use super::*;

    fn client() -> (Client, UnboundedReceiver<Event>) {
        let (sender, receiver) = unbounded_channel();
        let rocket = rocket::build()
            .mount("/", routes![gitlab_webhook])
            .manage(EventSender(sender));

        (Client::tracked(rocket).unwrap(), receiver)
    }

    #[test]
    fn forwards_decoded_deliveries() {
        let (client, mut receiver) = client();

        let response = client
            .post("/api/webhooks/gitlab")
            .header(ContentType::JSON)
            .body(r#"{"after": "a", "ref": "refs/heads/master", "commits": []}"#)
            .dispatch();
        assert_eq!(response.status(), Status::Ok);

        let Event::GitLab(delivery) = receiver.try_recv().unwrap();
        assert_eq!(delivery.object_kind(), ObjectKind::Push);
        assert_eq!(delivery.branch(), Ok("master"));
    }

    #[test]
    fn maps_errors_to_statuses() {
        let (client, mut receiver) = client();
        let post = |body: &'static str| {
            client
                .post("/api/webhooks/gitlab")
                .header(ContentType::JSON)
                .body(body)
                .dispatch()
                .status()
        };

        assert_eq!(post("not json"), Status::BadRequest);
        assert_eq!(post(r#"{"ref": "refs/heads/master"}"#), Status::UnprocessableEntity);
        assert_eq!(post(r#"{"object_kind": "frobnicate"}"#), Status::Accepted);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn wants_json() {
        let (client, _receiver) = client();

        let response = client
            .post("/api/webhooks/gitlab")
            .header(ContentType::Plain)
            .body("{}")
            .dispatch();
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[test]
    fn sniffs_without_decoding() {
        // a push missing all of its fields still has a kind
        assert_eq!(sniff_kind(b"{}").unwrap(), ObjectKind::Push);
        assert_eq!(
            sniff_kind(br#"{"object_kind": "wiki_page"}"#).unwrap(),
            ObjectKind::WikiPage
        );
    }
}
