use crate::correlator::Correlator;
use crate::protocol::{
    ClientEvent, InboundMessage, NotificationEnvelope, ResponseEnvelope, RpcEvent, RpcMethod,
    UpdateKind,
};
use crate::subscription::ControlEvent;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Classify one raw inbound line into at most one control event
///
/// Anything that fails here — undecodable JSON, an unmatched response id, a
/// payload that does not deserialize — is logged and dropped without
/// touching the connection.
pub(crate) fn handle_message(raw: &str, correlator: &Correlator) -> Option<ControlEvent> {
    tracing::debug!("Received: {}", raw);

    let message: InboundMessage = match serde_json::from_str(raw) {
        Ok(message) => message,
        Err(e) => {
            tracing::error!("Failed to decode message: {}", e);
            return None;
        }
    };

    match message {
        InboundMessage::Response(response) => handle_response(response, correlator),
        InboundMessage::Notification(NotificationEnvelope { method, params }) => {
            classify_update(&method, params, RpcEvent::Notification)
        }
    }
}

fn handle_response(response: ResponseEnvelope, correlator: &Correlator) -> Option<ControlEvent> {
    let Some(method) = correlator.resolve(response.id) else {
        tracing::error!("request for id {} not found", response.id);
        return None;
    };

    if let Some(error) = &response.error {
        // logged only; an accompanying result is still processed
        tracing::error!("{}: {}", method, error);
    }

    let result = response.result?;
    match method {
        RpcMethod::ClientGetStatus => Some(ControlEvent::Client {
            origin: RpcEvent::Response,
            event: ClientEvent::Updated,
            client: decode(result, "client status")?,
        }),
        RpcMethod::GroupGetStatus => Some(ControlEvent::Group {
            origin: RpcEvent::Response,
            group: decode(result, "group status")?,
        }),
        RpcMethod::ServerGetStatus => Some(ControlEvent::Server {
            origin: RpcEvent::Response,
            status: decode(result, "server status")?,
        }),
        _ => match serde_json::from_value::<NotificationEnvelope>(result) {
            // a Set command answered with the resulting update echoed back
            Ok(echo) => classify_update(&echo.method, echo.params, RpcEvent::Response),
            Err(_) => None,
        },
    }
}

fn classify_update(method: &str, params: Value, origin: RpcEvent) -> Option<ControlEvent> {
    match UpdateKind::from_method(method) {
        Some(UpdateKind::Client(event)) => Some(ControlEvent::Client {
            origin,
            event,
            client: decode(params, "client")?,
        }),
        Some(UpdateKind::Stream) => Some(ControlEvent::Stream {
            origin,
            stream: decode(params, "stream")?,
        }),
        Some(UpdateKind::Group) => Some(ControlEvent::Group {
            origin,
            group: decode(params, "group")?,
        }),
        Some(UpdateKind::Server) => Some(ControlEvent::Server {
            origin,
            status: decode(params, "server status")?,
        }),
        None if method.starts_with("Client.On") => {
            tracing::warn!("Unknown client event: {}", method);
            None
        }
        None => {
            tracing::debug!("Ignoring notification: {}", method);
            None
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::error!("Failed to decode {}: {}", what, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn send(correlator: &Correlator, method: RpcMethod) -> u64 {
        correlator.next_request(method, None).id
    }

    #[test]
    fn server_status_response_yields_one_server_update() {
        let correlator = Correlator::new();
        let id = send(&correlator, RpcMethod::ServerGetStatus);
        assert_eq!(id, 0);

        let raw = json!({"id": 0, "result": {"groups": [], "streams": []}}).to_string();
        let event = handle_message(&raw, &correlator).unwrap();
        assert!(matches!(
            event,
            ControlEvent::Server { origin: RpcEvent::Response, .. }
        ));
        // id 0 is no longer pending
        assert_eq!(correlator.resolve(0), None);
    }

    #[test]
    fn unsolicited_notification_yields_client_event() {
        let correlator = Correlator::new();
        let raw = json!({"method": "Client.OnConnect", "params": {"id": "c1"}}).to_string();
        let event = handle_message(&raw, &correlator).unwrap();
        match event {
            ControlEvent::Client { origin, event, client } => {
                assert_eq!(origin, RpcEvent::Notification);
                assert_eq!(event, ClientEvent::Connected);
                assert_eq!(client.id, "c1");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn echoed_update_in_set_response_is_classified_as_response() {
        let correlator = Correlator::new();
        let id = send(&correlator, RpcMethod::ClientSetVolume);
        let raw = json!({
            "id": id,
            "result": {"method": "Client.OnUpdate", "params": {"id": "c1"}}
        })
        .to_string();
        let event = handle_message(&raw, &correlator).unwrap();
        match event {
            ControlEvent::Client { origin, event, client } => {
                assert_eq!(origin, RpcEvent::Response);
                assert_eq!(event, ClientEvent::Updated);
                assert_eq!(client.id, "c1");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn response_for_unknown_id_is_dropped() {
        let correlator = Correlator::new();
        let raw = json!({"id": 999, "result": {"groups": []}}).to_string();
        assert!(handle_message(&raw, &correlator).is_none());
    }

    #[test]
    fn duplicate_response_resolves_only_once() {
        let correlator = Correlator::new();
        let id = send(&correlator, RpcMethod::ServerGetStatus);
        let raw = json!({"id": id, "result": {"groups": []}}).to_string();
        assert!(handle_message(&raw, &correlator).is_some());
        assert!(handle_message(&raw, &correlator).is_none());
    }

    #[test]
    fn each_notification_method_maps_to_its_event() {
        let correlator = Correlator::new();
        let cases = [
            ("Client.OnConnect", json!({"id": "c1"})),
            ("Client.OnDisconnect", json!({"id": "c1"})),
            ("Client.OnUpdate", json!({"id": "c1"})),
            ("Client.OnDelete", json!({"id": "c1"})),
            ("Stream.OnUpdate", json!({"id": "s1"})),
            ("Group.OnUpdate", json!({"id": "g1"})),
            ("Server.OnUpdate", json!({"groups": []})),
        ];
        for (method, params) in cases {
            let raw = json!({"method": method, "params": params}).to_string();
            let event = handle_message(&raw, &correlator)
                .unwrap_or_else(|| panic!("no event for {}", method));
            let matches = matches!(
                (method, &event),
                ("Client.OnConnect", ControlEvent::Client { event: ClientEvent::Connected, .. })
                    | ("Client.OnDisconnect", ControlEvent::Client { event: ClientEvent::Disconnected, .. })
                    | ("Client.OnUpdate", ControlEvent::Client { event: ClientEvent::Updated, .. })
                    | ("Client.OnDelete", ControlEvent::Client { event: ClientEvent::Deleted, .. })
                    | ("Stream.OnUpdate", ControlEvent::Stream { .. })
                    | ("Group.OnUpdate", ControlEvent::Group { .. })
                    | ("Server.OnUpdate", ControlEvent::Server { .. })
            );
            assert!(matches, "{} classified as {:?}", method, event);
        }
    }

    #[test]
    fn unknown_client_suffix_drops_only_that_message() {
        let correlator = Correlator::new();
        let raw = json!({"method": "Client.OnRename", "params": {"id": "c1"}}).to_string();
        assert!(handle_message(&raw, &correlator).is_none());
    }

    #[test]
    fn unknown_notification_method_is_ignored() {
        let correlator = Correlator::new();
        let raw = json!({"method": "Volume.OnChange", "params": {}}).to_string();
        assert!(handle_message(&raw, &correlator).is_none());
    }

    #[test]
    fn malformed_message_is_dropped() {
        let correlator = Correlator::new();
        assert!(handle_message("not json", &correlator).is_none());
        assert!(handle_message(r#"{"foo": 1}"#, &correlator).is_none());
    }

    #[test]
    fn error_object_does_not_suppress_result() {
        let correlator = Correlator::new();
        let id = send(&correlator, RpcMethod::ServerGetStatus);
        let raw = json!({
            "id": id,
            "error": {"code": -1, "message": "partial failure"},
            "result": {"groups": []}
        })
        .to_string();
        assert!(handle_message(&raw, &correlator).is_some());
    }

    #[test]
    fn error_only_response_yields_no_event() {
        let correlator = Correlator::new();
        let id = send(&correlator, RpcMethod::ClientSetName);
        let raw = json!({
            "id": id,
            "error": {"code": -32602, "message": "Invalid params"}
        })
        .to_string();
        assert!(handle_message(&raw, &correlator).is_none());
        // the request is resolved regardless
        assert_eq!(correlator.resolve(id), None);
    }

    #[test]
    fn set_response_without_echoed_update_is_ignored() {
        let correlator = Correlator::new();
        let id = send(&correlator, RpcMethod::GroupSetStream);
        let raw = json!({"id": id, "result": "ok"}).to_string();
        assert!(handle_message(&raw, &correlator).is_none());
    }

    #[test]
    fn undecodable_entity_payload_is_dropped() {
        let correlator = Correlator::new();
        // client id must be a string
        let raw = json!({"method": "Client.OnConnect", "params": {"id": 5}}).to_string();
        assert!(handle_message(&raw, &correlator).is_none());
    }

    #[test]
    fn responses_after_clear_are_unmatched() {
        let correlator = Correlator::new();
        let id = send(&correlator, RpcMethod::ServerGetStatus);
        correlator.clear();
        let raw = json!({"id": id, "result": {"groups": []}}).to_string();
        assert!(handle_message(&raw, &correlator).is_none());
    }
}
