//! Comprehensive unit tests for inbound frame validation

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::message::event_types;

    const MAX: usize = 1024;

    #[test]
    fn test_valid_frames() {
        assert_eq!(
            validate_client_frame(r#"{"type":"ping"}"#, MAX).unwrap(),
            ClientMessage::Ping
        );
        assert!(matches!(
            validate_client_frame(r#"{"type":"subscribe","event_type":"incident.created"}"#, MAX),
            Ok(ClientMessage::Subscribe { .. })
        ));
        assert!(matches!(
            validate_client_frame(r#"{"type":"unsubscribe","event_type":"rule.updated"}"#, MAX),
            Ok(ClientMessage::Unsubscribe { .. })
        ));
    }

    #[test]
    fn test_oversized_frame() {
        let text = format!(r#"{{"type":"subscribe","event_type":"{}"}}"#, "a".repeat(MAX));
        assert!(matches!(
            validate_client_frame(&text, MAX),
            Err(ValidationError::MessageTooLarge { max: MAX, .. })
        ));
    }

    #[test]
    fn test_malformed_frames() {
        for text in ["", "not json", "[]", r#"{"kind":"ping"}"#, r#"{"type":"subscribe"}"#] {
            assert!(
                matches!(
                    validate_client_frame(text, MAX),
                    Err(ValidationError::InvalidFormat(_))
                ),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_event_type_rules() {
        for name in event_types::ALL {
            assert!(validate_event_type(name).is_ok(), "{name} should be valid");
        }
        for name in ["custom_events", "Incident-Created", "1st.event", "tenant:42/alerts"] {
            assert!(validate_event_type(name).is_ok(), "{name} should be valid");
        }

        for name in ["", "a b", "incident\ncreated", "tab\tbed", "caf\u{e9}", "<script>"] {
            assert!(validate_event_type(name).is_err(), "{name:?} should be invalid");
        }
        assert!(validate_event_type(&"a".repeat(MAX_EVENT_TYPE_LEN + 1)).is_err());
    }

    #[test]
    fn test_subscribe_with_bad_event_type() {
        assert!(matches!(
            validate_client_frame(r#"{"type":"subscribe","event_type":"DROP TABLE"}"#, MAX),
            Err(ValidationError::InvalidEventType(_))
        ));
    }
}
