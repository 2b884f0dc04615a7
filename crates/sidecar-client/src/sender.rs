use crate::ClientError;
use serde_json::Value;
use sidecar_core::wire::{encode_frame, Action, Envelope, DEFAULT_MAX_FRAME_BYTES};
use sidecar_core::CategoryRegistry;
use std::sync::Arc;

/// Validates and encodes operator-issued commands. Transmission itself is
/// the connection manager's job; its failures propagate unchanged.
#[derive(Debug, Clone)]
pub struct OutboundSender {
    registry: Arc<CategoryRegistry>,
    max_frame_bytes: usize,
}

impl OutboundSender {
    pub fn new(registry: Arc<CategoryRegistry>) -> Self {
        Self {
            registry,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    /// Parse the operator-supplied text as JSON and wrap it in an envelope.
    /// Nothing is transmitted on failure.
    pub fn build(
        &self,
        category: &str,
        action: Action,
        raw_text: &str,
    ) -> Result<Envelope, ClientError> {
        let message: Value = serde_json::from_str(raw_text)
            .map_err(|err| ClientError::InvalidPayload(err.to_string()))?;
        self.registry
            .get(category)
            .map_err(|err| ClientError::UnknownCategory(err.0))?;
        Ok(Envelope::new(category, action, message))
    }

    /// The category's configured refresh trigger.
    pub fn build_refresh(&self, category: &str) -> Result<Envelope, ClientError> {
        let config = self
            .registry
            .get(category)
            .map_err(|err| ClientError::UnknownCategory(err.0))?;
        Ok(Envelope::new(
            category,
            Action::Request,
            config.default_request_payload.clone(),
        ))
    }

    pub fn encode(&self, envelope: &Envelope) -> Result<String, ClientError> {
        Ok(encode_frame(envelope, self.max_frame_bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sender() -> OutboundSender {
        OutboundSender::new(Arc::new(CategoryRegistry::sidecar_default()))
    }

    #[test]
    fn build_wraps_parsed_json_in_an_envelope() {
        let envelope = sender()
            .build("nodes", Action::Info, r#"[{"id":1,"available":"ko"}]"#)
            .expect("build");
        assert_eq!(envelope.category, "nodes");
        assert_eq!(envelope.action, Action::Info);
        assert_eq!(envelope.message, json!([{"id": 1, "available": "ko"}]));
    }

    #[test]
    fn unparsable_payload_is_rejected_before_any_transmission() {
        let err = sender()
            .build("nodes", Action::Info, "{not json")
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidPayload(_)));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let err = sender()
            .build("usrps", Action::Request, "\"PLEASE\"")
            .unwrap_err();
        assert!(matches!(err, ClientError::UnknownCategory(name) if name == "usrps"));
    }

    #[test]
    fn refresh_uses_the_registered_sentinel() {
        let envelope = sender().build_refresh("leases").expect("build");
        assert_eq!(envelope.action, Action::Request);
        assert_eq!(envelope.message, json!("PLEASE"));
    }
}
