use crate::domain::event::PenaltyPaymentEvent;
use crate::domain::ports::EventDecoder;
use crate::error::DecodeError;

/// Decodes partition payloads encoded as JSON documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonEventDecoder;

impl EventDecoder for JsonEventDecoder {
    fn decode(&self, payload: &[u8]) -> Result<PenaltyPaymentEvent, DecodeError> {
        serde_json::from_slice(payload).map_err(|e| DecodeError(e.to_string()))
    }
}
