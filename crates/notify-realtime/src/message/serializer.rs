//! JSON encoding and decoding for channel frames.

use notify_core::error::AppError;
use notify_core::result::AppResult;

use super::types::{InboundEvent, InboundFrame, OutboundMessage, WireEnvelope};

/// Decodes one inbound frame.
///
/// The envelope is parsed first so that an unrecognized `type` decodes to
/// [`InboundEvent::Unknown`] instead of failing. A recognized `type` whose
/// payload does not match is a decode error.
pub fn decode_inbound(text: &str) -> AppResult<InboundFrame> {
    let envelope: WireEnvelope = serde_json::from_str(text)
        .map_err(|e| AppError::decode(format!("Malformed envelope: {e}")))?;

    let event = match envelope.kind.as_str() {
        "notification" => InboundEvent::Notification(
            serde_json::from_value(envelope.data)
                .map_err(|e| AppError::decode(format!("Malformed notification payload: {e}")))?,
        ),
        "announcement" => InboundEvent::Announcement(
            serde_json::from_value(envelope.data)
                .map_err(|e| AppError::decode(format!("Malformed announcement payload: {e}")))?,
        ),
        "pong" => InboundEvent::Pong,
        _ => InboundEvent::Unknown {
            kind: envelope.kind,
        },
    };

    Ok(InboundFrame {
        event,
        user_id: envelope.user_id,
        timestamp: envelope.timestamp,
    })
}

/// Encodes an outbound message.
pub fn encode_outbound(msg: &OutboundMessage) -> AppResult<String> {
    Ok(serde_json::to_string(msg)?)
}
