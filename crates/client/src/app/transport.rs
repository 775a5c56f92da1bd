use plaza_engine::{MotionUpdate, Transport};
use tracing::{debug, warn};

/// Stands in for the realtime channel: every update is encoded exactly as it
/// would go on the wire and logged instead of sent.
#[derive(Debug, Default)]
pub(crate) struct LoopbackTransport {
    sent: u64,
    encode_failures: u64,
    last: Option<MotionUpdate>,
}

impl LoopbackTransport {
    pub(crate) fn sent(&self) -> u64 {
        self.sent
    }

    pub(crate) fn encode_failures(&self) -> u64 {
        self.encode_failures
    }

    pub(crate) fn last(&self) -> Option<&MotionUpdate> {
        self.last.as_ref()
    }
}

impl Transport for LoopbackTransport {
    fn send(&mut self, update: &MotionUpdate) {
        match update.to_wire_json() {
            Ok(payload) => {
                self.sent = self.sent.saturating_add(1);
                debug!(seq = self.sent, payload = %payload, "motion_update_sent");
            }
            Err(error) => {
                self.encode_failures = self.encode_failures.saturating_add(1);
                warn!(error = %error, "motion_update_encode_failed");
            }
        }
        self.last = Some(update.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plaza_engine::{AvatarMotion, Vec2};

    fn update_at(x: f32) -> MotionUpdate {
        let motion = AvatarMotion::at(Vec2::new(x, 0.0));
        serde_json::from_value(serde_json::json!({
            "position": motion.position,
            "isMoving": false,
            "movementDirection": null,
            "walkFrame": 1,
            "facingDirection": "right",
            "isGrabbing": false,
            "isResizing": false,
            "isSitting": false,
            "vehicle": null,
            "speedMultiplier": 1.0
        }))
        .expect("update json")
    }

    #[test]
    fn counts_sends_and_keeps_the_latest_update() {
        let mut transport = LoopbackTransport::default();
        transport.send(&update_at(1.0));
        transport.send(&update_at(2.0));
        assert_eq!(transport.sent(), 2);
        assert_eq!(transport.encode_failures(), 0);
        assert_eq!(transport.last().map(|update| update.position.x), Some(2.0));
    }
}
