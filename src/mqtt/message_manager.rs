use chrono::NaiveDateTime;
use std::fmt;
use tracing::info;

/// Inbound message as delivered to a [`MessageHandler`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MQTTMessage {
    pub topic: String,
    pub content: String,
    pub timestamp: NaiveDateTime,
}

impl fmt::Display for MQTTMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} - {}: {}", self.timestamp, self.topic, self.content)
    }
}

impl MQTTMessage {
    /// Wraps a raw publish payload; invalid UTF-8 is replaced, not rejected
    pub fn from_publish(topic: &str, payload: &[u8]) -> Self {
        MQTTMessage {
            topic: topic.to_string(),
            content: String::from_utf8_lossy(payload).into_owned(),
            timestamp: chrono::Local::now().naive_local(),
        }
    }
}

/// Receives every message the broker delivers on a subscribed topic.
///
/// Called from the event-loop task, so implementations should return quickly.
pub trait MessageHandler: Send + 'static {
    fn handle(&mut self, message: MQTTMessage);
}

impl<F> MessageHandler for F
where
    F: FnMut(MQTTMessage) + Send + 'static,
{
    fn handle(&mut self, message: MQTTMessage) {
        self(message)
    }
}

/// Default handler: logs topic and payload, nothing else
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHandler;

impl MessageHandler for LogHandler {
    fn handle(&mut self, message: MQTTMessage) {
        info!(topic = %message.topic, "message {}", message.content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_decoded_lossily() {
        let msg = MQTTMessage::from_publish("/pk/dn/user/control", b"on\xff");
        assert_eq!(msg.topic, "/pk/dn/user/control");
        assert_eq!(msg.content, "on\u{fffd}");
    }

    #[test]
    fn closures_are_handlers() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut handler = move |m: MQTTMessage| tx.send(m.content).unwrap();
        handler.handle(MQTTMessage::from_publish("t", b"one"));
        handler.handle(MQTTMessage::from_publish("t", b"two"));
        drop(handler);

        let seen: Vec<String> = rx.iter().collect();
        assert_eq!(seen, vec!["one".to_string(), "two".to_string()]);
    }
}
