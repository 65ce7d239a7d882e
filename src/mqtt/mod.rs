//! # MQTT Device Session
//!
//! Everything needed to put the simulated device on the broker:
//!
//! ```text
//! mqtt/
//! ├── signer.rs           - Sorted-key canonical string + HMAC-SHA1 password
//! ├── credentials.rs      - Client id, username and password for CONNECT
//! ├── topics.rs           - Property post and control topic names
//! ├── message_manager.rs  - Inbound message type and handler trait
//! └── mqtt_handler.rs     - Event-loop task, telemetry publisher, session handle
//! ```
//!
//! ## Task Layout
//!
//! ```text
//!                 ┌─► run_event_loop ──► MessageHandler (control topic)
//! DeviceHandle ───┤
//!                 └─► TelemetryPublisher ──► property post topic (every interval)
//! ```
//!
//! The two tasks share nothing but the read-only [`Config`](crate::config::Config)
//! they were built from. Connection lifecycle, including reconnecting after a
//! dropped connection, belongs to `rumqttc`.

pub mod credentials;
pub mod message_manager;
pub mod mqtt_handler;
pub mod signer;
pub mod topics;
