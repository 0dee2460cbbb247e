//! Realtime fan-out: the relay process and the API's client for it.

pub mod emitter;
pub mod protocol;
pub mod relay;
pub mod relay_http;

pub use emitter::RelayEmitter;
pub use protocol::{room_for_trip, Frame, RelayEvent, RELAY_PATH};
pub use relay::{RelayServer, RelayStats};
