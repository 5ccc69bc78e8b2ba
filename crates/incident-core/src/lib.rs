pub mod clock;
pub mod email;
pub mod envelope;
pub mod message_id;
pub mod state;

pub use clock::Clock;
pub use clock::FixedClock;
pub use clock::SystemClock;
pub use email::EmailData;
pub use envelope::ErrorCode;
pub use envelope::ErrorEnvelope;
pub use message_id::MessageId;
pub use state::ProcessingStatus;
pub use state::ServiceType;
