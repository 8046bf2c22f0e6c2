//! Application-Layer: Session, Transport, History, Workspace und Events.

pub mod events;
pub mod history;
pub mod session;
pub mod transport;
pub mod workspace;

pub use events::{CurveSetMessage, SessionEvent, TelemetryFrame};
pub use history::CurveHistory;
pub use session::{EditPhase, EditingSession, PositionHint};
pub use transport::{TimedSample, Transport, TransportState};
pub use workspace::Workspace;
