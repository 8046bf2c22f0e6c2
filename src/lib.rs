//! Motion Spline Editor Library.
//! Session-Engine für parametrische Bewegungskurven: Editing mit Undo/Redo,
//! Playback und Aufnahme gegen ein asynchrones Backend.

pub mod app;
pub mod backend;
pub mod core;
pub mod error;
pub mod render;
pub mod shared;

pub use app::{
    CurveHistory, CurveSetMessage, EditPhase, EditingSession, PositionHint, SessionEvent,
    TelemetryFrame, TimedSample, Transport, TransportState, Workspace,
};
pub use backend::{Backend, BackendReply, LoopbackBackend, MotionPlayerInfo, MotorInfo};
pub use core::{clip, scale, shift, stretch, BoundingBox, Curve};
pub use error::EditorError;
pub use render::{NullRenderer, Renderer};
pub use shared::SessionOptions;
