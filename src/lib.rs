#![forbid(unsafe_code)]
//! Frame-accurate scroll-driven video scrubbing.
//!
//! A page is split into sections, each anchored to a freeze frame of a background video. Moving
//! between sections plays the video between freeze frames: forward moves on the source
//! encoding, backward moves on a time-reversed copy, with an invisible swap between the two.
//! Around that transport sit a gesture scheduler, an asset-readiness gate, a splash sequence and
//! a GIF timing patcher. Everything is driven by the host through [`Experience`].

pub mod config;
pub mod events;
mod foundation;
mod gif;
mod lifecycle;
mod scheduler;
mod session;
mod splash;
pub mod store;
mod timing;
mod transport;

pub use config::{
    DeviceClass, ExperienceConfig, GestureConfig, LifecycleConfig, PlaybackMode, SplashConfig,
    TransportConfig,
};
pub use events::{Event, Outbox, SplashCue};
pub use foundation::clock::{DEFAULT_REFRESH, Deadline, DeterministicClock, RefreshTicker};
pub use foundation::core::{FRAME_EPSILON_SECS, Fps, FrameIndex, Track, frame_to_time};
pub use foundation::error::{ScrubError, ScrubResult};
pub use gif::patch::{
    FADE_IN_CENTISECONDS, FALLBACK_DURATION_MS, GifLayout, PatchedGif, patch as patch_gif,
    patched_duration_ms, scan as scan_gif,
};
pub use lifecycle::readiness::{GateSignal, ReadinessGate};
pub use scheduler::gesture::{Intent, NavKey, TouchTracker, WheelAccumulator};
pub use scheduler::navigator::{InputOutcome, Navigator, PanelState};
pub use session::experience::Experience;
pub use session::simulation::{
    LoggedEvent, Script, ScriptInput, ScriptStep, Simulation, SimulationReport,
};
pub use splash::orchestrator::{SplashOrchestrator, SplashStage, Viewport};
pub use store::{KeyValueStore, MemoryStore};
pub use timing::table::{SectionTimingEntry, SectionTimingTable};
pub use transport::dual::{DualTransport, TransportEvent};
pub use transport::handle::PlaybackHandle;
pub use transport::segment::{Phase, SegmentPlan};
pub use transport::sim::{SimCall, SimVideo};
