//! Headless driver: an [`Experience`] wired to two [`SimVideo`]s and a fixed refresh ticker.
//!
//! Used by the CLI `simulate` command and by integration tests. Inputs are applied between
//! ticks; every emitted event is logged with the tick time it was observed at.

use std::time::Duration;

use tracing::debug;

use crate::config::ExperienceConfig;
use crate::events::Event;
use crate::foundation::clock::RefreshTicker;
use crate::foundation::core::Track;
use crate::foundation::error::{ScrubError, ScrubResult};
use crate::scheduler::gesture::NavKey;
use crate::session::experience::Experience;
use crate::splash::orchestrator::{SplashStage, Viewport};
use crate::store::{MemoryStore, RETURN_SECTION_KEY, SPLASH_COMPLETED_KEY};
use crate::transport::sim::SimVideo;

/// Two-frame 1x1 GIF89a with an infinite NETSCAPE2.0 loop; stands in for the splash signature.
const SIM_SIGNATURE_GIF: &[u8] = &[
    b'G', b'I', b'F', b'8', b'9', b'a', 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, //
    0x21, 0xFF, 0x0B, b'N', b'E', b'T', b'S', b'C', b'A', b'P', b'E', b'2', b'.', b'0', 0x03,
    0x01, 0x00, 0x00, 0x00, //
    0x21, 0xF9, 0x04, 0x00, 0x0A, 0x00, 0x00, 0x00, //
    0x2C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, //
    0x21, 0xF9, 0x04, 0x00, 0x14, 0x00, 0x00, 0x00, //
    0x2C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, //
    0x3B,
];

/// An event and the simulated time it was drained at.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct LoggedEvent {
    /// Milliseconds since the simulation started.
    pub at_ms: u64,
    /// The event.
    #[serde(flatten)]
    pub event: Event,
}

/// One host input, as written in a script.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum ScriptInput {
    /// Every asset loads successfully.
    LoadAllAssets,
    /// One video can play through.
    VideoReady {
        /// Which video.
        track: Track,
    },
    /// One content image settled.
    ImageSettled {
        /// `false` for a load error.
        #[serde(default = "yes")]
        loaded: bool,
    },
    /// Window `load`.
    WindowLoad,
    /// Splash logo settled.
    LogoLoaded {
        /// `false` for a load error.
        #[serde(default = "yes")]
        ok: bool,
    },
    /// Splash signature fetched (a built-in GIF) or failed.
    SignatureFetched {
        /// `false` for a network error.
        #[serde(default = "yes")]
        ok: bool,
    },
    /// Splash signature decoded.
    SignatureDecoded {
        /// `false` for a decode error.
        #[serde(default = "yes")]
        ok: bool,
    },
    /// Viewport resized.
    Viewport {
        /// Width in CSS pixels.
        width: u32,
        /// Height in CSS pixels.
        height: u32,
    },
    /// Page visibility changed.
    Visibility {
        /// New visibility.
        visible: bool,
    },
    /// `pageshow`.
    PageShow {
        /// Restored from the back/forward cache.
        #[serde(default)]
        persisted: bool,
    },
    /// Time passes without any refresh ticks.
    Stall {
        /// Length of the stall.
        ms: u64,
    },
    /// Wheel event.
    Wheel {
        /// Vertical delta.
        delta_y: f64,
    },
    /// Touch start.
    TouchStart {
        /// Vertical position.
        y: f64,
    },
    /// Touch end.
    TouchEnd {
        /// Vertical position.
        y: f64,
    },
    /// Key press, by DOM key name.
    Key {
        /// `ArrowDown`, `PageUp`, `Home`, ...
        key: String,
    },
    /// Section indicator click.
    IndicatorClick {
        /// 1-based section.
        section: u32,
    },
    /// Tap on the tap-to-start prompt.
    Tap,
    /// Modal overlay opened or closed.
    Overlay {
        /// New state.
        open: bool,
    },
    /// Project link followed from `section`.
    OpenProject {
        /// 1-based section.
        section: u32,
    },
}

fn yes() -> bool {
    true
}

/// A timed input.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct ScriptStep {
    /// When to apply the input, in milliseconds since start.
    pub at_ms: u64,
    /// The input.
    #[serde(flatten)]
    pub input: ScriptInput,
}

/// Timed input sequence for [`Simulation::run_script`].
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct Script {
    /// Inputs; applied in `at_ms` order.
    pub steps: Vec<ScriptStep>,
    /// Total simulated time.
    pub run_ms: u64,
    /// Seek latency of both simulated videos.
    pub seek_latency_ms: u64,
    /// Initial contents of the persisted store.
    pub store: std::collections::BTreeMap<String, String>,
}

impl Script {
    /// Parse a JSON script.
    pub fn from_json(s: &str) -> ScrubResult<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Final state after a scripted run.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SimulationReport {
    /// Every event, in order.
    pub events: Vec<LoggedEvent>,
    /// Section current at the end.
    pub current_section: u32,
    /// Track visible at the end.
    pub active_track: Track,
    /// Navigation lock at the end.
    pub transitioning: bool,
    /// Splash stage at the end.
    pub splash_stage: SplashStage,
    /// Persisted return section, if one is stored.
    pub return_section: Option<String>,
    /// Whether the splash-completed flag is stored.
    pub splash_completed: bool,
}

/// [`Experience`] plus simulated media and a refresh ticker.
pub struct Simulation {
    experience: Experience,
    videos: [SimVideo; 2],
    ticker: RefreshTicker,
    log: Vec<LoggedEvent>,
}

impl Simulation {
    /// Simulation with instant seeks. The experience is started at time zero.
    pub fn new(cfg: ExperienceConfig, store: MemoryStore) -> ScrubResult<Self> {
        Self::with_seek_latency(cfg, store, Duration::ZERO)
    }

    /// Simulation whose videos take `latency` to complete each seek.
    pub fn with_seek_latency(
        cfg: ExperienceConfig,
        store: MemoryStore,
        latency: Duration,
    ) -> ScrubResult<Self> {
        // One extra frame so the last freeze frame is reachable.
        let duration = cfg.fps.frames_to_secs(cfg.total_frames.saturating_add(1));
        let videos = [
            SimVideo::new(duration).with_seek_latency(latency),
            SimVideo::new(duration).with_seek_latency(latency),
        ];
        let mut experience = Experience::new(cfg, Box::new(store))?;
        for track in Track::ALL {
            experience.mount(track, Box::new(videos[track.slot()].clone()));
        }
        experience.on_viewport(Viewport {
            width: 1440,
            height: 900,
        });
        let mut sim = Self {
            experience,
            videos,
            ticker: RefreshTicker::default(),
            log: Vec::new(),
        };
        sim.experience.start(sim.ticker.now());
        sim.collect();
        Ok(sim)
    }

    /// The driven experience.
    pub fn experience(&self) -> &Experience {
        &self.experience
    }

    /// The driven experience, for inputs not covered by [`ScriptInput`].
    pub fn experience_mut(&mut self) -> &mut Experience {
        &mut self.experience
    }

    /// Simulated video for `track`.
    pub fn video(&self, track: Track) -> &SimVideo {
        &self.videos[track.slot()]
    }

    /// Current simulated time.
    pub fn now(&self) -> Duration {
        self.ticker.now()
    }

    /// Events logged so far.
    pub fn events(&self) -> &[LoggedEvent] {
        &self.log
    }

    /// Logged events without their timestamps.
    pub fn event_kinds(&self) -> Vec<Event> {
        self.log.iter().map(|e| e.event).collect()
    }

    fn collect(&mut self) {
        let at_ms = u64::try_from(self.ticker.now().as_millis()).unwrap_or(u64::MAX);
        for event in self.experience.drain_events() {
            debug!(at_ms, ?event, "event");
            self.log.push(LoggedEvent { at_ms, event });
        }
    }

    fn advance_media(&self, dt: Duration) {
        for video in &self.videos {
            video.advance(dt);
        }
    }

    /// One display refresh.
    pub fn step(&mut self) {
        let dt = self.ticker.interval();
        let now = self.ticker.next_tick();
        self.advance_media(dt);
        self.experience.tick(now);
        self.collect();
    }

    /// Tick for `d`.
    pub fn run_for(&mut self, d: Duration) {
        let until = self.ticker.now() + d;
        while self.ticker.now() < until {
            self.step();
        }
    }

    /// Tick until `done` holds or `limit` elapses. Returns whether `done` held.
    pub fn run_until(
        &mut self,
        limit: Duration,
        mut done: impl FnMut(&Experience) -> bool,
    ) -> bool {
        let until = self.ticker.now() + limit;
        loop {
            if done(&self.experience) {
                return true;
            }
            if self.ticker.now() >= until {
                return false;
            }
            self.step();
        }
    }

    /// Let `d` pass with media running but no refresh ticks, as in a backgrounded tab.
    pub fn stall(&mut self, d: Duration) {
        self.ticker.stall(d);
        self.advance_media(d);
    }

    /// Report every asset as loaded.
    pub fn load_all_assets(&mut self) {
        let now = self.ticker.now();
        let images = self.experience.config().image_count;
        let exp = &mut self.experience;
        exp.on_logo_loaded(true);
        exp.on_signature_fetched(Ok(SIM_SIGNATURE_GIF.to_vec()));
        exp.on_signature_decoded(true);
        for track in Track::ALL {
            exp.on_video_ready(now, track);
        }
        for _ in 0..images {
            exp.on_image_settled(now, true);
        }
        exp.on_window_load(now);
        self.collect();
    }

    /// Apply one input at the current time.
    pub fn apply(&mut self, input: &ScriptInput) -> ScrubResult<()> {
        let now = self.ticker.now();
        let exp = &mut self.experience;
        match input {
            ScriptInput::LoadAllAssets => self.load_all_assets(),
            ScriptInput::VideoReady { track } => exp.on_video_ready(now, *track),
            ScriptInput::ImageSettled { loaded } => exp.on_image_settled(now, *loaded),
            ScriptInput::WindowLoad => exp.on_window_load(now),
            ScriptInput::LogoLoaded { ok } => exp.on_logo_loaded(*ok),
            ScriptInput::SignatureFetched { ok } => {
                let fetched = if *ok {
                    Ok(SIM_SIGNATURE_GIF.to_vec())
                } else {
                    Err("simulated network error".to_owned())
                };
                exp.on_signature_fetched(fetched);
            }
            ScriptInput::SignatureDecoded { ok } => exp.on_signature_decoded(*ok),
            ScriptInput::Viewport { width, height } => exp.on_viewport(Viewport {
                width: *width,
                height: *height,
            }),
            ScriptInput::Visibility { visible } => exp.on_visibility_change(*visible),
            ScriptInput::PageShow { persisted } => exp.on_page_show(*persisted),
            ScriptInput::Stall { ms } => self.stall(Duration::from_millis(*ms)),
            ScriptInput::Wheel { delta_y } => {
                exp.on_wheel(now, *delta_y);
            }
            ScriptInput::TouchStart { y } => exp.on_touch_start(*y),
            ScriptInput::TouchEnd { y } => {
                exp.on_touch_end(now, *y);
            }
            ScriptInput::Key { key } => {
                let key = NavKey::from_key_name(key)
                    .ok_or_else(|| ScrubError::validation(format!("unknown key {key:?}")))?;
                exp.on_key(now, key);
            }
            ScriptInput::IndicatorClick { section } => {
                exp.on_indicator_click(now, *section);
            }
            ScriptInput::Tap => {
                exp.on_tap(now);
            }
            ScriptInput::Overlay { open } => exp.set_overlay_open(*open),
            ScriptInput::OpenProject { section } => {
                exp.open_project(*section);
            }
        }
        self.collect();
        Ok(())
    }

    /// Build a simulation from `script`, play it, and report the outcome.
    #[tracing::instrument(level = "debug", skip_all, fields(steps = script.steps.len()))]
    pub fn run_script(cfg: ExperienceConfig, script: &Script) -> ScrubResult<SimulationReport> {
        let store = MemoryStore::with_entries(
            script.store.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        );
        let mut sim = Self::with_seek_latency(
            cfg,
            store,
            Duration::from_millis(script.seek_latency_ms),
        )?;

        let mut steps: Vec<&ScriptStep> = script.steps.iter().collect();
        steps.sort_by_key(|s| s.at_ms);
        for step in steps {
            let at = Duration::from_millis(step.at_ms);
            while sim.now() < at {
                sim.step();
            }
            sim.apply(&step.input)?;
        }
        let end = Duration::from_millis(script.run_ms);
        while sim.now() < end {
            sim.step();
        }
        Ok(sim.into_report())
    }

    /// Consume the simulation into a [`SimulationReport`].
    pub fn into_report(self) -> SimulationReport {
        let store = self.experience.store();
        SimulationReport {
            current_section: self.experience.current_section(),
            active_track: self.experience.active_track(),
            transitioning: self.experience.is_transitioning(),
            splash_stage: self.experience.splash_stage(),
            return_section: store.get(RETURN_SECTION_KEY),
            splash_completed: store.get(SPLASH_COMPLETED_KEY).is_some(),
            events: self.log,
        }
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("now", &self.ticker.now())
            .field("experience", &self.experience)
            .field("events", &self.log.len())
            .finish()
    }
}
