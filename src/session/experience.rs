use std::time::Duration;

use tracing::{debug, info};

use crate::config::{DeviceClass, ExperienceConfig};
use crate::events::{Event, Outbox};
use crate::foundation::core::Track;
use crate::foundation::error::ScrubResult;
use crate::gif::patch::PatchedGif;
use crate::lifecycle::readiness::{GateSignal, ReadinessGate};
use crate::scheduler::gesture::NavKey;
use crate::scheduler::navigator::{InputOutcome, Navigator, PanelState};
use crate::splash::orchestrator::{SplashOrchestrator, SplashStage, Viewport};
use crate::store::{self, KeyValueStore};
use crate::transport::dual::{DualTransport, TransportEvent};
use crate::transport::handle::PlaybackHandle;

/// The whole scroll-scrubbing experience behind one host-facing object.
///
/// The host forwards platform signals (asset loads, input, visibility), calls [`Self::tick`]
/// once per display refresh, and drains [`Event`]s. Components never talk to each other
/// directly; every hand-off goes through here.
pub struct Experience {
    cfg: ExperienceConfig,
    transport: DualTransport,
    navigator: Navigator,
    gate: ReadinessGate,
    splash: SplashOrchestrator,
    store: Box<dyn KeyValueStore>,
    out: Outbox,
    started: bool,
    video_faded_in: bool,
    splash_complete: bool,
    awaiting_tap: bool,
    intro_pending: bool,
}

impl Experience {
    /// Build every component from `cfg`.
    pub fn new(cfg: ExperienceConfig, store: Box<dyn KeyValueStore>) -> ScrubResult<Self> {
        cfg.validate()?;
        let table = cfg.timing_table()?;
        let sections = table.section_count();
        Ok(Self {
            transport: DualTransport::new(table, cfg.transport.clone()),
            navigator: Navigator::new(cfg.gestures.clone(), sections),
            gate: ReadinessGate::new(cfg.lifecycle.clone(), cfg.image_count),
            splash: SplashOrchestrator::new(cfg.splash.clone()),
            cfg,
            store,
            out: Outbox::new(),
            started: false,
            video_faded_in: false,
            splash_complete: false,
            awaiting_tap: false,
            intro_pending: false,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &ExperienceConfig {
        &self.cfg
    }

    /// Attach the video element for `track`.
    pub fn mount(&mut self, track: Track, handle: Box<dyn PlaybackHandle>) {
        self.transport.mount(track, handle);
    }

    /// Detach the video element for `track`.
    pub fn unmount(&mut self, track: Track) -> Option<Box<dyn PlaybackHandle>> {
        self.transport.unmount(track)
    }

    /// Begin loading: arm the readiness fallbacks and start (or skip) the splash.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn start(&mut self, now: Duration) {
        if self.started {
            return;
        }
        self.started = true;
        self.gate.start(now);
        let skip = self.cfg.device == DeviceClass::Pointer
            && self.cfg.splash.skip_when_returning
            && store::splash_completed(self.store.as_ref())
            && store::has_return_section(self.store.as_ref());
        self.drive_splash(now, |splash, out| splash.start(now, skip, out));
    }

    /// Advance every component by one display refresh.
    pub fn tick(&mut self, now: Duration) {
        let mut signals = Vec::new();
        self.gate.tick(now, &mut signals);
        self.apply_gate(now, signals);

        self.drive_splash(now, |splash, out| splash.tick(now, out));

        let mut events = Vec::new();
        self.transport.tick(now, &mut events);
        for e in events {
            if let TransportEvent::Completed(plan) = e {
                self.navigator.on_transport_complete(now, &plan, &mut self.out);
            }
        }
        self.navigator.tick(now, &mut self.out);
    }

    /// Take queued events, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.out.drain()
    }

    fn drive_splash(
        &mut self,
        now: Duration,
        f: impl FnOnce(&mut SplashOrchestrator, &mut Outbox),
    ) {
        let revealed = self.out.has_fired(Event::SiteReveal);
        let completed = self.out.has_fired(Event::SplashComplete);
        f(&mut self.splash, &mut self.out);
        if !revealed && self.out.has_fired(Event::SiteReveal) {
            self.video_faded_in = true;
        }
        if !completed && self.out.has_fired(Event::SplashComplete) {
            self.on_splash_complete(now);
        }
    }

    fn apply_gate(&mut self, now: Duration, signals: Vec<GateSignal>) {
        for signal in signals {
            match signal {
                GateSignal::VideosReady => self.transport.prime(),
                GateSignal::Ready => {
                    let sections = self.navigator.section_count();
                    if let Some(section) =
                        store::take_return_section(self.store.as_mut(), sections)
                    {
                        info!(section, "returning to section");
                        self.navigator.set_start_section(section);
                    }
                    self.out.emit(Event::AppReady);
                    self.splash.on_app_ready();
                    if self.intro_pending {
                        self.intro_pending = false;
                        self.begin_intro(now);
                    }
                }
            }
        }
    }

    fn on_splash_complete(&mut self, now: Duration) {
        self.splash_complete = true;
        if self.cfg.device == DeviceClass::Pointer {
            store::mark_splash_completed(self.store.as_mut());
        }
        if self.cfg.gestures.tap_to_start {
            debug!("waiting for tap to start");
            self.awaiting_tap = true;
        } else {
            self.begin_intro(now);
        }
    }

    fn begin_intro(&mut self, now: Duration) {
        if !self.gate.is_ready() {
            debug!("splash finished before the app was ready; intro deferred");
            self.intro_pending = true;
            return;
        }
        self.navigator
            .begin_intro(now, &mut self.transport, &mut self.out);
    }

    fn collect_gate(
        &mut self,
        now: Duration,
        f: impl FnOnce(&mut ReadinessGate, &mut Vec<GateSignal>),
    ) {
        let mut signals = Vec::new();
        f(&mut self.gate, &mut signals);
        self.apply_gate(now, signals);
    }

    /// The video element for `track` can play through.
    pub fn on_video_ready(&mut self, now: Duration, track: Track) {
        self.collect_gate(now, |gate, out| gate.on_video_ready(track, out));
    }

    /// A content image settled; `loaded` is `false` on error.
    pub fn on_image_settled(&mut self, now: Duration, loaded: bool) {
        self.collect_gate(now, |gate, out| gate.on_image_settled(loaded, out));
    }

    /// The window `load` event fired.
    pub fn on_window_load(&mut self, now: Duration) {
        self.collect_gate(now, |gate, out| gate.on_window_load(out));
    }

    /// Splash logo settled.
    pub fn on_logo_loaded(&mut self, ok: bool) {
        self.splash.on_logo_loaded(ok);
    }

    /// Splash signature fetched; returns the bytes to display.
    pub fn on_signature_fetched(&mut self, fetched: Result<Vec<u8>, String>) -> PatchedGif {
        self.splash.on_signature_fetched(fetched).clone()
    }

    /// Splash signature image decoded (or failed to).
    pub fn on_signature_decoded(&mut self, ok: bool) {
        self.splash.on_signature_decoded(ok);
    }

    /// Latest viewport size.
    pub fn on_viewport(&mut self, viewport: Viewport) {
        self.splash.on_viewport(viewport);
    }

    /// Page visibility changed. Regaining visibility mid-move force-settles.
    pub fn on_visibility_change(&mut self, visible: bool) {
        self.splash.on_visibility_change(visible);
        if self.gate.on_visibility_change(visible) {
            self.resettle_if_stalled();
        }
    }

    /// `pageshow` fired; `persisted` for back/forward cache restores.
    pub fn on_page_show(&mut self, persisted: bool) {
        if self.gate.on_page_show(persisted) {
            self.resettle_if_stalled();
        }
    }

    fn resettle_if_stalled(&mut self) {
        if self.navigator.needs_resettle(&self.transport) {
            self.navigator
                .force_settle(&mut self.transport, &mut self.out);
        }
    }

    /// Wheel event.
    pub fn on_wheel(&mut self, now: Duration, delta_y: f64) -> InputOutcome {
        self.navigator
            .on_wheel(now, delta_y, &mut self.transport, &mut self.out)
    }

    /// Touch start.
    pub fn on_touch_start(&mut self, y: f64) {
        self.navigator.on_touch_start(y);
    }

    /// Touch end.
    pub fn on_touch_end(&mut self, now: Duration, y: f64) -> InputOutcome {
        self.navigator
            .on_touch_end(now, y, &mut self.transport, &mut self.out)
    }

    /// Navigation key.
    pub fn on_key(&mut self, now: Duration, key: NavKey) -> InputOutcome {
        self.navigator
            .on_key(now, key, &mut self.transport, &mut self.out)
    }

    /// Section indicator click.
    pub fn on_indicator_click(&mut self, now: Duration, section: u32) -> InputOutcome {
        self.navigator
            .on_indicator_click(now, section, &mut self.transport, &mut self.out)
    }

    /// Explicit tap on the tap-to-start prompt. Returns `true` if it started the intro.
    pub fn on_tap(&mut self, now: Duration) -> bool {
        if !self.awaiting_tap {
            return false;
        }
        self.awaiting_tap = false;
        self.begin_intro(now);
        true
    }

    /// Open or close the modal overlay.
    pub fn set_overlay_open(&mut self, open: bool) {
        self.navigator.set_overlay_open(open);
    }

    /// Remember `section` before navigating to its project page.
    pub fn open_project(&mut self, section: u32) -> bool {
        if !(1..=self.navigator.section_count()).contains(&section) {
            return false;
        }
        store::store_return_section(self.store.as_mut(), section);
        true
    }

    /// Current section.
    pub fn current_section(&self) -> u32 {
        self.navigator.current_section()
    }

    /// Visible track.
    pub fn active_track(&self) -> Track {
        self.transport.active_track()
    }

    /// `true` for the video element the presentation layer should show.
    pub fn is_track_visible(&self, track: Track) -> bool {
        self.transport.is_visible(track)
    }

    /// `false` while `track` is repositioning in the background.
    pub fn is_track_ready(&self, track: Track) -> bool {
        self.transport.is_track_ready(track)
    }

    /// The navigation lock.
    pub fn is_transitioning(&self) -> bool {
        self.navigator.is_transitioning()
    }

    /// `true` while an incoming track is prepared but not shown.
    pub fn swap_pending(&self) -> bool {
        self.transport.swap_pending()
    }

    /// Presentation flags for `section`'s panel.
    pub fn panel(&self, section: u32) -> PanelState {
        self.navigator.panel(section)
    }

    /// `true` after `site-reveal`.
    pub fn video_faded_in(&self) -> bool {
        self.video_faded_in
    }

    /// `true` after `splash-complete`.
    pub fn splash_complete(&self) -> bool {
        self.splash_complete
    }

    /// `true` while the tap-to-start prompt should be shown.
    pub fn awaiting_tap(&self) -> bool {
        self.awaiting_tap
    }

    /// `true` while the scroll hint should be shown.
    pub fn hint_visible(&self) -> bool {
        self.navigator.hint_visible() && !self.awaiting_tap
    }

    /// `true` once the intro move has finished.
    pub fn intro_done(&self) -> bool {
        self.navigator.intro_done()
    }

    /// `true` once the readiness gate fired.
    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Where the splash is.
    pub fn splash_stage(&self) -> SplashStage {
        self.splash.stage()
    }

    /// The persisted store.
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }
}

impl std::fmt::Debug for Experience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Experience")
            .field("device", &self.cfg.device)
            .field("section", &self.navigator.current_section())
            .field("transitioning", &self.navigator.is_transitioning())
            .field("transport", &self.transport)
            .field("splash", &self.splash.stage())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/experience.rs"]
mod tests;
