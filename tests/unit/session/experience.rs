use super::*;
use crate::store::{MemoryStore, RETURN_SECTION_KEY, SPLASH_COMPLETED_KEY};
use crate::transport::sim::SimVideo;

const TICK: Duration = Duration::from_micros(16_667);

struct Rig {
    exp: Experience,
    fwd: SimVideo,
    rev: SimVideo,
    now: Duration,
    log: Vec<Event>,
}

impl Rig {
    fn with(cfg: ExperienceConfig, store: MemoryStore) -> Self {
        let mut exp = Experience::new(cfg, Box::new(store)).unwrap();
        let fwd = SimVideo::new(10.05);
        let rev = SimVideo::new(10.05);
        exp.mount(Track::Forward, Box::new(fwd.clone()));
        exp.mount(Track::Reverse, Box::new(rev.clone()));
        let mut rig = Self {
            exp,
            fwd,
            rev,
            now: Duration::ZERO,
            log: Vec::new(),
        };
        rig.exp.start(rig.now);
        rig.flush();
        rig
    }

    fn quick() -> Self {
        let mut cfg = ExperienceConfig::pointer();
        cfg.splash.enabled = false;
        Self::with(cfg, MemoryStore::new())
    }

    fn flush(&mut self) {
        self.log.extend(self.exp.drain_events());
    }

    fn videos_ready(&mut self) {
        self.exp.on_video_ready(self.now, Track::Forward);
        self.exp.on_video_ready(self.now, Track::Reverse);
        self.flush();
    }

    fn load_all(&mut self) {
        self.exp.on_logo_loaded(true);
        self.exp.on_signature_fetched(Err("offline".into()));
        self.exp.on_signature_decoded(true);
        self.videos_ready();
        for _ in 0..self.exp.config().image_count {
            self.exp.on_image_settled(self.now, true);
        }
        self.exp.on_window_load(self.now);
        self.flush();
    }

    fn step(&mut self) {
        self.now += TICK;
        self.fwd.advance(TICK);
        self.rev.advance(TICK);
        self.exp.tick(self.now);
        self.flush();
    }

    fn run_for(&mut self, d: Duration) {
        let until = self.now + d;
        while self.now < until {
            self.step();
        }
    }

    fn run_until(&mut self, what: &str, done: impl Fn(&Experience) -> bool) {
        for _ in 0..3_000 {
            if done(&self.exp) {
                return;
            }
            self.step();
        }
        panic!("timed out waiting for {what}: {:?}", self.exp);
    }

    /// Splash skipped, assets loaded, intro finished and input unlocked on section 1.
    fn idle_on_first_section() -> Self {
        let mut rig = Self::quick();
        rig.load_all();
        rig.run_until("intro", |e| e.intro_done() && !e.is_transitioning());
        rig.log.clear();
        rig
    }

    fn position(&self, e: &Event) -> usize {
        self.log
            .iter()
            .position(|x| x == e)
            .unwrap_or_else(|| panic!("{e:?} not in {:?}", self.log))
    }
}

#[test]
fn full_splash_hands_off_to_the_intro() {
    let mut rig = Rig::with(ExperienceConfig::pointer(), MemoryStore::new());
    rig.load_all();
    assert!(rig.exp.is_ready());
    assert!(!rig.exp.video_faded_in());

    rig.run_until("splash", |e| e.splash_complete());
    assert!(rig.exp.video_faded_in());

    let ready = rig.position(&Event::AppReady);
    let reveal = rig.position(&Event::SiteReveal);
    let complete = rig.position(&Event::SplashComplete);
    let intro = rig.position(&Event::TransitionStarted {
        track: Track::Forward,
        from: 0,
        to: 1,
    });
    assert!(ready < reveal && reveal < complete && complete < intro);
    assert_eq!(
        rig.exp.store().get(SPLASH_COMPLETED_KEY).as_deref(),
        Some("true")
    );

    rig.run_until("intro", |e| e.intro_done() && !e.is_transitioning());
    assert_eq!(rig.exp.current_section(), 1);
    assert!(rig.exp.panel(1).active);
}

#[test]
fn returning_visitor_skips_the_splash_and_resumes_the_section() {
    let store =
        MemoryStore::with_entries([(SPLASH_COMPLETED_KEY, "true"), (RETURN_SECTION_KEY, "3")]);
    let mut rig = Rig::with(ExperienceConfig::pointer(), store);
    assert_eq!(rig.exp.splash_stage(), SplashStage::Skipped);

    rig.load_all();
    rig.step();
    assert!(rig.log.contains(&Event::SplashComplete));
    assert!(rig.log.contains(&Event::TransitionStarted {
        track: Track::Forward,
        from: 0,
        to: 3,
    }));
    assert!(rig.exp.store().get(RETURN_SECTION_KEY).is_none());

    rig.run_until("intro", |e| e.intro_done() && !e.is_transitioning());
    assert_eq!(rig.exp.current_section(), 3);
}

#[test]
fn intro_waits_for_readiness_when_the_splash_finishes_first() {
    let mut cfg = ExperienceConfig::pointer();
    cfg.splash.enabled = false;
    cfg.splash.app_ready_timeout_ms = 1_000;
    let mut rig = Rig::with(cfg, MemoryStore::new());
    rig.videos_ready();

    rig.run_for(Duration::from_millis(1_200));
    assert!(rig.exp.splash_complete());
    assert!(!rig.exp.is_ready());
    assert!(!rig.log.iter().any(|e| matches!(e, Event::TransitionStarted { .. })));

    for _ in 0..rig.exp.config().image_count {
        rig.exp.on_image_settled(rig.now, false);
    }
    rig.exp.on_window_load(rig.now);
    rig.flush();
    let ready = rig.position(&Event::AppReady);
    let intro = rig.position(&Event::TransitionStarted {
        track: Track::Forward,
        from: 0,
        to: 1,
    });
    assert!(ready < intro);
}

#[test]
fn touch_devices_wait_for_a_tap() {
    let mut cfg = ExperienceConfig::touch();
    cfg.splash.enabled = false;
    let mut rig = Rig::with(cfg, MemoryStore::new());
    rig.load_all();
    rig.step();

    assert!(rig.exp.splash_complete());
    assert!(rig.exp.awaiting_tap());
    assert!(!rig.exp.hint_visible());
    assert_eq!(
        rig.exp.on_wheel(rig.now, 80.0),
        InputOutcome::Suppressed,
        "wheel is swallowed before the tap"
    );
    rig.flush();
    assert!(!rig.log.iter().any(|e| matches!(e, Event::TransitionStarted { .. })));
    assert!(rig.exp.store().get(SPLASH_COMPLETED_KEY).is_none());

    assert!(rig.exp.on_tap(rig.now));
    assert!(!rig.exp.on_tap(rig.now));
    rig.flush();
    assert!(rig.log.contains(&Event::TransitionStarted {
        track: Track::Forward,
        from: 0,
        to: 1,
    }));
}

#[test]
fn regaining_visibility_mid_move_settles_on_the_committed_section() {
    let mut rig = Rig::idle_on_first_section();
    assert!(matches!(
        rig.exp.on_wheel(rig.now, 50.0),
        InputOutcome::Navigated(_)
    ));
    for _ in 0..5 {
        rig.step();
    }
    assert!(rig.exp.is_transitioning());

    rig.exp.on_visibility_change(false);
    rig.exp.on_visibility_change(true);
    rig.flush();
    assert!(rig.log.contains(&Event::Settled {
        section: 1,
        track: Track::Forward,
    }));
    assert!(!rig.exp.is_transitioning());
    assert_eq!(rig.exp.current_section(), 1);

    rig.run_for(Duration::from_millis(200));
    assert!(!rig.log.iter().any(|e| matches!(e, Event::SectionChanged { .. })));
    assert!(matches!(
        rig.exp.on_wheel(rig.now + Duration::from_secs(1), 50.0),
        InputOutcome::Navigated(_)
    ));
}

#[test]
fn visibility_while_idle_changes_nothing() {
    let mut rig = Rig::idle_on_first_section();
    rig.exp.on_visibility_change(true);
    rig.exp.on_page_show(true);
    rig.flush();
    assert!(rig.log.is_empty());
}

#[test]
fn pageshow_resettles_only_when_configured() {
    let mut rig = Rig::idle_on_first_section();
    rig.exp.on_key(rig.now, NavKey::ArrowDown);
    rig.step();
    rig.exp.on_page_show(false);
    rig.flush();
    assert!(!rig.log.iter().any(|e| matches!(e, Event::Settled { .. })));

    rig.exp.on_page_show(true);
    rig.flush();
    assert!(rig.log.iter().any(|e| matches!(e, Event::Settled { .. })));
}

#[test]
fn open_project_remembers_valid_sections() {
    let mut rig = Rig::idle_on_first_section();
    assert!(!rig.exp.open_project(0));
    assert!(!rig.exp.open_project(5));
    assert!(rig.exp.open_project(4));
    assert_eq!(rig.exp.store().get(RETURN_SECTION_KEY).as_deref(), Some("4"));
}
