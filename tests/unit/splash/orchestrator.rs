use super::*;

const TICK: Duration = Duration::from_micros(16_667);

struct Run {
    splash: SplashOrchestrator,
    out: Outbox,
    now: Duration,
    log: Vec<(Duration, Event)>,
}

impl Run {
    fn new(cfg: SplashConfig) -> Self {
        Self {
            splash: SplashOrchestrator::new(cfg),
            out: Outbox::new(),
            now: Duration::ZERO,
            log: Vec::new(),
        }
    }

    fn start(&mut self, skip: bool) {
        self.splash.start(self.now, skip, &mut self.out);
        self.flush();
    }

    fn assets_ok(&mut self) {
        self.splash.on_logo_loaded(true);
        self.splash.on_signature_fetched(Err("offline".into()));
        self.splash.on_signature_decoded(true);
    }

    fn flush(&mut self) {
        for e in self.out.drain() {
            self.log.push((self.now, e));
        }
    }

    fn tick(&mut self) {
        self.now += TICK;
        self.splash.tick(self.now, &mut self.out);
        self.flush();
    }

    fn run_for(&mut self, d: Duration) {
        let until = self.now + d;
        while self.now < until {
            self.tick();
        }
    }

    fn run_until_done(&mut self) {
        for _ in 0..3_000 {
            if self.splash.is_done() {
                return;
            }
            self.tick();
        }
        panic!("splash stuck in {:?}", self.splash.stage());
    }

    fn at(&self, event: Event) -> Option<Duration> {
        self.log.iter().find(|(_, e)| *e == event).map(|(t, _)| *t)
    }

    fn cue(&self, cue: SplashCue) -> Option<Duration> {
        self.at(Event::Splash { cue })
    }

    fn events(&self) -> Vec<Event> {
        self.log.iter().map(|(_, e)| *e).collect()
    }
}

fn cue(cue: SplashCue) -> Event {
    Event::Splash { cue }
}

#[test]
fn full_sequence_runs_in_order_with_its_minimum_holds() {
    let mut run = Run::new(SplashConfig::default());
    run.start(false);
    run.assets_ok();
    run.splash.on_app_ready();
    run.run_until_done();

    assert_eq!(
        run.events(),
        vec![
            cue(SplashCue::LogoVisible),
            cue(SplashCue::SignatureVisible),
            cue(SplashCue::ShimmerStarted),
            cue(SplashCue::ShimmerStopped),
            cue(SplashCue::ContentFadeOut),
            cue(SplashCue::SiteVisible),
            Event::SiteReveal,
            cue(SplashCue::OverlayRemoved),
            Event::SplashComplete,
        ]
    );

    let logo = run.cue(SplashCue::LogoVisible).unwrap();
    let signature = run.cue(SplashCue::SignatureVisible).unwrap();
    let shimmer = run.cue(SplashCue::ShimmerStarted).unwrap();
    let stopped = run.cue(SplashCue::ShimmerStopped).unwrap();
    let reveal = run.at(Event::SiteReveal).unwrap();
    let complete = run.at(Event::SplashComplete).unwrap();

    assert!(signature - logo >= Duration::from_millis(100));
    assert!(shimmer - signature >= Duration::from_millis(3_000 + 100));
    assert!(stopped - shimmer >= Duration::from_millis(2_200));
    assert!(reveal - stopped >= Duration::from_millis(500));
    assert!(complete - reveal >= Duration::from_millis(500));
}

#[test]
fn reveal_waits_for_the_app() {
    let mut run = Run::new(SplashConfig::default());
    run.start(false);
    run.assets_ok();
    run.run_for(Duration::from_secs(8));
    assert_eq!(run.splash.stage(), SplashStage::AwaitingReady);
    assert_eq!(run.at(Event::SiteReveal), None);

    run.splash.on_app_ready();
    run.tick();
    assert_eq!(run.splash.stage(), SplashStage::FadingOut);
    run.run_until_done();
    assert!(run.at(Event::SplashComplete).is_some());
}

#[test]
fn ready_app_still_gets_the_full_shimmer() {
    let mut run = Run::new(SplashConfig::default());
    run.splash.on_app_ready();
    run.start(false);
    run.assets_ok();
    run.run_for(Duration::from_secs(4));
    assert_ne!(run.splash.stage(), SplashStage::FadingOut);
    assert_eq!(run.at(Event::SiteReveal), None);
}

#[test]
fn app_ready_timeout_reveals_anyway() {
    let mut run = Run::new(SplashConfig::default());
    run.start(false);
    run.assets_ok();
    run.run_until_done();
    let stopped = run.cue(SplashCue::ShimmerStopped).unwrap();
    assert!(stopped >= Duration::from_secs(15));
}

#[test]
fn hidden_page_holds_the_sequence() {
    let mut run = Run::new(SplashConfig::default());
    run.splash.on_visibility_change(false);
    run.start(false);
    run.assets_ok();
    run.run_for(Duration::from_secs(1));
    assert_eq!(run.splash.stage(), SplashStage::AwaitingVisibility);
    assert!(run.log.is_empty());

    run.splash.on_visibility_change(true);
    run.tick();
    assert_eq!(run.splash.stage(), SplashStage::StabilizingViewport);
    for _ in 0..3 {
        run.tick();
    }
    assert_eq!(run.splash.stage(), SplashStage::ShowingLogo);
}

#[test]
fn viewport_wait_is_bounded() {
    let mut run = Run::new(SplashConfig::default());
    run.start(false);
    run.assets_ok();
    for i in 0..29 {
        run.splash.on_viewport(Viewport {
            width: 400,
            height: 700 + i,
        });
        run.tick();
        assert_eq!(run.splash.stage(), SplashStage::StabilizingViewport, "tick {i}");
    }
    run.splash.on_viewport(Viewport {
        width: 400,
        height: 800,
    });
    run.tick();
    assert_eq!(run.splash.stage(), SplashStage::ShowingLogo);
}

#[test]
fn asset_failure_hides_after_two_seconds() {
    let mut run = Run::new(SplashConfig::default());
    run.start(false);
    run.splash.on_logo_loaded(false);
    run.run_for(Duration::from_millis(100));
    assert_eq!(run.splash.stage(), SplashStage::Failed);

    run.run_until_done();
    let fade = run.cue(SplashCue::ContentFadeOut).unwrap();
    assert!(fade >= Duration::from_secs(2));
    assert!(fade < Duration::from_secs(3));
    assert_eq!(run.cue(SplashCue::LogoVisible), None);
    assert!(run.at(Event::SplashComplete).is_some());
}

#[test]
fn skipped_splash_reveals_once_the_app_is_ready() {
    let mut run = Run::new(SplashConfig::default());
    run.start(true);
    assert_eq!(
        run.events(),
        vec![cue(SplashCue::SiteVisible), cue(SplashCue::OverlayRemoved)]
    );
    run.run_for(Duration::from_secs(1));
    assert_eq!(run.splash.stage(), SplashStage::Skipped);

    run.splash.on_app_ready();
    run.tick();
    assert!(run.splash.is_done());
    assert_eq!(
        &run.events()[2..],
        &[Event::SiteReveal, Event::SplashComplete]
    );
}

#[test]
fn signature_duration_comes_from_the_patched_gif() {
    let mut gif = b"GIF89a".to_vec();
    gif.extend_from_slice(&[1, 0, 1, 0, 0, 0, 0]);
    gif.extend_from_slice(&[0x21, 0xFF, 0x0B]);
    gif.extend_from_slice(b"NETSCAPE2.0");
    gif.extend_from_slice(&[0x03, 0x01, 0x00, 0x00, 0x00]);
    for _ in 0..3 {
        gif.extend_from_slice(&[0x21, 0xF9, 0x04, 0x00, 10, 0, 0x00, 0x00]);
        gif.extend_from_slice(&[0x2C, 0, 0, 0, 0, 1, 0, 1, 0, 0]);
        gif.extend_from_slice(&[0x02, 0x02, 0x44, 0x01, 0x00]);
    }
    gif.push(0x3B);

    let mut run = Run::new(SplashConfig::default());
    run.start(false);
    let patched = run.splash.on_signature_fetched(Ok(gif.clone()));
    assert!(patched.patched);
    assert_eq!(patched.duration_ms, 800);
    assert_eq!(patched.bytes.len(), gif.len());

    run.splash.on_logo_loaded(true);
    run.splash.on_signature_decoded(true);
    run.splash.on_app_ready();
    run.run_until_done();
    let signature = run.cue(SplashCue::SignatureVisible).unwrap();
    let shimmer = run.cue(SplashCue::ShimmerStarted).unwrap();
    assert!(shimmer - signature >= Duration::from_millis(900));
    assert!(shimmer - signature < Duration::from_millis(1_000));
}

#[test]
fn huge_signature_safety_margin_holds_without_overflowing() {
    let cfg = SplashConfig {
        signature_safety_ms: u64::MAX,
        ..SplashConfig::default()
    };
    let mut run = Run::new(cfg);
    run.start(false);
    run.assets_ok();
    run.splash.on_app_ready();
    run.run_for(Duration::from_secs(20));

    assert!(run.cue(SplashCue::SignatureVisible).is_some());
    assert!(run.cue(SplashCue::ShimmerStarted).is_none());
    assert!(!run.splash.is_done());
}
