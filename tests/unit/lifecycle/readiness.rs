use super::*;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn gate(images: u32) -> ReadinessGate {
    let mut g = ReadinessGate::new(LifecycleConfig::default(), images);
    g.start(Duration::ZERO);
    g
}

#[test]
fn ready_fires_once_all_three_aggregates_settle() {
    let mut g = gate(2);
    let mut out = Vec::new();

    g.on_window_load(&mut out);
    g.on_image_settled(true, &mut out);
    g.on_video_ready(Track::Forward, &mut out);
    assert!(out.is_empty());

    g.on_video_ready(Track::Reverse, &mut out);
    assert_eq!(out, vec![GateSignal::VideosReady]);
    assert!(!g.is_ready());

    g.on_image_settled(false, &mut out);
    assert_eq!(out, vec![GateSignal::VideosReady, GateSignal::Ready]);
    assert!(g.is_ready());
    assert_eq!(g.image_progress(), (2, 2));

    out.clear();
    g.on_video_ready(Track::Forward, &mut out);
    g.on_image_settled(true, &mut out);
    g.tick(ms(60_000), &mut out);
    assert!(out.is_empty(), "signals are one-shot: {out:?}");
    assert!(g.is_ready());
}

#[test]
fn failed_images_count_as_settled() {
    let mut g = gate(3);
    let mut out = Vec::new();
    g.on_video_ready(Track::Forward, &mut out);
    g.on_video_ready(Track::Reverse, &mut out);
    g.on_window_load(&mut out);
    for _ in 0..3 {
        g.on_image_settled(false, &mut out);
    }
    assert!(g.is_ready());
}

#[test]
fn no_images_means_videos_and_window_suffice() {
    let mut g = gate(0);
    let mut out = Vec::new();
    g.on_video_ready(Track::Reverse, &mut out);
    g.on_video_ready(Track::Forward, &mut out);
    g.on_window_load(&mut out);
    assert_eq!(out, vec![GateSignal::VideosReady, GateSignal::Ready]);
}

#[test]
fn ready_fallback_forces_readiness() {
    let mut g = gate(4);
    let mut out = Vec::new();
    g.on_image_settled(true, &mut out);

    g.tick(ms(9_999), &mut out);
    assert!(out.is_empty());
    g.tick(ms(10_000), &mut out);
    assert_eq!(out, vec![GateSignal::VideosReady, GateSignal::Ready]);
    assert!(g.is_ready());
}

#[test]
fn video_fallback_releases_only_the_videos() {
    let cfg = LifecycleConfig {
        video_fallback_ms: Some(4_000),
        ..LifecycleConfig::default()
    };
    let mut g = ReadinessGate::new(cfg, 1);
    g.start(ms(1_000));
    let mut out = Vec::new();

    g.tick(ms(4_999), &mut out);
    assert!(!g.videos_ready());
    g.tick(ms(5_000), &mut out);
    assert_eq!(out, vec![GateSignal::VideosReady]);
    assert!(!g.is_ready());

    g.on_window_load(&mut out);
    g.on_image_settled(true, &mut out);
    assert!(g.is_ready());
}

#[test]
fn resume_hooks_only_act_after_ready() {
    let mut g = gate(0);
    assert!(!g.on_visibility_change(true));
    assert!(!g.on_page_show(true));

    let mut out = Vec::new();
    g.on_video_ready(Track::Forward, &mut out);
    g.on_video_ready(Track::Reverse, &mut out);
    g.on_window_load(&mut out);

    assert!(g.on_visibility_change(true));
    assert!(!g.on_visibility_change(false));
    assert!(g.on_page_show(true));
    assert!(!g.on_page_show(false));

    let mut every = ReadinessGate::new(
        LifecycleConfig {
            resettle_on_every_pageshow: true,
            ..LifecycleConfig::default()
        },
        0,
    );
    every.on_video_ready(Track::Forward, &mut out);
    every.on_video_ready(Track::Reverse, &mut out);
    every.on_window_load(&mut out);
    assert!(every.on_page_show(false));
}
