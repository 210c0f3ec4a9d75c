use super::*;

fn desktop() -> SectionTimingTable {
    SectionTimingTable::from_freeze_frames(Fps::whole(24).unwrap(), 240, &[24, 55, 168, 240])
        .unwrap()
}

#[test]
fn reverse_freeze_frames_mirror_forward() {
    let t = desktop();
    let rev: Vec<u64> = (1..=4)
        .map(|s| t.freeze_frame(Track::Reverse, s).unwrap().0)
        .collect();
    assert_eq!(rev, vec![216, 185, 72, 0]);

    let fwd: Vec<u64> = (1..=4)
        .map(|s| t.freeze_frame(Track::Forward, s).unwrap().0)
        .collect();
    assert_eq!(fwd, vec![24, 55, 168, 240]);
}

#[test]
fn reverse_ranges_are_the_complement_of_forward() {
    let t = desktop();
    for s in 1..=t.section_count() {
        let (fs, fe) = t.forward_range(s).unwrap();
        let (rs, re) = t.reverse_range(s).unwrap();
        assert_eq!(rs.0, t.total_frames() - fe.0, "section {s}");
        assert_eq!(re.0, t.total_frames() - fs.0, "section {s}");
    }
}

#[test]
fn adjacent_sections_share_endpoints_and_stay_in_bounds() {
    let t = desktop();
    for pair in t.entries().windows(2) {
        assert_eq!(pair[0].end_frame, pair[1].start_frame);
    }
    for s in 0..=t.section_count() {
        for track in Track::ALL {
            let (a, b) = t.range(track, s).unwrap();
            assert!(a <= b);
            assert!(b.0 <= t.total_frames());
        }
    }
}

#[test]
fn virtual_section_zero_is_origin() {
    let t = desktop();
    assert_eq!(t.forward_range(0), Some((FrameIndex(0), FrameIndex(0))));
    assert_eq!(t.freeze_frame(Track::Forward, 0), Some(FrameIndex(0)));
    assert!(!t.contains(0));
    assert!(t.contains(4));
    assert!(!t.contains(5));
    assert_eq!(t.forward_range(5), None);
}

#[test]
fn boundary_times_increase_across_sections() {
    let t = desktop();
    let times: Vec<f64> = (0..=4)
        .map(|s| t.freeze_time(Track::Forward, s).unwrap())
        .collect();
    for w in times.windows(2) {
        assert!(w[0] < w[1]);
    }
}

#[test]
fn multi_section_segment_spans_from_and_to_freeze_frames() {
    let t = desktop();
    assert_eq!(
        t.segment_frames(Track::Forward, 1, 4),
        Some((FrameIndex(24), FrameIndex(240)))
    );
    assert_eq!(
        t.segment_frames(Track::Reverse, 4, 2),
        Some((FrameIndex(0), FrameIndex(185)))
    );
}

#[test]
fn disjoint_spans_are_rejected_outside_tolerance() {
    let fps = Fps::whole(24).unwrap();
    // One-frame gaps (~0.042s) pass a 0.05s tolerance.
    SectionTimingTable::new(fps, 240, &[(0, 25), (26, 56), (57, 168), (169, 240)], 0.05)
        .unwrap();
    // A ten-frame gap does not.
    let err = SectionTimingTable::new(fps, 240, &[(0, 24), (34, 56)], 0.05).unwrap_err();
    assert!(err.to_string().contains("do not join"));
}

#[test]
fn invalid_tables_are_rejected() {
    let fps = Fps::whole(24).unwrap();
    assert!(SectionTimingTable::new(fps, 240, &[], 0.05).is_err());
    assert!(SectionTimingTable::new(fps, 240, &[(10, 5)], 0.05).is_err());
    assert!(SectionTimingTable::new(fps, 240, &[(0, 300)], 0.05).is_err());
    assert!(SectionTimingTable::from_freeze_frames(fps, 240, &[55, 24]).is_err());
}
