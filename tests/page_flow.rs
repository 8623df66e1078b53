//! End-to-end page flow: stored visit count feeding a reveal-gated count-up,
//! and the cursor plus a magnetic control driven by pointer events.

use spark_motion::state::animate::{frame_subscriber_count, reset_frame_scheduler, run_frame};
use spark_motion::state::cursor::{self, reset_cursor_state};
use spark_motion::state::pointer::{self, listener_count, reset_pointer_state};
use spark_motion::state::scroll::{reset_scroll_state, HERO_FADE, HERO_PARALLAX};
use spark_motion::{
    dispatch_scroll, mount_cursor, scroll_transform, CountUp, FileStore, GeometrySource,
    Interactive, MagneticControl, MemoryStore, MotionConfig, Point, Rect, RevealObserver,
    TweenPhase, VisitorCounter,
};

const STATS_REGION: usize = 1;
const CTA_BUTTON: usize = 10;
const NAV_LINK: usize = 11;

fn setup() {
    reset_frame_scheduler();
    reset_pointer_state();
    reset_cursor_state();
    reset_scroll_state();
}

#[test]
fn visit_count_counts_up_once_stats_scroll_into_view() {
    setup();
    let config = MotionConfig::default();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("visits.json");

    // First visit seeds from the base count
    let durable = FileStore::open(&path).unwrap();
    let mut counter = VisitorCounter::new(durable, MemoryStore::new(), config.visitor.clone());
    let resolution = counter.resolve();
    assert!(resolution.settled);
    assert_eq!(resolution.count, 1251);

    // Stats section sits well below the fold
    let mut observer = RevealObserver::new(
        GeometrySource::new(Rect::new(0.0, 0.0, 1280.0, 800.0)),
        config.reveal.root_margin,
    );
    observer
        .source_mut()
        .set_region_bounds(STATS_REGION, Rect::new(0.0, 2000.0, 1280.0, 300.0));
    let trigger = observer.bind(STATS_REGION);

    let tween = CountUp::from_config(&config.tween).mount();
    tween.sync(Some(resolution.count), trigger.state());
    assert_eq!(tween.phase(), TweenPhase::Armed);
    assert_eq!(tween.value(), Some(0));

    assert!(observer.refresh().is_empty());
    run_frame(0.0);
    assert_eq!(tween.value(), Some(0));

    // Scroll until the expanded viewport touches the section
    let opacity = scroll_transform(HERO_FADE);
    let parallax = scroll_transform(HERO_PARALLAX);
    dispatch_scroll(1200.0);
    observer.source_mut().scroll_to(1200.0);
    assert_eq!(observer.refresh(), vec![STATS_REGION]);
    assert!(trigger.is_revealed());
    assert!(!observer.source().is_observing(STATS_REGION));
    assert_eq!(opacity.get(), 0.0);
    assert_eq!(parallax.get(), 150.0);

    tween.sync(None, trigger.state());
    assert!(tween.is_scheduled());

    let mut previous = 0;
    let mut now = 1000.0;
    while tween.phase() != TweenPhase::Finished {
        run_frame(now);
        let value = tween.value().unwrap();
        assert!(value >= previous);
        previous = value;
        now += 16.0;
        assert!(now < 5000.0, "count-up never finished");
    }
    assert_eq!(tween.value(), Some(1251));
    assert_eq!(tween.display_text(), "1251");
    assert!(!tween.is_scheduled());

    // Scrolling away again does not hide the section
    observer.source_mut().scroll_to(0.0);
    assert!(observer.refresh().is_empty());
    assert!(trigger.is_revealed());

    // Same session, fresh view: no increment
    let (_, session) = counter.into_parts();
    let durable = FileStore::open(&path).unwrap();
    let mut remounted = VisitorCounter::new(durable, session, config.visitor.clone());
    assert_eq!(remounted.resolve().count, 1251);

    // New session: one more
    let durable = FileStore::open(&path).unwrap();
    let mut next_session = VisitorCounter::new(durable, MemoryStore::new(), config.visitor);
    assert_eq!(next_session.resolve().count, 1252);
}

#[test]
fn unavailable_storage_still_counts_up_from_base() {
    setup();
    let config = MotionConfig::default();

    let mut counter =
        VisitorCounter::new(MemoryStore::disabled(), MemoryStore::disabled(), config.visitor);
    let resolution = counter.resolve();
    assert!(resolution.settled);
    assert_eq!(resolution.count, 1250);

    let mut observer = RevealObserver::new(
        GeometrySource::new(Rect::new(0.0, 0.0, 1280.0, 800.0)),
        config.reveal.root_margin,
    );
    observer
        .source_mut()
        .set_region_bounds(STATS_REGION, Rect::new(0.0, 100.0, 1280.0, 300.0));
    let trigger = observer.bind(STATS_REGION);
    observer.refresh();

    let tween = CountUp::from_config(&config.tween).mount();
    tween.sync(Some(resolution.count), trigger.state());

    let mut now = 0.0;
    while tween.phase() != TweenPhase::Finished && now < 5000.0 {
        run_frame(now);
        now += 16.0;
    }
    assert_eq!(tween.value(), Some(1250));
}

#[test]
fn tearing_down_mid_count_stops_ticks() {
    setup();

    let trigger_state = spark_motion::RevealState::Revealed;
    let tween = CountUp::new(2.0).mount();
    tween.sync(Some(500), trigger_state);
    run_frame(0.0);
    run_frame(16.0);
    assert!(tween.is_scheduled());

    tween.dispose();
    assert_eq!(run_frame(32.0), 0);
}

#[test]
fn cursor_and_magnetic_control_follow_pointer() {
    setup();
    let config = MotionConfig::default();

    let cursor_handle = mount_cursor(config.cursor);
    let magnetic = MagneticControl::new(config.magnetic).mount(CTA_BUTTON, Interactive::BUTTON);
    // Center at (200, 300)
    magnetic.set_bounds(Rect::new(150.0, 280.0, 100.0, 40.0));
    let unregister_link = pointer::register_interactive(NAV_LINK, Interactive::LINK);
    pointer::set_element_bounds(NAV_LINK, Rect::new(20.0, 20.0, 80.0, 20.0));

    assert_eq!(listener_count(), 2);
    assert_eq!(frame_subscriber_count(), 2);

    // Empty space
    pointer::dispatch_move(600.0, 600.0);
    assert!(cursor::is_cursor_visible());
    assert!(!cursor::is_hovering());
    assert_eq!(magnetic.target(), Point::ZERO);

    // Over the button
    pointer::dispatch_move(230.0, 300.0);
    assert!(cursor::is_hovering());
    assert_eq!(cursor::cursor_position(), Point::new(230.0, 300.0));
    assert!((magnetic.target().x - 9.0).abs() < 1e-4);

    let mut now = 0.0;
    for _ in 0..120 {
        run_frame(now);
        now += 16.0;
    }
    assert!((magnetic.offset().x - 9.0).abs() < 0.05);
    assert!(cursor::dot().scale.abs() < 0.05);
    assert!((cursor::ring().scale - 1.5).abs() < 0.05);
    assert!((cursor::dot().position.x - 230.0).abs() < 0.05);

    // Straight onto the link: button leaves, link enters
    pointer::dispatch_move(40.0, 30.0);
    assert!(cursor::is_hovering());
    assert_eq!(magnetic.target(), Point::ZERO);

    // Out of the window
    pointer::dispatch(pointer::PointerEvent::leave_window());
    assert!(!cursor::is_hovering());
    assert!(!cursor::is_cursor_visible());

    magnetic.unmount();
    unregister_link();
    cursor_handle.unmount();

    assert_eq!(listener_count(), 0);
    assert_eq!(frame_subscriber_count(), 0);
    assert!(!cursor::is_cursor_mounted());
}
