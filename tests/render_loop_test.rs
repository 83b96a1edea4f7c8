use ifc_ngin::{FrameToken, Viewer, ViewerConfig};

use crate::common::test_utils::{ManualHost, init_logger, model};

mod common;

#[test]
fn every_delivered_frame_draws_once() {
    init_logger();
    let mut host = ManualHost::new(800, 600);
    let mut viewer = Viewer::new(ViewerConfig::default());
    viewer
        .load(&mut host, model(&[("walls", 5), ("columns", 3)]))
        .unwrap();

    assert_eq!(host.pending_frames().len(), 1);
    host.pump_frames(&mut viewer, 10);

    let stats = host.stats();
    assert_eq!(stats.borrow().draw_calls, 10);
    assert_eq!(viewer.frames_drawn(), 10);
    // exactly one frame is outstanding at any time
    assert_eq!(host.pending_frames().len(), 1);

    let frame = stats.borrow().last_frame.clone().unwrap();
    assert_eq!(frame.batches, 2);
    assert_eq!(frame.instances, 8);
    assert_eq!(frame.line_batches, 2);
    assert!(!frame.wireframe);

    viewer.teardown(&mut host);
}

#[test]
fn no_draws_after_teardown() {
    init_logger();
    let mut host = ManualHost::new(800, 600);
    let mut viewer = Viewer::new(ViewerConfig::default());
    viewer.load(&mut host, model(&[("walls", 2)])).unwrap();
    host.pump_frames(&mut viewer, 2);
    let queued = host.pending_frames()[0];

    viewer.teardown(&mut host);
    // the host raced the cancellation and delivers anyway
    host.deliver_frame(&mut viewer, queued);
    host.pump_frames(&mut viewer, 5);

    let stats = host.stats();
    assert_eq!(stats.borrow().draw_calls, 2);
    assert_eq!(stats.borrow().rejected_draws, 0);
    assert!(host.pending_frames().is_empty());
}

#[test]
fn stale_tokens_are_ignored() {
    init_logger();
    let mut host = ManualHost::new(800, 600);
    let mut viewer = Viewer::new(ViewerConfig::default());
    viewer.load(&mut host, model(&[("walls", 2)])).unwrap();

    let first = host.pending_frames()[0];
    host.pump_frame(&mut viewer);

    // an already consumed token and one that was never issued
    host.deliver_frame(&mut viewer, first);
    host.deliver_frame(&mut viewer, FrameToken(u64::MAX));

    assert_eq!(host.stats().borrow().draw_calls, 1);
    assert_eq!(host.pending_frames().len(), 1);

    viewer.teardown(&mut host);
}
