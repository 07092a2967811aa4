//! Flush policies, failure handling and shutdown.

// Integration test file: unwrap/arithmetic lints are overly strict for tests
// where panics on failure are intentional.
#![allow(
    clippy::arithmetic_side_effects,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]

use std::thread;
use std::time::{Duration, Instant};

use panel_compositor::{argb, Display, DisplayConfig, DisplayError, DisplayInfo, PanelError, PixelFormat, Rotation, TransferDelay};
use panel_testing::{FailingPanel, RecordingPanel};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn debounced(millis: u64) -> DisplayConfig {
    DisplayConfig {
        transfer_delay: TransferDelay::Debounce(Duration::from_millis(millis)),
        ..DisplayConfig::DEFAULT
    }
}

/// Poll until `condition` holds or `timeout` passes
fn wait_for(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

// ============================================================================
// Policies
// ============================================================================

#[test]
fn test_debounce_coalesces_burst() {
    init_tracing();
    let panel = RecordingPanel::with_format(32, 32, PixelFormat::Rgb888);
    let display = Display::with_config(panel.clone(), Rotation::Degrees0, debounced(200)).unwrap();

    for i in 0..10 {
        display.set_pixel(i, i * 2, argb::WHITE).unwrap();
    }
    assert_eq!(panel.transfer_count(), 0);

    assert!(wait_for(Duration::from_secs(5), || panel.transfer_count() > 0));
    thread::sleep(Duration::from_millis(50));

    let transfers = panel.transfers();
    assert_eq!(transfers.len(), 1);
    let t = &transfers[0];
    assert_eq!((t.x, t.y, t.width, t.height), (0, 0, 10, 19));
    assert_eq!(display.dirty_region(), None);
}

#[test]
fn test_debounce_schedules_again_after_flush() {
    let panel = RecordingPanel::with_format(8, 8, PixelFormat::Rgb565);
    let display = Display::with_config(panel.clone(), Rotation::Degrees0, debounced(10)).unwrap();

    display.set_pixel(1, 1, argb::RED).unwrap();
    assert!(wait_for(Duration::from_secs(5), || panel.transfer_count() == 1));

    display.set_pixel(2, 2, argb::RED).unwrap();
    assert!(wait_for(Duration::from_secs(5), || panel.transfer_count() == 2));
}

#[test]
fn test_manual_waits_for_flush() {
    let panel = RecordingPanel::with_format(8, 8, PixelFormat::Rgb888);
    let display = Display::with_config(panel.clone(), Rotation::Degrees0, DisplayConfig::MANUAL).unwrap();

    display.fill_rect(0, 0, 4, 4, argb::RED).unwrap();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(panel.transfer_count(), 0);

    display.flush().unwrap();
    assert_eq!(panel.transfer_count(), 1);
}

#[test]
fn test_immediate_sends_every_write() {
    let panel = RecordingPanel::with_format(8, 8, PixelFormat::Rgb888);
    let display = Display::with_config(panel.clone(), Rotation::Degrees0, DisplayConfig::IMMEDIATE).unwrap();

    display.set_pixel(0, 0, argb::RED).unwrap();
    display.set_pixel(7, 7, argb::RED).unwrap();
    assert_eq!(panel.transfer_count(), 2);
}

#[test]
fn test_policy_change_applies_to_next_write() {
    let panel = RecordingPanel::with_format(8, 8, PixelFormat::Rgb888);
    let display = Display::with_config(panel.clone(), Rotation::Degrees0, DisplayConfig::MANUAL).unwrap();
    display.set_pixel(0, 0, argb::RED).unwrap();
    assert_eq!(display.transfer_delay(), TransferDelay::Manual);

    display.set_transfer_delay(TransferDelay::Immediate);
    display.set_pixel(5, 5, argb::RED).unwrap();

    // The pending damage goes out with the new write.
    let transfers = panel.transfers();
    assert_eq!(transfers.len(), 1);
    assert_eq!((transfers[0].width, transfers[0].height), (6, 6));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_failed_flush_keeps_damage() {
    let info = DisplayInfo::new(8, 8, PixelFormat::Rgb888);
    let panel = FailingPanel::new(info);
    let display = Display::with_config(panel.clone(), Rotation::Degrees0, DisplayConfig::MANUAL).unwrap();

    display.fill_rect(1, 1, 2, 2, argb::RED).unwrap();
    panel.set_fail_transfers(true);
    assert!(matches!(
        display.flush(),
        Err(DisplayError::Transport(PanelError::Transport(_)))
    ));
    assert!(display.dirty_region().is_some());

    panel.set_fail_transfers(false);
    display.flush().unwrap();
    assert_eq!(display.dirty_region(), None);
    assert_eq!(panel.transfer_attempts(), 2);
}

#[test]
fn test_immediate_write_reports_transport_error() {
    let info = DisplayInfo::new(4, 4, PixelFormat::Rgb565);
    let panel = FailingPanel::new(info);
    panel.set_fail_transfers(true);
    let display = Display::with_config(panel, Rotation::Degrees0, DisplayConfig::IMMEDIATE).unwrap();

    let result = display.set_pixel(0, 0, argb::WHITE);
    assert!(matches!(result, Err(DisplayError::Transport(_))));
    // The buffer write itself went through.
    assert_eq!(display.pixel(0, 0), Some(argb::WHITE));
}

#[test]
fn test_failed_scheduled_flush_is_retried_by_next_flush() {
    init_tracing();
    let info = DisplayInfo::new(4, 4, PixelFormat::Rgb888);
    let panel = FailingPanel::new(info);
    panel.set_fail_transfers(true);
    let display = Display::with_config(panel.clone(), Rotation::Degrees0, debounced(5)).unwrap();

    display.set_pixel(1, 1, argb::WHITE).unwrap();
    assert!(wait_for(Duration::from_secs(5), || panel.transfer_attempts() > 0));
    assert!(display.dirty_region().is_some());

    panel.set_fail_transfers(false);
    display.flush().unwrap();
    assert_eq!(display.dirty_region(), None);
}

// ============================================================================
// Close and drop
// ============================================================================

#[test]
fn test_close_flushes_and_closes_every_panel() {
    let display = Display::virtual_canvas_with_config(16, 8, DisplayConfig::MANUAL);
    let good = RecordingPanel::with_format(8, 8, PixelFormat::Rgb888);
    let bad_a = FailingPanel::failing_close(DisplayInfo::new(8, 8, PixelFormat::Rgb888));
    let bad_b = FailingPanel::failing_close(DisplayInfo::new(8, 8, PixelFormat::Rgb888));
    display.attach(0, 0, bad_a.clone(), Rotation::Degrees0).unwrap();
    display.attach(8, 0, good.clone(), Rotation::Degrees0).unwrap();
    display.attach(8, 0, bad_b.clone(), Rotation::Degrees0).unwrap();

    display.fill_rect(0, 0, 16, 8, argb::BLUE).unwrap();
    let result = display.close();

    assert!(matches!(
        result,
        Err(DisplayError::Close {
            failures: 2,
            source: PanelError::Transport(_)
        })
    ));
    assert_eq!(good.transfer_count(), 1);
    assert!(good.is_closed());
    assert_eq!(bad_a.close_attempts(), 1);
    assert_eq!(bad_b.close_attempts(), 1);
    assert!(display.is_closed());
    assert_eq!(display.panel_count(), 0);
}

#[test]
fn test_close_cancels_pending_flush() {
    let panel = RecordingPanel::with_format(8, 8, PixelFormat::Rgb888);
    let display = Display::with_config(panel.clone(), Rotation::Degrees0, debounced(100)).unwrap();

    display.set_pixel(3, 3, argb::RED).unwrap();
    display.close().unwrap();
    assert_eq!(panel.transfer_count(), 1);

    thread::sleep(Duration::from_millis(200));
    assert_eq!(panel.transfer_count(), 1);
}

#[test]
fn test_writes_after_close_only_touch_buffer() {
    let panel = RecordingPanel::with_format(8, 8, PixelFormat::Rgb888);
    let display = Display::with_config(panel.clone(), Rotation::Degrees0, DisplayConfig::IMMEDIATE).unwrap();
    display.close().unwrap();

    display.set_pixel(1, 1, argb::RED).unwrap();
    assert_eq!(display.pixel(1, 1), Some(argb::RED));
    assert_eq!(panel.transfer_count(), 0);
}

#[test]
fn test_close_failure_outranks_failed_final_flush() {
    init_tracing();
    let panel = FailingPanel::failing_close(DisplayInfo::new(8, 8, PixelFormat::Rgb888));
    let display = Display::with_config(panel.clone(), Rotation::Degrees0, DisplayConfig::MANUAL).unwrap();
    display.fill_rect(0, 0, 2, 2, argb::RED).unwrap();
    panel.set_fail_transfers(true);

    let result = display.close();

    assert!(matches!(result, Err(DisplayError::Close { failures: 1, .. })));
    assert_eq!(panel.transfer_attempts(), 1);
    assert_eq!(panel.close_attempts(), 1);
}

#[test]
fn test_attach_after_close_is_rejected() {
    let display = Display::virtual_canvas_with_config(16, 16, DisplayConfig::IMMEDIATE);
    display.close().unwrap();

    let panel = RecordingPanel::with_format(16, 16, PixelFormat::Rgb888);
    let result = display.attach(0, 0, panel.clone(), Rotation::Degrees0);
    assert!(matches!(result, Err(DisplayError::Closed)));
    assert_eq!(display.panel_count(), 0);

    display.fill_rect(0, 0, 16, 16, argb::RED).unwrap();
    assert_eq!(panel.transfer_count(), 0);
}

#[tokio::test]
async fn test_drop_inside_async_context() {
    let panel = RecordingPanel::with_format(8, 8, PixelFormat::Rgb888);
    let display = Display::with_config(panel.clone(), Rotation::Degrees0, debounced(1000)).unwrap();
    display.set_pixel(0, 0, argb::RED).unwrap();
    drop(display);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(panel.transfer_count(), 0);
}

#[test]
fn test_drop_without_close_stops_timer() {
    let panel = RecordingPanel::with_format(8, 8, PixelFormat::Rgb888);
    {
        let display = Display::with_config(panel.clone(), Rotation::Degrees0, debounced(50)).unwrap();
        display.set_pixel(0, 0, argb::RED).unwrap();
    }
    thread::sleep(Duration::from_millis(150));
    assert_eq!(panel.transfer_count(), 0);
}
