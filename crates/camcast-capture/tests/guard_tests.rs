use camcast_base::Resolution;
use camcast_capture::testing::{MockDevice, MockFailure, uniform_yuyv};
use camcast_capture::{CaptureConfig, CaptureError, DeviceGuard, FrameFormat, PixelFormat};
use std::time::Duration;

fn qvga() -> Resolution {
    Resolution::new(320, 240).unwrap()
}

#[test]
fn test_start_streams_and_drop_releases() {
    let mut device = MockDevice::new(vec![uniform_yuyv(qvga(), 80)], Duration::ZERO);
    let stats = device.stats();

    {
        let mut guard = DeviceGuard::start(&mut device, &CaptureConfig::default()).unwrap();
        assert!(stats.is_open());
        assert!(stats.is_streaming());
        assert_eq!(guard.format().resolution, qvga());

        guard.wait_for_frame(Duration::from_millis(50)).unwrap();
        assert_eq!(guard.read_frame().unwrap().len(), 320 * 240 * 2);
    }

    assert!(!stats.is_streaming());
    assert!(!stats.is_open());
    assert_eq!(stats.stops(), 1);
    assert_eq!(stats.closes(), 1);
}

#[test]
fn test_negotiated_resolution_wins() {
    let actual = Resolution::new(640, 480).unwrap();
    let mut device = MockDevice::new(vec![], Duration::ZERO).substituting(FrameFormat {
        pixel_format: PixelFormat::Yuyv,
        resolution: actual,
    });

    let guard = DeviceGuard::start(&mut device, &CaptureConfig::default()).unwrap();
    assert_eq!(guard.format().resolution, actual);
}

#[test]
fn test_substituted_pixel_format_is_rejected_and_released() {
    let mut device = MockDevice::new(vec![], Duration::ZERO).substituting(FrameFormat {
        pixel_format: PixelFormat::Mjpeg,
        resolution: qvga(),
    });
    let stats = device.stats();

    let result = DeviceGuard::start(&mut device, &CaptureConfig::default());
    assert!(matches!(result, Err(CaptureError::UnsupportedFormat(_))));

    assert_eq!(stats.opens(), 1);
    assert_eq!(stats.closes(), 1);
    assert_eq!(stats.starts(), 0);
}

#[test]
fn test_open_failure_leaves_device_closed() {
    let mut device = MockDevice::new(vec![], Duration::ZERO).failing(MockFailure::Open);
    let stats = device.stats();

    let result = DeviceGuard::start(&mut device, &CaptureConfig::default());
    assert!(matches!(result, Err(CaptureError::DeviceUnavailable(_))));
    assert!(!stats.is_open());
}

#[test]
fn test_negotiate_failure_closes_device() {
    let mut device = MockDevice::new(vec![], Duration::ZERO).failing(MockFailure::Negotiate);
    let stats = device.stats();

    let result = DeviceGuard::start(&mut device, &CaptureConfig::default());
    assert!(matches!(result, Err(CaptureError::UnsupportedFormat(_))));
    assert_eq!(stats.closes(), 1);
    assert!(!stats.is_open());
}

#[test]
fn test_start_failure_closes_device() {
    let mut device = MockDevice::new(vec![], Duration::ZERO).failing(MockFailure::Start);
    let stats = device.stats();

    let result = DeviceGuard::start(&mut device, &CaptureConfig::default());
    assert!(matches!(result, Err(CaptureError::StartFailed(_))));
    assert_eq!(stats.stops(), 0);
    assert_eq!(stats.closes(), 1);
}

#[test]
fn test_invalid_resolution_closes_device() {
    let mut device = MockDevice::new(vec![], Duration::ZERO);
    let stats = device.stats();

    let config = CaptureConfig::default().with_height(0);
    let result = DeviceGuard::start(&mut device, &config);
    assert!(matches!(result, Err(CaptureError::UnsupportedFormat(_))));
    assert_eq!(stats.closes(), 1);
}

#[test]
fn test_wait_times_out_when_device_runs_dry() {
    let mut device = MockDevice::new(vec![], Duration::ZERO);
    let mut guard = DeviceGuard::start(&mut device, &CaptureConfig::default()).unwrap();

    let result = guard.wait_for_frame(Duration::from_millis(20));
    assert!(matches!(result, Err(CaptureError::Timeout)));
}

#[test]
fn test_empty_frame_is_a_read_failure() {
    let mut device = MockDevice::new(vec![vec![]], Duration::ZERO);
    let mut guard = DeviceGuard::start(&mut device, &CaptureConfig::default()).unwrap();

    guard.wait_for_frame(Duration::from_millis(20)).unwrap();
    let err = guard.read_frame().unwrap_err();
    assert!(err.is_transient());
}
