mod common;

use common::{discrete_candidate, integrated_candidate, standard_config, swapchain_requirements, Event, MockGfx};
use oriel_gfx::{Extent2D, GfxContext};

const EXTENT: Extent2D = Extent2D::new(800, 600);

#[test]
fn test_discrete_gpu_wins_over_integrated_and_rejected() {
    let mock = MockGfx::new();
    let mut rejected = integrated_candidate("no-swapchain");
    rejected.extensions.clear();
    mock.set_devices(vec![rejected, integrated_candidate("igpu"), discrete_candidate("dgpu")]);

    let surface = mock.make_surface();
    let context = GfxContext::new(mock.clone(), swapchain_requirements());
    let (_, selection) = context.attach_window(surface, standard_config(EXTENT)).unwrap();

    assert_eq!(selection.candidate_index, 2);
    assert!(selection.identity.contains("dgpu"));
    assert!(selection.score > 0);
}

#[test]
fn test_attach_fails_when_no_candidate_suits() {
    let mock = MockGfx::new();
    let mut a = integrated_candidate("a");
    a.extensions.clear();
    let mut b = integrated_candidate("b");
    b.features = Default::default();
    mock.set_devices(vec![a, b]);

    let surface = mock.make_surface();
    let context = GfxContext::new(mock.clone(), swapchain_requirements());
    let err = context.attach_window(surface, standard_config(EXTENT)).unwrap_err();

    // 报告里每台候选设备的拒绝原因都要出现
    let report = err.to_string();
    assert!(report.contains("extensions"));
    assert!(report.contains("features"));

    // 选择失败时不应打开设备
    assert!(!mock.events().contains(&Event::DeviceOpened));
}

#[test]
fn test_selection_is_deterministic_across_contexts() {
    let run = || {
        let mock = MockGfx::new();
        mock.set_devices(vec![integrated_candidate("igpu"), discrete_candidate("dgpu")]);
        let surface = mock.make_surface();
        let context = GfxContext::new(mock, swapchain_requirements());
        let (_, selection) = context.attach_window(surface, standard_config(EXTENT)).unwrap();
        selection.candidate_index
    };

    assert_eq!(run(), run());
}

#[test]
fn test_device_shared_across_windows_and_closed_on_last_detach() {
    let mock = MockGfx::new();
    let context = GfxContext::new(mock.clone(), swapchain_requirements());

    let (first, _) = context.attach_window(mock.make_surface(), standard_config(EXTENT)).unwrap();
    let (second, _) = context.attach_window(mock.make_surface(), standard_config(EXTENT)).unwrap();
    assert_eq!(context.window_count(), 2);

    // 两个窗口共享一台设备
    let opens = mock.events().iter().filter(|e| **e == Event::DeviceOpened).count();
    assert_eq!(opens, 1);

    context.detach_window(first).unwrap();
    assert!(!mock.events().contains(&Event::DeviceClosed));

    context.detach_window(second).unwrap();
    assert!(mock.events().contains(&Event::DeviceClosed));
    assert_eq!(context.window_count(), 0);

    // 所有 GPU 句柄都已经成对销毁
    mock.assert_no_leaks();
}

#[test]
fn test_queue_plan_covers_all_roles_without_redundancy() {
    let mock = MockGfx::new();
    let context = GfxContext::new(mock.clone(), swapchain_requirements());
    let (_, selection) = context.attach_window(mock.make_surface(), standard_config(EXTENT)).unwrap();

    let total = oriel_gfx::foundation::queue::negotiated_total(&selection.queue_assignments);
    assert!(total.handles_everything());
    for assignment in &selection.queue_assignments {
        assert!(!assignment.contributed.is_empty());
    }
}
