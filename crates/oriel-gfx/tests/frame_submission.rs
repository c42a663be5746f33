mod common;

use common::{standard_config, swapchain_requirements, Event, HandleKind, MockGfx};
use oriel_gfx::api::{AcquireOutcome, Extent2D, PresentOutcome};
use oriel_gfx::pipelines::kind::FlatVertex;
use oriel_gfx::{ClipRect, DrawBatch, DrawList, FrameOutcome, GfxContext, SkipReason};

const EXTENT: Extent2D = Extent2D::new(800, 600);

fn attach(mock: &MockGfx) -> (GfxContext<MockGfx>, oriel_gfx::WindowId) {
    let context = GfxContext::new(mock.clone(), swapchain_requirements());
    let (id, _) = context.attach_window(mock.make_surface(), standard_config(EXTENT)).unwrap();
    (context, id)
}

fn flat_vertices(count: usize) -> Vec<FlatVertex> {
    (0..count)
        .map(|i| FlatVertex {
            position: [i as f32, 0.0],
            color: [1.0, 1.0, 1.0, 1.0],
            clip: [0.0; 4],
        })
        .collect()
}

fn gui_batches(flat_count: usize) -> Vec<DrawBatch> {
    vec![
        DrawBatch {
            list: DrawList::Flat(flat_vertices(flat_count)),
            transform: glam::Mat4::IDENTITY,
            clip: ClipRect::unclipped(),
        },
        DrawBatch::new(DrawList::ToneMap),
    ]
}

#[test]
fn test_semaphore_chain_is_gapless() {
    let mock = MockGfx::new();
    let (context, window) = attach(&mock);

    let outcome = context.render_frame(window, &gui_batches(3)).unwrap();
    assert_eq!(outcome, FrameOutcome::Rendered);

    let events = mock.events();
    let acquire_signal = events
        .iter()
        .find_map(|e| match e {
            Event::Acquired { signal, .. } => Some(*signal),
            _ => None,
        })
        .unwrap();

    // 五条管线，链首等 acquire，之后每条等前一条的 signal
    let submissions = mock.submissions();
    assert_eq!(submissions.len(), 5);
    assert_eq!(submissions[0].1, acquire_signal);
    for pair in submissions.windows(2) {
        assert_eq!(pair[1].1, pair[0].2, "next pipeline must wait on the previous signal");
    }

    // present 等链尾的 signal
    let present_wait = events
        .iter()
        .find_map(|e| match e {
            Event::Presented { wait, .. } => Some(*wait),
            _ => None,
        })
        .unwrap();
    assert_eq!(present_wait, submissions.last().unwrap().2);

    // 每条管线 signal 自己的 per-image semaphore，互不混用
    let mut signals: Vec<u64> = submissions.iter().map(|s| s.2).collect();
    signals.dedup();
    assert_eq!(signals.len(), 5);
}

#[test]
fn test_identical_frames_do_not_re_record() {
    let mock = MockGfx::new();
    let (context, window) = attach(&mock);
    // 两帧都拿到同一张 image，命令不变
    mock.push_acquire(AcquireOutcome::Ready { image_index: 0 });
    mock.push_acquire(AcquireOutcome::Ready { image_index: 0 });

    context.render_frame(window, &gui_batches(3)).unwrap();
    let after_first = mock.recorded_count();
    assert_eq!(after_first, 5);

    context.render_frame(window, &gui_batches(3)).unwrap();
    // 有效位全部仍然置位：一次录制都不应该发生
    assert_eq!(mock.recorded_count(), after_first);
    // 提交照常发生
    assert_eq!(mock.submissions().len(), 10);
}

#[test]
fn test_geometry_change_re_records_only_affected_pipeline() {
    let mock = MockGfx::new();
    let (context, window) = attach(&mock);
    for _ in 0..3 {
        mock.push_acquire(AcquireOutcome::Ready { image_index: 0 });
    }

    context.render_frame(window, &gui_batches(3)).unwrap();
    context.render_frame(window, &gui_batches(3)).unwrap();
    let before = mock.recorded_count();

    // flat 的顶点数变了，其余管线的几何不变
    context.render_frame(window, &gui_batches(6)).unwrap();
    assert_eq!(mock.recorded_count(), before + 1);
}

#[test]
fn test_each_image_records_once_across_the_ring() {
    let mock = MockGfx::new();
    let (context, window) = attach(&mock);

    // 默认 acquire 轮转 3 张 image；六帧相同命令只在前三帧录制
    for _ in 0..6 {
        context.render_frame(window, &gui_batches(3)).unwrap();
    }
    assert_eq!(mock.recorded_count(), 15);
}

#[test]
fn test_acquire_out_of_date_aborts_frame_and_rebuilds_next_tick() {
    let mock = MockGfx::new();
    let (context, window) = attach(&mock);
    mock.push_acquire(AcquireOutcome::OutOfDate);

    let outcome = context.render_frame(window, &gui_batches(3)).unwrap();
    assert_eq!(outcome, FrameOutcome::Skipped(SkipReason::OutOfDate));
    // 这一帧整体放弃，不应有任何提交
    assert!(mock.submissions().is_empty());

    let outcome = context.render_frame(window, &gui_batches(3)).unwrap();
    assert_eq!(outcome, FrameOutcome::Rendered);
    assert_eq!(mock.created_count(HandleKind::Swapchain), 2);
}

#[test]
fn test_acquire_timeout_skips_without_rebuild() {
    let mock = MockGfx::new();
    let (context, window) = attach(&mock);
    mock.push_acquire(AcquireOutcome::Timeout);

    let outcome = context.render_frame(window, &gui_batches(3)).unwrap();
    assert_eq!(outcome, FrameOutcome::Skipped(SkipReason::AcquireTimeout));

    context.render_frame(window, &gui_batches(3)).unwrap();
    // 超时不是交换链过期，不应触发重建
    assert_eq!(mock.created_count(HandleKind::Swapchain), 1);
}

#[test]
fn test_suboptimal_acquire_renders_then_rebuilds() {
    let mock = MockGfx::new();
    let (context, window) = attach(&mock);
    mock.push_acquire(AcquireOutcome::Suboptimal { image_index: 0 });

    let outcome = context.render_frame(window, &gui_batches(3)).unwrap();
    // image 还能用，这一帧照常画完
    assert_eq!(outcome, FrameOutcome::Rendered);
    assert_eq!(mock.submissions().len(), 5);

    context.render_frame(window, &gui_batches(3)).unwrap();
    assert_eq!(mock.created_count(HandleKind::Swapchain), 2);
}

#[test]
fn test_present_out_of_date_marks_rebuild_for_next_tick() {
    let mock = MockGfx::new();
    let (context, window) = attach(&mock);
    mock.push_present(PresentOutcome::OutOfDate);

    let outcome = context.render_frame(window, &gui_batches(3)).unwrap();
    // 呈现引擎已经处理过这一帧，本帧不算失败
    assert_eq!(outcome, FrameOutcome::Rendered);

    context.render_frame(window, &gui_batches(3)).unwrap();
    assert_eq!(mock.created_count(HandleKind::Swapchain), 2);
}

#[test]
fn test_device_loss_rebuilds_shaders_and_device() {
    let mock = MockGfx::new();
    let (context, window) = attach(&mock);
    assert_eq!(mock.created_count(HandleKind::ShaderModule), 10);

    context.notify_device_lost();
    let outcome = context.render_frame(window, &gui_batches(3)).unwrap();
    assert_eq!(outcome, FrameOutcome::Rendered);

    // 设备整个换掉：shader 也要跟着重建（交换链重建时 shader 是不动的）
    let events = mock.events();
    assert!(events.contains(&Event::DeviceClosed));
    assert_eq!(mock.destroyed_count(HandleKind::ShaderModule), 10);
    assert_eq!(mock.created_count(HandleKind::ShaderModule), 20);

    let opens = events.iter().filter(|e| **e == Event::DeviceOpened).count();
    assert_eq!(opens, 2);
}

#[test]
fn test_empty_batches_still_present_a_frame() {
    let mock = MockGfx::new();
    let (context, window) = attach(&mock);

    let outcome = context.render_frame(window, &[]).unwrap();
    assert_eq!(outcome, FrameOutcome::Rendered);
    // 链首仍然要 clear，所以 5 条管线照样提交
    assert_eq!(mock.submissions().len(), 5);
}
