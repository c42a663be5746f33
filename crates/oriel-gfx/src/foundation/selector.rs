use itertools::Itertools;

use crate::error::GfxError;
use crate::foundation::candidate::{
    DeviceRequirements, DeviceTypeTier, PhysicalDeviceCandidate, PresentMode, SurfaceFormat,
};
use crate::foundation::queue::{self, QueueAssignment};

/// 硬性条件不满足时的打分哨兵值
pub const SCORE_REJECTED: i64 = -1;

/// 能工作但无法上屏的设备（缺 present queue）
pub const SCORE_NO_PRESENT: i64 = 0;

/// 给单个候选设备打的分，以及打分过程的中间产物
#[derive(Debug, Clone)]
pub struct CandidateScore {
    pub score: i64,
    /// score >= 0 时有效
    pub queue_assignments: Vec<QueueAssignment>,
    pub best_surface_format: Option<SurfaceFormat>,
    pub best_present_mode: Option<PresentMode>,
    /// 被拒绝 / 降级的原因，拼进 attach 失败时的设备报告里
    pub reason: Option<String>,
}

impl CandidateScore {
    fn rejected(reason: String) -> Self {
        Self {
            score: SCORE_REJECTED,
            queue_assignments: Vec::new(),
            best_surface_format: None,
            best_present_mode: None,
            reason: Some(reason),
        }
    }
}

/// 选择结果：候选设备 + 解析好的 queue 方案 + surface format / present mode
///
/// 每次 attach 创建一次，只有 device lost 会使其失效
#[derive(Debug, Clone)]
pub struct DeviceSelection {
    /// 在枚举列表中的下标，后端据此打开对应的物理设备
    pub candidate_index: usize,
    pub identity: String,
    pub device_type: DeviceTypeTier,
    pub queue_assignments: Vec<QueueAssignment>,
    pub surface_format: SurfaceFormat,
    pub present_mode: PresentMode,
    pub score: i64,
}

/// 按整数得分评估一个候选设备，越高越好
///
/// 硬性要求（features/limits/extensions、graphics+compute 覆盖）有一项不满足
/// 就短路返回 -1；缺 present 返回 0（仍是可用设备，但不适合挂 window）。
pub fn score_candidate(candidate: &PhysicalDeviceCandidate, requirements: &DeviceRequirements) -> CandidateScore {
    log::info!("scoring device: {}", candidate.identity());

    if !candidate.features.contains(requirements.features) {
        let missing = requirements.features - candidate.features;
        return CandidateScore::rejected(format!("missing required features: {missing:?}"));
    }

    if !candidate.limits.meets(&requirements.limits) {
        return CandidateScore::rejected(format!("does not meet required limits: {:?}", candidate.limits));
    }

    let missing_exts = requirements.extensions.iter().filter(|e| !candidate.has_extension(e)).collect_vec();
    if !missing_exts.is_empty() {
        return CandidateScore::rejected(format!("missing required extensions: {missing_exts:?}"));
    }

    let assignments = queue::negotiate_queue_families(&candidate.queue_families);
    let total = queue::negotiated_total(&assignments);
    if !total.handles_graphics_and_compute() {
        return CandidateScore::rejected("no graphics+compute queue coverage".to_string());
    }

    // 挑出所有 queue family 都定下来之后，剩下的都是加分项
    let mut score: i64 = 0;

    if !total.contains(crate::foundation::queue::QueueCapabilities::PRESENT) {
        log::info!(" - no present-capable queue family, device kept as compute-only fallback");
        return CandidateScore {
            score: SCORE_NO_PRESENT,
            queue_assignments: assignments,
            best_surface_format: None,
            best_present_mode: None,
            reason: Some("no present-capable queue family".to_string()),
        };
    }

    let best_format = candidate.surface_formats.iter().copied().fold(None, |best: Option<SurfaceFormat>, f| {
        match best {
            Some(b) if b.score() >= f.score() => Some(b),
            _ => Some(f),
        }
    });
    let Some(best_format) = best_format else {
        return CandidateScore {
            score: SCORE_NO_PRESENT,
            queue_assignments: assignments,
            best_surface_format: None,
            best_present_mode: None,
            reason: Some("no usable surface format".to_string()),
        };
    };
    score += best_format.score();

    let best_present = candidate.present_modes.iter().copied().fold(None, |best: Option<PresentMode>, m| {
        match best {
            Some(b) if b.score() >= m.score() => Some(b),
            _ => Some(m),
        }
    });
    let Some(best_present) = best_present else {
        return CandidateScore {
            score: SCORE_NO_PRESENT,
            queue_assignments: assignments,
            best_surface_format: Some(best_format),
            best_present_mode: None,
            reason: Some("no usable present mode".to_string()),
        };
    };
    score += best_present.score();

    score += candidate.device_type.score();

    log::info!(
        " - score={}, format={:?}, present={:?}, type={:?}",
        score,
        best_format,
        best_present,
        candidate.device_type
    );

    CandidateScore {
        score,
        queue_assignments: assignments,
        best_surface_format: Some(best_format),
        best_present_mode: Some(best_present),
        reason: None,
    }
}

/// 从候选列表中选出得分最高的设备
///
/// 同分时保留枚举顺序靠前的候选（严格大于才替换），
/// 因此同一输入跑两次的结果完全一致。
pub fn select_device(
    candidates: &[PhysicalDeviceCandidate],
    requirements: &DeviceRequirements,
) -> Result<DeviceSelection, GfxError> {
    let mut best: Option<(usize, CandidateScore)> = None;
    let mut report = Vec::with_capacity(candidates.len());

    for (index, candidate) in candidates.iter().enumerate() {
        let scored = score_candidate(candidate, requirements);
        report.push(format!(
            "{}: score={}{}",
            candidate.identity(),
            scored.score,
            scored.reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default()
        ));

        let replace = match &best {
            None => true,
            Some((_, best_scored)) => scored.score > best_scored.score,
        };
        if replace {
            best = Some((index, scored));
        }
    }

    match best {
        Some((index, scored)) if scored.score > SCORE_NO_PRESENT => {
            let candidate = &candidates[index];
            Ok(DeviceSelection {
                candidate_index: index,
                identity: candidate.identity(),
                device_type: candidate.device_type,
                queue_assignments: scored.queue_assignments,
                surface_format: scored.best_surface_format.unwrap(),
                present_mode: scored.best_present_mode.unwrap(),
                score: scored.score,
            })
        }
        _ => Err(GfxError::NoSuitableDevice {
            report: report.join("; "),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::candidate::{ColorSpace, DeviceFeatures, DeviceLimits, PixelFormat};
    use crate::foundation::queue::{HardwareQueueFlags, QueueFamilyDesc};

    fn all_in_one_queue() -> Vec<QueueFamilyDesc> {
        vec![QueueFamilyDesc {
            index: 0,
            hardware_flags: HardwareQueueFlags::GRAPHICS | HardwareQueueFlags::COMPUTE,
            supports_present: true,
        }]
    }

    fn base_candidate(name: &str) -> PhysicalDeviceCandidate {
        PhysicalDeviceCandidate {
            name: name.to_string(),
            vendor_id: 0x10de,
            device_id: 0x2489,
            device_type: DeviceTypeTier::Integrated,
            features: DeviceFeatures::all(),
            limits: DeviceLimits {
                max_image_dimension_2d: 16384,
                max_vertex_input_attributes: 16,
                max_per_stage_descriptor_samplers: 16,
            },
            extensions: vec!["VK_KHR_swapchain".to_string()],
            surface_formats: vec![SurfaceFormat {
                format: PixelFormat::Bgra8Unorm,
                color_space: ColorSpace::SrgbNonlinear,
            }],
            present_modes: vec![PresentMode::Fifo],
            queue_families: all_in_one_queue(),
        }
    }

    fn swapchain_requirement() -> DeviceRequirements {
        DeviceRequirements {
            features: DeviceFeatures::SAMPLER_ANISOTROPY,
            limits: DeviceLimits {
                max_image_dimension_2d: 4096,
                ..Default::default()
            },
            extensions: vec!["VK_KHR_swapchain".to_string()],
        }
    }

    #[test]
    fn test_missing_extension_rejected_with_sentinel() {
        let mut candidate = base_candidate("no-swapchain");
        candidate.extensions.clear();

        let scored = score_candidate(&candidate, &swapchain_requirement());
        assert_eq!(scored.score, SCORE_REJECTED);
        assert!(scored.reason.unwrap().contains("extensions"));
    }

    #[test]
    fn test_no_present_scores_zero() {
        let mut candidate = base_candidate("headless");
        candidate.queue_families = vec![QueueFamilyDesc {
            index: 0,
            hardware_flags: HardwareQueueFlags::GRAPHICS | HardwareQueueFlags::COMPUTE,
            supports_present: false,
        }];

        let scored = score_candidate(&candidate, &swapchain_requirement());
        assert_eq!(scored.score, SCORE_NO_PRESENT);
    }

    #[test]
    fn test_discrete_with_mailbox_beats_integrated() {
        // 三个候选：缺扩展的、普通集显、带 mailbox + 扩展色域的独显
        let mut rejected = base_candidate("rejected");
        rejected.extensions.clear();

        let integrated = base_candidate("integrated");

        let mut discrete = base_candidate("discrete");
        discrete.device_type = DeviceTypeTier::Discrete;
        discrete.present_modes.push(PresentMode::Mailbox);
        discrete.surface_formats.push(SurfaceFormat {
            format: PixelFormat::Rgba16Float,
            color_space: ColorSpace::ExtendedSrgbNonlinear,
        });

        let candidates = vec![rejected, integrated, discrete];
        let selection = select_device(&candidates, &swapchain_requirement()).unwrap();

        assert_eq!(selection.candidate_index, 2);
        assert_eq!(selection.present_mode, PresentMode::Mailbox);
        assert_eq!(selection.surface_format.color_space, ColorSpace::ExtendedSrgbNonlinear);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let candidates = vec![base_candidate("a"), base_candidate("b")];
        let requirements = swapchain_requirement();

        let first = select_device(&candidates, &requirements).unwrap();
        let second = select_device(&candidates, &requirements).unwrap();
        assert_eq!(first.candidate_index, second.candidate_index);
        // 同分时保留先枚举的候选
        assert_eq!(first.candidate_index, 0);
    }

    #[test]
    fn test_adding_better_present_mode_never_decreases_score() {
        let candidate = base_candidate("base");
        let base_score = score_candidate(&candidate, &swapchain_requirement()).score;

        let mut improved = base_candidate("improved");
        improved.present_modes.push(PresentMode::Mailbox);
        let improved_score = score_candidate(&improved, &swapchain_requirement()).score;

        assert!(improved_score >= base_score);
    }

    #[test]
    fn test_adding_better_surface_format_never_decreases_score() {
        let candidate = base_candidate("base");
        let base_score = score_candidate(&candidate, &swapchain_requirement()).score;

        let mut improved = base_candidate("improved");
        improved.surface_formats.push(SurfaceFormat {
            format: PixelFormat::Rgba16Float,
            color_space: ColorSpace::ExtendedSrgbNonlinear,
        });
        let improved_score = score_candidate(&improved, &swapchain_requirement()).score;

        assert!(improved_score >= base_score);
    }

    #[test]
    fn test_all_rejected_reports_every_reason() {
        let mut a = base_candidate("a");
        a.extensions.clear();
        let mut b = base_candidate("b");
        b.features = DeviceFeatures::empty();

        let err = select_device(&vec![a, b], &swapchain_requirement()).unwrap_err();
        let report = err.to_string();
        assert!(report.contains("extensions"));
        assert!(report.contains("features"));
    }
}
