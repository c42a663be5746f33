use bitflags::bitflags;
use itertools::Itertools;

bitflags! {
    /// 一个 queue family 能承担的角色集合
    ///
    /// 纯值类型，可以用并集/差集组合，用于给 queue family 打分和装配
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct QueueCapabilities: u32 {
        const GRAPHICS = 0b001;
        const PRESENT = 0b010;
        const COMPUTE = 0b100;
    }
}

bitflags! {
    /// 硬件上报的 queue family 原始 flags
    ///
    /// present 支持不在其中，它是 per-surface 查询出来的
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HardwareQueueFlags: u32 {
        const GRAPHICS = 0b0001;
        const COMPUTE = 0b0010;
        const TRANSFER = 0b0100;
    }
}

// 派生谓词
impl QueueCapabilities {
    #[inline]
    pub fn handles_everything(self) -> bool {
        self.contains(Self::GRAPHICS | Self::PRESENT | Self::COMPUTE)
    }

    #[inline]
    pub fn handles_graphics_and_present(self) -> bool {
        self.contains(Self::GRAPHICS | Self::PRESENT)
    }

    #[inline]
    pub fn handles_graphics_and_compute(self) -> bool {
        self.contains(Self::GRAPHICS | Self::COMPUTE)
    }

    /// 给单个 queue family 打分：全能 > graphics+present > 单项角色
    ///
    /// 权重是经验值，只有相对大小有意义
    pub fn score(self) -> u32 {
        let mut score = 0;
        score += if self.handles_everything() { 10 } else { 0 };
        score += if self.handles_graphics_and_present() { 5 } else { 0 };
        score += if self.contains(Self::GRAPHICS) { 1 } else { 0 };
        score += if self.contains(Self::PRESENT) { 1 } else { 0 };
        score += if self.contains(Self::COMPUTE) { 1 } else { 0 };
        score
    }
}

/// 枚举阶段产出的 queue family 描述：原始 flags 加上 per-surface 的 present 支持
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyDesc {
    pub index: u32,
    pub hardware_flags: HardwareQueueFlags,
    pub supports_present: bool,
}

impl QueueFamilyDesc {
    /// 把硬件 flags 和 present 查询结果折算成角色集合
    pub fn capabilities(&self) -> QueueCapabilities {
        let mut caps = QueueCapabilities::empty();
        if self.hardware_flags.contains(HardwareQueueFlags::GRAPHICS) {
            caps |= QueueCapabilities::GRAPHICS;
        }
        if self.hardware_flags.contains(HardwareQueueFlags::COMPUTE) {
            caps |= QueueCapabilities::COMPUTE;
        }
        if self.supports_present {
            caps |= QueueCapabilities::PRESENT;
        }
        caps
    }
}

/// 装配结果中的一项：family index 以及它对总集合的**净贡献**
///
/// 贡献是相对于之前已覆盖角色的差集，因此任何一项的贡献都不为空
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueAssignment {
    pub family_index: u32,
    pub contributed: QueueCapabilities,
}

/// 用尽量少的 queue family 覆盖 {graphics, present, compute}
///
/// 先按得分降序排（stable sort，同分保持枚举顺序），再贪心收取：
/// 只有当一个 family 的角色集合不是已覆盖集合的子集时才接收它。
/// 输入顺序固定时结果是确定的。
pub fn negotiate_queue_families(families: &[QueueFamilyDesc]) -> Vec<QueueAssignment> {
    let mut scored = families.iter().map(|f| (*f, f.capabilities())).collect_vec();
    scored.sort_by(|a, b| b.1.score().cmp(&a.1.score()));

    for (family, caps) in &scored {
        log::debug!("queue family {}: capabilities={:?}, score={}", family.index, caps, caps.score());
    }

    let mut assignments = Vec::new();
    let mut total = QueueCapabilities::empty();
    for (family, caps) in scored {
        if caps.is_empty() || total.contains(caps) {
            continue;
        }
        assignments.push(QueueAssignment {
            family_index: family.index,
            contributed: caps - total,
        });
        total |= caps;
    }

    assignments
}

/// 装配结果覆盖的角色全集
pub fn negotiated_total(assignments: &[QueueAssignment]) -> QueueCapabilities {
    assignments.iter().fold(QueueCapabilities::empty(), |acc, a| acc | a.contributed)
}
