use bitflags::bitflags;

use crate::foundation::queue::QueueFamilyDesc;

/// 设备类型的档次，独显最高
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceTypeTier {
    Discrete,
    Integrated,
    Virtual,
    Cpu,
    Other,
}

impl DeviceTypeTier {
    /// 档次得分：discrete > integrated > virtual > cpu/other
    pub fn score(self) -> i64 {
        match self {
            DeviceTypeTier::Discrete => 4,
            DeviceTypeTier::Integrated => 3,
            DeviceTypeTier::Virtual => 2,
            DeviceTypeTier::Cpu => 1,
            DeviceTypeTier::Other => 1,
        }
    }
}

bitflags! {
    /// GUI 渲染需要的 device features
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DeviceFeatures: u32 {
        const SAMPLER_ANISOTROPY = 0b001;
        const INDEPENDENT_BLEND = 0b010;
        /// 亚像素文字渲染需要 dual-source blending
        const DUAL_SRC_BLEND = 0b100;
    }
}

/// 选择设备时关心的 limits 子集
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceLimits {
    pub max_image_dimension_2d: u32,
    pub max_vertex_input_attributes: u32,
    pub max_per_stage_descriptor_samplers: u32,
}

impl DeviceLimits {
    /// 每一项都不低于要求的下限
    pub fn meets(&self, required: &DeviceLimits) -> bool {
        self.max_image_dimension_2d >= required.max_image_dimension_2d
            && self.max_vertex_input_attributes >= required.max_vertex_input_attributes
            && self.max_per_stage_descriptor_samplers >= required.max_per_stage_descriptor_samplers
    }
}

/// swapchain image 的像素格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8Unorm,
    Bgra8Unorm,
    Rgba16Float,
}

impl PixelFormat {
    /// 位深更高的格式得分更高
    pub fn score(self) -> i64 {
        match self {
            PixelFormat::Rgba8Unorm | PixelFormat::Bgra8Unorm => 1,
            PixelFormat::Rgba16Float => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    SrgbNonlinear,
    ExtendedSrgbNonlinear,
}

impl ColorSpace {
    /// 扩展色域的得分远高于普通 sRGB
    pub fn score(self) -> i64 {
        match self {
            ColorSpace::SrgbNonlinear => 1,
            ColorSpace::ExtendedSrgbNonlinear => 100,
        }
    }
}

/// surface 支持的 (format, color space) 组合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceFormat {
    pub format: PixelFormat,
    pub color_space: ColorSpace,
}

impl SurfaceFormat {
    #[inline]
    pub fn score(self) -> i64 {
        self.format.score() + self.color_space.score()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentMode {
    Immediate,
    FifoRelaxed,
    Fifo,
    Mailbox,
}

impl PresentMode {
    /// mailbox > fifo-relaxed > fifo > immediate
    ///
    /// fifo 系列不撕裂所以优于 immediate，mailbox 低延迟且不撕裂
    pub fn score(self) -> i64 {
        match self {
            PresentMode::Immediate => 1,
            PresentMode::FifoRelaxed => 2,
            PresentMode::Fifo => 3,
            PresentMode::Mailbox => 10,
        }
    }
}

/// 一张物理显卡的不可变描述
///
/// 由后端枚举产生，之后不再修改。选择逻辑只依赖这里的纯数据，
/// 不触碰任何图形 API 对象。
#[derive(Debug, Clone)]
pub struct PhysicalDeviceCandidate {
    pub name: String,
    pub vendor_id: u32,
    pub device_id: u32,
    pub device_type: DeviceTypeTier,

    pub features: DeviceFeatures,
    pub limits: DeviceLimits,
    pub extensions: Vec<String>,

    /// 针对目标 surface 查询出来的支持列表
    pub surface_formats: Vec<SurfaceFormat>,
    pub present_modes: Vec<PresentMode>,

    pub queue_families: Vec<QueueFamilyDesc>,
}

impl PhysicalDeviceCandidate {
    /// "vendor:device name" 形式的标识串，用于日志和拒绝报告
    pub fn identity(&self) -> String {
        format!("{:04x}:{:04x} {}", self.vendor_id, self.device_id, self.name)
    }

    #[inline]
    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|e| e == name)
    }
}

/// 设备必须满足的 features/limits/extensions 清单
#[derive(Debug, Clone, Default)]
pub struct DeviceRequirements {
    pub features: DeviceFeatures,
    pub limits: DeviceLimits,
    pub extensions: Vec<String>,
}
