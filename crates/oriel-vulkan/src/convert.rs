//! 核心纯数据类型和 vk 类型之间的互转
//!
//! 枚举方向（vk → 核心）的转换是部分的：核心不认识的格式/模式
//! 直接丢弃，不参与打分。

use ash::vk;
use oriel_gfx::api::{Extent2D, VertexFormat};
use oriel_gfx::foundation::candidate::{ColorSpace, DeviceTypeTier, PixelFormat, PresentMode};
use oriel_gfx::foundation::queue::HardwareQueueFlags;

pub fn extent(e: vk::Extent2D) -> Extent2D {
    Extent2D::new(e.width, e.height)
}

pub fn vk_extent(e: Extent2D) -> vk::Extent2D {
    vk::Extent2D {
        width: e.width,
        height: e.height,
    }
}

pub fn pixel_format(format: vk::Format) -> Option<PixelFormat> {
    match format {
        vk::Format::R8G8B8A8_UNORM => Some(PixelFormat::Rgba8Unorm),
        vk::Format::B8G8R8A8_UNORM => Some(PixelFormat::Bgra8Unorm),
        vk::Format::R16G16B16A16_SFLOAT => Some(PixelFormat::Rgba16Float),
        _ => None,
    }
}

pub fn vk_format(format: PixelFormat) -> vk::Format {
    match format {
        PixelFormat::Rgba8Unorm => vk::Format::R8G8B8A8_UNORM,
        PixelFormat::Bgra8Unorm => vk::Format::B8G8R8A8_UNORM,
        PixelFormat::Rgba16Float => vk::Format::R16G16B16A16_SFLOAT,
    }
}

pub fn color_space(color_space: vk::ColorSpaceKHR) -> Option<ColorSpace> {
    match color_space {
        vk::ColorSpaceKHR::SRGB_NONLINEAR => Some(ColorSpace::SrgbNonlinear),
        vk::ColorSpaceKHR::EXTENDED_SRGB_NONLINEAR_EXT => Some(ColorSpace::ExtendedSrgbNonlinear),
        _ => None,
    }
}

pub fn vk_color_space(color_space: ColorSpace) -> vk::ColorSpaceKHR {
    match color_space {
        ColorSpace::SrgbNonlinear => vk::ColorSpaceKHR::SRGB_NONLINEAR,
        ColorSpace::ExtendedSrgbNonlinear => vk::ColorSpaceKHR::EXTENDED_SRGB_NONLINEAR_EXT,
    }
}

pub fn present_mode(mode: vk::PresentModeKHR) -> Option<PresentMode> {
    match mode {
        vk::PresentModeKHR::IMMEDIATE => Some(PresentMode::Immediate),
        vk::PresentModeKHR::FIFO_RELAXED => Some(PresentMode::FifoRelaxed),
        vk::PresentModeKHR::FIFO => Some(PresentMode::Fifo),
        vk::PresentModeKHR::MAILBOX => Some(PresentMode::Mailbox),
        _ => None,
    }
}

pub fn vk_present_mode(mode: PresentMode) -> vk::PresentModeKHR {
    match mode {
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
        PresentMode::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
    }
}

pub fn device_type(device_type: vk::PhysicalDeviceType) -> DeviceTypeTier {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => DeviceTypeTier::Discrete,
        vk::PhysicalDeviceType::INTEGRATED_GPU => DeviceTypeTier::Integrated,
        vk::PhysicalDeviceType::VIRTUAL_GPU => DeviceTypeTier::Virtual,
        vk::PhysicalDeviceType::CPU => DeviceTypeTier::Cpu,
        _ => DeviceTypeTier::Other,
    }
}

pub fn queue_flags(flags: vk::QueueFlags) -> HardwareQueueFlags {
    let mut hardware = HardwareQueueFlags::empty();
    if flags.contains(vk::QueueFlags::GRAPHICS) {
        hardware |= HardwareQueueFlags::GRAPHICS;
    }
    if flags.contains(vk::QueueFlags::COMPUTE) {
        hardware |= HardwareQueueFlags::COMPUTE;
    }
    if flags.contains(vk::QueueFlags::TRANSFER) {
        hardware |= HardwareQueueFlags::TRANSFER;
    }
    hardware
}

pub fn vk_vertex_format(format: VertexFormat) -> vk::Format {
    match format {
        VertexFormat::F32 => vk::Format::R32_SFLOAT,
        VertexFormat::F32x2 => vk::Format::R32G32_SFLOAT,
        VertexFormat::F32x3 => vk::Format::R32G32B32_SFLOAT,
        VertexFormat::F32x4 => vk::Format::R32G32B32A32_SFLOAT,
    }
}
