//! Oriel 的 Vulkan 后端
//!
//! 用 ash 实现 `oriel-gfx` 的 [`oriel_gfx::GfxApi`] 协议：
//! instance/debug messenger/surface 在 [`VulkanApi`] 创建时就绪，
//! 逻辑设备、交换链和管线资源由核心按协议驱动。

pub mod api;
pub mod convert;
pub mod device;
pub mod foundation;

pub use api::VulkanApi;
pub use device::BufferHandle;
