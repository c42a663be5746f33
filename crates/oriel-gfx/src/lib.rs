//! 设备/交换链/管线的生命周期核心
//!
//! 选出一张合适的物理显卡，对窗口尺寸变化和设备丢失做交换链与管线
//! 资源的重建，并驱动逐帧的 acquire → 管线链式提交 → present 协议。
//! 核心不依赖任何具体图形 API：GPU 操作全部经过 [`api::GfxApi`]，
//! 由后端 crate（或测试里的记录后端）实现。

pub mod api;
pub mod context;
pub mod draw;
pub mod error;
pub mod foundation;
pub mod frame;
pub mod pipelines;
pub mod swapchain;
pub mod window;

pub use api::{Extent2D, GfxApi};
pub use context::{GfxContext, WindowId};
pub use draw::{ClipRect, DrawBatch, DrawList};
pub use error::GfxError;
pub use foundation::candidate::{DeviceRequirements, PhysicalDeviceCandidate};
pub use foundation::selector::DeviceSelection;
pub use frame::{FrameOutcome, SkipReason};
pub use pipelines::kind::PipelineKind;
pub use pipelines::resources::PipelineSetup;
pub use window::WindowConfig;
