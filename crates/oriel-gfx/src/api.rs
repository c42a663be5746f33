//! 后端协议：任何显式的、基于 command buffer 的图形 API 绑定都实现这个 trait
//!
//! 核心只通过这里的句柄和操作与 GPU 交互。句柄都是 `Copy` 的不透明值，
//! 真正的 API 对象表由绑定自己持有。资源创建失败对绑定来说是致命的
//! （直接 panic，不做部分构建的恢复）；只有 acquire/present 会报告
//! 可恢复的瞬态状态。

use std::fmt::Debug;

use crate::foundation::candidate::{PhysicalDeviceCandidate, PixelFormat, SurfaceFormat};
use crate::foundation::candidate::PresentMode;
use crate::foundation::selector::DeviceSelection;

/// 像素尺寸，核心自己的类型，不依赖任何图形 API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// 面积为零的 surface 无法建交换链（拖动缩放时常见）
    #[inline]
    pub fn is_zero(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// 逐分量 clamp 到 [min, max]
    pub fn clamp(self, min: Extent2D, max: Extent2D) -> Extent2D {
        Extent2D {
            width: self.width.clamp(min.width, max.width),
            height: self.height.clamp(min.height, max.height),
        }
    }
}

/// surface 当前的能力：尺寸范围和 image 数量范围
#[derive(Debug, Clone, Copy)]
pub struct SurfaceCaps {
    /// 驱动定死的当前尺寸；None 表示由应用自己决定（在 min/max 内）
    pub current_extent: Option<Extent2D>,
    pub min_extent: Extent2D,
    pub max_extent: Extent2D,
    pub min_image_count: u32,
    /// 0 表示不限制数量
    pub max_image_count: u32,
}

/// 建交换链的参数
#[derive(Debug, Clone, Copy)]
pub struct SwapchainDesc {
    pub extent: Extent2D,
    pub format: SurfaceFormat,
    pub present_mode: PresentMode,
    pub image_count: u32,
}

/// render pass 在管线链中的位置，决定 attachment 的 load/store 和布局转换
///
/// 第一个 pass 负责 clear，中间的 pass 保留已有内容，最后一个 pass
/// 把 image 转换到可呈现的布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPassRole {
    First,
    FollowUp,
    Last,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderPassDesc {
    pub format: PixelFormat,
    pub role: RenderPassRole,
}

/// 顶点属性的标量布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    F32,
    F32x2,
    F32x3,
    F32x4,
}

#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute {
    pub location: u32,
    pub offset: u32,
    pub format: VertexFormat,
}

/// 一种管线的顶点内存布局，静态描述
#[derive(Debug, Clone, Copy)]
pub struct VertexLayout {
    pub stride: u32,
    pub attributes: &'static [VertexAttribute],
}

/// GUI 管线只需要两种混合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// src-alpha / one-minus-src-alpha
    Alpha,
    Opaque,
}

/// 创建 pipeline state object 所需的全部信息
pub struct PipelineStateDesc<'a, A: GfxApi> {
    pub vertex_shader: A::ShaderModule,
    pub fragment_shader: A::ShaderModule,
    pub vertex_layout: &'static VertexLayout,
    pub blend: BlendMode,
    pub render_pass: A::RenderPass,
    pub extent: Extent2D,
    pub debug_name: &'a str,
}

/// 录制一个 command buffer 所需的全部信息
///
/// 录制内容是固定形状的：begin render pass → bind pipeline →
/// bind vertex buffer → draw(vertex_count) → end
pub struct DrawRecording<A: GfxApi> {
    pub render_pass: A::RenderPass,
    pub framebuffer: A::Framebuffer,
    pub extent: Extent2D,
    pub pipeline: A::PipelineState,
    pub vertex_buffer: A::Buffer,
    pub vertex_count: u32,
    /// Some 表示这个 pass 负责 clear
    pub clear_color: Option<[f32; 4]>,
}

/// acquire 的结果；Suboptimal 的 image 仍然可用，但交换链该重建了
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    Ready { image_index: u32 },
    Suboptimal { image_index: u32 },
    OutOfDate,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    Presented,
    Suboptimal,
    OutOfDate,
}

/// 显式图形 API 绑定要实现的协议
///
/// 所有创建/销毁必须严格成对；核心保证按创建的逆序调用销毁。
/// `submit` 的 wait/signal 语义：GPU 侧等待 `wait` 触发后才开始执行，
/// 执行完毕后触发 `signal`。
pub trait GfxApi: Sized {
    type Surface: Copy + Eq + Debug;
    type Swapchain: Copy + Eq + Debug;
    type RenderPass: Copy + Eq + Debug;
    type ImageView: Copy + Eq + Debug;
    type Framebuffer: Copy + Eq + Debug;
    type ShaderModule: Copy + Eq + Debug;
    type PipelineState: Copy + Eq + Debug;
    type Buffer: Copy + Eq + Debug;
    type CommandBuffer: Copy + Eq + Debug;
    type Semaphore: Copy + Eq + Debug;

    // ------------------------------------------------------------------
    // 设备枚举与生命周期
    // ------------------------------------------------------------------

    /// 枚举所有物理设备；present 支持按给定 surface 查询
    fn enumerate_devices(&mut self, surface: Self::Surface) -> Vec<PhysicalDeviceCandidate>;

    /// 按选择结果打开逻辑设备并取出协商好的各角色 queue
    fn open_device(&mut self, selection: &DeviceSelection);

    /// 关闭当前逻辑设备；调用前核心已保证所有设备级资源都已销毁
    fn close_device(&mut self);

    fn destroy_surface(&mut self, surface: Self::Surface);

    /// 等待设备空闲；teardown 前必须调用（无界阻塞）
    fn wait_idle(&mut self);

    // ------------------------------------------------------------------
    // 交换链资源
    // ------------------------------------------------------------------

    fn surface_capabilities(&mut self, surface: Self::Surface) -> SurfaceCaps;

    /// 返回交换链和实际的 image 数量（驱动可能多给）
    fn create_swapchain(&mut self, surface: Self::Surface, desc: &SwapchainDesc) -> (Self::Swapchain, u32);
    fn destroy_swapchain(&mut self, swapchain: Self::Swapchain);

    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Self::RenderPass;
    fn destroy_render_pass(&mut self, render_pass: Self::RenderPass);

    fn create_swapchain_view(&mut self, swapchain: Self::Swapchain, image_index: u32) -> Self::ImageView;
    fn destroy_image_view(&mut self, view: Self::ImageView);

    fn create_framebuffer(
        &mut self,
        render_pass: Self::RenderPass,
        view: Self::ImageView,
        extent: Extent2D,
    ) -> Self::Framebuffer;
    fn destroy_framebuffer(&mut self, framebuffer: Self::Framebuffer);

    fn create_semaphore(&mut self, debug_name: &str) -> Self::Semaphore;
    fn destroy_semaphore(&mut self, semaphore: Self::Semaphore);

    // ------------------------------------------------------------------
    // 管线资源
    // ------------------------------------------------------------------

    /// spirv 是调用方提供的不透明字节块
    fn create_shader_module(&mut self, spirv: &[u8], debug_name: &str) -> Self::ShaderModule;
    fn destroy_shader_module(&mut self, module: Self::ShaderModule);

    /// host-visible 的顶点缓冲
    fn create_vertex_buffer(&mut self, size: u64, debug_name: &str) -> Self::Buffer;
    fn destroy_buffer(&mut self, buffer: Self::Buffer);

    /// 覆写缓冲前缀；data 长度不会超过创建时的 size
    fn write_vertex_buffer(&mut self, buffer: Self::Buffer, data: &[u8]);

    fn create_pipeline_state(&mut self, desc: &PipelineStateDesc<'_, Self>) -> Self::PipelineState;
    fn destroy_pipeline_state(&mut self, pipeline: Self::PipelineState);

    fn alloc_command_buffers(&mut self, count: u32, debug_name: &str) -> Vec<Self::CommandBuffer>;
    fn free_command_buffers(&mut self, cmds: &[Self::CommandBuffer]);

    // ------------------------------------------------------------------
    // 录制、提交、呈现
    // ------------------------------------------------------------------

    /// 重置并重新录制一个 command buffer
    fn record_draw(&mut self, cmd: Self::CommandBuffer, desc: &DrawRecording<Self>);

    /// 提交到 graphics queue；队列满时阻塞（不可取消）
    fn submit(&mut self, cmd: Self::CommandBuffer, wait: Self::Semaphore, signal: Self::Semaphore);

    /// 有界等待下一个可用 image，超时翻译成 [`AcquireOutcome::Timeout`]
    fn acquire_next_image(
        &mut self,
        swapchain: Self::Swapchain,
        signal: Self::Semaphore,
        timeout_ns: u64,
    ) -> AcquireOutcome;

    fn present(&mut self, swapchain: Self::Swapchain, image_index: u32, wait: Self::Semaphore) -> PresentOutcome;
}
