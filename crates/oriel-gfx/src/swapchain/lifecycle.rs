use crate::api::{Extent2D, GfxApi, RenderPassDesc, RenderPassRole, SurfaceCaps, SwapchainDesc};
use crate::foundation::candidate::{PresentMode, SurfaceFormat};
use crate::swapchain::state::SwapchainState;

/// 进入 Stale 的原因；多个原因叠加时按严重程度合并
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// OS 上报了与构建时不同的 surface 尺寸
    Resized,
    /// acquire/present 返回 out-of-date 或 suboptimal
    OutOfDate,
    /// 设备丢失，连同设备级资源一起重建
    DeviceLost,
}

impl StaleReason {
    fn severity(self) -> u8 {
        match self {
            StaleReason::Resized => 1,
            StaleReason::OutOfDate => 2,
            StaleReason::DeviceLost => 3,
        }
    }

    fn merge(self, other: StaleReason) -> StaleReason {
        if other.severity() > self.severity() { other } else { self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapchainPhase {
    Uninitialized,
    Built,
    Stale(StaleReason),
}

/// Build 的结果；零尺寸不是错误，只是这一帧没东西可画
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Built,
    ZeroExtent,
}

/// 交换链生命周期控制器
///
/// 状态机：`Uninitialized → Built → Stale → (teardown) → Uninitialized`。
/// 重建在下一帧 acquire 之前完成；控制器对交换链独占，重建过程中
/// 外界观察不到部分状态。
pub struct SwapchainLifecycle<A: GfxApi> {
    surface: A::Surface,
    format: SurfaceFormat,
    present_mode: PresentMode,

    phase: SwapchainPhase,
    /// 跨越所有重建单调递增
    generation: u64,
    state: Option<SwapchainState<A>>,
    /// 最近一次 resize 通知的期望尺寸，Build 时生效
    desired_extent: Extent2D,
}

// 创建与销毁
impl<A: GfxApi> SwapchainLifecycle<A> {
    pub fn new(surface: A::Surface, format: SurfaceFormat, present_mode: PresentMode, initial_extent: Extent2D) -> Self {
        Self {
            surface,
            format,
            present_mode,
            phase: SwapchainPhase::Uninitialized,
            generation: 0,
            state: None,
            desired_extent: initial_extent,
        }
    }

    /// 构建全部交换链资源并递增代数
    ///
    /// 创建顺序：swapchain → image view → render pass → framebuffer →
    /// semaphore。teardown 严格按逆序执行。
    pub fn build(&mut self, api: &mut A) -> BuildOutcome {
        debug_assert!(self.state.is_none(), "build on an already-built swapchain");

        let caps = api.surface_capabilities(self.surface);
        let extent = Self::resolve_extent(&caps, self.desired_extent);
        if extent.is_zero() {
            log::debug!("swapchain: zero-area surface, nothing to build this tick");
            return BuildOutcome::ZeroExtent;
        }

        let mut image_count = caps.min_image_count + 1;
        if caps.max_image_count != 0 {
            image_count = image_count.min(caps.max_image_count);
        }

        let (swapchain, image_count) = api.create_swapchain(
            self.surface,
            &SwapchainDesc {
                extent,
                format: self.format,
                present_mode: self.present_mode,
                image_count,
            },
        );

        let image_views = (0..image_count).map(|i| api.create_swapchain_view(swapchain, i)).collect::<Vec<_>>();

        let first_render_pass = api.create_render_pass(&RenderPassDesc {
            format: self.format.format,
            role: RenderPassRole::First,
        });
        let followup_render_pass = api.create_render_pass(&RenderPassDesc {
            format: self.format.format,
            role: RenderPassRole::FollowUp,
        });
        let last_render_pass = api.create_render_pass(&RenderPassDesc {
            format: self.format.format,
            role: RenderPassRole::Last,
        });

        // pass 之间只有 load/store 和布局转换不同，framebuffer 互相兼容
        let framebuffers =
            image_views.iter().map(|view| api.create_framebuffer(first_render_pass, *view, extent)).collect();

        let image_acquired = api.create_semaphore("swapchain-image-acquired");

        self.generation += 1;
        log::info!(
            "swapchain: built generation {} ({}x{}, {} images)",
            self.generation,
            extent.width,
            extent.height,
            image_count
        );

        self.state = Some(SwapchainState {
            swapchain,
            generation: self.generation,
            extent,
            format: self.format,
            image_count,
            image_views,
            first_render_pass,
            followup_render_pass,
            last_render_pass,
            framebuffers,
            image_acquired,
        });
        self.phase = SwapchainPhase::Built;
        BuildOutcome::Built
    }

    /// 等设备空闲后按创建的逆序拆除全部资源
    pub fn teardown(&mut self, api: &mut A) {
        let Some(state) = self.state.take() else {
            self.phase = SwapchainPhase::Uninitialized;
            return;
        };

        // 必须先排干在途的 GPU 工作
        api.wait_idle();

        api.destroy_semaphore(state.image_acquired);
        for framebuffer in state.framebuffers.into_iter().rev() {
            api.destroy_framebuffer(framebuffer);
        }
        api.destroy_render_pass(state.last_render_pass);
        api.destroy_render_pass(state.followup_render_pass);
        api.destroy_render_pass(state.first_render_pass);
        for view in state.image_views.into_iter().rev() {
            api.destroy_image_view(view);
        }
        api.destroy_swapchain(state.swapchain);

        self.phase = SwapchainPhase::Uninitialized;
        log::info!("swapchain: torn down (generation {})", self.generation);
    }

    /// teardown + build，一帧内原子完成
    pub fn rebuild(&mut self, api: &mut A) -> BuildOutcome {
        self.teardown(api);
        self.build(api)
    }
}

// 状态转移
impl<A: GfxApi> SwapchainLifecycle<A> {
    /// OS 上报了新的窗口尺寸
    ///
    /// 与构建时尺寸一致的通知直接忽略；连续多次通知只会在下一帧
    /// 触发一次重建，使用最后一次的尺寸。
    pub fn notify_resize(&mut self, new_extent: Extent2D) {
        self.desired_extent = new_extent;
        if let Some(state) = &self.state
            && state.extent != new_extent
        {
            self.mark_stale(StaleReason::Resized);
        }
    }

    pub fn mark_stale(&mut self, reason: StaleReason) {
        self.phase = match self.phase {
            SwapchainPhase::Uninitialized => SwapchainPhase::Uninitialized,
            SwapchainPhase::Built => SwapchainPhase::Stale(reason),
            SwapchainPhase::Stale(existing) => SwapchainPhase::Stale(existing.merge(reason)),
        };
    }

    fn resolve_extent(caps: &SurfaceCaps, desired: Extent2D) -> Extent2D {
        match caps.current_extent {
            // 驱动定死了尺寸，必须照用
            Some(fixed) => fixed,
            None => desired.clamp(caps.min_extent, caps.max_extent),
        }
    }
}

// getters
impl<A: GfxApi> SwapchainLifecycle<A> {
    #[inline]
    pub fn phase(&self) -> SwapchainPhase {
        self.phase
    }

    #[inline]
    pub fn is_stale(&self) -> bool {
        matches!(self.phase, SwapchainPhase::Stale(_))
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn surface(&self) -> A::Surface {
        self.surface
    }

    /// Built 状态下的交换链资源
    #[inline]
    pub fn state(&self) -> Option<&SwapchainState<A>> {
        self.state.as_ref()
    }
}

impl<A: GfxApi> Drop for SwapchainLifecycle<A> {
    fn drop(&mut self) {
        debug_assert!(self.state.is_none(), "swapchain dropped without teardown");
    }
}
