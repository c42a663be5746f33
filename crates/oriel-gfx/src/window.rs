use crate::api::{AcquireOutcome, Extent2D, GfxApi, PresentOutcome};
use crate::draw::{self, DrawBatch};
use crate::foundation::selector::DeviceSelection;
use crate::frame::{FrameOutcome, FrameTicket, SkipReason};
use crate::pipelines::resources::{PipelineResources, PipelineSetup};
use crate::swapchain::lifecycle::{BuildOutcome, StaleReason, SwapchainLifecycle, SwapchainPhase};

/// acquire 的有界等待，超时翻译成跳帧
const IMAGE_ACQUIRE_TIMEOUT_NS: u64 = 1_000_000_000;

/// attach 时由调用方给出的窗口配置
///
/// `pipelines` 的顺序就是每帧固定的提交顺序
pub struct WindowConfig {
    pub pipelines: Vec<PipelineSetup>,
    pub initial_extent: Extent2D,
    pub clear_color: [f32; 4],
}

impl WindowConfig {
    pub fn new(pipelines: Vec<PipelineSetup>, initial_extent: Extent2D) -> Self {
        Self {
            pipelines,
            initial_extent,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// 单个窗口的渲染器：交换链 + 管线链 + 逐帧提交
///
/// 所有 GPU 调用都通过外部传入的 `api` 走；本类型只负责协议和顺序。
pub struct WindowRenderer<A: GfxApi> {
    swapchain: SwapchainLifecycle<A>,
    pipelines: Vec<PipelineResources<A>>,
    clear_color: [f32; 4],
}

// 创建与销毁
impl<A: GfxApi> WindowRenderer<A> {
    pub fn new(surface: A::Surface, selection: &DeviceSelection, config: WindowConfig) -> Self {
        debug_assert!(!config.pipelines.is_empty(), "a window needs at least one pipeline");
        Self {
            swapchain: SwapchainLifecycle::new(
                surface,
                selection.surface_format,
                selection.present_mode,
                config.initial_extent,
            ),
            pipelines: config.pipelines.into_iter().map(PipelineResources::new).collect(),
            clear_color: config.clear_color,
        }
    }

    /// 设备打开后的完整构建；零尺寸的 surface 会把构建推迟到首帧
    pub fn build_for_device(&mut self, api: &mut A) {
        if self.swapchain.build(api) == BuildOutcome::Built {
            self.build_pipelines(api, true);
        }
    }

    /// 设备丢失/关闭前的完整拆除，与 [`Self::build_for_device`] 对称
    pub fn teardown_for_device(&mut self, api: &mut A) {
        api.wait_idle();
        for pipeline in self.pipelines.iter_mut().rev() {
            pipeline.teardown_for_device_change(api);
        }
        self.swapchain.teardown(api);
    }

    /// detach 时的彻底拆除，连 surface 一起销毁
    pub fn teardown(&mut self, api: &mut A) {
        self.teardown_for_device(api);
        api.destroy_surface(self.swapchain.surface());
    }
}

// 外部通知
impl<A: GfxApi> WindowRenderer<A> {
    pub fn notify_resize(&mut self, new_extent: Extent2D) {
        self.swapchain.notify_resize(new_extent);
    }

    pub fn mark_device_lost(&mut self) {
        self.swapchain.mark_stale(StaleReason::DeviceLost);
    }

    #[inline]
    pub fn surface(&self) -> A::Surface {
        self.swapchain.surface()
    }
}

// 逐帧提交
impl<A: GfxApi> WindowRenderer<A> {
    /// 一帧的完整流程：重建（如需）→ acquire → 逐管线链式提交 → present
    pub fn render_frame(&mut self, api: &mut A, batches: &[DrawBatch]) -> FrameOutcome {
        if let Err(reason) = self.ensure_ready(api) {
            return FrameOutcome::Skipped(reason);
        }

        let (swapchain_handle, acquire_semaphore, generation) = {
            let state = self.swapchain.state().expect("ensure_ready left the swapchain built");
            (state.swapchain, state.image_acquired, state.generation)
        };

        let image_index = match api.acquire_next_image(swapchain_handle, acquire_semaphore, IMAGE_ACQUIRE_TIMEOUT_NS) {
            AcquireOutcome::Ready { image_index } => image_index,
            AcquireOutcome::Suboptimal { image_index } => {
                // image 仍然可用，先画完这一帧，下一帧重建
                self.swapchain.mark_stale(StaleReason::OutOfDate);
                image_index
            }
            AcquireOutcome::OutOfDate => {
                self.swapchain.mark_stale(StaleReason::OutOfDate);
                return FrameOutcome::Skipped(SkipReason::OutOfDate);
            }
            AcquireOutcome::Timeout => return FrameOutcome::Skipped(SkipReason::AcquireTimeout),
        };

        // 把本帧的绘制命令填进各管线当前 image 的顶点缓冲
        for pipeline in &mut self.pipelines {
            let (bytes, vertex_count) = draw::encode_for_pipeline(pipeline.kind(), batches);
            pipeline.upload_vertices(api, image_index, &bytes, vertex_count);
        }

        // 按固定顺序链式提交，前一条的 signal 是后一条的 wait
        let mut ticket = FrameTicket::<A>::new(image_index, acquire_semaphore);
        let pipeline_count = self.pipelines.len();
        for (index, pipeline) in self.pipelines.iter_mut().enumerate() {
            let target = self
                .swapchain
                .state()
                .expect("swapchain stays built for the whole frame")
                .target_for(index, pipeline_count, image_index, self.clear_color);
            let wait = ticket.next_wait();
            let signal = pipeline.render(api, &target, image_index, generation, wait);
            ticket.push_link(pipeline.kind(), wait, signal);
        }

        match api.present(swapchain_handle, image_index, ticket.present_wait()) {
            PresentOutcome::Presented => {}
            PresentOutcome::Suboptimal | PresentOutcome::OutOfDate => {
                // 这一帧已经由呈现引擎处理掉了，下一帧再重建
                self.swapchain.mark_stale(StaleReason::OutOfDate);
            }
        }

        FrameOutcome::Rendered
    }

    /// acquire 之前把交换链弄到 Built 状态；重建失败（零尺寸）时跳帧
    fn ensure_ready(&mut self, api: &mut A) -> Result<(), SkipReason> {
        match self.swapchain.phase() {
            SwapchainPhase::Built => Ok(()),
            SwapchainPhase::Uninitialized | SwapchainPhase::Stale(_) => {
                // PSO 绑定着旧的 render pass，必须先于交换链拆掉
                api.wait_idle();
                for pipeline in self.pipelines.iter_mut().rev() {
                    pipeline.teardown_for_swapchain_change(api);
                }
                match self.swapchain.rebuild(api) {
                    BuildOutcome::ZeroExtent => Err(SkipReason::ZeroExtent),
                    BuildOutcome::Built => {
                        self.build_pipelines(api, false);
                        Ok(())
                    }
                }
            }
        }
    }

    /// 交换链构建完成后把每条管线带到可用状态
    ///
    /// `device_change` 为 false 时走交换链变更路径（shader 不动）；
    /// 但从未建过设备级资源的管线（首次构建被零尺寸推迟）仍然走完整构建。
    fn build_pipelines(&mut self, api: &mut A, device_change: bool) {
        let generation = self.swapchain.generation();
        let pipeline_count = self.pipelines.len();
        let (extent, image_count) = {
            let state = self.swapchain.state().expect("pipelines are built against a built swapchain");
            (state.extent, state.image_count)
        };

        for (index, pipeline) in self.pipelines.iter_mut().enumerate() {
            let render_pass = self
                .swapchain
                .state()
                .expect("pipelines are built against a built swapchain")
                .render_pass_for(index, pipeline_count);
            if device_change || !pipeline.has_device_resources() {
                pipeline.build_for_device_change(api, render_pass, extent, image_count, generation);
            } else {
                pipeline.build_for_swapchain_change(api, render_pass, extent, image_count, generation);
            }
        }
    }
}

// getters
impl<A: GfxApi> WindowRenderer<A> {
    #[inline]
    pub fn is_device_lost(&self) -> bool {
        matches!(self.swapchain.phase(), SwapchainPhase::Stale(StaleReason::DeviceLost))
    }

    #[inline]
    pub fn swapchain_generation(&self) -> u64 {
        self.swapchain.generation()
    }

    #[inline]
    pub fn swapchain_phase(&self) -> SwapchainPhase {
        self.swapchain.phase()
    }
}
