use crate::api::{Extent2D, GfxApi};
use crate::foundation::candidate::SurfaceFormat;
use crate::pipelines::resources::RenderTarget;

/// 一次 Build 产出的全部交换链资源
///
/// 整体构建、整体拆除，外界观察不到部分有效的中间状态。
/// render pass 有三份：链首的负责 clear，中间的保留内容，
/// 链尾的把 image 转到可呈现布局。
pub struct SwapchainState<A: GfxApi> {
    pub swapchain: A::Swapchain,
    /// 本次构建的代数，单调递增
    pub generation: u64,
    pub extent: Extent2D,
    pub format: SurfaceFormat,
    pub image_count: u32,

    pub image_views: Vec<A::ImageView>,
    pub first_render_pass: A::RenderPass,
    pub followup_render_pass: A::RenderPass,
    pub last_render_pass: A::RenderPass,
    pub framebuffers: Vec<A::Framebuffer>,

    /// acquire 时让 GPU 等待的信号；render-finished 语义的 semaphore
    /// 归各管线所有（每个 image 一个）
    pub image_acquired: A::Semaphore,
}

impl<A: GfxApi> SwapchainState<A> {
    /// 按管线在链中的位置挑 render pass
    pub fn render_pass_for(&self, pipeline_index: usize, pipeline_count: usize) -> A::RenderPass {
        if pipeline_index + 1 == pipeline_count {
            self.last_render_pass
        } else if pipeline_index == 0 {
            self.first_render_pass
        } else {
            self.followup_render_pass
        }
    }

    /// 组装一次 render 调用的目标；链首的管线负责 clear
    pub fn target_for(
        &self,
        pipeline_index: usize,
        pipeline_count: usize,
        image_index: u32,
        clear_color: [f32; 4],
    ) -> RenderTarget<A> {
        RenderTarget {
            render_pass: self.render_pass_for(pipeline_index, pipeline_count),
            framebuffer: self.framebuffers[image_index as usize],
            extent: self.extent,
            clear_color: (pipeline_index == 0).then_some(clear_color),
        }
    }
}
