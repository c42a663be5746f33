use crate::api::{DrawRecording, Extent2D, GfxApi, PipelineStateDesc};
use crate::pipelines::kind::PipelineKind;

/// 调用方提供的单条管线配置：种类 + 不透明的 SPIR-V 字节块
///
/// `WindowConfig.pipelines` 里的顺序就是每帧的提交顺序
#[derive(Debug, Clone)]
pub struct PipelineSetup {
    pub kind: PipelineKind,
    pub vertex_shader: Vec<u8>,
    pub fragment_shader: Vec<u8>,
}

/// 一次 render 调用的渲染目标，由交换链按管线在链中的位置给出
pub struct RenderTarget<A: GfxApi> {
    pub render_pass: A::RenderPass,
    pub framebuffer: A::Framebuffer,
    pub extent: Extent2D,
    /// Some 表示这条管线在链首，负责 clear
    pub clear_color: Option<[f32; 4]>,
}

/// 单条渲染管线的全部 GPU 资源
///
/// shader 是设备级的，只在设备变更时重建；顶点缓冲/command buffer/semaphore
/// 和 swapchain image 一一对应，数量变化时重建；PSO 绑定到具体的
/// render pass + extent，交换链每次重建都要跟着重建。
///
/// command buffer 的有效位清掉之后，下一次 render 才会惰性重录。
pub struct PipelineResources<A: GfxApi> {
    kind: PipelineKind,
    vertex_shader_spirv: Vec<u8>,
    fragment_shader_spirv: Vec<u8>,

    shaders: Option<ShaderPair<A>>,
    vertex_buffers: Vec<A::Buffer>,
    command_buffers: Vec<A::CommandBuffer>,
    command_buffers_valid: Vec<bool>,
    /// 每个 image 当前上传的顶点数；数量变化意味着几何变化，对应的
    /// command buffer 必须重录
    vertex_counts: Vec<u32>,
    render_finished_semaphores: Vec<A::Semaphore>,
    pipeline_state: Option<A::PipelineState>,

    /// 构建时的交换链代数；与当前代数不符的 command buffer 一律无效
    built_generation: u64,
}

struct ShaderPair<A: GfxApi> {
    vertex: A::ShaderModule,
    fragment: A::ShaderModule,
}

// 创建与销毁
impl<A: GfxApi> PipelineResources<A> {
    pub fn new(setup: PipelineSetup) -> Self {
        Self {
            kind: setup.kind,
            vertex_shader_spirv: setup.vertex_shader,
            fragment_shader_spirv: setup.fragment_shader,
            shaders: None,
            vertex_buffers: Vec::new(),
            command_buffers: Vec::new(),
            command_buffers_valid: Vec::new(),
            vertex_counts: Vec::new(),
            render_finished_semaphores: Vec::new(),
            pipeline_state: None,
            built_generation: 0,
        }
    }

    /// 设备变更后的完整构建：shader → 顶点缓冲 → command buffer →
    /// semaphore → PSO。在已拆除的实例上调用是幂等的。
    pub fn build_for_device_change(
        &mut self,
        api: &mut A,
        render_pass: A::RenderPass,
        extent: Extent2D,
        image_count: u32,
        generation: u64,
    ) {
        log::info!("pipeline[{}]: build for device change ({} images)", self.kind.debug_name(), image_count);
        self.build_shaders(api);
        self.build_vertex_buffers(api, image_count);
        self.build_command_buffers(api, image_count);
        self.build_semaphores(api, image_count);
        self.build_pipeline_state(api, render_pass, extent);
        self.built_generation = generation;
    }

    /// 与 [`Self::build_for_device_change`] 对称的逆操作，严格按构建的逆序拆除
    pub fn teardown_for_device_change(&mut self, api: &mut A) {
        self.teardown_pipeline_state(api);
        self.teardown_semaphores(api);
        self.teardown_command_buffers(api);
        self.teardown_vertex_buffers(api);
        self.teardown_shaders(api);
    }

    /// 交换链变更后的构建：shader 不动；image 数量变了才重建
    /// 顶点缓冲/command buffer/semaphore；PSO 总是对着新的
    /// render pass + extent 重建，所有 command buffer 全部作废。
    pub fn build_for_swapchain_change(
        &mut self,
        api: &mut A,
        render_pass: A::RenderPass,
        extent: Extent2D,
        image_count: u32,
        generation: u64,
    ) {
        debug_assert!(self.shaders.is_some(), "swapchain-change build without device-level resources");

        if image_count as usize != self.command_buffers.len() {
            log::info!(
                "pipeline[{}]: image count {} -> {}, rebuilding per-image resources",
                self.kind.debug_name(),
                self.command_buffers.len(),
                image_count
            );
            self.teardown_semaphores(api);
            self.teardown_command_buffers(api);
            self.teardown_vertex_buffers(api);

            self.build_vertex_buffers(api, image_count);
            self.build_command_buffers(api, image_count);
            self.build_semaphores(api, image_count);
        }
        self.invalidate_command_buffers();
        self.build_pipeline_state(api, render_pass, extent);
        self.built_generation = generation;
    }

    /// 交换链拆除前调用；只有 PSO 绑定到了交换链的 render pass
    pub fn teardown_for_swapchain_change(&mut self, api: &mut A) {
        self.teardown_pipeline_state(api);
    }

    #[inline]
    pub fn is_built(&self) -> bool {
        self.pipeline_state.is_some()
    }

    /// 设备级资源（shader）是否已经建好
    #[inline]
    pub fn has_device_resources(&self) -> bool {
        self.shaders.is_some()
    }

    #[inline]
    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    #[inline]
    pub fn built_generation(&self) -> u64 {
        self.built_generation
    }
}

// 逐帧操作
impl<A: GfxApi> PipelineResources<A> {
    /// 作废所有 command buffer；不碰缓冲分配
    pub fn invalidate_command_buffers(&mut self) {
        for valid in &mut self.command_buffers_valid {
            *valid = false;
        }
    }

    /// 覆写某个 image 的顶点缓冲
    ///
    /// 顶点**数量**变化才会作废对应的 command buffer：录制好的 draw
    /// 烧死了顶点数，内容变化只改缓冲，GPU 执行时自然读到新数据。
    pub fn upload_vertices(&mut self, api: &mut A, image_index: u32, data: &[u8], vertex_count: u32) {
        let index = image_index as usize;
        debug_assert!(index < self.vertex_buffers.len());

        if !data.is_empty() {
            api.write_vertex_buffer(self.vertex_buffers[index], data);
        }
        if self.vertex_counts[index] != vertex_count {
            self.vertex_counts[index] = vertex_count;
            self.command_buffers_valid[index] = false;
        }
    }

    /// 校验（必要时重录）command buffer 并提交，返回本管线的
    /// render-finished semaphore 作为下一条管线的等待依赖
    pub fn render(
        &mut self,
        api: &mut A,
        target: &RenderTarget<A>,
        image_index: u32,
        current_generation: u64,
        wait: A::Semaphore,
    ) -> A::Semaphore {
        let index = image_index as usize;
        debug_assert!(index < self.command_buffers_valid.len(), "image index out of range");
        debug_assert!(
            self.built_generation == current_generation,
            "pipeline[{}] built against generation {} but swapchain is at {}",
            self.kind.debug_name(),
            self.built_generation,
            current_generation,
        );

        if !self.command_buffers_valid[index] {
            log::debug!(
                "pipeline[{}]: re-recording command buffer {} ({} vertices)",
                self.kind.debug_name(),
                index,
                self.vertex_counts[index]
            );
            api.record_draw(
                self.command_buffers[index],
                &DrawRecording {
                    render_pass: target.render_pass,
                    framebuffer: target.framebuffer,
                    extent: target.extent,
                    pipeline: self.pipeline_state.expect("render without built pipeline state"),
                    vertex_buffer: self.vertex_buffers[index],
                    vertex_count: self.vertex_counts[index],
                    clear_color: target.clear_color,
                },
            );
            self.command_buffers_valid[index] = true;
        }

        let signal = self.render_finished_semaphores[index];
        api.submit(self.command_buffers[index], wait, signal);
        signal
    }
}

// 构建过程的各个步骤，成对出现
impl<A: GfxApi> PipelineResources<A> {
    fn build_shaders(&mut self, api: &mut A) {
        if self.shaders.is_some() {
            return;
        }
        let name = self.kind.debug_name();
        self.shaders = Some(ShaderPair {
            vertex: api.create_shader_module(&self.vertex_shader_spirv, &format!("{name}-vert")),
            fragment: api.create_shader_module(&self.fragment_shader_spirv, &format!("{name}-frag")),
        });
    }

    fn teardown_shaders(&mut self, api: &mut A) {
        if let Some(shaders) = self.shaders.take() {
            api.destroy_shader_module(shaders.fragment);
            api.destroy_shader_module(shaders.vertex);
        }
    }

    fn build_vertex_buffers(&mut self, api: &mut A, image_count: u32) {
        debug_assert!(self.vertex_buffers.is_empty());
        let size = self.kind.vertex_buffer_size();
        let name = self.kind.debug_name();
        self.vertex_buffers = (0..image_count)
            .map(|i| api.create_vertex_buffer(size, &format!("{name}-vertices-{i}")))
            .collect();
        self.vertex_counts = vec![0; image_count as usize];
    }

    fn teardown_vertex_buffers(&mut self, api: &mut A) {
        for buffer in self.vertex_buffers.drain(..).rev() {
            api.destroy_buffer(buffer);
        }
        self.vertex_counts.clear();
    }

    fn build_command_buffers(&mut self, api: &mut A, image_count: u32) {
        debug_assert!(self.command_buffers.is_empty());
        self.command_buffers = api.alloc_command_buffers(image_count, self.kind.debug_name());
        self.command_buffers_valid = vec![false; image_count as usize];
    }

    fn teardown_command_buffers(&mut self, api: &mut A) {
        if !self.command_buffers.is_empty() {
            api.free_command_buffers(&self.command_buffers);
            self.command_buffers.clear();
        }
        self.command_buffers_valid.clear();
    }

    fn build_semaphores(&mut self, api: &mut A, image_count: u32) {
        debug_assert!(self.render_finished_semaphores.is_empty());
        let name = self.kind.debug_name();
        self.render_finished_semaphores =
            (0..image_count).map(|i| api.create_semaphore(&format!("{name}-render-finished-{i}"))).collect();
    }

    fn teardown_semaphores(&mut self, api: &mut A) {
        for semaphore in self.render_finished_semaphores.drain(..).rev() {
            api.destroy_semaphore(semaphore);
        }
    }

    fn build_pipeline_state(&mut self, api: &mut A, render_pass: A::RenderPass, extent: Extent2D) {
        debug_assert!(self.pipeline_state.is_none(), "pipeline state must be torn down before rebuild");
        let shaders = self.shaders.as_ref().expect("pipeline state requires shader modules");
        self.pipeline_state = Some(api.create_pipeline_state(&PipelineStateDesc {
            vertex_shader: shaders.vertex,
            fragment_shader: shaders.fragment,
            vertex_layout: self.kind.vertex_layout(),
            blend: self.kind.blend(),
            render_pass,
            extent,
            debug_name: self.kind.debug_name(),
        }));
    }

    fn teardown_pipeline_state(&mut self, api: &mut A) {
        if let Some(pipeline) = self.pipeline_state.take() {
            api.destroy_pipeline_state(pipeline);
        }
    }
}

impl<A: GfxApi> Drop for PipelineResources<A> {
    fn drop(&mut self) {
        debug_assert!(
            self.shaders.is_none() && self.pipeline_state.is_none() && self.vertex_buffers.is_empty(),
            "pipeline[{}] dropped without teardown",
            self.kind.debug_name(),
        );
    }
}
