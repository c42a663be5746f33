#![allow(dead_code)]
//! 记录型测试后端
//!
//! 每个 GPU 操作都追加进事件日志，测试据此断言创建/销毁配平、
//! 拆除顺序、录制次数和 semaphore 链。acquire/present 的结果可以
//! 预先排队，用来注入 out-of-date / suboptimal / 超时。

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use oriel_gfx::api::{
    AcquireOutcome, DrawRecording, Extent2D, GfxApi, PipelineStateDesc, PresentOutcome, RenderPassDesc, SurfaceCaps,
    SwapchainDesc,
};
use oriel_gfx::foundation::candidate::{
    ColorSpace, DeviceFeatures, DeviceLimits, DeviceTypeTier, PhysicalDeviceCandidate, PixelFormat, PresentMode,
    SurfaceFormat,
};
use oriel_gfx::foundation::queue::{HardwareQueueFlags, QueueFamilyDesc};
use oriel_gfx::foundation::selector::DeviceSelection;
use oriel_gfx::pipelines::kind::PipelineKind;
use oriel_gfx::window::WindowConfig;
use oriel_gfx::PipelineSetup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Surface,
    Swapchain,
    RenderPass,
    ImageView,
    Framebuffer,
    ShaderModule,
    PipelineState,
    Buffer,
    CommandBuffer,
    Semaphore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Created(HandleKind, u64),
    Destroyed(HandleKind, u64),
    BufferWritten { buffer: u64, bytes: usize },
    Recorded { cmd: u64, vertex_count: u32 },
    Submitted { cmd: u64, wait: u64, signal: u64 },
    Acquired { image_index: Option<u32>, signal: u64 },
    Presented { image_index: u32, wait: u64 },
    WaitIdle,
    DeviceOpened,
    DeviceClosed,
}

macro_rules! mock_handle {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub u64);
    };
}

mock_handle!(MockSurface);
mock_handle!(MockSwapchain);
mock_handle!(MockRenderPass);
mock_handle!(MockImageView);
mock_handle!(MockFramebuffer);
mock_handle!(MockShaderModule);
mock_handle!(MockPipelineState);
mock_handle!(MockBuffer);
mock_handle!(MockCommandBuffer);
mock_handle!(MockSemaphore);

struct MockState {
    next_id: u64,
    events: Vec<Event>,
    live: Vec<(HandleKind, u64)>,

    devices: Vec<PhysicalDeviceCandidate>,
    caps: SurfaceCaps,
    last_swapchain_desc: Option<SwapchainDesc>,
    swapchain_image_count: u32,
    next_image: u32,

    acquire_script: VecDeque<AcquireOutcome>,
    present_script: VecDeque<PresentOutcome>,

    device_open: bool,
}

/// 可克隆的记录后端；克隆共享同一份状态，方便把一份交给
/// `GfxContext`、另一份留在测试里做检查
#[derive(Clone)]
pub struct MockGfx {
    state: Rc<RefCell<MockState>>,
}

impl MockGfx {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState {
                next_id: 0,
                events: Vec::new(),
                live: Vec::new(),
                devices: vec![integrated_candidate("mock-gpu")],
                caps: default_caps(),
                last_swapchain_desc: None,
                swapchain_image_count: 0,
                next_image: 0,
                acquire_script: VecDeque::new(),
                present_script: VecDeque::new(),
                device_open: false,
            })),
        }
    }

    fn alloc(&self, kind: HandleKind) -> u64 {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = state.next_id;
        state.events.push(Event::Created(kind, id));
        state.live.push((kind, id));
        id
    }

    fn release(&self, kind: HandleKind, id: u64) {
        let mut state = self.state.borrow_mut();
        let position = state
            .live
            .iter()
            .position(|entry| *entry == (kind, id))
            .unwrap_or_else(|| panic!("destroying {kind:?} {id} which is not alive"));
        state.live.remove(position);
        state.events.push(Event::Destroyed(kind, id));
    }
}

// 测试配置
impl MockGfx {
    pub fn make_surface(&self) -> MockSurface {
        MockSurface(self.alloc(HandleKind::Surface))
    }

    pub fn set_devices(&self, devices: Vec<PhysicalDeviceCandidate>) {
        self.state.borrow_mut().devices = devices;
    }

    pub fn set_caps(&self, caps: SurfaceCaps) {
        self.state.borrow_mut().caps = caps;
    }

    pub fn push_acquire(&self, outcome: AcquireOutcome) {
        self.state.borrow_mut().acquire_script.push_back(outcome);
    }

    pub fn push_present(&self, outcome: PresentOutcome) {
        self.state.borrow_mut().present_script.push_back(outcome);
    }
}

// 检查
impl MockGfx {
    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    pub fn created_count(&self, kind: HandleKind) -> usize {
        self.state.borrow().events.iter().filter(|e| matches!(e, Event::Created(k, _) if *k == kind)).count()
    }

    pub fn destroyed_count(&self, kind: HandleKind) -> usize {
        self.state.borrow().events.iter().filter(|e| matches!(e, Event::Destroyed(k, _) if *k == kind)).count()
    }

    pub fn recorded_count(&self) -> usize {
        self.state.borrow().events.iter().filter(|e| matches!(e, Event::Recorded { .. })).count()
    }

    pub fn submissions(&self) -> Vec<(u64, u64, u64)> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Submitted { cmd, wait, signal } => Some((*cmd, *wait, *signal)),
                _ => None,
            })
            .collect()
    }

    pub fn last_swapchain_desc(&self) -> Option<SwapchainDesc> {
        self.state.borrow().last_swapchain_desc
    }

    pub fn assert_no_leaks(&self) {
        let state = self.state.borrow();
        assert!(state.live.is_empty(), "leaked handles: {:?}", state.live);
    }
}

impl GfxApi for MockGfx {
    type Surface = MockSurface;
    type Swapchain = MockSwapchain;
    type RenderPass = MockRenderPass;
    type ImageView = MockImageView;
    type Framebuffer = MockFramebuffer;
    type ShaderModule = MockShaderModule;
    type PipelineState = MockPipelineState;
    type Buffer = MockBuffer;
    type CommandBuffer = MockCommandBuffer;
    type Semaphore = MockSemaphore;

    fn enumerate_devices(&mut self, _surface: MockSurface) -> Vec<PhysicalDeviceCandidate> {
        self.state.borrow().devices.clone()
    }

    fn open_device(&mut self, _selection: &DeviceSelection) {
        let mut state = self.state.borrow_mut();
        assert!(!state.device_open, "open_device while a device is already open");
        state.device_open = true;
        state.events.push(Event::DeviceOpened);
    }

    fn close_device(&mut self) {
        let mut state = self.state.borrow_mut();
        assert!(state.device_open, "close_device without an open device");
        state.device_open = false;
        state.events.push(Event::DeviceClosed);
    }

    fn destroy_surface(&mut self, surface: MockSurface) {
        self.release(HandleKind::Surface, surface.0);
    }

    fn wait_idle(&mut self) {
        self.state.borrow_mut().events.push(Event::WaitIdle);
    }

    fn surface_capabilities(&mut self, _surface: MockSurface) -> SurfaceCaps {
        self.state.borrow().caps
    }

    fn create_swapchain(&mut self, _surface: MockSurface, desc: &SwapchainDesc) -> (MockSwapchain, u32) {
        let id = self.alloc(HandleKind::Swapchain);
        let mut state = self.state.borrow_mut();
        state.last_swapchain_desc = Some(*desc);
        state.swapchain_image_count = desc.image_count;
        state.next_image = 0;
        (MockSwapchain(id), desc.image_count)
    }

    fn destroy_swapchain(&mut self, swapchain: MockSwapchain) {
        self.release(HandleKind::Swapchain, swapchain.0);
    }

    fn create_render_pass(&mut self, _desc: &RenderPassDesc) -> MockRenderPass {
        MockRenderPass(self.alloc(HandleKind::RenderPass))
    }

    fn destroy_render_pass(&mut self, render_pass: MockRenderPass) {
        self.release(HandleKind::RenderPass, render_pass.0);
    }

    fn create_swapchain_view(&mut self, _swapchain: MockSwapchain, _image_index: u32) -> MockImageView {
        MockImageView(self.alloc(HandleKind::ImageView))
    }

    fn destroy_image_view(&mut self, view: MockImageView) {
        self.release(HandleKind::ImageView, view.0);
    }

    fn create_framebuffer(
        &mut self,
        _render_pass: MockRenderPass,
        _view: MockImageView,
        _extent: Extent2D,
    ) -> MockFramebuffer {
        MockFramebuffer(self.alloc(HandleKind::Framebuffer))
    }

    fn destroy_framebuffer(&mut self, framebuffer: MockFramebuffer) {
        self.release(HandleKind::Framebuffer, framebuffer.0);
    }

    fn create_semaphore(&mut self, _debug_name: &str) -> MockSemaphore {
        MockSemaphore(self.alloc(HandleKind::Semaphore))
    }

    fn destroy_semaphore(&mut self, semaphore: MockSemaphore) {
        self.release(HandleKind::Semaphore, semaphore.0);
    }

    fn create_shader_module(&mut self, _spirv: &[u8], _debug_name: &str) -> MockShaderModule {
        MockShaderModule(self.alloc(HandleKind::ShaderModule))
    }

    fn destroy_shader_module(&mut self, module: MockShaderModule) {
        self.release(HandleKind::ShaderModule, module.0);
    }

    fn create_vertex_buffer(&mut self, _size: u64, _debug_name: &str) -> MockBuffer {
        MockBuffer(self.alloc(HandleKind::Buffer))
    }

    fn destroy_buffer(&mut self, buffer: MockBuffer) {
        self.release(HandleKind::Buffer, buffer.0);
    }

    fn write_vertex_buffer(&mut self, buffer: MockBuffer, data: &[u8]) {
        self.state.borrow_mut().events.push(Event::BufferWritten {
            buffer: buffer.0,
            bytes: data.len(),
        });
    }

    fn create_pipeline_state(&mut self, _desc: &PipelineStateDesc<'_, Self>) -> MockPipelineState {
        MockPipelineState(self.alloc(HandleKind::PipelineState))
    }

    fn destroy_pipeline_state(&mut self, pipeline: MockPipelineState) {
        self.release(HandleKind::PipelineState, pipeline.0);
    }

    fn alloc_command_buffers(&mut self, count: u32, _debug_name: &str) -> Vec<MockCommandBuffer> {
        (0..count).map(|_| MockCommandBuffer(self.alloc(HandleKind::CommandBuffer))).collect()
    }

    fn free_command_buffers(&mut self, cmds: &[MockCommandBuffer]) {
        for cmd in cmds {
            self.release(HandleKind::CommandBuffer, cmd.0);
        }
    }

    fn record_draw(&mut self, cmd: MockCommandBuffer, desc: &DrawRecording<Self>) {
        self.state.borrow_mut().events.push(Event::Recorded {
            cmd: cmd.0,
            vertex_count: desc.vertex_count,
        });
    }

    fn submit(&mut self, cmd: MockCommandBuffer, wait: MockSemaphore, signal: MockSemaphore) {
        self.state.borrow_mut().events.push(Event::Submitted {
            cmd: cmd.0,
            wait: wait.0,
            signal: signal.0,
        });
    }

    fn acquire_next_image(&mut self, _swapchain: MockSwapchain, signal: MockSemaphore, _timeout_ns: u64) -> AcquireOutcome {
        let mut state = self.state.borrow_mut();
        let outcome = state.acquire_script.pop_front().unwrap_or_else(|| {
            let image_index = state.next_image;
            state.next_image = (state.next_image + 1) % state.swapchain_image_count.max(1);
            AcquireOutcome::Ready { image_index }
        });
        let image_index = match outcome {
            AcquireOutcome::Ready { image_index } | AcquireOutcome::Suboptimal { image_index } => Some(image_index),
            _ => None,
        };
        state.events.push(Event::Acquired {
            image_index,
            signal: signal.0,
        });
        outcome
    }

    fn present(&mut self, _swapchain: MockSwapchain, image_index: u32, wait: MockSemaphore) -> PresentOutcome {
        let mut state = self.state.borrow_mut();
        state.events.push(Event::Presented {
            image_index,
            wait: wait.0,
        });
        state.present_script.pop_front().unwrap_or(PresentOutcome::Presented)
    }
}

// ---------------------------------------------------------------------------
// 共享的测试夹具
// ---------------------------------------------------------------------------

pub fn default_caps() -> SurfaceCaps {
    SurfaceCaps {
        current_extent: None,
        min_extent: Extent2D::new(1, 1),
        max_extent: Extent2D::new(16384, 16384),
        min_image_count: 2,
        max_image_count: 8,
    }
}

pub fn all_in_one_families() -> Vec<QueueFamilyDesc> {
    vec![QueueFamilyDesc {
        index: 0,
        hardware_flags: HardwareQueueFlags::GRAPHICS | HardwareQueueFlags::COMPUTE | HardwareQueueFlags::TRANSFER,
        supports_present: true,
    }]
}

pub fn integrated_candidate(name: &str) -> PhysicalDeviceCandidate {
    PhysicalDeviceCandidate {
        name: name.to_string(),
        vendor_id: 0x8086,
        device_id: 0x9a49,
        device_type: DeviceTypeTier::Integrated,
        features: DeviceFeatures::all(),
        limits: DeviceLimits {
            max_image_dimension_2d: 16384,
            max_vertex_input_attributes: 16,
            max_per_stage_descriptor_samplers: 16,
        },
        extensions: vec!["VK_KHR_swapchain".to_string()],
        surface_formats: vec![SurfaceFormat {
            format: PixelFormat::Bgra8Unorm,
            color_space: ColorSpace::SrgbNonlinear,
        }],
        present_modes: vec![PresentMode::Fifo],
        queue_families: all_in_one_families(),
    }
}

pub fn discrete_candidate(name: &str) -> PhysicalDeviceCandidate {
    let mut candidate = integrated_candidate(name);
    candidate.vendor_id = 0x10de;
    candidate.device_id = 0x2489;
    candidate.device_type = DeviceTypeTier::Discrete;
    candidate.present_modes.push(PresentMode::Mailbox);
    candidate.surface_formats.push(SurfaceFormat {
        format: PixelFormat::Rgba16Float,
        color_space: ColorSpace::ExtendedSrgbNonlinear,
    });
    candidate
}

pub fn swapchain_requirements() -> oriel_gfx::DeviceRequirements {
    oriel_gfx::DeviceRequirements {
        features: DeviceFeatures::SAMPLER_ANISOTROPY | DeviceFeatures::DUAL_SRC_BLEND,
        limits: DeviceLimits {
            max_image_dimension_2d: 4096,
            ..Default::default()
        },
        extensions: vec!["VK_KHR_swapchain".to_string()],
    }
}

/// 五条标准管线，空的 shader 字节块（记录后端不解析）
pub fn standard_config(extent: Extent2D) -> WindowConfig {
    let pipelines = PipelineKind::RENDER_ORDER
        .iter()
        .map(|kind| PipelineSetup {
            kind: *kind,
            vertex_shader: Vec::new(),
            fragment_shader: Vec::new(),
        })
        .collect();
    WindowConfig::new(pipelines, extent)
}
