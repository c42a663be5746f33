//! 最小的演示 App：一个窗口，画一个带圆角盒和纯色快的界面骨架
//!
//! SPIR-V 从工作区的 `shaders/` 目录读取（`<kind>.vert.spv` /
//! `<kind>.frag.spv`），由外部的着色器构建流程产出。

use anyhow::Context;
use oriel_crate_tools::init_log::init_log;
use oriel_crate_tools::resource::OrielPath;
use oriel_gfx::foundation::candidate::{DeviceFeatures, DeviceLimits, DeviceRequirements};
use oriel_gfx::pipelines::kind::{BoxVertex, FlatVertex, PipelineKind};
use oriel_gfx::{ClipRect, DrawBatch, DrawList, Extent2D, GfxContext, PipelineSetup, WindowConfig, WindowId};
use oriel_vulkan::VulkanApi;
use raw_window_handle::HasDisplayHandle;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId as WinitWindowId};

struct QuadDemo {
    window: Option<Window>,
    gfx: Option<GfxContext<VulkanApi>>,
    gfx_window: Option<WindowId>,
}

// 初始化
impl QuadDemo {
    fn new() -> Self {
        Self {
            window: None,
            gfx: None,
            gfx_window: None,
        }
    }

    /// 在 window 创建之后初始化渲染
    fn init_after_window(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attr = Window::default_attributes()
            .with_title("oriel quad demo")
            .with_inner_size(winit::dpi::LogicalSize::new(1200.0, 800.0));
        let window = event_loop.create_window(window_attr)?;

        let api = VulkanApi::new("oriel-quad-demo", event_loop.display_handle()?.as_raw());
        let surface = api.create_surface(&window);

        let requirements = DeviceRequirements {
            features: DeviceFeatures::SAMPLER_ANISOTROPY | DeviceFeatures::INDEPENDENT_BLEND | DeviceFeatures::DUAL_SRC_BLEND,
            limits: DeviceLimits {
                max_image_dimension_2d: 4096,
                ..Default::default()
            },
            extensions: vec!["VK_KHR_swapchain".to_string()],
        };
        let gfx = GfxContext::new(api, requirements);

        let size = window.inner_size();
        let config = WindowConfig::new(load_pipelines()?, Extent2D::new(size.width, size.height));
        let (gfx_window, selection) = gfx.attach_window(surface, config)?;
        log::info!("rendering on: {}", selection.identity);

        self.window = Some(window);
        self.gfx = Some(gfx);
        self.gfx_window = Some(gfx_window);
        Ok(())
    }

    fn destroy(&mut self) {
        if let (Some(gfx), Some(id)) = (self.gfx.take(), self.gfx_window.take()) {
            let _ = gfx.detach_window(id);
            // drop 时关闭设备并拆掉 instance
        }
        self.window = None;
    }
}

// 每帧内容
impl QuadDemo {
    fn frame_batches(&self) -> Vec<DrawBatch> {
        let background = DrawBatch::new(DrawList::Flat(flat_quad(
            [100.0, 100.0],
            [1000.0, 600.0],
            [0.13, 0.14, 0.18, 1.0],
        )));

        let mut panel = DrawBatch::new(DrawList::Box(rounded_box(
            [200.0, 160.0],
            [800.0, 480.0],
            [0.21, 0.23, 0.30, 1.0],
        )));
        panel.clip = ClipRect {
            x: 100.0,
            y: 100.0,
            width: 1000.0,
            height: 600.0,
        };

        vec![background, panel, DrawBatch::new(DrawList::ToneMap)]
    }

    fn redraw(&mut self) {
        let (Some(gfx), Some(id)) = (&self.gfx, self.gfx_window) else {
            return;
        };
        match gfx.render_frame(id, &self.frame_batches()) {
            Ok(outcome) => log::trace!("frame: {outcome:?}"),
            Err(err) => log::error!("frame failed: {err}"),
        }
    }
}

impl ApplicationHandler for QuadDemo {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init_after_window(event_loop) {
            log::error!("init failed: {err:#}");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WinitWindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let (Some(gfx), Some(id)) = (&self.gfx, self.gfx_window) {
                    let _ = gfx.notify_resize(id, Extent2D::new(size.width, size.height));
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("loop exiting");
        self.destroy();
    }
}

/// 读取五条管线的 SPIR-V
fn load_pipelines() -> anyhow::Result<Vec<PipelineSetup>> {
    PipelineKind::RENDER_ORDER
        .iter()
        .map(|kind| {
            let name = kind.debug_name();
            let load = |stage: &str| {
                let path = OrielPath::shader_path(&format!("{name}.{stage}.spv"));
                std::fs::read(&path).with_context(|| format!("missing shader blob: {}", path.display()))
            };
            Ok(PipelineSetup {
                kind: *kind,
                vertex_shader: load("vert")?,
                fragment_shader: load("frag")?,
            })
        })
        .collect()
}

fn flat_quad(origin: [f32; 2], size: [f32; 2], color: [f32; 4]) -> Vec<FlatVertex> {
    let [x, y] = origin;
    let [w, h] = size;
    let clip = [0.0; 4];
    let v = |position: [f32; 2]| FlatVertex { position, color, clip };
    vec![
        v([x, y]),
        v([x + w, y]),
        v([x, y + h]),
        v([x + w, y]),
        v([x + w, y + h]),
        v([x, y + h]),
    ]
}

fn rounded_box(origin: [f32; 2], size: [f32; 2], fill_color: [f32; 4]) -> Vec<BoxVertex> {
    let [x, y] = origin;
    let [w, h] = size;
    let v = |position: [f32; 2]| BoxVertex {
        position,
        clip: [0.0; 4],
        corner_radii: [12.0; 4],
        fill_color,
        border_color: [0.45, 0.47, 0.55, 1.0],
        border_width: 1.5,
    };
    vec![
        v([x, y]),
        v([x + w, y]),
        v([x, y + h]),
        v([x + w, y]),
        v([x + w, y + h]),
        v([x, y + h]),
    ]
}

fn main() -> anyhow::Result<()> {
    init_log();

    let event_loop = EventLoop::new()?;
    let mut app = QuadDemo::new();
    event_loop.run_app(&mut app)?;
    Ok(())
}
