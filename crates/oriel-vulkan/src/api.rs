use std::ffi::CStr;
use std::io::Cursor;

use ash::vk;
use itertools::Itertools;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle};

use oriel_gfx::api::{
    AcquireOutcome, BlendMode, DrawRecording, GfxApi, PipelineStateDesc, PresentOutcome, RenderPassDesc,
    RenderPassRole, SurfaceCaps, SwapchainDesc,
};
use oriel_gfx::foundation::candidate::{DeviceFeatures, DeviceLimits, PhysicalDeviceCandidate, SurfaceFormat};
use oriel_gfx::foundation::queue::QueueFamilyDesc;
use oriel_gfx::foundation::selector::DeviceSelection;

use crate::convert;
use crate::device::{BufferHandle, DeviceContext};
use crate::foundation::debug_messenger::DebugMessenger;
use crate::foundation::instance::Instance;

/// ash 后端：用 Vulkan 实现核心的 [`GfxApi`] 协议
///
/// instance 级的对象在这里创建一次；逻辑设备按核心的指令开关。
/// 除了 acquire/present 的瞬态状态码之外，任何 vk 调用失败都是
/// 致命的，直接 panic（带着残缺的 GPU 状态继续跑风险更大）。
pub struct VulkanApi {
    surface_pf: ash::khr::surface::Instance,
    // 字段顺序即 drop 顺序：messenger 必须先于 instance 销毁
    debug_messenger: Option<DebugMessenger>,
    instance: Instance,

    /// 上一次枚举的结果，candidate_index 指向这里
    physical_devices: Vec<vk::PhysicalDevice>,
    device: Option<DeviceContext>,
}

// 创建与销毁
impl VulkanApi {
    /// display handle 用来收集 surface 相关的 instance extension
    pub fn new(app_name: &str, display_handle: RawDisplayHandle) -> Self {
        let surface_exts = ash_window::enumerate_required_extensions(display_handle).unwrap();
        let surface_exts =
            surface_exts.iter().map(|ext| unsafe { CStr::from_ptr(*ext) }).collect_vec();

        let instance = Instance::new(app_name, &surface_exts);
        let debug_messenger = DebugMessenger::new(instance.entry(), instance.ash_instance());
        let surface_pf = ash::khr::surface::Instance::new(instance.entry(), instance.ash_instance());

        Self {
            surface_pf,
            debug_messenger: Some(debug_messenger),
            instance,
            physical_devices: Vec::new(),
            device: None,
        }
    }

    /// 从 OS 窗口创建 surface；销毁走 [`GfxApi::destroy_surface`]
    pub fn create_surface(&self, window: &(impl HasDisplayHandle + HasWindowHandle)) -> vk::SurfaceKHR {
        unsafe {
            ash_window::create_surface(
                self.instance.entry(),
                self.instance.ash_instance(),
                window.display_handle().unwrap().as_raw(),
                window.window_handle().unwrap().as_raw(),
                None,
            )
            .unwrap()
        }
    }
}

impl Drop for VulkanApi {
    fn drop(&mut self) {
        // 正常路径下上层会先关闭设备；这里兜住异常退出
        if let Some(device) = self.device.take() {
            log::warn!("api dropped with an open device, closing it");
            device.close();
        }
    }
}

// 内部工具
impl VulkanApi {
    #[inline]
    fn device(&self) -> &DeviceContext {
        self.device.as_ref().expect("no open device")
    }

    #[inline]
    fn device_mut(&mut self) -> &mut DeviceContext {
        self.device.as_mut().expect("no open device")
    }

    /// 把一张物理显卡的全部信息抓成核心的纯数据描述
    fn capture_candidate(&self, pd: vk::PhysicalDevice, surface: vk::SurfaceKHR) -> PhysicalDeviceCandidate {
        let instance = self.instance.ash_instance();

        let props = unsafe { instance.get_physical_device_properties(pd) };
        let name = unsafe { CStr::from_ptr(props.device_name.as_ptr()) }.to_string_lossy().into_owned();
        log::info!("found gpu: {}", name);

        let features = unsafe { instance.get_physical_device_features(pd) };
        let mut feature_flags = DeviceFeatures::empty();
        if features.sampler_anisotropy == vk::TRUE {
            feature_flags |= DeviceFeatures::SAMPLER_ANISOTROPY;
        }
        if features.independent_blend == vk::TRUE {
            feature_flags |= DeviceFeatures::INDEPENDENT_BLEND;
        }
        if features.dual_src_blend == vk::TRUE {
            feature_flags |= DeviceFeatures::DUAL_SRC_BLEND;
        }

        let extensions = unsafe { instance.enumerate_device_extension_properties(pd).unwrap() }
            .iter()
            .map(|ext| {
                unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) }.to_string_lossy().into_owned()
            })
            .collect_vec();

        let surface_formats = unsafe { self.surface_pf.get_physical_device_surface_formats(pd, surface).unwrap() }
            .iter()
            .filter_map(|f| {
                Some(SurfaceFormat {
                    format: convert::pixel_format(f.format)?,
                    color_space: convert::color_space(f.color_space)?,
                })
            })
            .collect_vec();

        let present_modes =
            unsafe { self.surface_pf.get_physical_device_surface_present_modes(pd, surface).unwrap() }
                .iter()
                .filter_map(|mode| convert::present_mode(*mode))
                .collect_vec();

        let queue_families = unsafe { instance.get_physical_device_queue_family_properties(pd) }
            .iter()
            .enumerate()
            .map(|(index, family)| QueueFamilyDesc {
                index: index as u32,
                hardware_flags: convert::queue_flags(family.queue_flags),
                supports_present: unsafe {
                    self.surface_pf.get_physical_device_surface_support(pd, index as u32, surface).unwrap_or(false)
                },
            })
            .collect_vec();

        PhysicalDeviceCandidate {
            name,
            vendor_id: props.vendor_id,
            device_id: props.device_id,
            device_type: convert::device_type(props.device_type),
            features: feature_flags,
            limits: DeviceLimits {
                max_image_dimension_2d: props.limits.max_image_dimension2_d,
                max_vertex_input_attributes: props.limits.max_vertex_input_attributes,
                max_per_stage_descriptor_samplers: props.limits.max_per_stage_descriptor_samplers,
            },
            extensions,
            surface_formats,
            present_modes,
            queue_families,
        }
    }

    /// 组装一条图形管线；viewport/scissor 静态绑定到 extent，
    /// 所以交换链尺寸变化时 PSO 必须跟着重建
    fn build_pipeline(device: &DeviceContext, desc: &PipelineStateDesc<'_, VulkanApi>) -> (vk::Pipeline, vk::PipelineLayout) {
        let layout = unsafe {
            device.device.create_pipeline_layout(&vk::PipelineLayoutCreateInfo::default(), None).unwrap()
        };

        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(desc.vertex_shader)
                .name(c"main"),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(desc.fragment_shader)
                .name(c"main"),
        ];

        let vertex_bindings = [vk::VertexInputBindingDescription {
            binding: 0,
            stride: desc.vertex_layout.stride,
            input_rate: vk::VertexInputRate::VERTEX,
        }];
        let vertex_attributes = desc
            .vertex_layout
            .attributes
            .iter()
            .map(|attr| vk::VertexInputAttributeDescription {
                location: attr.location,
                binding: 0,
                format: convert::vk_vertex_format(attr.format),
                offset: attr.offset,
            })
            .collect_vec();
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewports = [vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: desc.extent.width as f32,
            height: desc.extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }];
        let scissors = [vk::Rect2D {
            offset: vk::Offset2D::default(),
            extent: convert::vk_extent(desc.extent),
        }];
        let viewport_state = vk::PipelineViewportStateCreateInfo::default().viewports(&viewports).scissors(&scissors);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .polygon_mode(vk::PolygonMode::FILL)
            // GUI 的几何两面都要画
            .cull_mode(vk::CullModeFlags::NONE)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .line_width(1.0);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let blend_attachments = [match desc.blend {
            BlendMode::Alpha => vk::PipelineColorBlendAttachmentState::default()
                .blend_enable(true)
                .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                .color_blend_op(vk::BlendOp::ADD)
                .src_alpha_blend_factor(vk::BlendFactor::ONE)
                .dst_alpha_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                .alpha_blend_op(vk::BlendOp::ADD)
                .color_write_mask(vk::ColorComponentFlags::RGBA),
            BlendMode::Opaque => {
                vk::PipelineColorBlendAttachmentState::default().color_write_mask(vk::ColorComponentFlags::RGBA)
            }
        }];
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default().attachments(&blend_attachments);

        let pipeline_ci = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .layout(layout)
            .render_pass(desc.render_pass)
            .subpass(0);

        let pipeline = unsafe {
            device
                .device
                .create_graphics_pipelines(vk::PipelineCache::null(), std::slice::from_ref(&pipeline_ci), None)
                .unwrap()[0]
        };
        device.set_object_debug_name(pipeline, desc.debug_name);

        (pipeline, layout)
    }
}

impl GfxApi for VulkanApi {
    type Surface = vk::SurfaceKHR;
    type Swapchain = vk::SwapchainKHR;
    type RenderPass = vk::RenderPass;
    type ImageView = vk::ImageView;
    type Framebuffer = vk::Framebuffer;
    type ShaderModule = vk::ShaderModule;
    type PipelineState = vk::Pipeline;
    type Buffer = BufferHandle;
    type CommandBuffer = vk::CommandBuffer;
    type Semaphore = vk::Semaphore;

    fn enumerate_devices(&mut self, surface: vk::SurfaceKHR) -> Vec<PhysicalDeviceCandidate> {
        self.physical_devices =
            unsafe { self.instance.ash_instance().enumerate_physical_devices().unwrap() };
        self.physical_devices.clone().iter().map(|pd| self.capture_candidate(*pd, surface)).collect()
    }

    fn open_device(&mut self, selection: &DeviceSelection) {
        assert!(self.device.is_none(), "a device is already open");
        let pd = self.physical_devices[selection.candidate_index];
        self.device = Some(DeviceContext::open(self.instance.ash_instance(), pd, selection));
    }

    fn close_device(&mut self) {
        self.device.take().expect("no open device").close();
    }

    fn destroy_surface(&mut self, surface: vk::SurfaceKHR) {
        unsafe {
            self.surface_pf.destroy_surface(surface, None);
        }
    }

    fn wait_idle(&mut self) {
        if let Some(device) = &self.device {
            unsafe {
                device.device.device_wait_idle().unwrap();
            }
        }
    }

    fn surface_capabilities(&mut self, surface: vk::SurfaceKHR) -> SurfaceCaps {
        let pd = self.device().physical_device;
        let caps = unsafe { self.surface_pf.get_physical_device_surface_capabilities(pd, surface).unwrap() };

        SurfaceCaps {
            // u32::MAX 表示由应用决定尺寸
            current_extent: (caps.current_extent.width != u32::MAX).then(|| convert::extent(caps.current_extent)),
            min_extent: convert::extent(caps.min_image_extent),
            max_extent: convert::extent(caps.max_image_extent),
            min_image_count: caps.min_image_count,
            max_image_count: caps.max_image_count,
        }
    }

    fn create_swapchain(&mut self, surface: vk::SurfaceKHR, desc: &SwapchainDesc) -> (vk::SwapchainKHR, u32) {
        let pd = self.device().physical_device;
        let caps = unsafe { self.surface_pf.get_physical_device_surface_capabilities(pd, surface).unwrap() };

        let vk_format = convert::vk_format(desc.format.format);
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(desc.image_count)
            .image_format(vk_format)
            .image_color_space(convert::vk_color_space(desc.format.color_space))
            .image_extent(convert::vk_extent(desc.extent))
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .pre_transform(caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(convert::vk_present_mode(desc.present_mode))
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .clipped(true);

        let device = self.device_mut();
        let swapchain = unsafe { device.swapchain_pf.create_swapchain(&create_info, None).unwrap() };
        let images = unsafe { device.swapchain_pf.get_swapchain_images(swapchain).unwrap() };
        for (index, image) in images.iter().enumerate() {
            device.set_object_debug_name(*image, format!("swapchain-image-{index}"));
        }

        let image_count = images.len() as u32;
        device.swapchain_images.insert(swapchain, (images, vk_format));
        (swapchain, image_count)
    }

    fn destroy_swapchain(&mut self, swapchain: vk::SwapchainKHR) {
        let device = self.device_mut();
        device.swapchain_images.remove(&swapchain);
        unsafe {
            device.swapchain_pf.destroy_swapchain(swapchain, None);
        }
    }

    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> vk::RenderPass {
        // 链首 clear，中间的 load，链尾转换到可呈现的布局
        let (load_op, initial_layout, final_layout) = match desc.role {
            RenderPassRole::First => (
                vk::AttachmentLoadOp::CLEAR,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            ),
            RenderPassRole::FollowUp => (
                vk::AttachmentLoadOp::LOAD,
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            ),
            RenderPassRole::Last => (
                vk::AttachmentLoadOp::LOAD,
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
                vk::ImageLayout::PRESENT_SRC_KHR,
            ),
        };

        let attachments = [vk::AttachmentDescription::default()
            .format(convert::vk_format(desc.format))
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(load_op)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(initial_layout)
            .final_layout(final_layout)];

        let color_refs = [vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];
        let subpasses = [vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs)];

        // 等 acquire semaphore 生效的阶段和写 attachment 的阶段对齐
        let dependencies = [vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)];

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        unsafe { self.device().device.create_render_pass(&create_info, None).unwrap() }
    }

    fn destroy_render_pass(&mut self, render_pass: vk::RenderPass) {
        unsafe {
            self.device().device.destroy_render_pass(render_pass, None);
        }
    }

    fn create_swapchain_view(&mut self, swapchain: vk::SwapchainKHR, image_index: u32) -> vk::ImageView {
        let device = self.device();
        let (images, format) = device.swapchain_images.get(&swapchain).expect("unknown swapchain");
        let image = images[image_index as usize];

        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(*format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        let view = unsafe { device.device.create_image_view(&create_info, None).unwrap() };
        device.set_object_debug_name(view, format!("swapchain-view-{image_index}"));
        view
    }

    fn destroy_image_view(&mut self, view: vk::ImageView) {
        unsafe {
            self.device().device.destroy_image_view(view, None);
        }
    }

    fn create_framebuffer(
        &mut self,
        render_pass: vk::RenderPass,
        view: vk::ImageView,
        extent: oriel_gfx::Extent2D,
    ) -> vk::Framebuffer {
        let attachments = [view];
        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(&attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        unsafe { self.device().device.create_framebuffer(&create_info, None).unwrap() }
    }

    fn destroy_framebuffer(&mut self, framebuffer: vk::Framebuffer) {
        unsafe {
            self.device().device.destroy_framebuffer(framebuffer, None);
        }
    }

    fn create_semaphore(&mut self, debug_name: &str) -> vk::Semaphore {
        let device = self.device();
        let semaphore =
            unsafe { device.device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None).unwrap() };
        device.set_object_debug_name(semaphore, debug_name);
        semaphore
    }

    fn destroy_semaphore(&mut self, semaphore: vk::Semaphore) {
        unsafe {
            self.device().device.destroy_semaphore(semaphore, None);
        }
    }

    fn create_shader_module(&mut self, spirv: &[u8], debug_name: &str) -> vk::ShaderModule {
        let code = ash::util::read_spv(&mut Cursor::new(spirv)).expect("invalid SPIR-V blob");
        let device = self.device();
        let module = unsafe {
            device.device.create_shader_module(&vk::ShaderModuleCreateInfo::default().code(&code), None).unwrap()
        };
        device.set_object_debug_name(module, debug_name);
        module
    }

    fn destroy_shader_module(&mut self, module: vk::ShaderModule) {
        unsafe {
            self.device().device.destroy_shader_module(module, None);
        }
    }

    fn create_vertex_buffer(&mut self, size: u64, debug_name: &str) -> BufferHandle {
        self.device_mut().create_host_visible_buffer(size, debug_name)
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.device_mut().destroy_buffer(buffer);
    }

    fn write_vertex_buffer(&mut self, buffer: BufferHandle, data: &[u8]) {
        self.device_mut().write_buffer(buffer, data);
    }

    fn create_pipeline_state(&mut self, desc: &PipelineStateDesc<'_, Self>) -> vk::Pipeline {
        let device = self.device_mut();
        let (pipeline, layout) = Self::build_pipeline(device, desc);
        device.pipeline_layouts.insert(pipeline, layout);
        pipeline
    }

    fn destroy_pipeline_state(&mut self, pipeline: vk::Pipeline) {
        let device = self.device_mut();
        let layout = device.pipeline_layouts.remove(&pipeline).expect("unknown pipeline");
        unsafe {
            device.device.destroy_pipeline(pipeline, None);
            device.device.destroy_pipeline_layout(layout, None);
        }
    }

    fn alloc_command_buffers(&mut self, count: u32, debug_name: &str) -> Vec<vk::CommandBuffer> {
        let device = self.device();
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(device.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);

        let cmds = unsafe { device.device.allocate_command_buffers(&allocate_info).unwrap() };
        for (index, cmd) in cmds.iter().enumerate() {
            device.set_object_debug_name(*cmd, format!("{debug_name}-cmd-{index}"));
        }
        cmds
    }

    fn free_command_buffers(&mut self, cmds: &[vk::CommandBuffer]) {
        let device = self.device();
        unsafe {
            device.device.free_command_buffers(device.command_pool, cmds);
        }
    }

    fn record_draw(&mut self, cmd: vk::CommandBuffer, desc: &DrawRecording<Self>) {
        let vertex_buffer = self.device().buffers.get(desc.vertex_buffer).expect("unknown vertex buffer").buffer;
        let device = &self.device().device;

        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue {
                float32: desc.clear_color.unwrap_or([0.0, 0.0, 0.0, 1.0]),
            },
        }];
        let render_area = vk::Rect2D {
            offset: vk::Offset2D::default(),
            extent: convert::vk_extent(desc.extent),
        };
        let render_pass_begin = vk::RenderPassBeginInfo::default()
            .render_pass(desc.render_pass)
            .framebuffer(desc.framebuffer)
            .render_area(render_area)
            .clear_values(&clear_values);

        unsafe {
            device.reset_command_buffer(cmd, vk::CommandBufferResetFlags::RELEASE_RESOURCES).unwrap();
            device
                .begin_command_buffer(
                    cmd,
                    &vk::CommandBufferBeginInfo::default().flags(vk::CommandBufferUsageFlags::SIMULTANEOUS_USE),
                )
                .unwrap();

            device.cmd_begin_render_pass(cmd, &render_pass_begin, vk::SubpassContents::INLINE);
            device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, desc.pipeline);
            device.cmd_bind_vertex_buffers(cmd, 0, &[vertex_buffer], &[0]);
            if desc.vertex_count > 0 {
                device.cmd_draw(cmd, desc.vertex_count, 1, 0, 0);
            }
            device.cmd_end_render_pass(cmd);

            device.end_command_buffer(cmd).unwrap();
        }
    }

    fn submit(&mut self, cmd: vk::CommandBuffer, wait: vk::Semaphore, signal: vk::Semaphore) {
        let device = self.device();

        let wait_semaphores = [wait];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [cmd];
        let signal_semaphores = [signal];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            device
                .device
                .queue_submit(device.graphics_queue, std::slice::from_ref(&submit_info), vk::Fence::null())
                .unwrap();
        }
    }

    fn acquire_next_image(
        &mut self,
        swapchain: vk::SwapchainKHR,
        signal: vk::Semaphore,
        timeout_ns: u64,
    ) -> AcquireOutcome {
        let device = self.device();
        let result =
            unsafe { device.swapchain_pf.acquire_next_image(swapchain, timeout_ns, signal, vk::Fence::null()) };

        match result {
            Ok((image_index, false)) => AcquireOutcome::Ready { image_index },
            Ok((image_index, true)) => AcquireOutcome::Suboptimal { image_index },
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => AcquireOutcome::OutOfDate,
            Err(vk::Result::TIMEOUT) | Err(vk::Result::NOT_READY) => AcquireOutcome::Timeout,
            Err(err) => panic!("acquire_next_image failed: {err}"),
        }
    }

    fn present(&mut self, swapchain: vk::SwapchainKHR, image_index: u32, wait: vk::Semaphore) -> PresentOutcome {
        let device = self.device();

        let wait_semaphores = [wait];
        let swapchains = [swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = unsafe { device.swapchain_pf.queue_present(device.present_queue, &present_info) };
        match result {
            Ok(false) => PresentOutcome::Presented,
            Ok(true) => PresentOutcome::Suboptimal,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => PresentOutcome::OutOfDate,
            Err(err) => panic!("queue_present failed: {err}"),
        }
    }
}
