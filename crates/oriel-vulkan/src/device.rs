use std::collections::HashMap;
use std::ffi::CString;

use ash::vk;
use itertools::Itertools;
use oriel_gfx::foundation::queue::QueueCapabilities;
use oriel_gfx::foundation::selector::DeviceSelection;
use slotmap::SlotMap;
use vk_mem::Alloc;

slotmap::new_key_type! {
    /// host-visible 顶点缓冲的句柄，真正的 buffer + allocation 在表里
    pub struct BufferHandle;
}

pub(crate) struct BufferBlock {
    pub buffer: vk::Buffer,
    pub allocation: vk_mem::Allocation,
    pub size: u64,
}

/// 打开的逻辑设备和它的所有设备级状态
///
/// 按协商结果取出各角色的 queue；graphics family 上挂一个
/// 可以单独 reset command buffer 的 pool。
pub(crate) struct DeviceContext {
    pub physical_device: vk::PhysicalDevice,
    pub device: ash::Device,
    pub swapchain_pf: ash::khr::swapchain::Device,
    pub debug_utils: ash::ext::debug_utils::Device,

    /// Option 只是为了在销毁 device 之前先 drop 掉 allocator
    pub allocator: Option<vk_mem::Allocator>,

    pub graphics_queue: vk::Queue,
    pub present_queue: vk::Queue,
    pub _compute_queue: vk::Queue,
    pub command_pool: vk::CommandPool,

    pub buffers: SlotMap<BufferHandle, BufferBlock>,
    /// swapchain handle → (它的 images, image 格式)
    pub swapchain_images: HashMap<vk::SwapchainKHR, (Vec<vk::Image>, vk::Format)>,
    /// PSO → 它独占的 pipeline layout，销毁时成对处理
    pub pipeline_layouts: HashMap<vk::Pipeline, vk::PipelineLayout>,
}

// 创建与销毁
impl DeviceContext {
    pub fn open(instance: &ash::Instance, physical_device: vk::PhysicalDevice, selection: &DeviceSelection) -> Self {
        let queue_priorities = [1.0f32];
        let queue_create_infos = selection
            .queue_assignments
            .iter()
            .map(|assignment| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(assignment.family_index)
                    .queue_priorities(&queue_priorities)
            })
            .collect_vec();

        let device_exts = Self::basic_device_exts();
        let mut exts_str = String::new();
        for ext in &device_exts {
            exts_str.push_str(&format!("\n\t{:?}", unsafe { std::ffi::CStr::from_ptr(*ext) }));
        }
        log::info!("device exts: {}", exts_str);

        let features = Self::basic_device_features();
        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&device_exts)
            .enabled_features(&features);

        let device = unsafe { instance.create_device(physical_device, &device_create_info, None).unwrap() };
        let swapchain_pf = ash::khr::swapchain::Device::new(instance, &device);
        let debug_utils = ash::ext::debug_utils::Device::new(instance, &device);

        // 按协商出来的净贡献把 queue 挂到各个角色上
        let mut graphics_queue = vk::Queue::null();
        let mut present_queue = vk::Queue::null();
        let mut compute_queue = vk::Queue::null();
        let mut graphics_family = 0;
        for assignment in &selection.queue_assignments {
            let queue = unsafe { device.get_device_queue(assignment.family_index, 0) };
            if assignment.contributed.contains(QueueCapabilities::GRAPHICS) {
                graphics_queue = queue;
                graphics_family = assignment.family_index;
            }
            if assignment.contributed.contains(QueueCapabilities::PRESENT) {
                present_queue = queue;
            }
            if assignment.contributed.contains(QueueCapabilities::COMPUTE) {
                compute_queue = queue;
            }
        }

        let command_pool = unsafe {
            device
                .create_command_pool(
                    &vk::CommandPoolCreateInfo::default()
                        .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
                        .queue_family_index(graphics_family),
                    None,
                )
                .unwrap()
        };

        let mut allocator_ci = vk_mem::AllocatorCreateInfo::new(instance, &device, physical_device);
        allocator_ci.vulkan_api_version = vk::API_VERSION_1_2;
        let allocator = unsafe { vk_mem::Allocator::new(allocator_ci).unwrap() };

        log::info!("opened logical device: {}", selection.identity);
        Self {
            physical_device,
            device,
            swapchain_pf,
            debug_utils,
            allocator: Some(allocator),
            graphics_queue,
            present_queue,
            _compute_queue: compute_queue,
            command_pool,
            buffers: SlotMap::with_key(),
            swapchain_images: HashMap::new(),
            pipeline_layouts: HashMap::new(),
        }
    }

    pub fn close(mut self) {
        debug_assert!(self.buffers.is_empty(), "buffers must be destroyed before the device closes");
        debug_assert!(self.pipeline_layouts.is_empty(), "pipelines must be destroyed before the device closes");

        log::info!("closing logical device");
        unsafe {
            self.device.destroy_command_pool(self.command_pool, None);
            // allocator 必须先于 device 销毁
            drop(self.allocator.take());
            self.device.destroy_device(None);
        }
    }
}

// tools
impl DeviceContext {
    pub fn set_object_debug_name<T: vk::Handle + Copy>(&self, handle: T, name: impl AsRef<str>) {
        let name = CString::new(name.as_ref()).unwrap();
        unsafe {
            // debug name 失败不影响渲染，忽略错误
            let _ = self.debug_utils.set_debug_utils_object_name(
                &vk::DebugUtilsObjectNameInfoEXT::default().object_name(name.as_c_str()).object_handle(handle),
            );
        }
    }

    pub fn create_host_visible_buffer(&mut self, size: u64, debug_name: &str) -> BufferHandle {
        let buffer_info =
            vk::BufferCreateInfo::default().size(size).usage(vk::BufferUsageFlags::VERTEX_BUFFER);
        let alloc_info = vk_mem::AllocationCreateInfo {
            usage: vk_mem::MemoryUsage::Auto,
            flags: vk_mem::AllocationCreateFlags::HOST_ACCESS_SEQUENTIAL_WRITE,
            ..Default::default()
        };

        let (buffer, allocation) =
            unsafe { self.allocator.as_ref().unwrap().create_buffer(&buffer_info, &alloc_info).unwrap() };
        self.set_object_debug_name(buffer, debug_name);

        self.buffers.insert(BufferBlock {
            buffer,
            allocation,
            size,
        })
    }

    pub fn destroy_buffer(&mut self, handle: BufferHandle) {
        let mut block = self.buffers.remove(handle).expect("destroying an unknown buffer");
        unsafe {
            self.allocator.as_ref().unwrap().destroy_buffer(block.buffer, &mut block.allocation);
        }
    }

    /// map → copy → flush → unmap，覆写缓冲前缀
    pub fn write_buffer(&mut self, handle: BufferHandle, data: &[u8]) {
        let allocator = self.allocator.as_ref().unwrap();
        let block = self.buffers.get_mut(handle).expect("writing an unknown buffer");
        debug_assert!(data.len() as u64 <= block.size, "vertex data exceeds the buffer capacity");

        unsafe {
            let ptr = allocator.map_memory(&mut block.allocation).unwrap();
            std::ptr::copy_nonoverlapping(data.as_ptr(), ptr, data.len());
            allocator.flush_allocation(&block.allocation, 0, data.len() as vk::DeviceSize).unwrap();
            allocator.unmap_memory(&mut block.allocation);
        }
    }
}

// 创建过程的辅助函数
impl DeviceContext {
    /// GUI 渲染需要的 device features（与设备选择的 requirements 对应）
    fn basic_device_features() -> vk::PhysicalDeviceFeatures {
        vk::PhysicalDeviceFeatures::default()
            .sampler_anisotropy(true)
            .independent_blend(true)
            // 亚像素文字渲染需要 dual-source blending
            .dual_src_blend(true)
    }

    /// 必要的 device extensions
    fn basic_device_exts() -> Vec<*const std::ffi::c_char> {
        vec![
            // swapchain
            ash::khr::swapchain::NAME.as_ptr(),
        ]
    }
}
