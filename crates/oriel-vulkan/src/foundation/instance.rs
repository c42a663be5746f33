use std::ffi::{c_char, CStr, CString};

use ash::vk;
use itertools::Itertools;

use crate::foundation::debug_messenger::DebugMessenger;

/// vk 实例：entry 加上 instance 级函数指针
///
/// 只是函数指针和一个裸 handle，生命周期由 [`Self::destroy`] 手动控制
pub struct Instance {
    pub(crate) entry: ash::Entry,
    pub(crate) handle: ash::Instance,
}

// 创建与销毁
impl Instance {
    /// 设置所需的 layers 和 extensions，创建 vk instance
    pub fn new(app_name: &str, extra_instance_exts: &[&'static CStr]) -> Self {
        let entry = unsafe { ash::Entry::load().expect("vulkan loader not found") };

        let app_name = CString::new(app_name).unwrap();
        let app_info = vk::ApplicationInfo::default()
            // 版本过低时，有些函数无法正确加载
            .api_version(vk::API_VERSION_1_2)
            .application_name(app_name.as_ref())
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(c"Oriel")
            .engine_version(vk::make_api_version(0, 1, 0, 0));

        let enabled_extensions = Self::get_extensions(&entry, extra_instance_exts);
        let mut enabled_extensions_str = String::new();
        for ext in &enabled_extensions {
            enabled_extensions_str.push_str(&format!("\n\t{:?}", unsafe { CStr::from_ptr(*ext) }));
        }
        log::info!("instance extensions: {}", enabled_extensions_str);

        let mut instance_ci =
            vk::InstanceCreateInfo::default().application_info(&app_info).enabled_extension_names(&enabled_extensions);

        // 为 instance info 添加 debug messenger，覆盖创建期间的消息
        let mut debug_utils_messenger_ci = DebugMessenger::debug_utils_messenger_ci();
        instance_ci = instance_ci.push_next(&mut debug_utils_messenger_ci);

        let handle = unsafe { entry.create_instance(&instance_ci, None).unwrap() };

        Self { entry, handle }
    }

    #[inline]
    pub fn destroy(self) {
        // 触发 drop 进行销毁
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        log::info!("destroying vk instance");
        unsafe {
            self.handle.destroy_instance(None);
        }
    }
}

// getters
impl Instance {
    #[inline]
    pub fn ash_instance(&self) -> &ash::Instance {
        &self.handle
    }

    #[inline]
    pub fn entry(&self) -> &ash::Entry {
        &self.entry
    }
}

// 构造过程
impl Instance {
    /// instance 所需的、且受支持的 extension
    fn get_extensions(entry: &ash::Entry, extra_instance_exts: &[&'static CStr]) -> Vec<*const c_char> {
        let all_ext_props = unsafe { entry.enumerate_instance_extension_properties(None).unwrap() };

        let mut enabled_extensions: Vec<&'static CStr> = Vec::new();
        let mut enable_ext = |ext: &'static CStr| {
            let supported = all_ext_props
                .iter()
                .any(|supported_ext| ext == unsafe { CStr::from_ptr(supported_ext.extension_name.as_ptr()) });
            if supported {
                if !enabled_extensions.contains(&ext) {
                    enabled_extensions.push(ext);
                }
            } else {
                panic!("required instance extension ({ext:?}) is missing");
            }
        };

        // 外部传入的（surface 相关的 extension 来自 ash-window）
        for ext in extra_instance_exts {
            enable_ext(ext);
        }

        for ext in Self::basic_instance_exts() {
            enable_ext(ext);
        }

        enabled_extensions.iter().map(|ext| ext.as_ptr()).collect_vec()
    }

    /// 必须要开启的 instance extensions
    fn basic_instance_exts() -> Vec<&'static CStr> {
        vec![
            // debug messenger + 为 vulkan object 设置 debug name
            vk::EXT_DEBUG_UTILS_NAME,
        ]
    }
}
