use parking_lot::RwLock;
use slotmap::SlotMap;

use crate::api::{Extent2D, GfxApi};
use crate::draw::DrawBatch;
use crate::error::GfxError;
use crate::foundation::candidate::{DeviceRequirements, PhysicalDeviceCandidate};
use crate::foundation::selector::{self, DeviceSelection};
use crate::frame::FrameOutcome;
use crate::window::{WindowConfig, WindowRenderer};

slotmap::new_key_type! {
    /// attach 时发给调用方的窗口句柄
    pub struct WindowId;
}

struct ContextInner<A: GfxApi> {
    api: A,
    requirements: DeviceRequirements,

    /// 枚举结果的缓存，设备丢失时重新填充
    candidates: Vec<PhysicalDeviceCandidate>,
    selection: Option<DeviceSelection>,
    device_lost: bool,

    windows: SlotMap<WindowId, WindowRenderer<A>>,
}

impl<A: GfxApi> Drop for ContextInner<A> {
    fn drop(&mut self) {
        // 所有退出路径（包括 panic 展开）都走完整的拆除
        let ids: Vec<WindowId> = self.windows.keys().collect();
        for id in ids {
            if let Some(mut window) = self.windows.remove(id) {
                window.teardown(&mut self.api);
            }
        }
        if self.selection.take().is_some() {
            self.api.close_device();
        }
    }
}

/// 图形上下文：设备生命周期 + 窗口集合
///
/// 同一设备被挂在它上面的所有窗口共享。读写锁保证设备丢失的拆除
/// 不会和 attach 竞争；帧内的录制和提交本来就是顺序的（§ 管线链），
/// 不需要更细的锁。
///
/// 生命周期：第一个窗口 attach 时选择并打开设备，最后一个窗口
/// detach 时关闭设备。没有任何全局状态。
pub struct GfxContext<A: GfxApi> {
    inner: RwLock<ContextInner<A>>,
}

// 创建与销毁
impl<A: GfxApi> GfxContext<A> {
    pub fn new(api: A, requirements: DeviceRequirements) -> Self {
        Self {
            inner: RwLock::new(ContextInner {
                api,
                requirements,
                candidates: Vec::new(),
                selection: None,
                device_lost: false,
                windows: SlotMap::with_key(),
            }),
        }
    }
}

// 对外接口
impl<A: GfxApi> GfxContext<A> {
    /// 给一个 surface 挂上渲染：第一次 attach 会枚举设备、打分选择并
    /// 打开设备；之后的 attach 复用同一设备。
    ///
    /// 配置类失败（没有可用设备）在这里一次性报告，对这个窗口是致命的。
    pub fn attach_window(
        &self,
        surface: A::Surface,
        config: WindowConfig,
    ) -> Result<(WindowId, DeviceSelection), GfxError> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        if inner.selection.is_none() {
            inner.candidates = inner.api.enumerate_devices(surface);
            let selection = selector::select_device(&inner.candidates, &inner.requirements)?;
            log::info!("selected device: {} (score {})", selection.identity, selection.score);
            inner.api.open_device(&selection);
            inner.selection = Some(selection);
        }
        let selection = inner.selection.clone().unwrap();

        let mut window = WindowRenderer::new(surface, &selection, config);
        window.build_for_device(&mut inner.api);
        let id = inner.windows.insert(window);

        Ok((id, selection))
    }

    /// 摘掉一个窗口；最后一个窗口摘掉后关闭设备
    pub fn detach_window(&self, id: WindowId) -> Result<(), GfxError> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let mut window = inner.windows.remove(id).ok_or(GfxError::UnknownWindow)?;
        window.teardown(&mut inner.api);

        if inner.windows.is_empty() && inner.selection.take().is_some() {
            log::info!("last window detached, closing device");
            inner.api.close_device();
            inner.candidates.clear();
            inner.device_lost = false;
        }
        Ok(())
    }

    /// 为一个窗口提交一帧
    pub fn render_frame(&self, id: WindowId, batches: &[DrawBatch]) -> Result<FrameOutcome, GfxError> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        if inner.device_lost {
            Self::rebuild_device(inner, id)?;
        }

        let window = inner.windows.get_mut(id).ok_or(GfxError::UnknownWindow)?;
        Ok(window.render_frame(&mut inner.api, batches))
    }

    /// OS 上报了新的窗口尺寸，交换链标记为 Stale，下一帧重建
    pub fn notify_resize(&self, id: WindowId, new_extent: Extent2D) -> Result<(), GfxError> {
        let mut guard = self.inner.write();
        guard.windows.get_mut(id).ok_or(GfxError::UnknownWindow)?.notify_resize(new_extent);
        Ok(())
    }

    /// 设备丢失：设备和所有窗口的交换链都标记为需要完整重建
    pub fn notify_device_lost(&self) {
        let mut guard = self.inner.write();
        guard.device_lost = true;
        for (_, window) in guard.windows.iter_mut() {
            window.mark_device_lost();
        }
    }
}

// 设备丢失恢复
impl<A: GfxApi> GfxContext<A> {
    /// 拆掉所有窗口的设备级资源，换一台（可能不同的）设备重建
    fn rebuild_device(inner: &mut ContextInner<A>, requesting_window: WindowId) -> Result<(), GfxError> {
        log::warn!("device lost, rebuilding against a fresh device");

        for (_, window) in inner.windows.iter_mut() {
            window.teardown_for_device(&mut inner.api);
        }
        if inner.selection.take().is_some() {
            inner.api.close_device();
        }

        let surface =
            inner.windows.get(requesting_window).ok_or(GfxError::UnknownWindow)?.surface();
        inner.candidates = inner.api.enumerate_devices(surface);
        let selection = selector::select_device(&inner.candidates, &inner.requirements)?;
        log::info!("re-selected device: {} (score {})", selection.identity, selection.score);
        inner.api.open_device(&selection);
        inner.selection = Some(selection);

        for (_, window) in inner.windows.iter_mut() {
            window.build_for_device(&mut inner.api);
        }
        inner.device_lost = false;
        Ok(())
    }
}

// 查询
impl<A: GfxApi> GfxContext<A> {
    pub fn window_count(&self) -> usize {
        self.inner.read().windows.len()
    }

    pub fn selection(&self) -> Option<DeviceSelection> {
        self.inner.read().selection.clone()
    }
}
