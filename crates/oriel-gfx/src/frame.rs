use crate::api::GfxApi;
use crate::pipelines::kind::PipelineKind;

/// 链上一环：一条管线本帧的 wait → signal 依赖
pub struct SemaphoreLink<A: GfxApi> {
    pub kind: PipelineKind,
    pub wait: A::Semaphore,
    pub signal: A::Semaphore,
}

/// 一帧的瞬态状态：acquire 到的 image 和显式的 semaphore 依赖图
///
/// 把"上一条管线的 signal 是下一条管线的 wait"这个约定做成数据，
/// 帧结束即丢弃。
pub struct FrameTicket<A: GfxApi> {
    pub image_index: u32,
    pub acquire_semaphore: A::Semaphore,
    pub links: Vec<SemaphoreLink<A>>,
}

impl<A: GfxApi> FrameTicket<A> {
    pub fn new(image_index: u32, acquire_semaphore: A::Semaphore) -> Self {
        Self {
            image_index,
            acquire_semaphore,
            links: Vec::new(),
        }
    }

    /// 下一条管线提交时要等待的 semaphore：
    /// 链上最后一环的 signal，链为空时是 acquire semaphore
    #[inline]
    pub fn next_wait(&self) -> A::Semaphore {
        self.links.last().map_or(self.acquire_semaphore, |link| link.signal)
    }

    /// 记录一条管线的提交
    pub fn push_link(&mut self, kind: PipelineKind, wait: A::Semaphore, signal: A::Semaphore) {
        debug_assert!(wait == self.next_wait(), "semaphore chain must be gapless");
        self.links.push(SemaphoreLink { kind, wait, signal });
    }

    /// present 要等待的 semaphore
    #[inline]
    pub fn present_wait(&self) -> A::Semaphore {
        self.next_wait()
    }
}

/// 一帧的结果；跳帧不是错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// surface 面积为零（拖动缩放中），重建推迟到下一帧
    ZeroExtent,
    /// acquire 报告 out-of-date，交换链已标记重建
    OutOfDate,
    /// acquire 有界等待超时
    AcquireTimeout,
}
