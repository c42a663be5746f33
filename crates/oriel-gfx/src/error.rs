use thiserror::Error;

/// attach 阶段的配置类错误
///
/// 瞬态的交换链问题（out-of-date、零尺寸 surface）不会出现在这里，
/// 它们走 Stale → rebuild 路径，最多丢一帧；资源创建失败在后端直接 panic。
#[derive(Debug, Error)]
pub enum GfxError {
    /// 没有任何候选设备通过硬性要求，report 逐台列出拒绝原因
    #[error("no suitable rendering device: {report}")]
    NoSuitableDevice { report: String },

    /// window id 不在当前 window 集合中
    #[error("window is not attached to this context")]
    UnknownWindow,
}
