use std::path::PathBuf;

/// 统一资源路径管理
///
/// 所有路径基于工作区根目录（通过 `CARGO_MANIFEST_DIR` 推导），
/// 避免硬编码相对路径在不同构建环境下漂移。
pub struct OrielPath {}

impl OrielPath {
    /// 获取工作区根目录
    pub fn workspace_path() -> PathBuf {
        // crates/<name>/ 往上两级就是工作区根
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .and_then(|p| p.parent())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// 获取 `shaders/` 目录下编译好的 SPIR-V 路径
    pub fn shader_path(filename: &str) -> PathBuf {
        Self::workspace_path().join("shaders").join(filename)
    }
}
