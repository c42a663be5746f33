use bytemuck::{Pod, Zeroable};

use crate::api::{BlendMode, VertexAttribute, VertexFormat, VertexLayout};

/// 固定的管线种类集合
///
/// GUI 的绘制种类是封闭的，用 enum 分发而不是开放的继承体系
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    /// 纯色填充
    Flat,
    /// 圆角矩形（带边框）
    Box,
    /// atlas 图片
    Image,
    /// SDF 字形
    SdfText,
    /// 色调映射后处理
    ToneMap,
}

impl PipelineKind {
    /// 绘制顺序：背景填充 → 圆角盒 → 图片 → 文字 → 色调映射
    pub const RENDER_ORDER: [PipelineKind; 5] =
        [PipelineKind::Flat, PipelineKind::Box, PipelineKind::Image, PipelineKind::SdfText, PipelineKind::ToneMap];

    pub fn debug_name(self) -> &'static str {
        match self {
            PipelineKind::Flat => "flat",
            PipelineKind::Box => "box",
            PipelineKind::Image => "image",
            PipelineKind::SdfText => "sdf-text",
            PipelineKind::ToneMap => "tone-map",
        }
    }

    pub fn vertex_layout(self) -> &'static VertexLayout {
        match self {
            PipelineKind::Flat => &FLAT_VERTEX_LAYOUT,
            PipelineKind::Box => &BOX_VERTEX_LAYOUT,
            PipelineKind::Image => &IMAGE_VERTEX_LAYOUT,
            PipelineKind::SdfText => &SDF_VERTEX_LAYOUT,
            PipelineKind::ToneMap => &TONE_MAP_VERTEX_LAYOUT,
        }
    }

    pub fn blend(self) -> BlendMode {
        match self {
            // 后处理覆写整个 image，其余种类都要和底下的内容混合
            PipelineKind::ToneMap => BlendMode::Opaque,
            _ => BlendMode::Alpha,
        }
    }

    /// 每个 swapchain image 的顶点缓冲容量（顶点个数）
    pub fn max_vertices(self) -> u32 {
        match self {
            PipelineKind::Flat => 65536,
            PipelineKind::Box => 65536,
            PipelineKind::Image => 65536,
            // 文字的顶点量远大于其他种类
            PipelineKind::SdfText => 262144,
            PipelineKind::ToneMap => 3,
        }
    }

    /// 单个 image 的顶点缓冲字节数
    #[inline]
    pub fn vertex_buffer_size(self) -> u64 {
        self.vertex_layout().stride as u64 * self.max_vertices() as u64
    }
}

/// 纯色填充的顶点
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FlatVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
    pub clip: [f32; 4],
}

pub static FLAT_VERTEX_LAYOUT: VertexLayout = VertexLayout {
    stride: 40,
    attributes: &[
        VertexAttribute { location: 0, offset: 0, format: VertexFormat::F32x2 },
        VertexAttribute { location: 1, offset: 8, format: VertexFormat::F32x4 },
        VertexAttribute { location: 2, offset: 24, format: VertexFormat::F32x4 },
    ],
};

/// 圆角矩形的顶点
///
/// corner_radii 按 左下/右下/左上/右上 存四个圆角半径
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BoxVertex {
    pub position: [f32; 2],
    pub clip: [f32; 4],
    pub corner_radii: [f32; 4],
    pub fill_color: [f32; 4],
    pub border_color: [f32; 4],
    pub border_width: f32,
}

pub static BOX_VERTEX_LAYOUT: VertexLayout = VertexLayout {
    stride: 76,
    attributes: &[
        VertexAttribute { location: 0, offset: 0, format: VertexFormat::F32x2 },
        VertexAttribute { location: 1, offset: 8, format: VertexFormat::F32x4 },
        VertexAttribute { location: 2, offset: 24, format: VertexFormat::F32x4 },
        VertexAttribute { location: 3, offset: 40, format: VertexFormat::F32x4 },
        VertexAttribute { location: 4, offset: 56, format: VertexFormat::F32x4 },
        VertexAttribute { location: 5, offset: 72, format: VertexFormat::F32 },
    ],
};

/// atlas 图片的顶点；atlas_coord 的 z 分量是 atlas 的层号
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ImageVertex {
    pub position: [f32; 2],
    pub clip: [f32; 4],
    pub atlas_coord: [f32; 3],
}

pub static IMAGE_VERTEX_LAYOUT: VertexLayout = VertexLayout {
    stride: 36,
    attributes: &[
        VertexAttribute { location: 0, offset: 0, format: VertexFormat::F32x2 },
        VertexAttribute { location: 1, offset: 8, format: VertexFormat::F32x4 },
        VertexAttribute { location: 2, offset: 24, format: VertexFormat::F32x3 },
    ],
};

/// SDF 字形的顶点
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SdfVertex {
    pub position: [f32; 2],
    pub clip: [f32; 4],
    pub texture_coord: [f32; 3],
    pub color: [f32; 4],
    /// 字形缩放后把 SDF 距离换算回像素的系数
    pub distance_multiplier: f32,
}

pub static SDF_VERTEX_LAYOUT: VertexLayout = VertexLayout {
    stride: 56,
    attributes: &[
        VertexAttribute { location: 0, offset: 0, format: VertexFormat::F32x2 },
        VertexAttribute { location: 1, offset: 8, format: VertexFormat::F32x4 },
        VertexAttribute { location: 2, offset: 24, format: VertexFormat::F32x3 },
        VertexAttribute { location: 3, offset: 36, format: VertexFormat::F32x4 },
        VertexAttribute { location: 4, offset: 52, format: VertexFormat::F32 },
    ],
};

/// 色调映射画全屏三角形，只需要 NDC 位置
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ToneMapVertex {
    pub position: [f32; 2],
}

pub static TONE_MAP_VERTEX_LAYOUT: VertexLayout = VertexLayout {
    stride: 8,
    attributes: &[VertexAttribute { location: 0, offset: 0, format: VertexFormat::F32x2 }],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strides_match_struct_sizes() {
        assert_eq!(FLAT_VERTEX_LAYOUT.stride as usize, std::mem::size_of::<FlatVertex>());
        assert_eq!(BOX_VERTEX_LAYOUT.stride as usize, std::mem::size_of::<BoxVertex>());
        assert_eq!(IMAGE_VERTEX_LAYOUT.stride as usize, std::mem::size_of::<ImageVertex>());
        assert_eq!(SDF_VERTEX_LAYOUT.stride as usize, std::mem::size_of::<SdfVertex>());
        assert_eq!(TONE_MAP_VERTEX_LAYOUT.stride as usize, std::mem::size_of::<ToneMapVertex>());
    }

    #[test]
    fn test_attribute_offsets_within_stride() {
        for kind in PipelineKind::RENDER_ORDER {
            let layout = kind.vertex_layout();
            for attr in layout.attributes {
                assert!(attr.offset < layout.stride, "{:?} attribute offset out of range", kind);
            }
        }
    }
}
