//! widget/layout 层每帧下发的绘制命令
//!
//! 核心不理解 widget，只负责把每个命令的顶点（应用 transform、盖上 clip）
//! 追加进对应管线当前 image 的顶点缓冲。

use crate::pipelines::kind::{BoxVertex, FlatVertex, ImageVertex, PipelineKind, SdfVertex, ToneMapVertex};

/// 裁剪矩形，窗口坐标系
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ClipRect {
    /// 覆盖整个窗口，等于不裁剪
    pub fn unclipped() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: f32::MAX,
            height: f32::MAX,
        }
    }

    #[inline]
    fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

/// 一个命令携带的、按管线种类分型的顶点数据
#[derive(Debug, Clone)]
pub enum DrawList {
    Flat(Vec<FlatVertex>),
    Box(Vec<BoxVertex>),
    Image(Vec<ImageVertex>),
    SdfText(Vec<SdfVertex>),
    /// 全屏三角形由核心生成，调用方不提供顶点
    ToneMap,
}

impl DrawList {
    pub fn kind(&self) -> PipelineKind {
        match self {
            DrawList::Flat(_) => PipelineKind::Flat,
            DrawList::Box(_) => PipelineKind::Box,
            DrawList::Image(_) => PipelineKind::Image,
            DrawList::SdfText(_) => PipelineKind::SdfText,
            DrawList::ToneMap => PipelineKind::ToneMap,
        }
    }
}

/// 一批绘制命令：目标管线由 list 决定，外加变换和裁剪
#[derive(Debug, Clone)]
pub struct DrawBatch {
    pub list: DrawList,
    pub transform: glam::Mat4,
    pub clip: ClipRect,
}

impl DrawBatch {
    pub fn new(list: DrawList) -> Self {
        Self {
            list,
            transform: glam::Mat4::IDENTITY,
            clip: ClipRect::unclipped(),
        }
    }
}

#[inline]
fn transform_position(transform: &glam::Mat4, position: [f32; 2]) -> [f32; 2] {
    let p = transform.transform_point3(glam::vec3(position[0], position[1], 0.0));
    [p.x, p.y]
}

/// 全屏三角形，覆盖整个 NDC
const FULLSCREEN_TRIANGLE: [ToneMapVertex; 3] = [
    ToneMapVertex { position: [-1.0, -1.0] },
    ToneMapVertex { position: [3.0, -1.0] },
    ToneMapVertex { position: [-1.0, 3.0] },
];

/// 把属于 `kind` 的所有命令编码成一段连续的顶点字节流
///
/// 返回 (字节, 顶点数)。命令之间保持提交顺序。
pub(crate) fn encode_for_pipeline(kind: PipelineKind, batches: &[DrawBatch]) -> (Vec<u8>, u32) {
    let mut bytes = Vec::new();
    let mut vertex_count = 0u32;

    for batch in batches.iter().filter(|b| b.list.kind() == kind) {
        let clip = batch.clip.to_array();
        match &batch.list {
            DrawList::Flat(vertices) => {
                for v in vertices {
                    let mut v = *v;
                    v.position = transform_position(&batch.transform, v.position);
                    v.clip = clip;
                    bytes.extend_from_slice(bytemuck::bytes_of(&v));
                }
                vertex_count += vertices.len() as u32;
            }
            DrawList::Box(vertices) => {
                for v in vertices {
                    let mut v = *v;
                    v.position = transform_position(&batch.transform, v.position);
                    v.clip = clip;
                    bytes.extend_from_slice(bytemuck::bytes_of(&v));
                }
                vertex_count += vertices.len() as u32;
            }
            DrawList::Image(vertices) => {
                for v in vertices {
                    let mut v = *v;
                    v.position = transform_position(&batch.transform, v.position);
                    v.clip = clip;
                    bytes.extend_from_slice(bytemuck::bytes_of(&v));
                }
                vertex_count += vertices.len() as u32;
            }
            DrawList::SdfText(vertices) => {
                for v in vertices {
                    let mut v = *v;
                    v.position = transform_position(&batch.transform, v.position);
                    v.clip = clip;
                    bytes.extend_from_slice(bytemuck::bytes_of(&v));
                }
                vertex_count += vertices.len() as u32;
            }
            DrawList::ToneMap => {
                // 变换与裁剪对全屏 pass 没有意义
                bytes.extend_from_slice(bytemuck::cast_slice(&FULLSCREEN_TRIANGLE));
                vertex_count += FULLSCREEN_TRIANGLE.len() as u32;
            }
        }
    }

    debug_assert!(vertex_count <= kind.max_vertices(), "{} vertex buffer overflow", kind.debug_name());
    (bytes, vertex_count)
}
