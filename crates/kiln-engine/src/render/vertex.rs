use bytemuck::{Pod, Zeroable};

/// Vertex emitted by the UI engine.
///
/// Attribute locations are fixed: 0 = position (UI-space pixels),
/// 1 = color (RGBA8, straight alpha, normalized in the shader), 2 = texcoord.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [u8; 4],
    pub tex_coord: [f32; 2],
}

impl Vertex {
    pub const POSITION_LOCATION: u32 = 0;
    pub const COLOR_LOCATION: u32 = 1;
    pub const TEX_COORD_LOCATION: u32 = 2;

    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Unorm8x4,  // color
        2 => Float32x2  // tex_coord
    ];

    #[inline]
    pub const fn new(position: [f32; 2], color: [u8; 4], tex_coord: [f32; 2]) -> Self {
        Self { position, color, tex_coord }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}
