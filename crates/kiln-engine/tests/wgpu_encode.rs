//! Renders recorded frames offscreen through `WgpuDevice` and reads the
//! pixels back. Skipped on machines without a GPU adapter.

use std::sync::Arc;

use kiln_engine::coords::{FramebufferSize, Rect};
use kiln_engine::device::{GpuContext, GpuInit};
use kiln_engine::render::{
    PlaceholderDecoder, RenderInterface, RenderTarget, Renderer, RendererConfig, TextureHandle, TextureSize,
    UniformMember, Vertex, WgpuDevice, UI_FRAGMENT_WGSL, UI_VERTEX_WGSL,
};

const SIZE: u32 = 64;
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const RED: [u8; 4] = [255, 0, 0, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

fn context() -> Option<GpuContext> {
    match GpuContext::headless(&GpuInit::default()) {
        Ok(context) => Some(context),
        Err(err) => {
            eprintln!("skipping GPU test: {err:#}");
            None
        }
    }
}

fn square(side: f32, color: [u8; 4]) -> (Vec<Vertex>, Vec<u32>) {
    let vertices = vec![
        Vertex::new([0.0, 0.0], color, [0.0, 0.0]),
        Vertex::new([side, 0.0], color, [1.0, 0.0]),
        Vertex::new([side, side], color, [1.0, 1.0]),
        Vertex::new([0.0, side], color, [0.0, 1.0]),
    ];
    (vertices, vec![0, 1, 2, 0, 2, 3])
}

fn renderer(context: &GpuContext) -> Renderer<WgpuDevice> {
    let framebuffer = Arc::new(FramebufferSize::new(SIZE, SIZE));
    let device = WgpuDevice::new(context, FORMAT, framebuffer);
    let mut renderer = Renderer::new(device, Box::new(PlaceholderDecoder), RendererConfig::default());
    let program = renderer
        .compile_program(UI_VERTEX_WGSL, UI_FRAGMENT_WGSL)
        .expect("stock program compiles");
    renderer.attach_program(program);
    renderer.begin_frame();
    renderer
}

/// Clears a `SIZE`×`SIZE` target to black, encodes the recorded frame over
/// it and returns the RGBA8 rows.
fn encode_and_read(context: &GpuContext, renderer: &mut Renderer<WgpuDevice>) -> Vec<u8> {
    let device = context.device();
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("offscreen target"),
        size: wgpu::Extent3d { width: SIZE, height: SIZE, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

    {
        let _clear = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }
    renderer.encode(&mut RenderTarget::new(&mut encoder, &view, FramebufferSize::new(SIZE, SIZE)));

    // 64 px * 4 bytes is already a multiple of COPY_BYTES_PER_ROW_ALIGNMENT.
    let bytes_per_row = SIZE * 4;
    let readback = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback"),
        size: u64::from(bytes_per_row * SIZE),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(SIZE),
            },
        },
        wgpu::Extent3d { width: SIZE, height: SIZE, depth_or_array_layers: 1 },
    );
    context.queue().submit(Some(encoder.finish()));

    let slice = readback.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |res| {
        let _ = tx.send(res);
    });
    device.poll(wgpu::PollType::wait_indefinitely()).expect("poll");
    rx.recv().expect("map callback").expect("map readback");

    let pixels = slice.get_mapped_range().to_vec();
    readback.unmap();
    pixels
}

fn pixel(pixels: &[u8], x: u32, y: u32) -> [u8; 4] {
    let i = ((y * SIZE + x) * 4) as usize;
    [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
}

#[test]
fn recorded_draws_land_where_translated() {
    let Some(context) = context() else { return };
    let mut r = renderer(&context);

    let (v, i) = square(16.0, WHITE);
    let tile = r.compile_geometry(&v, &i);
    let red = r.generate_texture(&RED, TextureSize::new(1, 1));

    r.render_geometry(tile, glam::Vec2::new(0.0, 0.0), red);
    r.render_geometry(tile, glam::Vec2::new(32.0, 0.0), TextureHandle::NONE);
    let pixels = encode_and_read(&context, &mut r);

    assert_eq!(pixel(&pixels, 8, 8), RED);
    assert_eq!(pixel(&pixels, 40, 8), WHITE);
    assert_eq!(pixel(&pixels, 24, 8), BLACK);
    assert_eq!(pixel(&pixels, 8, 24), BLACK);
}

#[test]
fn scissor_clips_in_ui_space() {
    let Some(context) = context() else { return };
    let mut r = renderer(&context);

    let (v, i) = square(16.0, WHITE);
    let tile = r.compile_geometry(&v, &i);

    r.enable_scissor_region(true);
    r.set_scissor_region(Rect::new(0, 32, 8, 32));
    r.render_geometry(tile, glam::Vec2::new(0.0, 32.0), TextureHandle::NONE);
    r.enable_scissor_region(false);
    r.render_geometry(tile, glam::Vec2::new(32.0, 32.0), TextureHandle::NONE);
    let pixels = encode_and_read(&context, &mut r);

    assert_eq!(pixel(&pixels, 4, 40), WHITE);
    assert_eq!(pixel(&pixels, 12, 40), BLACK);
    assert_eq!(pixel(&pixels, 44, 40), WHITE);
}

#[test]
fn vertex_alpha_blends_over_target() {
    let Some(context) = context() else { return };
    let mut r = renderer(&context);

    let (v, i) = square(16.0, [255, 255, 255, 128]);
    let tile = r.compile_geometry(&v, &i);
    r.render_geometry(tile, glam::Vec2::new(48.0, 48.0), TextureHandle::NONE);
    let pixels = encode_and_read(&context, &mut r);

    let [red, green, blue, _] = pixel(&pixels, 56, 56);
    for channel in [red, green, blue] {
        assert!((126..=130).contains(&channel), "channel {channel}");
    }
}

#[test]
fn many_draws_each_keep_their_own_uniforms() {
    let Some(context) = context() else { return };
    let mut r = renderer(&context);

    let model: &UniformMember = r.program().and_then(|p| p.uniforms().member("model")).expect("model uniform");
    assert_eq!(model.offset, 64);

    // More draws than the initial uniform ring holds, one per 4x4 cell of
    // the left half.
    let (v, i) = square(4.0, WHITE);
    let cell = r.compile_geometry(&v, &i);
    for n in 0..128u32 {
        let (x, y) = ((n % 8) * 4, (n / 8) * 4);
        r.render_geometry(cell, glam::Vec2::new(x as f32, y as f32), TextureHandle::NONE);
    }
    assert_eq!(r.frame().len(), 128);
    let pixels = encode_and_read(&context, &mut r);

    assert_eq!(pixel(&pixels, 1, 1), WHITE);
    assert_eq!(pixel(&pixels, 30, 62), WHITE);
    assert_eq!(pixel(&pixels, 34, 2), BLACK);
}

#[test]
fn oversized_texture_degrades_instead_of_failing() {
    let Some(context) = context() else { return };
    let mut r = renderer(&context);

    let too_wide = TextureSize::new(context.max_texture_dimension() + 1, 1);
    let pixels = vec![255; too_wide.byte_len().expect("fits in memory")];
    assert!(r.generate_texture(&pixels, too_wide).is_none());
    assert!(r.textures().is_empty());
}
