use glam::Vec2;
use kiln_engine::coords::Rect;
use kiln_engine::render::{GeometryHandle, RenderInterface, TextureHandle, TextureSize, Vertex};

const CHECKER_SIZE: u32 = 8;
const ROWS: usize = 12;
const ROW_HEIGHT: f32 = 28.0;

/// Stand-in for a UI document: compiles its geometry once, draws it every
/// frame through a [`RenderInterface`], and releases it explicitly.
pub struct Document {
    panel: GeometryHandle,
    tile: GeometryHandle,
    row: GeometryHandle,
    checker: TextureHandle,
    logo: TextureHandle,
    logo_size: TextureSize,
    list_clip: Rect,
}

impl Document {
    pub fn build(ui: &mut impl RenderInterface) -> Self {
        let (v, i) = gradient_rect(360.0, 420.0, [40, 44, 52, 255], [24, 26, 31, 255]);
        let panel = ui.compile_geometry(&v, &i);

        let (v, i) = gradient_rect(96.0, 96.0, [255, 255, 255, 255], [255, 255, 255, 255]);
        let tile = ui.compile_geometry(&v, &i);

        let (v, i) = gradient_rect(320.0, ROW_HEIGHT - 4.0, [90, 120, 200, 220], [60, 80, 150, 220]);
        let row = ui.compile_geometry(&v, &i);

        let checker = ui.generate_texture(&checker_pixels(CHECKER_SIZE), TextureSize::new(CHECKER_SIZE, CHECKER_SIZE));
        let (logo, logo_size) = ui.load_texture("logo.png");
        log::info!("logo texture is {}x{}", logo_size.width, logo_size.height);

        Self {
            panel,
            tile,
            row,
            checker,
            logo,
            logo_size,
            list_clip: Rect::new(40, 180, 320, 200),
        }
    }

    /// Records one frame. `elapsed` drives the animated parts.
    pub fn render(&self, ui: &mut impl RenderInterface, elapsed: f64) {
        let t = elapsed as f32;

        ui.render_geometry(self.panel, Vec2::new(20.0, 20.0), TextureHandle::NONE);

        let bob = (t * 2.0).sin() * 12.0;
        ui.render_geometry(self.tile, Vec2::new(40.0, 40.0 + bob), self.checker);
        ui.render_geometry(self.tile, Vec2::new(160.0, 40.0), self.logo);

        // Scrolling list clipped to its viewport.
        let scroll = (t * 30.0) % (ROWS as f32 * ROW_HEIGHT);
        ui.enable_scissor_region(true);
        ui.set_scissor_region(self.list_clip);
        for n in 0..ROWS {
            let y = self.list_clip.top as f32 + n as f32 * ROW_HEIGHT - scroll;
            ui.render_geometry(self.row, Vec2::new(self.list_clip.left as f32, y), TextureHandle::NONE);
        }
        ui.enable_scissor_region(false);
    }

    pub fn logo_size(&self) -> TextureSize {
        self.logo_size
    }

    pub fn release(self, ui: &mut impl RenderInterface) {
        for geometry in [self.panel, self.tile, self.row] {
            ui.release_geometry(geometry);
        }
        ui.release_texture(self.checker);
        ui.release_texture(self.logo);
    }
}

/// Rectangle at the origin with a vertical color gradient.
fn gradient_rect(w: f32, h: f32, top: [u8; 4], bottom: [u8; 4]) -> (Vec<Vertex>, Vec<u32>) {
    let vertices = vec![
        Vertex::new([0.0, 0.0], top, [0.0, 0.0]),
        Vertex::new([w, 0.0], top, [1.0, 0.0]),
        Vertex::new([w, h], bottom, [1.0, 1.0]),
        Vertex::new([0.0, h], bottom, [0.0, 1.0]),
    ];
    (vertices, vec![0, 1, 2, 0, 2, 3])
}

fn checker_pixels(size: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let v = if (x + y) % 2 == 0 { 230 } else { 70 };
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;

    #[derive(Default)]
    struct Log {
        next: u64,
        draws: Vec<(u64, Vec2, u64)>,
        scissor: Vec<Option<Rect>>,
        released: Vec<u64>,
        clip_enabled: bool,
    }

    impl RenderInterface for Log {
        fn compile_geometry(&mut self, _vertices: &[Vertex], indices: &[u32]) -> GeometryHandle {
            assert_eq!(indices.len() % 3, 0);
            self.next += 1;
            GeometryHandle::from_raw(self.next)
        }

        fn render_geometry(&mut self, geometry: GeometryHandle, translation: Vec2, texture: TextureHandle) {
            self.draws.push((geometry.raw(), translation, texture.raw()));
        }

        fn release_geometry(&mut self, geometry: GeometryHandle) {
            self.released.push(geometry.raw());
        }

        fn load_texture(&mut self, _source: &str) -> (TextureHandle, TextureSize) {
            self.next += 1;
            (TextureHandle::from_raw(self.next), TextureSize::new(1, 1))
        }

        fn generate_texture(&mut self, pixels: &[u8], size: TextureSize) -> TextureHandle {
            assert_eq!(size.byte_len(), Some(pixels.len()));
            self.next += 1;
            TextureHandle::from_raw(self.next)
        }

        fn release_texture(&mut self, texture: TextureHandle) {
            self.released.push(texture.raw());
        }

        fn enable_scissor_region(&mut self, enable: bool) {
            self.clip_enabled = enable;
            if !enable {
                self.scissor.push(None);
            }
        }

        fn set_scissor_region(&mut self, region: Rect) {
            assert!(self.clip_enabled);
            self.scissor.push(Some(region));
        }

        fn set_transform(&mut self, _transform: Option<&Mat4>) {
            panic!("document uses translation only");
        }
    }

    #[test]
    fn frame_draws_panel_first_and_leaves_clipping_off() {
        let mut ui = Log::default();
        let doc = Document::build(&mut ui);
        doc.render(&mut ui, 0.0);

        assert_eq!(ui.draws.len(), 3 + ROWS);
        assert_eq!(ui.draws[0].0, doc.panel.raw());
        assert!(!ui.clip_enabled);
        assert_eq!(ui.scissor, vec![Some(doc.list_clip), None]);
    }

    #[test]
    fn release_frees_every_handle_once() {
        let mut ui = Log::default();
        let doc = Document::build(&mut ui);
        doc.release(&mut ui);

        let mut released = ui.released.clone();
        released.sort_unstable();
        assert_eq!(released, (1..=5).collect::<Vec<_>>());
    }

    #[test]
    fn checker_is_rgba8() {
        let pixels = checker_pixels(4);
        assert_eq!(pixels.len(), 64);
        assert_eq!(&pixels[..8], &[230, 230, 230, 255, 70, 70, 70, 255]);
    }
}
