//! In-memory [`GpuDevice`] for exercising the render bridge without a GPU.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::coords::FramebufferSize;

use super::device::GpuDevice;
use super::program::{LinkedShader, ShaderError};
use super::texture::TextureSize;
use super::vertex::Vertex;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedGeometry {
    pub id: u32,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTexture {
    pub id: u32,
    pub size: TextureSize,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedProgram(pub u32);

#[derive(Debug)]
pub struct RecordingDevice {
    pub framebuffer: FramebufferSize,
    pub fail_programs: bool,
    pub max_texture_dimension: u32,
    pub programs_created: usize,
    pub geometries_released: usize,
    pub textures_created: usize,
    pub textures_released: usize,
    /// Geometry and texture releases, observable after the device is moved.
    pub releases: Rc<Cell<usize>>,
    next_id: u32,
    geometries: BTreeMap<u32, Rc<RecordedGeometry>>,
    textures: BTreeMap<u32, Rc<RecordedTexture>>,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self {
            framebuffer: FramebufferSize::new(800, 600),
            fail_programs: false,
            max_texture_dimension: 8192,
            programs_created: 0,
            geometries_released: 0,
            textures_created: 0,
            textures_released: 0,
            releases: Rc::new(Cell::new(0)),
            next_id: 0,
            geometries: BTreeMap::new(),
            textures: BTreeMap::new(),
        }
    }
}

impl RecordingDevice {
    pub fn live_geometries(&self) -> usize {
        self.geometries.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn geometry<'a>(&self, gpu: &'a Rc<RecordedGeometry>) -> &'a RecordedGeometry {
        gpu
    }

    pub fn texture<'a>(&self, gpu: &'a Rc<RecordedTexture>) -> &'a RecordedTexture {
        gpu
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl GpuDevice for RecordingDevice {
    type Program = RecordedProgram;
    type Geometry = Rc<RecordedGeometry>;
    type Texture = Rc<RecordedTexture>;

    fn create_program(&mut self, _shader: &LinkedShader) -> Result<Self::Program, ShaderError> {
        if self.fail_programs {
            return Err(ShaderError::Link { log: "device rejected the program".to_string() });
        }
        self.programs_created += 1;
        Ok(RecordedProgram(self.next()))
    }

    fn create_geometry(&mut self, vertices: &[Vertex], indices: &[u32]) -> Self::Geometry {
        let id = self.next();
        let geometry = Rc::new(RecordedGeometry { id, vertices: vertices.to_vec(), indices: indices.to_vec() });
        self.geometries.insert(id, geometry.clone());
        geometry
    }

    fn release_geometry(&mut self, geometry: Self::Geometry) {
        assert!(self.geometries.remove(&geometry.id).is_some(), "geometry {} released twice", geometry.id);
        self.geometries_released += 1;
        self.releases.set(self.releases.get() + 1);
    }

    fn create_texture(&mut self, size: TextureSize, pixels: &[u8]) -> Self::Texture {
        assert_eq!(size.byte_len(), Some(pixels.len()));
        assert!(size.fits(self.max_texture_dimension), "{size:?} exceeds the device limit");
        let id = self.next();
        let texture = Rc::new(RecordedTexture { id, size, pixels: pixels.to_vec() });
        self.textures.insert(id, texture.clone());
        self.textures_created += 1;
        texture
    }

    fn release_texture(&mut self, texture: Self::Texture) {
        assert!(self.textures.remove(&texture.id).is_some(), "texture {} released twice", texture.id);
        self.textures_released += 1;
        self.releases.set(self.releases.get() + 1);
    }

    fn max_texture_dimension(&self) -> u32 {
        self.max_texture_dimension
    }

    fn framebuffer_size(&self) -> FramebufferSize {
        self.framebuffer
    }
}

/// Axis-aligned quad with indices `[0, 1, 2, 0, 2, 3]`.
pub fn quad(x: f32, y: f32, w: f32, h: f32) -> (Vec<Vertex>, Vec<u32>) {
    let white = [255; 4];
    let vertices = vec![
        Vertex::new([x, y], white, [0.0, 0.0]),
        Vertex::new([x + w, y], white, [1.0, 0.0]),
        Vertex::new([x + w, y + h], white, [1.0, 1.0]),
        Vertex::new([x, y + h], white, [0.0, 1.0]),
    ];
    (vertices, vec![0, 1, 2, 0, 2, 3])
}
