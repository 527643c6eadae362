use super::decode::TextureDecoder;
use super::device::GpuDevice;
use super::handle::{HandleArena, TextureHandle, TextureKind};

/// Pixel dimensions of a texture.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct TextureSize {
    pub width: u32,
    pub height: u32,
}

impl TextureSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether neither side exceeds `max_dimension`.
    #[inline]
    pub const fn fits(self, max_dimension: u32) -> bool {
        self.width <= max_dimension && self.height <= max_dimension
    }

    /// Bytes of tightly packed RGBA8 data for this size, if it fits in `usize`.
    pub fn byte_len(self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(4)
    }
}

/// Opaque white, used when a load fails.
pub const WHITE_PIXEL: [u8; 4] = [255, 255, 255, 255];

#[derive(Debug, Clone)]
pub struct TextureEntry<T> {
    pub gpu: T,
    pub size: TextureSize,
}

/// Owns textures keyed by [`TextureHandle`].
pub struct TextureTable<D: GpuDevice> {
    entries: HandleArena<TextureKind, TextureEntry<D::Texture>>,
}

impl<D: GpuDevice> Default for TextureTable<D> {
    fn default() -> Self {
        Self { entries: HandleArena::new() }
    }
}

impl<D: GpuDevice> TextureTable<D> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, handle: TextureHandle) -> Option<&TextureEntry<D::Texture>> {
        self.entries.get(handle)
    }

    /// Decodes `source` and uploads it.
    ///
    /// A decode failure, or an image larger than the device accepts, is
    /// logged and replaced by a 1×1 white texture, so a usable handle is
    /// always returned alongside the size actually uploaded.
    pub fn load(
        &mut self,
        device: &mut D,
        decoder: &dyn TextureDecoder,
        source: &str,
    ) -> (TextureHandle, TextureSize) {
        let max = device.max_texture_dimension();
        match decoder.decode(source) {
            Ok(image) if image.size.is_empty() || !image.size.fits(max) => {
                log::warn!(
                    "texture `{source}`: {}x{} is empty or over the {max}px device limit; using white",
                    image.size.width,
                    image.size.height
                );
                self.white(device)
            }
            Ok(image) if image.size.byte_len() == Some(image.pixels.len()) => {
                let handle = self.upload(device, image.size, &image.pixels);
                log::debug!("loaded texture `{source}` as {handle:?} ({}x{})", image.size.width, image.size.height);
                (handle, image.size)
            }
            Ok(image) => {
                log::warn!(
                    "texture `{source}`: decoder returned {} bytes for {}x{}; using white",
                    image.pixels.len(),
                    image.size.width,
                    image.size.height
                );
                self.white(device)
            }
            Err(err) => {
                log::warn!("texture `{source}`: {err}; using white");
                self.white(device)
            }
        }
    }

    /// Uploads caller-supplied RGBA8 pixels.
    ///
    /// Returns [`TextureHandle::NONE`] when `size` is empty or larger than the
    /// device accepts, or `pixels` is not exactly `width * height * 4` bytes.
    pub fn generate(&mut self, device: &mut D, pixels: &[u8], size: TextureSize) -> TextureHandle {
        if size.is_empty() {
            log::warn!("generate_texture: empty size {}x{}", size.width, size.height);
            return TextureHandle::NONE;
        }
        let max = device.max_texture_dimension();
        if !size.fits(max) {
            log::warn!("generate_texture: {}x{} exceeds the {max}px device limit", size.width, size.height);
            return TextureHandle::NONE;
        }
        if size.byte_len() != Some(pixels.len()) {
            log::warn!(
                "generate_texture: {} bytes supplied for {}x{} RGBA8",
                pixels.len(),
                size.width,
                size.height
            );
            return TextureHandle::NONE;
        }
        self.upload(device, size, pixels)
    }

    /// Frees the texture behind `handle`. Unknown handles are ignored.
    pub fn release(&mut self, device: &mut D, handle: TextureHandle) -> bool {
        let Some(entry) = self.entries.remove(handle) else {
            log::trace!("release of unknown texture {handle:?} ignored");
            return false;
        };
        device.release_texture(entry.gpu);
        true
    }

    pub fn release_all(&mut self, device: &mut D) -> usize {
        let drained = self.entries.drain();
        let count = drained.len();
        for (_, entry) in drained {
            device.release_texture(entry.gpu);
        }
        count
    }

    fn white(&mut self, device: &mut D) -> (TextureHandle, TextureSize) {
        let size = TextureSize::new(1, 1);
        (self.upload(device, size, &WHITE_PIXEL), size)
    }

    fn upload(&mut self, device: &mut D, size: TextureSize, pixels: &[u8]) -> TextureHandle {
        let entry = TextureEntry { gpu: device.create_texture(size, pixels), size };
        match self.entries.insert(entry) {
            Ok(handle) => handle,
            Err(entry) => {
                log::error!("texture handle space exhausted; dropping upload");
                device.release_texture(entry.gpu);
                TextureHandle::NONE
            }
        }
    }
}
