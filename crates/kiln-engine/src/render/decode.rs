use std::path::{Path, PathBuf};

use thiserror::Error;

use super::texture::TextureSize;

/// Tightly packed RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub size: TextureSize,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to decode `{path}`: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("`{0}` decoded to an empty image")]
    Empty(String),
    #[error("image decoding is not available for `{0}`")]
    Unsupported(String),
}

/// Turns a texture source string into RGBA8 pixels.
pub trait TextureDecoder {
    fn decode(&self, source: &str) -> Result<DecodedImage, DecodeError>;
}

/// Decodes image files relative to a root directory.
///
/// Supports whatever formats the `image` crate was built with (PNG, JPEG,
/// BMP, GIF and TGA here).
#[derive(Debug, Clone)]
pub struct FileDecoder {
    root: PathBuf,
}

impl FileDecoder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TextureDecoder for FileDecoder {
    fn decode(&self, source: &str) -> Result<DecodedImage, DecodeError> {
        let path = self.root.join(source);
        let rgba = image::open(&path)
            .map_err(|source| DecodeError::Image { path, source })?
            .to_rgba8();

        let size = TextureSize::new(rgba.width(), rgba.height());
        if size.is_empty() {
            return Err(DecodeError::Empty(source.to_string()));
        }
        Ok(DecodedImage { size, pixels: rgba.into_raw() })
    }
}

/// Decoder that never succeeds; every load falls back to the white texture.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderDecoder;

impl TextureDecoder for PlaceholderDecoder {
    fn decode(&self, source: &str) -> Result<DecodedImage, DecodeError> {
        Err(DecodeError::Unsupported(source.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kiln-decode-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn file_decoder_reads_png_as_rgba8() {
        let dir = scratch_dir("png");
        let img = image::RgbaImage::from_fn(2, 3, |x, y| image::Rgba([x as u8, y as u8, 7, 255]));
        img.save(dir.join("tile.png")).unwrap();

        let decoded = FileDecoder::new(&dir).decode("tile.png").unwrap();
        assert_eq!(decoded.size, TextureSize::new(2, 3));
        assert_eq!(decoded.pixels.len(), 2 * 3 * 4);
        assert_eq!(&decoded.pixels[..4], &[0, 0, 7, 255]);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_file_is_an_image_error() {
        let dir = scratch_dir("missing");
        let err = FileDecoder::new(&dir).decode("nope.png").unwrap_err();
        assert!(matches!(err, DecodeError::Image { .. }));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn placeholder_always_fails() {
        let err = PlaceholderDecoder.decode("anything.tga").unwrap_err();
        assert!(err.to_string().contains("anything.tga"));
    }
}
