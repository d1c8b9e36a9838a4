use std::io::Cursor;
use std::path::Path;

use anyhow::Context;
use image::DynamicImage;
use image::ImageFormat;
use image::ImageReader;
use image_paste_core::EncodedImageFormat;

use crate::collaborators::ImageCodec;

/// [`ImageCodec`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateCodec;

impl ImageCodec for ImageCrateCodec {
    fn decode(&self, path: &Path) -> anyhow::Result<(DynamicImage, EncodedImageFormat)> {
        let reader = ImageReader::open(path)
            .with_context(|| format!("open {}", path.display()))?
            .with_guessed_format()
            .with_context(|| format!("sniff format of {}", path.display()))?;
        let format = match reader.format() {
            Some(ImageFormat::Png) => EncodedImageFormat::Png,
            Some(ImageFormat::Jpeg) => EncodedImageFormat::Jpeg,
            _ => EncodedImageFormat::Other,
        };
        let image = reader
            .decode()
            .with_context(|| format!("decode {}", path.display()))?;
        Ok((image, format))
    }

    fn encode(&self, image: &DynamicImage, format: EncodedImageFormat) -> anyhow::Result<Vec<u8>> {
        let target = match format {
            EncodedImageFormat::Png => ImageFormat::Png,
            EncodedImageFormat::Jpeg => ImageFormat::Jpeg,
            EncodedImageFormat::Other => anyhow::bail!("no encoder for {}", format.label()),
        };
        let mut buf = Cursor::new(Vec::new());
        image
            .write_to(&mut buf, target)
            .with_context(|| format!("encode {}", format.label()))?;
        Ok(buf.into_inner())
    }

    fn dimensions(&self, path: &Path) -> anyhow::Result<(u32, u32)> {
        image::image_dimensions(path)
            .with_context(|| format!("read dimensions of {}", path.display()))
    }
}
