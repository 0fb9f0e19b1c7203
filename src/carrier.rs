use crate::{Result, StegoError, HEADER_BITS};
use image::io::Reader as ImageReader;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use log::debug;
use std::io::{BufRead, Cursor, Seek, Write};

/// Colour channels that carry payload bits: R, G and B. Alpha never does.
pub const EMBED_CHANNELS: usize = 3;

const ACCEPTED_FORMATS: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Bmp, ImageFormat::Jpeg];

/// A decoded image as a flat, row-major buffer of 8-bit channel values.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Carrier {
    width: u32,
    height: u32,
    channels: usize,
    pixels: Vec<u8>,
}

impl Carrier {
    pub fn from_bytes(image_bytes: &[u8]) -> Result<Self> {
        Self::read(Cursor::new(image_bytes))
    }

    /// Decode a PNG, BMP or JPEG carrier. Images with an alpha channel keep it
    /// as a fourth channel, everything else is normalised to 8-bit RGB.
    pub fn read<R: BufRead + Seek>(input_image: R) -> Result<Self> {
        let reader = ImageReader::new(input_image)
            .with_guessed_format()
            .map_err(|err| StegoError::CorruptImage(err.to_string()))?;

        match reader.format() {
            Some(format) if ACCEPTED_FORMATS.contains(&format) => {
                debug!("carrier format: {:?}", format)
            }
            _ => return Err(StegoError::UnsupportedFormat),
        }

        let img = reader.decode()?;
        let carrier = if img.color().has_alpha() {
            Self::from_rgba(img.to_rgba8())
        } else {
            Self::from_rgb(img.to_rgb8())
        };

        carrier.check_minimum_size()?;
        Ok(carrier)
    }

    pub fn from_rgb(img: RgbImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            channels: 3,
            pixels: img.into_raw(),
        }
    }

    pub fn from_rgba(img: RgbaImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            channels: 4,
            pixels: img.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn embeddable_bits(&self) -> usize {
        self.width as usize * self.height as usize * EMBED_CHANNELS
    }

    /// A carrier must fit the header plus at least one body byte.
    fn check_minimum_size(&self) -> Result<()> {
        if self.embeddable_bits() < HEADER_BITS + 8 {
            return Err(StegoError::CarrierTooSmall {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Always PNG: LSB data does not survive lossy re-compression.
    pub fn write_png<W: Write + Seek>(self, output: &mut W) -> Result<()> {
        let (width, height) = (self.width, self.height);
        let img = if self.channels == 4 {
            RgbaImage::from_raw(width, height, self.pixels).map(DynamicImage::ImageRgba8)
        } else {
            RgbImage::from_raw(width, height, self.pixels).map(DynamicImage::ImageRgb8)
        };

        let img = img.ok_or_else(|| {
            StegoError::ImageEncoding(
                "could not create output image buffer from raw parts".to_string(),
            )
        })?;

        img.write_to(output, ImageFormat::Png)
            .map_err(|err| StegoError::ImageEncoding(err.to_string()))
    }

    pub fn to_png(self) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        self.write_png(&mut out)?;
        Ok(out.into_inner())
    }
}
