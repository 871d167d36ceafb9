use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader, Rgb, RgbImage};

use crate::core::ErrorKind;

const JPEG_QUALITY: u8 = 90;

// ISO BMFF major brands used by HEIC/HEIF stills and sequences
const HEIF_BRANDS: &[&[u8; 4]] = &[
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"mif1", b"msf1",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    Jpeg,
}

impl ImageEncoding {
    pub fn tag(&self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "jpeg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "image/jpeg",
        }
    }
}

/// A normalized image ready to attach to one request. Only needed
/// until that request completes.
#[derive(Clone, Debug)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub encoding: ImageEncoding,
    pub width: u32,
    pub height: u32,
}

impl ImagePayload {
    /// Inline form used in `image_url` content parts
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.encoding.mime_type(),
            BASE64.encode(&self.bytes)
        )
    }
}

/// Decodes an uploaded image in any supported raster format and
/// re-encodes it as an 8-bit RGB JPEG. Transparent pixels are
/// composited onto white.
pub fn normalize(bytes: &[u8]) -> Result<ImagePayload, ErrorKind> {
    if bytes.is_empty() {
        return Err(ErrorKind::InvalidImage("upload is empty".to_string()));
    }

    let decoded = if is_heif(bytes) {
        decode_heif(bytes)?
    } else {
        decode_raster(bytes)?
    };
    let rgb = flatten_alpha(decoded);
    let (width, height) = rgb.dimensions();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| ErrorKind::InvalidImage(format!("failed to encode JPEG: {}", e)))?;

    tracing::debug!(
        "Normalized {} byte upload to {}x{} JPEG ({} bytes)",
        bytes.len(),
        width,
        height,
        out.len()
    );

    Ok(ImagePayload {
        bytes: out,
        encoding: ImageEncoding::Jpeg,
        width,
        height,
    })
}

fn is_heif(bytes: &[u8]) -> bool {
    match (bytes.get(4..8), bytes.get(8..12)) {
        (Some(b"ftyp"), Some(brand)) => HEIF_BRANDS.iter().any(|b| b.as_slice() == brand),
        _ => false,
    }
}

fn decode_raster(bytes: &[u8]) -> Result<DynamicImage, ErrorKind> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ErrorKind::InvalidImage(format!("failed to read upload: {}", e)))?;
    let format = reader
        .format()
        .ok_or_else(|| ErrorKind::InvalidImage("unrecognized image format".to_string()))?;

    reader
        .decode()
        .map_err(|e| ErrorKind::InvalidImage(format!("failed to decode {:?}: {}", format, e)))
}

#[cfg(feature = "heic")]
fn decode_heif(bytes: &[u8]) -> Result<DynamicImage, ErrorKind> {
    use libheif_rs::{ColorSpace, HeifContext, HeifError, LibHeif, RgbChroma};

    let invalid = |e: HeifError| ErrorKind::InvalidImage(format!("failed to decode HEIC: {}", e));

    let lib_heif = LibHeif::new();
    let ctx = HeifContext::read_from_bytes(bytes).map_err(invalid)?;
    let handle = ctx.primary_image_handle().map_err(invalid)?;
    let image = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(invalid)?;

    let planes = image.planes();
    let plane = planes.interleaved.ok_or_else(|| {
        ErrorKind::InvalidImage("HEIC decoder returned no pixel data".to_string())
    })?;

    // Rows are padded out to `stride` bytes
    let row_len = plane.width as usize * 3;
    let mut pixels = Vec::with_capacity(row_len * plane.height as usize);
    for row in plane.data.chunks(plane.stride).take(plane.height as usize) {
        let row = row.get(..row_len).ok_or_else(|| {
            ErrorKind::InvalidImage("HEIC decoder returned a short row".to_string())
        })?;
        pixels.extend_from_slice(row);
    }

    RgbImage::from_raw(plane.width, plane.height, pixels)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| ErrorKind::InvalidImage("HEIC pixel data is incomplete".to_string()))
}

#[cfg(not(feature = "heic"))]
fn decode_heif(_bytes: &[u8]) -> Result<DynamicImage, ErrorKind> {
    Err(ErrorKind::InvalidImage("HEIC support is not enabled".to_string()))
}

fn flatten_alpha(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut flattened = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = u16::from(pixel[3]);
        let blend = |channel: u8| -> u8 {
            (((u16::from(channel) * alpha) + (255 * (255 - alpha))) / 255) as u8
        };
        flattened.put_pixel(
            x,
            y,
            Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]),
        );
    }
    flattened
}
