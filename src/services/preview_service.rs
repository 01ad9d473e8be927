use crate::error::AppError;
use crate::models::upload_types::SelectedFile;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::ImageReader;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

const PREVIEW_SIZE: u32 = 200;
const PREVIEW_QUALITY: u8 = 60;

/// Wrap already-loaded bytes as a selection. Never fails: an undecodable
/// image just has no preview, validation is left to the service.
pub fn select_bytes(name: impl Into<String>, bytes: Vec<u8>) -> SelectedFile {
    let name = name.into();
    let preview = match generate_preview(&bytes) {
        Ok(uri) => Some(Arc::from(uri)),
        Err(e) => {
            log::warn!("[preview] {}: {}", name, e);
            None
        }
    };
    SelectedFile {
        name,
        bytes: Arc::from(bytes),
        preview,
    }
}

/// Read an image from disk and wrap it as a selection.
pub async fn select_path(path: &Path) -> Result<SelectedFile, AppError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| AppError {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;
    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    // Decoding a full-size X-ray is CPU work; keep it off the async worker.
    tokio::task::spawn_blocking(move || select_bytes(name, bytes))
        .await
        .map_err(|e| AppError {
            message: format!("Preview task failed: {}", e),
        })
}

/// Build a JPEG thumbnail as a data URI. Respects EXIF orientation.
pub fn generate_preview(bytes: &[u8]) -> Result<String, AppError> {
    let jpeg = generate_preview_bytes(bytes)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&jpeg);
    Ok(format!("data:image/jpeg;base64,{}", b64))
}

fn generate_preview_bytes(bytes: &[u8]) -> Result<Vec<u8>, AppError> {
    let (exif_thumb, orientation) = read_exif_info(bytes);

    // Embedded EXIF thumbnail is already preview-sized
    if let Some(thumb) = exif_thumb {
        if orientation == 1 {
            return Ok(thumb);
        }
        match decode(&thumb) {
            Ok(img) => return encode_jpeg(&apply_orientation(img, orientation)),
            Err(e) => log::debug!("[preview] EXIF thumbnail unusable: {}, falling back", e),
        }
    }

    let mut img = decode(bytes)?;

    let intermediate_size = PREVIEW_SIZE * 4;
    if img.width() > intermediate_size * 2 || img.height() > intermediate_size * 2 {
        img = img.resize(intermediate_size, intermediate_size, FilterType::Nearest);
    }
    img = img.resize(PREVIEW_SIZE, PREVIEW_SIZE, FilterType::Triangle);

    if orientation != 1 {
        img = apply_orientation(img, orientation);
    }

    encode_jpeg(&img)
}

fn decode(bytes: &[u8]) -> Result<image::DynamicImage, AppError> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;
    Ok(img)
}

fn encode_jpeg(img: &image::DynamicImage) -> Result<Vec<u8>, AppError> {
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, PREVIEW_QUALITY);
    // JPEG has no alpha channel
    let rgb = image::DynamicImage::from(img.to_rgb8());
    rgb.write_with_encoder(encoder).map_err(|e| AppError {
        message: format!("Failed to encode preview: {}", e),
    })?;
    Ok(buffer.into_inner())
}

/// Returns (embedded thumbnail, orientation). Orientation defaults to 1.
fn read_exif_info(bytes: &[u8]) -> (Option<Vec<u8>>, u32) {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(e) => e,
        Err(_) => return (None, 1),
    };

    let orientation = match exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY) {
        Some(field) => match field.value {
            exif::Value::Short(ref v) => *v.first().unwrap_or(&1) as u32,
            exif::Value::Long(ref v) => *v.first().unwrap_or(&1),
            _ => 1,
        },
        None => 1,
    };

    (extract_thumb_from_exif(&exif), orientation)
}

fn extract_thumb_from_exif(exif: &exif::Exif) -> Option<Vec<u8>> {
    let offset_field = exif.get_field(exif::Tag::JPEGInterchangeFormat, exif::In::THUMBNAIL)?;
    let length_field = exif.get_field(exif::Tag::JPEGInterchangeFormatLength, exif::In::THUMBNAIL)?;

    let offset = match offset_field.value {
        exif::Value::Long(ref v) => *v.first()? as usize,
        _ => return None,
    };
    let length = match length_field.value {
        exif::Value::Long(ref v) => *v.first()? as usize,
        _ => return None,
    };

    if !(100..=200_000).contains(&length) {
        return None;
    }

    let buf = exif.buf();
    let thumb = buf.get(offset..offset.checked_add(length)?)?;
    if thumb.len() < 2 || thumb[0] != 0xFF || thumb[1] != 0xD8 {
        return None;
    }

    Some(thumb.to_vec())
}

fn apply_orientation(img: image::DynamicImage, orientation: u32) -> image::DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.fliph().rotate90(),
        6 => img.rotate90(),
        7 => img.fliph().rotate270(),
        8 => img.rotate270(),
        _ => img,
    }
}
