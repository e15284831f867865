//! Embedded image extraction from PDFs and office packages.
//!
//! PDF image XObjects encoded as JPEG or JPEG 2000 are written unchanged; 8-bit RGB and
//! greyscale samples (raw or Flate-compressed) are re-encoded as PNG. Other encodings are
//! skipped. Office packages contribute every part under their `media/` folder.

use super::{
    ExtractionError, SourceFormat,
    office::{MAX_PART_BYTES, open_package, read_bounded},
};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Depth limit when walking the page tree for inherited resources.
const MAX_PARENT_DEPTH: usize = 32;

/// An image written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedImage {
    /// Path of the written file.
    pub image_path: String,
    /// Page the image was found on (PDF only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    /// Pixel width, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Pixel height, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// File format label such as `png` or `jpg`.
    pub format: String,
}

/// Write the images embedded in `bytes` into `output_dir`, which must exist.
pub fn extract_images(
    format: SourceFormat,
    bytes: &[u8],
    output_dir: &Path,
) -> Result<Vec<ExtractedImage>, ExtractionError> {
    let images = match format {
        SourceFormat::Pdf => pdf_images(bytes, output_dir)?,
        SourceFormat::Docx => office_media(bytes, "word/media/", output_dir)?,
        SourceFormat::Pptx => office_media(bytes, "ppt/media/", output_dir)?,
        SourceFormat::Image => Vec::new(),
    };
    tracing::info!(
        format = format.as_str(),
        images = images.len(),
        dir = %output_dir.display(),
        "Image extraction finished"
    );
    Ok(images)
}

fn pdf_images(bytes: &[u8], output_dir: &Path) -> Result<Vec<ExtractedImage>, ExtractionError> {
    let document = Document::load_mem(bytes)?;
    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut images = Vec::new();

    for (page_number, page_id) in document.get_pages() {
        let Some(xobjects) = page_xobjects(&document, page_id) else {
            continue;
        };
        for (name, object) in xobjects.iter() {
            if let Object::Reference(id) = object {
                if !seen.insert(*id) {
                    continue;
                }
            }
            let Ok(stream) = resolve(&document, object).and_then(Object::as_stream) else {
                continue;
            };
            if !is_image(stream) {
                continue;
            }

            let stem = format!(
                "page{page_number}_{}",
                String::from_utf8_lossy(name).replace(|c: char| !c.is_ascii_alphanumeric(), "")
            );
            match write_pdf_image(stream, output_dir, &stem) {
                Ok(Some(mut image)) => {
                    image.page_number = Some(page_number);
                    images.push(image);
                }
                Ok(None) => {
                    tracing::debug!(page = page_number, image = %stem, "Skipping unsupported image encoding");
                }
                Err(err) => {
                    tracing::warn!(page = page_number, image = %stem, error = %err, "Failed to write image");
                }
            }
        }
    }

    Ok(images)
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> lopdf::Result<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id),
        other => Ok(other),
    }
}

/// XObject dictionary of a page, following `Parent` links for inherited resources.
fn page_xobjects(document: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = document.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_PARENT_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            let resources = resolve(document, resources).ok()?.as_dict().ok()?;
            let xobjects = resources.get(b"XObject").ok()?;
            return resolve(document, xobjects).ok()?.as_dict().ok();
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = document.get_dictionary(parent).ok()?;
    }
    None
}

fn is_image(stream: &Stream) -> bool {
    stream
        .dict
        .get(b"Subtype")
        .and_then(Object::as_name)
        .is_ok_and(|subtype| subtype == b"Image")
}

fn filters(stream: &Stream) -> Vec<Vec<u8>> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

fn dimension(stream: &Stream, key: &[u8]) -> Option<u32> {
    stream
        .dict
        .get(key)
        .and_then(Object::as_i64)
        .ok()
        .and_then(|value| u32::try_from(value).ok())
}

fn write_pdf_image(
    stream: &Stream,
    output_dir: &Path,
    stem: &str,
) -> Result<Option<ExtractedImage>, ExtractionError> {
    let width = dimension(stream, b"Width");
    let height = dimension(stream, b"Height");
    let filters = filters(stream);

    let passthrough = match filters.last().map(Vec::as_slice) {
        Some(b"DCTDecode") => Some("jpg"),
        Some(b"JPXDecode") => Some("jp2"),
        _ => None,
    };
    if let Some(extension) = passthrough {
        if filters.len() != 1 {
            return Ok(None);
        }
        let path = output_dir.join(format!("{stem}.{extension}"));
        std::fs::write(&path, &stream.content)?;
        return Ok(Some(ExtractedImage {
            image_path: path.display().to_string(),
            page_number: None,
            width,
            height,
            format: extension.to_string(),
        }));
    }

    let samples = match filters.as_slice() {
        [] => stream.content.clone(),
        [only] if only.as_slice() == b"FlateDecode" => stream.decompressed_content()?,
        _ => return Ok(None),
    };
    let (Some(width), Some(height)) = (width, height) else {
        return Ok(None);
    };
    let bits = stream
        .dict
        .get(b"BitsPerComponent")
        .and_then(Object::as_i64)
        .unwrap_or(8);
    let color_space = stream
        .dict
        .get(b"ColorSpace")
        .and_then(Object::as_name)
        .unwrap_or(b"");
    if bits != 8 {
        return Ok(None);
    }

    let image = match color_space {
        b"DeviceRGB" => RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
        b"DeviceGray" => GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8),
        _ => None,
    };
    let Some(image) = image else {
        return Ok(None);
    };

    let path = output_dir.join(format!("{stem}.png"));
    image.save_with_format(&path, ImageFormat::Png)?;
    Ok(Some(ExtractedImage {
        image_path: path.display().to_string(),
        page_number: None,
        width: Some(width),
        height: Some(height),
        format: "png".to_string(),
    }))
}

fn office_media(
    bytes: &[u8],
    prefix: &str,
    output_dir: &Path,
) -> Result<Vec<ExtractedImage>, ExtractionError> {
    let mut package = open_package(bytes)?;
    let mut images = Vec::new();

    for idx in 0..package.len() {
        let mut entry = package.by_index(idx)?;
        if entry.is_dir() || !entry.name().starts_with(prefix) {
            continue;
        }
        let Some(file_name) = Path::new(entry.name())
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
        else {
            continue;
        };

        let part = entry.name().to_string();
        let contents = read_bounded(&part, &mut entry, MAX_PART_BYTES)?;
        let path = output_dir.join(&file_name);
        std::fs::write(&path, &contents)?;

        let dimensions = image::image_dimensions(&path).ok();
        let format = Path::new(&file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "bin".to_string());

        images.push(ExtractedImage {
            image_path: path.display().to_string(),
            page_number: None,
            width: dimensions.map(|(width, _)| width),
            height: dimensions.map(|(_, height)| height),
            format,
        });
    }

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ScratchDir;
    use crate::extraction::office::fixtures::package;
    use lopdf::dictionary;

    fn pdf_with_rgb_image() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 2,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255],
        ));
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1,
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Im0" => image_id },
                },
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn reencodes_raw_pdf_samples_as_png() {
        let scratch = ScratchDir::new().unwrap();
        let images =
            extract_images(SourceFormat::Pdf, &pdf_with_rgb_image(), scratch.path()).unwrap();
        assert_eq!(images.len(), 1);
        let image = &images[0];
        assert_eq!(image.page_number, Some(1));
        assert_eq!((image.width, image.height), (Some(2), Some(2)));
        assert_eq!(image.format, "png");
        assert!(image.image_path.ends_with("page1_Im0.png"));
        assert_eq!(image::image_dimensions(&image.image_path).unwrap(), (2, 2));
    }

    #[test]
    fn copies_office_media_parts() {
        let mut png = Vec::new();
        DynamicImage::ImageLuma8(GrayImage::new(3, 1))
            .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        let bytes = package(&[
            ("word/document.xml", b"<w:document/>".as_slice()),
            ("word/media/image1.png", png.as_slice()),
        ]);
        let scratch = ScratchDir::new().unwrap();
        let images = extract_images(SourceFormat::Docx, &bytes, scratch.path()).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].format, "png");
        assert_eq!(images[0].width, Some(3));
        assert_eq!(images[0].page_number, None);
    }
}
