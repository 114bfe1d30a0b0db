use base64::Engine;
use image::GenericImageView;
use std::io::Write;
use std::path::Path;

/// Well-known optional asset names looked up under the configured asset
/// directory.
pub const LOGO_ASSET: &str = "logo.png";
pub const SIGNATURE_ASSET: &str = "signature.png";

/// Decoded raster ready for PDF embedding. JPEG bytes pass through with
/// DCTDecode; everything else is decoded to raw RGB (plus an optional gray
/// soft mask) and zlib-compressed.
pub(crate) struct ImageData {
    pub width: u32,
    pub height: u32,
    pub color_space: &'static str,
    pub bits_per_component: u8,
    pub filter: &'static str,
    pub data: Vec<u8>,
    pub alpha: Option<AlphaData>,
}

pub(crate) struct AlphaData {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u8,
    pub data: Vec<u8>,
}

/// Resolve a well-known asset name to a loadable source string, if the file
/// exists under `dir`.
pub(crate) fn well_known_source(dir: &Path, name: &str) -> Option<String> {
    let path = dir.join(name);
    if path.is_file() {
        Some(path.to_string_lossy().into_owned())
    } else {
        None
    }
}

/// Cheap availability check used before layout so a missing asset can be
/// warned about once and skipped.
pub(crate) fn probe(source: &str) -> bool {
    if source.starts_with("data:") {
        return parse_data_uri(source).is_some();
    }
    Path::new(source).is_file()
}

pub(crate) fn load_image(source: &str) -> Option<ImageData> {
    if let Some((mime, data)) = parse_data_uri(source) {
        return decode_image_bytes(&data, Some(&mime));
    }
    let bytes = std::fs::read(Path::new(source)).ok()?;
    decode_image_bytes(&bytes, None)
}

fn decode_image_bytes(data: &[u8], mime: Option<&str>) -> Option<ImageData> {
    let format = if let Some(mime) = mime {
        if mime.contains("png") {
            Some(image::ImageFormat::Png)
        } else if mime.contains("jpeg") || mime.contains("jpg") {
            Some(image::ImageFormat::Jpeg)
        } else {
            None
        }
    } else {
        image::guess_format(data).ok()
    };

    let decoded = image::load_from_memory(data).ok()?;
    let (width, height) = decoded.dimensions();

    if matches!(format, Some(image::ImageFormat::Jpeg)) {
        let color_space = match decoded.color() {
            image::ColorType::L8 | image::ColorType::La8 => "/DeviceGray",
            _ => "/DeviceRGB",
        };
        return Some(ImageData {
            width,
            height,
            color_space,
            bits_per_component: 8,
            filter: "/DCTDecode",
            data: data.to_vec(),
            alpha: None,
        });
    }

    let rgba = decoded.to_rgba8();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    let mut has_alpha = false;
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        if a != 255 {
            has_alpha = true;
        }
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    let alpha = if has_alpha {
        Some(AlphaData {
            width,
            height,
            bits_per_component: 8,
            data: flate_compress(&alpha),
        })
    } else {
        None
    };
    Some(ImageData {
        width,
        height,
        color_space: "/DeviceRGB",
        bits_per_component: 8,
        filter: "/FlateDecode",
        data: flate_compress(&rgb),
        alpha,
    })
}

pub(crate) fn parse_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    if !uri.starts_with("data:") {
        return None;
    }
    let parts: Vec<&str> = uri.splitn(2, ',').collect();
    if parts.len() != 2 {
        return None;
    }
    let header = parts[0];
    let data_part = parts[1];
    let mime = header
        .trim_start_matches("data:")
        .split(';')
        .next()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = if header.contains("base64") {
        base64::engine::general_purpose::STANDARD
            .decode(data_part)
            .ok()?
    } else {
        data_part.as_bytes().to_vec()
    };
    Some((mime, data))
}

pub(crate) fn flate_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    let _ = encoder.write_all(data);
    encoder.finish().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn data_uri_base64_round_trip() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"hello");
        let uri = format!("data:image/png;base64,{encoded}");
        let (mime, data) = parse_data_uri(&uri).expect("parse");
        assert_eq!(mime, "image/png");
        assert_eq!(data, b"hello");
    }

    #[test]
    fn data_uri_without_base64_passes_bytes_through() {
        let (mime, data) = parse_data_uri("data:text/plain,raw").expect("parse");
        assert_eq!(mime, "text/plain");
        assert_eq!(data, b"raw");
    }

    #[test]
    fn malformed_data_uri_is_rejected() {
        assert!(parse_data_uri("data:image/png;base64").is_none());
        assert!(parse_data_uri("http://example/logo.png").is_none());
    }

    #[test]
    fn probe_reports_missing_files() {
        assert!(!probe("/nonexistent/logo.png"));
    }

    #[test]
    fn flate_output_inflates_back() {
        let payload = b"ledgerpress ledgerpress ledgerpress".repeat(8);
        let compressed = flate_compress(&payload);
        assert!(!compressed.is_empty());
        let mut decoder = flate2::read::ZlibDecoder::new(compressed.as_slice());
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).expect("inflate");
        assert_eq!(out, payload);
    }

    #[test]
    fn well_known_source_requires_an_existing_file() {
        assert!(well_known_source(Path::new("/nonexistent"), LOGO_ASSET).is_none());
    }
}
