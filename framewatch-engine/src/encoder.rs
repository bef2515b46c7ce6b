use crate::traits::VideoFrame;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;

const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("frame has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },

    #[error("frame buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("jpeg encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
}

/// JPEG-encodes a frame at its native resolution. Alpha is dropped.
pub fn encode_jpeg(frame: &VideoFrame, quality: u8) -> Result<Vec<u8>, EncodeError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(EncodeError::Empty {
            width: frame.width,
            height: frame.height,
        });
    }

    let expected = (frame.width as usize) * (frame.height as usize) * 4;
    if frame.rgba.len() != expected {
        return Err(EncodeError::BufferSize {
            width: frame.width,
            height: frame.height,
            expected,
            actual: frame.rgba.len(),
        });
    }

    let rgb: Vec<u8> = frame
        .rgba
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).encode(
        &rgb,
        frame.width,
        frame.height,
        ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}

/// Same as `encode_jpeg`, wrapped as a `data:image/jpeg;base64,` URI.
pub fn encode_jpeg_data_uri(frame: &VideoFrame, quality: u8) -> Result<String, EncodeError> {
    let jpeg = encode_jpeg(frame, quality)?;
    Ok(format!("{DATA_URI_PREFIX}{}", BASE64.encode(jpeg)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn data_uri_decodes_back_to_native_size() {
        let frame = VideoFrame::solid(8, 6, [200, 10, 10, 255]);
        let uri = encode_jpeg_data_uri(&frame, 92).unwrap();
        assert!(uri.starts_with(DATA_URI_PREFIX));

        let bytes = BASE64.decode(&uri[DATA_URI_PREFIX.len()..]).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (8, 6));
    }

    #[test]
    fn empty_frame_is_an_error() {
        let frame = VideoFrame {
            width: 0,
            height: 0,
            rgba: vec![],
        };
        assert!(matches!(
            encode_jpeg(&frame, 92),
            Err(EncodeError::Empty { .. })
        ));
    }

    #[test]
    fn short_buffer_is_an_error() {
        let frame = VideoFrame {
            width: 2,
            height: 2,
            rgba: vec![0; 10],
        };
        let err = encode_jpeg(&frame, 92).unwrap_err();
        assert!(err.to_string().contains("expected 16"));
    }
}
