//! Minimal BMP encoder for [`ImageBuffer`]s.
//!
//! Writes an uncompressed 32-bit BGRA bitmap with a BITMAPINFOHEADER and a
//! negative height, so rows are stored top-down exactly like the buffer.

use std::io::{self, Write};

use crate::image::ImageBuffer;

const FILE_HEADER_SIZE: u32 = 14;
const INFO_HEADER_SIZE: u32 = 40;

/// Write `img` as a BMP stream.
pub fn write_bmp<W: Write + ?Sized>(out: &mut W, img: &ImageBuffer) -> io::Result<()> {
    let w = img.width();
    let h = img.height();
    let row_size = w * 4;
    let image_size = row_size * h;
    let file_size = FILE_HEADER_SIZE + INFO_HEADER_SIZE + image_size;

    // File header
    out.write_all(b"BM")?;
    out.write_all(&file_size.to_le_bytes())?;
    out.write_all(&[0u8; 4])?; // reserved
    out.write_all(&(FILE_HEADER_SIZE + INFO_HEADER_SIZE).to_le_bytes())?;

    // BITMAPINFOHEADER
    out.write_all(&INFO_HEADER_SIZE.to_le_bytes())?;
    out.write_all(&(w as i32).to_le_bytes())?;
    out.write_all(&(-(h as i32)).to_le_bytes())?; // top-down
    out.write_all(&1u16.to_le_bytes())?; // planes
    out.write_all(&32u16.to_le_bytes())?; // bits per pixel
    out.write_all(&0u32.to_le_bytes())?; // BI_RGB
    out.write_all(&image_size.to_le_bytes())?;
    out.write_all(&[0u8; 8])?; // pixels per meter, x and y
    out.write_all(&0u32.to_le_bytes())?; // colors used
    out.write_all(&0u32.to_le_bytes())?; // important colors

    let mut row = vec![0u8; row_size as usize];
    for y in 0..h {
        for (dst, src) in row.chunks_exact_mut(4).zip(img.row(y).chunks_exact(4)) {
            dst[0] = src[2];
            dst[1] = src[1];
            dst[2] = src[0];
            dst[3] = src[3];
        }
        out.write_all(&row)?;
    }
    Ok(())
}

/// Encode `img` into an in-memory BMP.
pub fn encode_bmp(img: &ImageBuffer) -> io::Result<Vec<u8>> {
    let len = (FILE_HEADER_SIZE + INFO_HEADER_SIZE) as usize + img.data().len();
    let mut out = Vec::with_capacity(len);
    write_bmp(&mut out, img)?;
    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba8;

    fn le_u32(b: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
    }

    #[test]
    fn test_header_fields() {
        let img = ImageBuffer::new(3, 2).unwrap();
        let bytes = encode_bmp(&img).unwrap();
        assert_eq!(&bytes[0..2], b"BM");
        assert_eq!(bytes.len(), 54 + 3 * 2 * 4);
        assert_eq!(le_u32(&bytes, 2) as usize, bytes.len());
        assert_eq!(le_u32(&bytes, 10), 54);
        assert_eq!(le_u32(&bytes, 18), 3);
        assert_eq!(le_u32(&bytes, 22) as i32, -2);
        assert_eq!(u16::from_le_bytes([bytes[28], bytes[29]]), 32);
    }

    #[test]
    fn test_pixels_are_bgra_top_down() {
        let mut img = ImageBuffer::new(2, 2).unwrap();
        img.copy_pixel(0, 0, Rgba8::new(10, 20, 30, 255));
        img.copy_pixel(1, 1, Rgba8::new(40, 50, 60, 128));
        let bytes = encode_bmp(&img).unwrap();
        assert_eq!(&bytes[54..58], &[30, 20, 10, 255]);
        assert_eq!(&bytes[54 + 12..54 + 16], &[60, 50, 40, 128]);
    }

    #[test]
    fn test_write_to_trait_object() {
        let img = ImageBuffer::new(4, 1).unwrap();
        let mut buf: Vec<u8> = Vec::new();
        {
            let out: &mut dyn Write = &mut buf;
            write_bmp(out, &img).unwrap();
        }
        assert_eq!(buf, encode_bmp(&img).unwrap());
    }
}
