//! Image dimensions from file headers.
//!
//! Only the three formats the image loader accepts are understood. Reads
//! are bounds-checked; a truncated header yields `None`, never a panic.

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u64,
    pub height: u64,
}

fn u16_le(buf: &[u8], at: usize) -> Option<u64> {
    let bytes = buf.get(at..at + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]) as u64)
}

fn u16_be(buf: &[u8], at: usize) -> Option<u64> {
    let bytes = buf.get(at..at + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]) as u64)
}

fn u32_be(buf: &[u8], at: usize) -> Option<u64> {
    let bytes = buf.get(at..at + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as u64)
}

fn gif(buf: &[u8]) -> Option<ImageSize> {
    Some(ImageSize {
        width: u16_le(buf, 6)?,
        height: u16_le(buf, 8)?,
    })
}

fn png(buf: &[u8]) -> Option<ImageSize> {
    Some(ImageSize {
        width: u32_be(buf, 16)?,
        height: u32_be(buf, 20)?,
    })
}

/// Walk JPEG segments until a baseline or progressive start-of-frame.
fn jpeg(buf: &[u8]) -> Option<ImageSize> {
    let mut offset = 2;
    while offset < buf.len() {
        let marker = u16_be(buf, offset)?;
        offset += 2;
        if marker == 0xFFC0 || marker == 0xFFC2 {
            return Some(ImageSize {
                width: u16_be(buf, offset + 5)?,
                height: u16_be(buf, offset + 3)?,
            });
        }
        let length = u16_be(buf, offset)? as usize;
        if length < 2 {
            return None;
        }
        offset += length;
    }
    None
}

/// Sniff `buf` and return the image's dimensions.
pub fn image_size(buf: &[u8]) -> Option<ImageSize> {
    match buf {
        [0xFF, 0xD8, ..] => jpeg(buf),
        [b'G', b'I', b'F', ..] => gif(buf),
        [0x89, b'P', b'N', b'G', ..] => png(buf),
        _ => None,
    }
}
