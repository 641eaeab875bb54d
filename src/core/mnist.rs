//! IDX file parsing for the MNIST image and label sets.

#![allow(dead_code)]

use flate2::read::GzDecoder;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::core::error::{ErrorCode, HandwriteError, Result};
use crate::core::matrix::Matrix;

pub const IMAGE_MAGIC: u32 = 0x0000_0803;
pub const LABEL_MAGIC: u32 = 0x0000_0801;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Parses a big-endian unsigned 32-bit integer.
pub fn parse_u32_be(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |acc, &b| acc.wrapping_shl(8) | u32::from(b))
}

#[derive(Debug, Clone)]
pub struct ImageSet {
    pub count: usize,
    pub height: usize,
    pub width: usize,
    pub images: Vec<Matrix>,
}

#[derive(Debug, Clone)]
pub struct LabelSet {
    pub count: usize,
    pub labels: Vec<u8>,
}

impl ImageSet {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = read_file(path)?;
        Self::parse(&bytes).map_err(|err| with_path(path, err))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::parse(&read_all(reader)?)
    }

    fn parse(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        if cursor.u32()? != IMAGE_MAGIC {
            return Err(HandwriteError::message(
                ErrorCode::InvalidData,
                "not an IDX image file",
            ));
        }
        let count = cursor.u32()? as usize;
        let height = cursor.u32()? as usize;
        let width = cursor.u32()? as usize;

        if count > 0 && (height == 0 || width == 0) {
            return Err(HandwriteError::message(
                ErrorCode::InvalidData,
                format!("IDX image header declares {count} images of size {height}x{width}"),
            ));
        }
        let needed = height
            .checked_mul(width)
            .and_then(|pixels| pixels.checked_mul(count));
        match needed {
            Some(needed) if needed <= cursor.remaining() => {}
            _ => {
                return Err(HandwriteError::message(
                    ErrorCode::InvalidData,
                    format!(
                        "truncated IDX data: header declares {count} images of {height}x{width}, found {} bytes",
                        cursor.remaining()
                    ),
                ));
            }
        }

        let mut images = Vec::with_capacity(count);
        for _ in 0..count {
            let mut image = Matrix::from_bytes(cursor.take(height * width)?);
            image.reshape(height, width)?;
            images.push(image);
        }

        Ok(Self {
            count,
            height,
            width,
            images,
        })
    }
}

impl LabelSet {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = read_file(path)?;
        Self::parse(&bytes).map_err(|err| with_path(path, err))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::parse(&read_all(reader)?)
    }

    fn parse(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        if cursor.u32()? != LABEL_MAGIC {
            return Err(HandwriteError::message(
                ErrorCode::InvalidData,
                "not an IDX label file",
            ));
        }
        let count = cursor.u32()? as usize;
        let labels = cursor.take(count)?.to_vec();
        Ok(Self { count, labels })
    }
}

/// Images paired with their labels.
#[derive(Debug, Clone)]
pub struct Dataset {
    images: ImageSet,
    labels: LabelSet,
}

impl Dataset {
    pub fn pair(images: ImageSet, labels: LabelSet) -> Result<Self> {
        if images.count != labels.count {
            return Err(HandwriteError::message(
                ErrorCode::InvalidData,
                format!(
                    "image count {} does not match label count {}",
                    images.count, labels.count
                ),
            ));
        }
        Ok(Self { images, labels })
    }

    pub fn len(&self) -> usize {
        self.images.count
    }

    pub fn is_empty(&self) -> bool {
        self.images.count == 0
    }

    pub fn images(&self) -> &ImageSet {
        &self.images
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn sample(&self, index: usize) -> Result<(&Matrix, u8)> {
        match (self.images.images.get(index), self.labels.labels.get(index)) {
            (Some(image), Some(&label)) => Ok((image, label)),
            _ => Err(HandwriteError::message(
                ErrorCode::InvalidInput,
                format!(
                    "sample index {index} is out of range (dataset has {} samples)",
                    self.len()
                ),
            )),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Matrix, u8)> {
        self.images
            .images
            .iter()
            .zip(self.labels.labels.iter().copied())
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if remaining < len {
            return Err(HandwriteError::message(
                ErrorCode::InvalidData,
                format!(
                    "truncated IDX data: expected {len} bytes at offset {}, found {remaining}",
                    self.offset
                ),
            ));
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32> {
        self.take(4).map(parse_u32_be)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|err| {
        HandwriteError::context(
            ErrorCode::Io,
            format!("failed to open {}", path.display()),
            err,
        )
    })?;
    read_all(file)
}

/// Reads a whole stream, transparently inflating gzip input.
fn read_all<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;
    if !raw.starts_with(&GZIP_MAGIC) {
        return Ok(raw);
    }

    let mut inflated = Vec::new();
    GzDecoder::new(raw.as_slice())
        .read_to_end(&mut inflated)
        .map_err(|err| {
            HandwriteError::context(ErrorCode::InvalidData, "failed to inflate gzip data", err)
        })?;
    Ok(inflated)
}

fn with_path(path: &Path, err: HandwriteError) -> HandwriteError {
    match err {
        HandwriteError::Message { code, message } => {
            HandwriteError::message(code, format!("{}: {message}", path.display()))
        }
        other => other,
    }
}

impl fmt::Display for ImageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ImageSet{{count={}, height={}, width={}}}",
            self.count, self.height, self.width
        )
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LabelSet{{count={}}}", self.count)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{image_bytes, label_bytes};
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn parse_u32_is_big_endian_unsigned() {
        assert_eq!(parse_u32_be(&[0x00, 0x00, 0x08, 0x03]), 0x803);
        assert_eq!(parse_u32_be(&[0xff, 0xff, 0xff, 0xff]), u32::MAX);
        assert_eq!(parse_u32_be(&[0x00, 0x00, 0xea, 0x60]), 60_000);
    }

    #[test]
    fn images_are_reshaped_to_grid() {
        let bytes = image_bytes(2, 3, &[vec![0, 1, 2, 3, 4, 255], vec![9; 6]]);
        let set = ImageSet::from_reader(bytes.as_slice()).unwrap();

        assert_eq!(set.count, 2);
        assert_eq!(set.images[0].shape(), (2, 3));
        assert_eq!(set.images[0].get(1, 2).unwrap(), 255.0);
        assert_eq!(set.images[1].get(0, 0).unwrap(), 9.0);
        assert_eq!(set.to_string(), "ImageSet{count=2, height=2, width=3}");
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let labels = label_bytes(&[1, 2]);
        let err = ImageSet::from_reader(labels.as_slice()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidData);
        assert_eq!(err.to_string(), "not an IDX image file");

        let images = image_bytes(1, 1, &[vec![0]]);
        let err = LabelSet::from_reader(images.as_slice()).unwrap_err();
        assert_eq!(err.to_string(), "not an IDX label file");
    }

    #[test]
    fn truncated_stream_reports_expected_length() {
        let mut bytes = label_bytes(&[1, 2, 3]);
        bytes.pop();
        let err = LabelSet::from_reader(bytes.as_slice()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidData);
        assert!(err.to_string().contains("expected 3 bytes"));
    }

    fn image_header(count: u32, height: u32, width: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        for value in [IMAGE_MAGIC, count, height, width] {
            bytes.extend_from_slice(&value.to_be_bytes());
        }
        bytes
    }

    #[test]
    fn zero_sized_images_are_rejected() {
        let bytes = image_header(5_000_000, 0, 0);
        let err = ImageSet::from_reader(bytes.as_slice()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidData);
        assert!(err.to_string().contains("5000000 images of size 0x0"));

        let empty = ImageSet::from_reader(image_header(0, 0, 0).as_slice()).unwrap();
        assert_eq!(empty.count, 0);
    }

    #[test]
    fn image_count_beyond_payload_is_rejected() {
        let mut bytes = image_header(u32::MAX, 28, 28);
        bytes.extend_from_slice(&[0; 784]);
        let err = ImageSet::from_reader(bytes.as_slice()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidData);
        assert!(err.to_string().contains("found 784 bytes"));
    }

    #[test]
    fn gzip_input_is_inflated() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&label_bytes(&[7, 3, 0])).unwrap();
        let compressed = encoder.finish().unwrap();

        let set = LabelSet::from_reader(compressed.as_slice()).unwrap();
        assert_eq!(set.labels, vec![7, 3, 0]);
        assert_eq!(set.to_string(), "LabelSet{count=3}");
    }

    #[test]
    fn dataset_pairs_matching_counts() {
        let images = ImageSet::from_reader(image_bytes(1, 2, &[vec![1, 2], vec![3, 4]]).as_slice())
            .unwrap();
        let labels = LabelSet::from_reader(label_bytes(&[5, 6]).as_slice()).unwrap();
        let dataset = Dataset::pair(images.clone(), labels).unwrap();

        let (image, label) = dataset.sample(1).unwrap();
        assert_eq!(label, 6);
        assert_eq!(image.as_slice(), &[3.0, 4.0]);
        assert_eq!(dataset.iter().count(), 2);
        assert_eq!(dataset.sample(2).unwrap_err().code(), ErrorCode::InvalidInput);

        let short = LabelSet::from_reader(label_bytes(&[5]).as_slice()).unwrap();
        assert!(Dataset::pair(images, short).is_err());
    }

    #[test]
    fn open_prefixes_path_on_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.idx1-ubyte");
        std::fs::write(&path, [0u8; 8]).unwrap();
        let err = LabelSet::open(&path).unwrap_err();
        assert!(err.to_string().contains("bogus.idx1-ubyte"));
    }
}
