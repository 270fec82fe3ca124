//! Native TIFF frame reading/writing
//!
//! Uses the `tiff` crate for plain single-image TIFF I/O. Georeferencing tags
//! are ignored: every frame of a stack is assumed to be co-registered.

use crate::error::{Error, Result};
use crate::raster::{default_labels, RasterElement, RasterStack};
use ndarray::{Array2, ArrayView2};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray8;
use tiff::encoder::TiffEncoder;
use tracing::debug;

/// Read the first band of a TIFF file as an `f64` frame.
///
/// Integer and float sample formats are widened to `f64`. No cleaning is
/// done here; sentinel values come through untouched.
pub fn read_frame<P: AsRef<Path>>(path: P) -> Result<Array2<f64>> {
    let file = File::open(path.as_ref())?;
    let frame = decode_frame(BufReader::new(file))?;
    debug!(
        "Read {} ({} x {})",
        path.as_ref().display(),
        frame.ncols(),
        frame.nrows()
    );
    Ok(frame)
}

/// Read a TIFF frame from an in-memory buffer
pub fn read_frame_from_buffer(data: &[u8]) -> Result<Array2<f64>> {
    decode_frame(Cursor::new(data))
}

/// Load a series of frames into a stack, in the given order.
///
/// Frames are labelled `Time-1`, `Time-2`, ... Every frame must have the
/// dimensions of the first one.
pub fn read_stack<P: AsRef<Path>>(paths: &[P]) -> Result<RasterStack> {
    if paths.is_empty() {
        return Err(Error::shape("at least one input frame", &[0]));
    }

    let labels = default_labels(paths.len());
    let frames = labels
        .into_iter()
        .zip(paths)
        .map(|(label, path)| Ok((label, read_frame(path)?)))
        .collect::<Result<Vec<_>>>()?;

    RasterStack::from_frames(frames)
}

/// Internal: decode the first band from any `Read + Seek` source
fn decode_frame<R>(reader: R) -> Result<Array2<f64>>
where
    R: std::io::Read + std::io::Seek,
{
    let mut decoder = Decoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let rows = height as usize;
    let cols = width as usize;

    let samples: Vec<f64> = match decoder.read_image()? {
        DecodingResult::U8(buf) => widen(&buf),
        DecodingResult::U16(buf) => widen(&buf),
        DecodingResult::U32(buf) => widen(&buf),
        DecodingResult::U64(buf) => widen(&buf),
        DecodingResult::I8(buf) => widen(&buf),
        DecodingResult::I16(buf) => widen(&buf),
        DecodingResult::I32(buf) => widen(&buf),
        DecodingResult::I64(buf) => widen(&buf),
        DecodingResult::F32(buf) => widen(&buf),
        DecodingResult::F64(buf) => widen(&buf),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(Error::UnsupportedDataType(
                "unsupported TIFF sample format".to_string(),
            ))
        }
    };

    let pixels = rows * cols;
    if pixels == 0 || samples.len() % pixels != 0 {
        return Err(Error::shape(
            format!("{} samples per band", pixels),
            &[samples.len()],
        ));
    }

    // Chunky layout: keep the first sample of every pixel
    let bands = samples.len() / pixels;
    let first_band: Vec<f64> = if bands == 1 {
        samples
    } else {
        samples.into_iter().step_by(bands).collect()
    };

    Ok(Array2::from_shape_vec((rows, cols), first_band)?)
}

fn widen<T: RasterElement>(buf: &[T]) -> Vec<f64> {
    buf.iter().map(|&v| v.to_sample()).collect()
}

/// Write one anomaly-mask frame as a single-band `u8` TIFF (1 = anomaly).
pub fn write_mask_frame<P: AsRef<Path>>(mask: ArrayView2<'_, bool>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    encode_mask(mask, BufWriter::new(file))
}

/// Encode an anomaly-mask frame into an in-memory TIFF buffer
pub fn write_mask_frame_to_buffer(mask: ArrayView2<'_, bool>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_mask(mask, Cursor::new(&mut buf))?;
    Ok(buf)
}

fn encode_mask<W>(mask: ArrayView2<'_, bool>, writer: W) -> Result<()>
where
    W: std::io::Write + std::io::Seek,
{
    let (rows, cols) = mask.dim();
    if rows == 0 || cols == 0 {
        return Err(Error::shape("non-empty frame", &[rows, cols]));
    }

    let data: Vec<u8> = mask.iter().map(|&flag| u8::from(flag)).collect();
    let mut encoder = TiffEncoder::new(writer)?;
    encoder.write_image::<Gray8>(cols as u32, rows as u32, &data)?;
    Ok(())
}
