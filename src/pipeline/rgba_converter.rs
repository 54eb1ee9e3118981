use rayon::prelude::*;

use crate::types::{Frame, GrayFrame};

#[cfg(feature = "camera-nokhwa")]
pub use self::camera_buffer::convert_camera_frame;

// BT.601 luma weights in 16.16 fixed point.
const LUMA_R: u32 = 19_595;
const LUMA_G: u32 = 38_470;
const LUMA_B: u32 = 7_471;

/// Collapses an RGBA frame to the single intensity channel the detector reads.
pub fn rgba_to_gray(frame: &Frame) -> GrayFrame {
    let luma = frame
        .rgba
        .par_chunks_exact(4)
        .map(|px| {
            let weighted =
                LUMA_R * px[0] as u32 + LUMA_G * px[1] as u32 + LUMA_B * px[2] as u32 + (1 << 15);
            (weighted >> 16) as u8
        })
        .collect();

    GrayFrame {
        luma,
        width: frame.width,
        height: frame.height,
    }
}

#[cfg(feature = "camera-nokhwa")]
mod camera_buffer {
    use std::convert::TryFrom;

    use anyhow::{Result, anyhow, bail};
    use nokhwa::{Buffer, utils::FrameFormat};
    use rayon::prelude::*;
    use yuv::{
        YuvBiPlanarImage, YuvConversionMode, YuvPackedImage, YuvRange, YuvStandardMatrix,
        yuv_nv12_to_rgba, yuyv422_to_rgba,
    };
    use zune_jpeg::{
        JpegDecoder,
        zune_core::{bytestream::ZCursor, colorspace::ColorSpace, options::DecoderOptions},
    };

    use crate::types::Frame;

    /// Decodes whatever pixel format the driver handed us into an RGBA [`Frame`].
    pub fn convert_camera_frame(buffer: &Buffer) -> Result<Frame> {
        let resolution = buffer.resolution();
        let (width, height) = (resolution.width_x, resolution.height_y);
        let data = buffer.buffer();
        let pixels = width as usize * height as usize;

        let rgba = match buffer.source_frame_format() {
            FrameFormat::NV12 => {
                require_len("NV12", data, pixels + pixels / 2)?;
                from_nv12(data, width, height)?
            }
            FrameFormat::YUYV => {
                require_len("YUYV", data, pixels * 2)?;
                from_yuyv(data, width, height)?
            }
            FrameFormat::MJPEG => from_mjpeg(data)?,
            FrameFormat::RAWRGB => {
                require_len("RGB", data, pixels * 3)?;
                expand_rgb(data, pixels, [0, 1, 2])
            }
            FrameFormat::RAWBGR => {
                require_len("BGR", data, pixels * 3)?;
                expand_rgb(data, pixels, [2, 1, 0])
            }
            FrameFormat::GRAY => {
                require_len("GRAY", data, pixels)?;
                expand_gray(&data[..pixels])
            }
        };

        Ok(Frame::new(rgba, width, height))
    }

    fn require_len(format: &str, data: &[u8], expected: usize) -> Result<()> {
        if data.len() < expected {
            bail!(
                "{format} buffer too small: got {}, expected {expected}",
                data.len()
            );
        }
        Ok(())
    }

    fn from_nv12(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        let y_len = width as usize * height as usize;
        let image = YuvBiPlanarImage {
            y_plane: &data[..y_len],
            y_stride: width,
            uv_plane: &data[y_len..y_len + y_len / 2],
            uv_stride: width,
            width,
            height,
        };

        let mut rgba = vec![0u8; y_len * 4];
        yuv_nv12_to_rgba(
            &image,
            &mut rgba,
            width * 4,
            YuvRange::Full,
            YuvStandardMatrix::Bt709,
            YuvConversionMode::Balanced,
        )
        .map_err(|err| anyhow!("NV12 conversion failed: {err:?}"))?;
        Ok(rgba)
    }

    fn from_yuyv(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        let packed = YuvPackedImage {
            yuy: data,
            yuy_stride: width * 2,
            width,
            height,
        };

        let mut rgba = vec![0u8; width as usize * height as usize * 4];
        yuyv422_to_rgba(
            &packed,
            &mut rgba,
            width * 4,
            YuvRange::Full,
            YuvStandardMatrix::Bt709,
        )
        .map_err(|err| anyhow!("YUYV conversion failed: {err:?}"))?;
        Ok(rgba)
    }

    fn from_mjpeg(data: &[u8]) -> Result<Vec<u8>> {
        let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::RGBA);
        let mut decoder = JpegDecoder::new_with_options(ZCursor::new(data), options);
        let rgba = decoder
            .decode()
            .map_err(|err| anyhow!("MJPEG decode failed: {err:?}"))?;

        if let Some(info) = decoder.info() {
            let expected = usize::try_from(info.width)
                .and_then(|w| usize::try_from(info.height).map(|h| w * h * 4))
                .map_err(|_| anyhow!("MJPEG dimensions do not fit usize"))?;
            require_len("MJPEG", &rgba, expected)?;
        }
        Ok(rgba)
    }

    fn expand_rgb(data: &[u8], pixels: usize, order: [usize; 3]) -> Vec<u8> {
        let mut rgba = vec![0u8; pixels * 4];
        rgba.par_chunks_mut(4)
            .zip(data.par_chunks_exact(3))
            .for_each(|(dst, src)| {
                dst[0] = src[order[0]];
                dst[1] = src[order[1]];
                dst[2] = src[order[2]];
                dst[3] = 255;
            });
        rgba
    }

    fn expand_gray(data: &[u8]) -> Vec<u8> {
        let mut rgba = vec![0u8; data.len() * 4];
        rgba.par_chunks_mut(4)
            .zip(data.par_iter())
            .for_each(|(dst, &value)| {
                dst[..3].fill(value);
                dst[3] = 255;
            });
        rgba
    }
}
