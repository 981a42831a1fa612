//! V4L2 webcam capture (Linux).

use crate::{Frame, FrameSource, VisionError};
use image::{ImageFormat, RgbImage};
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

const MJPEG: &[u8; 4] = b"MJPG";
const YUYV: &[u8; 4] = b"YUYV";
const BUFFER_COUNT: u32 = 4;

#[derive(Debug, Clone, Copy)]
pub struct CameraSettings {
    pub index: usize,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
        }
    }
}

/// Pixel layout the device agreed to deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelFormat {
    Mjpeg,
    /// Packed 4:2:2, `Y0 U Y1 V` per pixel pair.
    Yuyv { width: u32, height: u32 },
}

/// Webcam streaming over memory-mapped buffers. MJPEG is preferred; devices
/// without it fall back to raw YUYV.
pub struct Camera {
    stream: Option<MmapStream<'static>>,
    _device: Device,
    pixel_format: PixelFormat,
    frames_read: u64,
}

impl Camera {
    pub fn open(settings: CameraSettings) -> crate::Result<Self> {
        let unavailable =
            |e: std::io::Error| VisionError::DeviceUnavailable(format!("/dev/video{}: {e}", settings.index));

        let device = Device::new(settings.index).map_err(unavailable)?;

        let mut requested = device.format().map_err(unavailable)?;
        requested.width = settings.width;
        requested.height = settings.height;

        let mut pixel_format = None;
        for fourcc in [MJPEG, YUYV] {
            requested.fourcc = FourCC::new(fourcc);
            let format = device.set_format(&requested).map_err(unavailable)?;
            if format.fourcc == FourCC::new(MJPEG) {
                pixel_format = Some((PixelFormat::Mjpeg, format));
                break;
            }
            if format.fourcc == FourCC::new(YUYV) {
                let yuyv = PixelFormat::Yuyv {
                    width: format.width,
                    height: format.height,
                };
                pixel_format = Some((yuyv, format));
                break;
            }
            tracing::debug!(requested = %requested.fourcc, got = %format.fourcc, "format rejected");
        }

        let Some((pixel_format, format)) = pixel_format else {
            return Err(VisionError::DeviceUnavailable(format!(
                "/dev/video{} supports neither MJPEG nor YUYV capture",
                settings.index
            )));
        };

        let stream =
            MmapStream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT).map_err(unavailable)?;

        tracing::info!(
            index = settings.index,
            width = format.width,
            height = format.height,
            fourcc = %format.fourcc,
            "Camera opened"
        );

        Ok(Self {
            stream: Some(stream),
            _device: device,
            pixel_format,
            frames_read: 0,
        })
    }
}

impl FrameSource for Camera {
    fn next_frame(&mut self) -> crate::Result<Option<Frame>> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| VisionError::FrameRead("camera released".to_string()))?;

        let (buf, meta) = stream
            .next()
            .map_err(|e| VisionError::FrameRead(e.to_string()))?;
        let used = (meta.bytesused as usize).min(buf.len());

        let image = match self.pixel_format {
            PixelFormat::Mjpeg => image::load_from_memory_with_format(&buf[..used], ImageFormat::Jpeg)
                .map_err(|e| VisionError::FrameRead(e.to_string()))?
                .to_rgb8(),
            PixelFormat::Yuyv { width, height } => {
                yuyv_to_rgb(&buf[..used], width, height).ok_or_else(|| {
                    VisionError::FrameRead(format!("short YUYV frame: {used} bytes"))
                })?
            }
        };

        let frame = Frame::new(image, self.frames_read);
        self.frames_read += 1;
        Ok(Some(frame))
    }

    fn release(&mut self) {
        if self.stream.take().is_some() {
            tracing::info!(frames = self.frames_read, "Camera released");
        }
    }
}

/// Convert a packed YUYV buffer to RGB (BT.601, full range). `None` if the
/// buffer holds fewer than `width * height` pixels.
fn yuyv_to_rgb(data: &[u8], width: u32, height: u32) -> Option<RgbImage> {
    let pixels = (width as usize) * (height as usize);
    let needed = pixels * 2;
    if width % 2 != 0 || data.len() < needed {
        return None;
    }

    let mut rgb = Vec::with_capacity(pixels * 3);
    for quad in data[..needed].chunks_exact(4) {
        let (y0, u, y1, v) = (quad[0], quad[1], quad[2], quad[3]);
        rgb.extend_from_slice(&ycbcr_to_rgb(y0, u, v));
        rgb.extend_from_slice(&ycbcr_to_rgb(y1, u, v));
    }
    RgbImage::from_raw(width, height, rgb)
}

fn ycbcr_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;
    let clamp = |c: f32| c.round().clamp(0.0, 255.0) as u8;
    [
        clamp(y + 1.402 * v),
        clamp(y - 0.344_136 * u - 0.714_136 * v),
        clamp(y + 1.772 * u),
    ]
}
