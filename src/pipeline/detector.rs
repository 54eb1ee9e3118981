use std::path::{Path, PathBuf};

use opencv::{
    core::{Mat, Rect, Size, Vector},
    objdetect::CascadeClassifier,
    prelude::*,
};
use thiserror::Error;

use crate::types::{FaceRect, GrayFrame};

/// Detector policy. These are fixed for the lifetime of the app.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectParams {
    pub scale_factor: f64,
    pub min_neighbors: i32,
    pub min_size: (i32, i32),
}

pub const FACE_DETECT_PARAMS: DetectParams = DetectParams {
    scale_factor: 1.2,
    min_neighbors: 5,
    min_size: (50, 50),
};

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("cascade file {} could not be loaded", .0.display())]
    EmptyCascade(PathBuf),
    #[error("gray frame is {width}x{height} but holds {len} bytes")]
    BadFrame { width: u32, height: u32, len: usize },
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

pub trait FaceLocator: Send + 'static {
    fn detect(
        &mut self,
        frame: &GrayFrame,
        params: &DetectParams,
    ) -> Result<Vec<FaceRect>, DetectorError>;
}

/// Haar cascade face locator backed by OpenCV's `CascadeClassifier`.
pub struct HaarCascadeLocator {
    classifier: CascadeClassifier,
}

impl HaarCascadeLocator {
    pub fn load(cascade_path: &Path) -> Result<Self, DetectorError> {
        let classifier = CascadeClassifier::new(&cascade_path.to_string_lossy())?;
        if classifier.empty()? {
            return Err(DetectorError::EmptyCascade(cascade_path.to_path_buf()));
        }
        log::info!("loaded face cascade from {}", cascade_path.display());
        Ok(Self { classifier })
    }
}

impl FaceLocator for HaarCascadeLocator {
    fn detect(
        &mut self,
        frame: &GrayFrame,
        params: &DetectParams,
    ) -> Result<Vec<FaceRect>, DetectorError> {
        let expected = frame.width as usize * frame.height as usize;
        if expected == 0 || frame.luma.len() != expected {
            return Err(DetectorError::BadFrame {
                width: frame.width,
                height: frame.height,
                len: frame.luma.len(),
            });
        }

        let flat = Mat::from_slice(&frame.luma)?;
        let image = flat.reshape(1, frame.height as i32)?;

        let mut found = Vector::<Rect>::new();
        self.classifier.detect_multi_scale(
            &*image,
            &mut found,
            params.scale_factor,
            params.min_neighbors,
            0,
            Size::new(params.min_size.0, params.min_size.1),
            Size::default(),
        )?;

        Ok(found
            .iter()
            .map(|r| FaceRect::new(r.x, r.y, r.width, r.height))
            .collect())
    }
}
