//! Pupil-centre estimation inside an eye region.
//!
//! A locator returns the pupil centre in eye-local pixels: the offset from
//! the top-left corner of the eye contour's bounding box. Smoothing and gaze
//! variance operate in that space, so head movement across the frame does not
//! register as gaze movement.

use image::{imageops, GrayImage, Luma};
use imageproc::contrast::{adaptive_threshold, equalize_histogram};
use imageproc::filter::gaussian_blur_f32;
use imageproc::region_labelling::{connected_components, Connectivity};

use poise_model::landmarks::{Eye, LandmarkFrame};
use poise_model::point::{Bounds, Point2D};

use crate::source::VideoFrame;

/// Finds a pupil centre for one eye on one frame.
pub trait PupilLocator<F>: Send {
    /// Eye-local pupil centre, or `None` when no pupil can be found.
    ///
    /// `landmarks` holds the detections for `frame` (normalized coordinates).
    fn locate(&mut self, frame: &F, landmarks: &LandmarkFrame, eye: Eye) -> Option<Point2D>;
}

/// Uses the iris centre the face detector already refined.
#[derive(Debug, Clone, Copy, Default)]
pub struct IrisPupilLocator;

impl<F> PupilLocator<F> for IrisPupilLocator {
    fn locate(&mut self, _frame: &F, landmarks: &LandmarkFrame, eye: Eye) -> Option<Point2D> {
        let face = landmarks.face_pixels()?;
        let bounds = Bounds::of(face.eye(eye))?;
        let iris = face.iris(eye)?;
        Some(bounds.to_local(iris))
    }
}

/// Pixel-based locator for detectors without iris refinement.
///
/// Crops the eye box from the luma plane, equalizes and blurs it, marks
/// pixels darker than the mean of their surrounding block, and returns the
/// centre of the bounding box of the largest dark connected region.
#[derive(Debug, Clone, Copy)]
pub struct DarkRegionPupilLocator {
    /// Half-width of the square block each pixel is compared against.
    pub block_radius: u32,

    /// Gaussian blur sigma; 0 disables blurring.
    pub blur_sigma: f32,

    /// Smallest dark region accepted as a pupil.
    pub min_dark_pixels: usize,
}

impl Default for DarkRegionPupilLocator {
    fn default() -> Self {
        Self {
            block_radius: 5,
            blur_sigma: 1.0,
            min_dark_pixels: 4,
        }
    }
}

impl DarkRegionPupilLocator {
    /// Locate the pupil in an already-cropped eye image. Coordinates are
    /// relative to the image's top-left corner.
    pub fn locate_in(&self, eye_image: &GrayImage) -> Option<Point2D> {
        let (width, height) = eye_image.dimensions();
        if width < 2 || height < 2 {
            return None;
        }

        let equalized = equalize_histogram(eye_image);
        let smoothed = if self.blur_sigma > 0.0 {
            gaussian_blur_f32(&equalized, self.blur_sigma)
        } else {
            equalized
        };

        // Bright marks pixels at or above their local mean; flip it so the
        // dark regions become foreground.
        let mut mask = adaptive_threshold(&smoothed, self.block_radius.max(1));
        imageops::invert(&mut mask);

        let labels = connected_components(&mask, Connectivity::Eight, Luma([0u8]));
        let largest = largest_region(&labels)?;
        if largest.pixels < self.min_dark_pixels {
            return None;
        }
        Some(Point2D::new(
            (largest.min_x + largest.max_x) as f64 / 2.0,
            (largest.min_y + largest.max_y) as f64 / 2.0,
        ))
    }
}

impl PupilLocator<VideoFrame> for DarkRegionPupilLocator {
    fn locate(
        &mut self,
        frame: &VideoFrame,
        landmarks: &LandmarkFrame,
        eye: Eye,
    ) -> Option<Point2D> {
        let face = landmarks.face_pixels()?;
        let bounds = Bounds::of(face.eye(eye))?;

        let (frame_w, frame_h) = frame.luma.dimensions();
        let x0 = bounds.min.x.floor().max(0.0) as u32;
        let y0 = bounds.min.y.floor().max(0.0) as u32;
        let x1 = (bounds.max.x.ceil().max(0.0) as u32).min(frame_w);
        let y1 = (bounds.max.y.ceil().max(0.0) as u32).min(frame_h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        let eye_image = imageops::crop_imm(&frame.luma, x0, y0, x1 - x0, y1 - y0).to_image();
        let in_crop = self.locate_in(&eye_image)?;
        // The crop origin is snapped to whole pixels; re-express against the
        // exact contour box.
        let origin = Point2D::new(x0 as f64, y0 as f64);
        Some(bounds.to_local(in_crop + origin))
    }
}

#[derive(Debug, Clone, Copy)]
struct Region {
    pixels: usize,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

fn largest_region(labels: &image::ImageBuffer<Luma<u32>, Vec<u32>>) -> Option<Region> {
    let mut regions: Vec<Option<Region>> = vec![];
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0] as usize;
        if label == 0 {
            continue;
        }
        if regions.len() < label {
            regions.resize(label, None);
        }
        let slot = &mut regions[label - 1];
        match slot {
            Some(region) => {
                region.pixels += 1;
                region.min_x = region.min_x.min(x);
                region.min_y = region.min_y.min(y);
                region.max_x = region.max_x.max(x);
                region.max_y = region.max_y.max(y);
            }
            None => {
                *slot = Some(Region {
                    pixels: 1,
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                });
            }
        }
    }
    // Ties keep the lowest label so the result is deterministic.
    regions
        .into_iter()
        .flatten()
        .fold(None, |best: Option<Region>, region| match best {
            Some(b) if b.pixels >= region.pixels => Some(b),
            _ => Some(region),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_circle_mut;
    use poise_model::landmarks::FaceLandmarks;

    fn eye_image(width: u32, height: u32, pupil: (i32, i32), radius: i32) -> GrayImage {
        let mut img = GrayImage::from_pixel(width, height, Luma([220u8]));
        draw_filled_circle_mut(&mut img, pupil, radius, Luma([20u8]));
        img
    }

    fn contour(x0: f64, y0: f64, w: f64, h: f64) -> Vec<Point2D> {
        vec![
            Point2D::new(x0, y0 + h / 2.0),
            Point2D::new(x0 + w / 3.0, y0),
            Point2D::new(x0 + 2.0 * w / 3.0, y0),
            Point2D::new(x0 + w, y0 + h / 2.0),
            Point2D::new(x0 + 2.0 * w / 3.0, y0 + h),
            Point2D::new(x0 + w / 3.0, y0 + h),
        ]
    }

    #[test]
    fn test_dark_region_finds_drawn_pupil() {
        let locator = DarkRegionPupilLocator::default();
        let img = eye_image(40, 20, (25, 10), 4);
        let pupil = locator.locate_in(&img).unwrap();
        assert!((pupil.x - 25.0).abs() <= 1.5, "x = {}", pupil.x);
        assert!((pupil.y - 10.0).abs() <= 1.5, "y = {}", pupil.y);
    }

    #[test]
    fn test_uniform_image_has_no_pupil() {
        let locator = DarkRegionPupilLocator::default();
        let img = GrayImage::from_pixel(30, 15, Luma([128u8]));
        assert!(locator.locate_in(&img).is_none());
    }

    #[test]
    fn test_low_contrast_pupil_is_found() {
        let locator = DarkRegionPupilLocator::default();
        for (background, pupil) in [(70u8, 40u8), (240, 205)] {
            let mut img = GrayImage::from_pixel(40, 20, Luma([background]));
            draw_filled_circle_mut(&mut img, (14, 9), 4, Luma([pupil]));
            let found = locator.locate_in(&img).unwrap();
            assert!((found.x - 14.0).abs() <= 1.5, "x = {}", found.x);
            assert!((found.y - 9.0).abs() <= 1.5, "y = {}", found.y);
        }
    }

    #[test]
    fn test_block_radius_zero_is_clamped() {
        let locator = DarkRegionPupilLocator {
            block_radius: 0,
            ..Default::default()
        };
        let img = eye_image(40, 20, (25, 10), 4);
        assert!(locator.locate_in(&img).is_some());
    }

    #[test]
    fn test_largest_dark_region_wins() {
        let locator = DarkRegionPupilLocator {
            blur_sigma: 0.0,
            ..Default::default()
        };
        let mut img = eye_image(60, 20, (40, 10), 6);
        img.put_pixel(5, 5, Luma([20u8]));
        img.put_pixel(6, 5, Luma([20u8]));
        let pupil = locator.locate_in(&img).unwrap();
        assert!((pupil.x - 40.0).abs() <= 1.0);
    }

    #[test]
    fn test_locate_on_video_frame_is_eye_local() {
        let mut luma = GrayImage::from_pixel(200, 100, Luma([220u8]));
        draw_filled_circle_mut(&mut luma, (70, 40), 4, Luma([20u8]));
        let frame = VideoFrame::new(luma);

        // Eye box spans pixels (50, 30)..(90, 50).
        let face = FaceLandmarks {
            left_eye: contour(50.0 / 200.0, 30.0 / 100.0, 40.0 / 200.0, 20.0 / 100.0),
            right_eye: contour(0.6, 0.3, 0.2, 0.2),
            ..Default::default()
        };
        let landmarks = LandmarkFrame::empty(0.0, 200, 100).with_face(face);

        let mut locator = DarkRegionPupilLocator::default();
        let pupil = locator.locate(&frame, &landmarks, Eye::Left).unwrap();
        assert!((pupil.x - 20.0).abs() <= 1.5, "x = {}", pupil.x);
        assert!((pupil.y - 10.0).abs() <= 1.5, "y = {}", pupil.y);
    }

    #[test]
    fn test_iris_locator_offsets_from_eye_box() {
        let face = FaceLandmarks {
            left_eye: contour(0.2, 0.4, 0.1, 0.05),
            right_eye: contour(0.6, 0.4, 0.1, 0.05),
            left_iris: Some(Point2D::new(0.25, 0.42)),
            ..Default::default()
        };
        let landmarks = LandmarkFrame::empty(0.0, 1000, 1000).with_face(face);

        let mut locator = IrisPupilLocator;
        let pupil =
            PupilLocator::<LandmarkFrame>::locate(&mut locator, &landmarks, &landmarks, Eye::Left)
                .unwrap();
        assert!((pupil.x - 50.0).abs() < 1e-6);
        assert!((pupil.y - 20.0).abs() < 1e-6);

        assert!(
            PupilLocator::<LandmarkFrame>::locate(&mut locator, &landmarks, &landmarks, Eye::Right)
                .is_none()
        );
    }

    #[test]
    fn test_no_face_no_pupil() {
        let frame = VideoFrame::new(GrayImage::new(10, 10));
        let landmarks = LandmarkFrame::empty(0.0, 10, 10);
        let mut locator = DarkRegionPupilLocator::default();
        assert!(locator.locate(&frame, &landmarks, Eye::Left).is_none());
    }
}
