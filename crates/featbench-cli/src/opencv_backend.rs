//! OpenCV implementation of every detector, descriptor and matcher name.

use std::path::Path;

use featbench_core::features::detect::suppress_overlaps;
use featbench_core::{
    Combination, DMatch, Descriptor, DescriptorKind, Detector, FeatureBackend, FeatureError,
    KeyPoint, MatcherKind, Unsupported,
};
use log::trace;
use opencv::core::{
    self as cv, CV_32F, CV_32FC1, Mat, NORM_HAMMING, NORM_L2, NORM_MINMAX, Point2f, Ptr, Vector,
    no_array,
};
use opencv::features2d::{
    AKAZE, BFMatcher, BRISK, DescriptorMatcher, FastFeatureDetector, Feature2D,
    FastFeatureDetector_DetectorType, FlannBasedMatcher, ORB, ORB_ScoreType, SIFT,
};
use opencv::prelude::*;
use opencv::xfeatures2d::{BriefDescriptorExtractor, FREAK};
use opencv::{imgcodecs, imgproc};

const BACKEND_NAME: &str = "opencv";

type CvResult<T> = std::result::Result<T, opencv::Error>;

/// Thin adapter over the OpenCV `features2d` and `xfeatures2d` modules.
#[derive(Debug, Default)]
pub struct OpenCvBackend;

impl OpenCvBackend {
    pub fn new() -> Self {
        Self
    }

    fn detect_cv(&self, image: &Mat, detector: Detector) -> CvResult<Vec<KeyPoint>> {
        match detector {
            Detector::ShiTomasi => shi_tomasi(image),
            Detector::Harris => harris(image),
            _ => {
                let mut feature: Ptr<Feature2D> = match detector {
                    Detector::Fast => FastFeatureDetector::create(
                        30,
                        true,
                        FastFeatureDetector_DetectorType::TYPE_9_16,
                    )?
                    .into(),
                    Detector::Brisk => BRISK::create(30, 3, 1.0)?.into(),
                    Detector::Orb => orb()?.into(),
                    Detector::Akaze => AKAZE::create_def()?.into(),
                    Detector::Sift => SIFT::create(0, 3, 0.04, 10.0, 1.6, false)?.into(),
                    Detector::ShiTomasi | Detector::Harris => {
                        return Err(opencv::Error::new(
                            cv::StsBadArg,
                            format!("{detector} has no Feature2D detector"),
                        ));
                    }
                };
                let mut keypoints = Vector::<cv::KeyPoint>::new();
                feature.detect(image, &mut keypoints, &no_array())?;
                Ok(keypoints.iter().map(|kp| from_cv(&kp)).collect())
            }
        }
    }

    fn describe_cv(
        &self,
        image: &Mat,
        keypoints: &mut Vec<KeyPoint>,
        descriptor: Descriptor,
    ) -> CvResult<Mat> {
        let mut extractor: Ptr<Feature2D> = match descriptor {
            Descriptor::Brisk => BRISK::create(30, 3, 1.0)?.into(),
            Descriptor::Brief => BriefDescriptorExtractor::create(32, false)?.into(),
            Descriptor::Orb => orb()?.into(),
            Descriptor::Freak => FREAK::create_def()?.into(),
            Descriptor::Akaze => AKAZE::create_def()?.into(),
            Descriptor::Sift => SIFT::create(0, 3, 0.04, 10.0, 1.6, false)?.into(),
        };

        let mut cv_keypoints = keypoints
            .iter()
            .map(to_cv)
            .collect::<CvResult<Vector<cv::KeyPoint>>>()?;
        let mut descriptors = Mat::default();
        extractor.compute(image, &mut cv_keypoints, &mut descriptors)?;
        *keypoints = cv_keypoints.iter().map(|kp| from_cv(&kp)).collect();
        Ok(descriptors)
    }

    fn matcher(matcher: MatcherKind, kind: DescriptorKind) -> CvResult<Ptr<DescriptorMatcher>> {
        Ok(match matcher {
            MatcherKind::BruteForce => {
                let norm = match kind {
                    DescriptorKind::Binary => NORM_HAMMING,
                    DescriptorKind::Hog => NORM_L2,
                };
                BFMatcher::create(norm, false)?.into()
            }
            MatcherKind::Flann => FlannBasedMatcher::create()?.into(),
        })
    }

    /// FLANN works on float rows only.
    fn prepare(matcher: MatcherKind, descriptors: &Mat) -> CvResult<Mat> {
        if matcher == MatcherKind::Flann && descriptors.typ() != CV_32F {
            let mut converted = Mat::default();
            descriptors.convert_to(&mut converted, CV_32F, 1.0, 0.0)?;
            Ok(converted)
        } else {
            Ok(descriptors.clone())
        }
    }

    fn match_nearest_cv(
        &self,
        source: &Mat,
        reference: &Mat,
        matcher: MatcherKind,
        kind: DescriptorKind,
    ) -> CvResult<Vec<DMatch>> {
        if source.empty() || reference.empty() {
            return Ok(Vec::new());
        }
        let (source, reference) = (Self::prepare(matcher, source)?, Self::prepare(matcher, reference)?);
        let mut matches = Vector::<cv::DMatch>::new();
        Self::matcher(matcher, kind)?.train_match(&source, &reference, &mut matches, &no_array())?;
        Ok(matches.iter().map(|m| from_cv_match(&m)).collect())
    }

    fn match_knn_cv(
        &self,
        source: &Mat,
        reference: &Mat,
        matcher: MatcherKind,
        kind: DescriptorKind,
        k: usize,
    ) -> CvResult<Vec<Vec<DMatch>>> {
        if source.empty() || reference.empty() {
            return Ok(Vec::new());
        }
        let (source, reference) = (Self::prepare(matcher, source)?, Self::prepare(matcher, reference)?);
        let mut matches = Vector::<Vector<cv::DMatch>>::new();
        Self::matcher(matcher, kind)?.knn_train_match(
            &source,
            &reference,
            &mut matches,
            k as i32,
            &no_array(),
            false,
        )?;
        Ok(matches
            .iter()
            .map(|list| list.iter().map(|m| from_cv_match(&m)).collect())
            .collect())
    }
}

impl FeatureBackend for OpenCvBackend {
    type Image = Mat;
    type Descriptors = Mat;

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn supports(&self, _combination: &Combination) -> std::result::Result<(), Unsupported> {
        Ok(())
    }

    fn load_gray(&mut self, path: &Path) -> featbench_core::Result<Mat> {
        let image = imgcodecs::imread(&path.to_string_lossy(), imgcodecs::IMREAD_GRAYSCALE)
            .map_err(|e| unreadable(path, e.to_string()))?;
        if image.empty() {
            // imread signals unreadable files with an empty matrix
            return Err(unreadable(path, "OpenCV could not decode the file".to_string()));
        }
        trace!("Loaded {} ({}x{})", path.display(), image.cols(), image.rows());
        Ok(image)
    }

    fn detect(&mut self, image: &Mat, detector: Detector) -> featbench_core::Result<Vec<KeyPoint>> {
        self.detect_cv(image, detector)
            .map_err(|e| FeatureError::Detection(e.to_string()))
    }

    fn describe(
        &mut self,
        image: &Mat,
        keypoints: &mut Vec<KeyPoint>,
        descriptor: Descriptor,
    ) -> featbench_core::Result<Mat> {
        self.describe_cv(image, keypoints, descriptor)
            .map_err(|e| FeatureError::Descriptor(e.to_string()))
    }

    fn match_nearest(
        &mut self,
        source: &Mat,
        reference: &Mat,
        matcher: MatcherKind,
        kind: DescriptorKind,
    ) -> featbench_core::Result<Vec<DMatch>> {
        self.match_nearest_cv(source, reference, matcher, kind)
            .map_err(|e| FeatureError::Matching(e.to_string()))
    }

    fn match_knn(
        &mut self,
        source: &Mat,
        reference: &Mat,
        matcher: MatcherKind,
        kind: DescriptorKind,
        k: usize,
    ) -> featbench_core::Result<Vec<Vec<DMatch>>> {
        self.match_knn_cv(source, reference, matcher, kind, k)
            .map_err(|e| FeatureError::Matching(e.to_string()))
    }
}

fn unreadable(path: &Path, reason: String) -> FeatureError {
    FeatureError::Image {
        path: path.display().to_string(),
        source: image::ImageError::IoError(std::io::Error::other(reason)),
    }
}

fn orb() -> CvResult<Ptr<ORB>> {
    ORB::create(500, 1.2, 8, 31, 0, 2, ORB_ScoreType::HARRIS_SCORE, 31, 20)
}

fn shi_tomasi(image: &Mat) -> CvResult<Vec<KeyPoint>> {
    let block_size = 4;
    let min_distance = 4.0; // no overlap between blocks
    let max_corners = (image.rows() as f64 * image.cols() as f64 / min_distance) as i32;

    let mut corners = Vector::<Point2f>::new();
    imgproc::good_features_to_track(
        image,
        &mut corners,
        max_corners,
        0.01,
        min_distance,
        &no_array(),
        block_size,
        false,
        0.04,
    )?;
    Ok(corners
        .iter()
        .map(|p| KeyPoint::new(p.x, p.y, block_size as f32))
        .collect())
}

fn harris(image: &Mat) -> CvResult<Vec<KeyPoint>> {
    let block_size = 2;
    let aperture = 3;
    let min_response = 100;

    let mut response = Mat::default();
    imgproc::corner_harris(image, &mut response, block_size, aperture, 0.04, cv::BORDER_DEFAULT)?;
    let mut normalized = Mat::default();
    cv::normalize(&response, &mut normalized, 0.0, 255.0, NORM_MINMAX, CV_32FC1, &no_array())?;

    let size = 2.0 * aperture as f32;
    let mut candidates = Vec::new();
    for row in 0..normalized.rows() {
        for col in 0..normalized.cols() {
            // responses are compared and stored as whole numbers
            let value = (*normalized.at_2d::<f32>(row, col)?) as i32;
            if value > min_response {
                candidates.push(KeyPoint::new(col as f32, row as f32, size).with_response(value as f32));
            }
        }
    }
    Ok(suppress_overlaps(candidates))
}

fn to_cv(kp: &KeyPoint) -> CvResult<cv::KeyPoint> {
    cv::KeyPoint::new_coords(
        kp.x(),
        kp.y(),
        kp.size,
        kp.angle.unwrap_or(-1.0),
        kp.response,
        kp.octave,
        kp.class_id,
    )
}

fn from_cv(kp: &cv::KeyPoint) -> KeyPoint {
    let pt = kp.pt();
    let angle = kp.angle();
    KeyPoint {
        angle: (angle >= 0.0).then_some(angle),
        response: kp.response(),
        octave: kp.octave(),
        class_id: kp.class_id(),
        ..KeyPoint::new(pt.x, pt.y, kp.size())
    }
}

fn from_cv_match(m: &cv::DMatch) -> DMatch {
    DMatch::new(m.query_idx as usize, m.train_idx as usize, m.distance)
}
