use akaze::Akaze;
use bitarray::BitArray;
use glam::Vec2;
use image::DynamicImage;

/// AKAZE binary descriptor, 486 bits packed into 64 bytes.
pub type Descriptor = BitArray<64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// Pixel location, (0, 0) is the top left corner.
    pub point: Vec2,
    pub size: f32,
    pub angle: f32,
    pub response: f32,
    pub octave: usize,
}

impl From<akaze::KeyPoint> for Keypoint {
    fn from(kp: akaze::KeyPoint) -> Self {
        Keypoint {
            point: Vec2::new(kp.point.0, kp.point.1),
            size: kp.size,
            angle: kp.angle,
            response: kp.response,
            octave: kp.octave,
        }
    }
}

/// Keypoints of one image with their descriptors, aligned by index.
#[derive(Debug, Clone, Default)]
pub struct Features {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl Features {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

pub trait FeatureExtractor {
    /// Detects keypoints and computes descriptors.
    ///
    /// Empty or textureless images give empty `Features`.
    fn extract(&self, image: &DynamicImage) -> Features;
}

#[derive(Debug, Clone, Copy)]
pub struct AkazeExtractor {
    akaze: Akaze,
}

impl AkazeExtractor {
    pub fn new(threshold: f64) -> AkazeExtractor {
        AkazeExtractor {
            akaze: Akaze::new(threshold),
        }
    }
}

impl Default for AkazeExtractor {
    fn default() -> Self {
        AkazeExtractor {
            akaze: Akaze::default(),
        }
    }
}

/// Copies the pixels into the `image` release the `akaze` crate is built against.
fn to_akaze_image(image: &DynamicImage) -> Option<akaze_image::DynamicImage> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    akaze_image::RgbImage::from_raw(width, height, rgb.into_raw())
        .map(akaze_image::DynamicImage::ImageRgb8)
}

impl FeatureExtractor for AkazeExtractor {
    fn extract(&self, image: &DynamicImage) -> Features {
        if image.width() == 0 || image.height() == 0 {
            return Features::default();
        }
        let Some(input) = to_akaze_image(image) else {
            return Features::default();
        };
        let (keypoints, descriptors) = self.akaze.extract(&input);
        log::trace!("akaze found {} keypoints", keypoints.len());
        Features {
            keypoints: keypoints.into_iter().map(Keypoint::from).collect(),
            descriptors: descriptors
                .iter()
                .map(|d| Descriptor::new(*d.bytes()))
                .collect(),
        }
    }
}
