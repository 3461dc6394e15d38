//! Local checks that run without any network access: the profile heuristic
//! scorer, upload validation for images, and classification of vision model
//! replies.

pub mod image;
pub mod profile;
pub mod risk;

pub use image::{image_content_type, validate_image, ImageRejection, MAX_IMAGE_BYTES};
pub use profile::{analyze_profile, ProfileSnapshot, ScanResult, Verdict};
pub use risk::{parse_assessment, AssessmentError, ImageAssessment};
