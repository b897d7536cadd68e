//! Upload limits for base64 image payloads

use crate::config::UploadsConfig;
use crate::utils::errors::ValidationErrors;
use crate::utils::helpers::decoded_len;

/// Count and size caps for one kind of image field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePolicy {
    pub max_images: usize,
    pub max_bytes: usize,
}

impl ImagePolicy {
    pub fn event_images(config: &UploadsConfig) -> Self {
        Self {
            max_images: config.max_images,
            max_bytes: config.event_image_max_bytes,
        }
    }

    pub fn payment_proof(config: &UploadsConfig) -> Self {
        Self {
            max_images: 1,
            max_bytes: config.payment_proof_max_bytes,
        }
    }

    pub fn merchandise_images(config: &UploadsConfig) -> Self {
        Self {
            max_images: config.max_images,
            max_bytes: config.merchandise_image_max_bytes,
        }
    }

    /// Record a message under `field` for the first violation found
    pub fn check(&self, field: &str, images: &[String], errors: &mut ValidationErrors) {
        if images.len() > self.max_images {
            errors.add(field, format!("At most {} images are allowed", self.max_images));
            return;
        }

        for (index, payload) in images.iter().enumerate() {
            match decoded_len(payload) {
                None => {
                    errors.add(field, format!("Image {} is not a valid base64 payload", index + 1));
                    return;
                }
                Some(size) if size > self.max_bytes => {
                    errors.add(
                        field,
                        format!("Image {} exceeds {} KB", index + 1, self.max_bytes / 1024),
                    );
                    return;
                }
                Some(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    fn payload(bytes: usize) -> String {
        base64::engine::general_purpose::STANDARD.encode(vec![7u8; bytes])
    }

    #[test]
    fn test_count_and_size_caps() {
        let policy = ImagePolicy { max_images: 2, max_bytes: 100 };

        let mut errors = ValidationErrors::new();
        policy.check("images", &[payload(100), format!("data:image/png;base64,{}", payload(10))], &mut errors);
        assert!(errors.is_empty());

        policy.check("images", &[payload(101)], &mut errors);
        assert!(errors.get("images").is_some());

        let mut errors = ValidationErrors::new();
        policy.check("images", &[payload(1), payload(1), payload(1)], &mut errors);
        assert_eq!(errors.get("images"), Some("At most 2 images are allowed"));
    }

    #[test]
    fn test_rejects_garbage() {
        let mut errors = ValidationErrors::new();
        ImagePolicy { max_images: 4, max_bytes: 100 }.check("images", &["not base64!".to_string()], &mut errors);
        assert_eq!(errors.len(), 1);
    }
}
