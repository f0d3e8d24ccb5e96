//! Simulated license plate recognition collaborator
//!
//! Stands in for LPR hardware. The core only consumes its result contract:
//! a validated plate string plus a confidence score, or a failure.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::events::EventRecorder;
use crate::models::EventSeverity;

/// LPR failure
#[derive(Error, Debug)]
pub enum LprError {
    #[error("License plate recognition failed")]
    RecognitionFailed,
}

/// Plate recognition result
#[derive(Debug, Serialize)]
pub struct PlateReading {
    pub license_plate: String,
    pub confidence: f64,
}

/// Simulated LPR service
#[derive(Clone)]
pub struct LprService {
    processing_delay: Duration,
    failure_rate: f64,
    events: EventRecorder,
}

impl LprService {
    pub fn new(processing_delay: Duration, failure_rate: f64, events: EventRecorder) -> Self {
        Self {
            processing_delay,
            failure_rate,
            events,
        }
    }

    /// Identify a license plate from image data.
    ///
    /// The plate is derived deterministically from the image bytes so the
    /// same image always reads the same plate.
    pub async fn identify(&self, image_data: &str) -> Result<PlateReading, LprError> {
        tokio::time::sleep(self.processing_delay).await;

        let should_fail = {
            use rand::Rng;
            rand::thread_rng().gen::<f64>() < self.failure_rate
        };

        if should_fail {
            self.events
                .record(
                    "lpr_failure",
                    EventSeverity::Medium,
                    "LPR",
                    "Unable to read license plate",
                    serde_json::json!({}),
                )
                .await;
            return Err(LprError::RecognitionFailed);
        }

        let plate = plate_from_image(image_data);

        self.events
            .record(
                "lpr_success",
                EventSeverity::Low,
                "LPR",
                &format!("Plate identified: {}", plate),
                serde_json::json!({ "licensePlate": plate }),
            )
            .await;

        tracing::info!(license_plate = %plate, "License plate identified");

        Ok(PlateReading {
            license_plate: plate,
            confidence: 0.95,
        })
    }
}

/// Derive a simulated `ABC-1234` plate from image data
fn plate_from_image(image_data: &str) -> String {
    let mut hash: i32 = 0;
    for byte in image_data.bytes().take(100) {
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(byte as i32);
    }

    const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    const DIGITS: &[u8] = b"0123456789";

    let hash = hash.unsigned_abs();
    let letters: String = (0..3)
        .map(|i| LETTERS[((hash >> (4 * i)) % LETTERS.len() as u32) as usize] as char)
        .collect();
    let digits: String = (0..4)
        .map(|i| DIGITS[((hash >> (12 + 4 * i)) % DIGITS.len() as u32) as usize] as char)
        .collect();

    format!("{}-{}", letters, digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plate_is_deterministic() {
        let first = plate_from_image("some-image-bytes");
        let second = plate_from_image("some-image-bytes");
        assert_eq!(first, second);
    }

    #[test]
    fn test_plate_format() {
        let plate = plate_from_image("another-image");
        let parts: Vec<&str> = plate.split('-').collect();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), 3);
        assert!(parts[0].chars().all(|c| c.is_ascii_uppercase()));
        assert_eq!(parts[1].len(), 4);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_different_images_usually_differ() {
        let a = plate_from_image("image-a");
        let b = plate_from_image("image-b-with-other-content");
        assert_ne!(a, b);
    }
}
