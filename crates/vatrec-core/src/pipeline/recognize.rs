//! Text recognition capability seam.

use std::time::Duration;

use tracing::warn;

use crate::error::RecognizeError;

/// "Text from image bytes" capability.
///
/// The extraction engine does not care whether recognition runs against
/// a cloud vision API or a local OCR engine; implementations are
/// interchangeable and selected at construction time.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, bytes: &[u8]) -> Result<String, RecognizeError>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for std::sync::Arc<T> {
    fn recognize(&self, bytes: &[u8]) -> Result<String, RecognizeError> {
        (**self).recognize(bytes)
    }
}

/// Recognizer for inputs that already are text: interprets the bytes as
/// UTF-8. Useful for pre-extracted documents and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextRecognizer;

impl TextRecognizer for PlainTextRecognizer {
    fn recognize(&self, bytes: &[u8]) -> Result<String, RecognizeError> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| RecognizeError::UnsupportedInput(e.to_string()))
    }
}

/// Call the provider with a bounded retry count and a fixed delay
/// between attempts. Only transient failures are retried; an input the
/// provider can never handle fails immediately.
pub fn recognize_with_retry<R: TextRecognizer + ?Sized>(
    recognizer: &R,
    bytes: &[u8],
    retries: u32,
    delay: Duration,
) -> Result<String, RecognizeError> {
    let attempts = retries.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match recognizer.recognize(bytes) {
            Ok(text) => return Ok(text),
            Err(err) if err.is_transient() && attempt < attempts => {
                warn!(attempt, attempts, error = %err, "recognition failed, retrying");
                std::thread::sleep(delay);
            }
            Err(err) => return Err(err),
        }
    }
}
