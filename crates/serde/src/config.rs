//! Codec options.

use serde::{Deserialize, Serialize};

/// Default maximum nesting depth of elements and resources.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default maximum input size: 32 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 32 * 1024 * 1024;

/// Bounds enforced by the decoders before and while building a tree.
///
/// ```
/// use arbor_serde::DecodeOptions;
///
/// let options = DecodeOptions::default().max_depth(16).max_input_bytes(1 << 20);
/// assert_eq!(options.max_depth, 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Deepest element nesting accepted; the root resource is depth 1.
    pub max_depth: usize,
    /// Largest input accepted, in bytes.
    pub max_input_bytes: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

impl DecodeOptions {
    /// Options with no depth or size limit.
    pub fn unbounded() -> Self {
        Self {
            max_depth: usize::MAX,
            max_input_bytes: usize::MAX,
        }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_input_bytes(mut self, max_input_bytes: usize) -> Self {
        self.max_input_bytes = max_input_bytes;
        self
    }

    pub(crate) fn check_size(&self, size: usize) -> crate::Result<()> {
        if size > self.max_input_bytes {
            tracing::warn!(size, limit = self.max_input_bytes, "rejecting oversized input");
            return Err(crate::SerdeError::InputTooLarge {
                size,
                limit: self.max_input_bytes,
            });
        }
        Ok(())
    }

    pub(crate) fn check_depth(&self, depth: usize) -> crate::Result<()> {
        if depth > self.max_depth {
            tracing::warn!(depth, limit = self.max_depth, "rejecting deeply nested input");
            return Err(crate::SerdeError::DepthLimitExceeded {
                limit: self.max_depth,
            });
        }
        Ok(())
    }
}

/// Output options shared by the encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// Indent output (two spaces in both formats).
    pub pretty: bool,
    /// Start XML output with `<?xml version="1.0" encoding="UTF-8"?>`.
    pub xml_declaration: bool,
}

impl EncodeOptions {
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Self::default()
        }
    }

    pub fn with_xml_declaration(mut self, xml_declaration: bool) -> Self {
        self.xml_declaration = xml_declaration;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = DecodeOptions::default();
        assert_eq!(options.max_depth, 64);
        assert_eq!(options.max_input_bytes, 32 * 1024 * 1024);
        assert!(!EncodeOptions::default().pretty);
    }

    #[test]
    fn test_limits() {
        let options = DecodeOptions::default().max_depth(2).max_input_bytes(10);
        assert!(options.check_depth(2).is_ok());
        assert!(matches!(
            options.check_depth(3),
            Err(crate::SerdeError::DepthLimitExceeded { limit: 2 })
        ));
        assert!(matches!(
            options.check_size(11),
            Err(crate::SerdeError::InputTooLarge { size: 11, limit: 10 })
        ));
        assert!(DecodeOptions::unbounded().check_size(usize::MAX).is_ok());
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: DecodeOptions = serde_json::from_str(r#"{"max_depth": 8}"#).unwrap();
        assert_eq!(options.max_depth, 8);
        assert_eq!(options.max_input_bytes, DEFAULT_MAX_INPUT_BYTES);
    }
}
