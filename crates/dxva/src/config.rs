use std::fmt::Display;

/// Bitstream buffers handed to the driver are padded to this many bytes.
pub const DEFAULT_BITSTREAM_ALIGNMENT: usize = 128;

/// Options for [`DxvaH264Decoder`](crate::DxvaH264Decoder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DxvaConfig {
    /// The submitted bitstream is zero padded to a multiple of this size.
    /// The last slice is grown to cover the padding.
    pub bitstream_alignment: usize,

    /// Prefix every slice with `00 00 01`.
    pub start_code_prefix: bool,

    /// Number pictures through `StatusReportFeedbackNumber` instead of
    /// always sending 1.
    pub status_report_feedback: bool,
}

impl Default for DxvaConfig {
    fn default() -> Self {
        Self {
            bitstream_alignment: DEFAULT_BITSTREAM_ALIGNMENT,
            start_code_prefix: true,
            status_report_feedback: false,
        }
    }
}

impl Display for DxvaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DxvaConfig {{ bitstream_alignment: {} bytes, start_code_prefix: {}, status_report_feedback: {} }}",
            self.bitstream_alignment, self.start_code_prefix, self.status_report_feedback
        )
    }
}

impl DxvaConfig {
    /// Starts from the defaults.
    pub fn builder() -> DxvaConfigBuilder {
        DxvaConfigBuilder::default()
    }
}

/// Builder for [`DxvaConfig`].
#[derive(Debug, Clone, Default)]
pub struct DxvaConfigBuilder {
    config: DxvaConfig,
}

impl DxvaConfigBuilder {
    /// Sets [`DxvaConfig::bitstream_alignment`]. Zero disables padding.
    pub fn bitstream_alignment(mut self, alignment: usize) -> Self {
        self.config.bitstream_alignment = alignment;
        self
    }

    /// Sets [`DxvaConfig::start_code_prefix`].
    pub fn start_code_prefix(mut self, enabled: bool) -> Self {
        self.config.start_code_prefix = enabled;
        self
    }

    /// Sets [`DxvaConfig::status_report_feedback`].
    pub fn status_report_feedback(mut self, enabled: bool) -> Self {
        self.config.status_report_feedback = enabled;
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> DxvaConfig {
        self.config
    }
}
