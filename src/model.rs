use crate::{
    foundation::{
        core::{Resolution, frame_count},
        error::{CountdownError, CountdownResult},
    },
    format::OutputFormat,
};

/// A validated request for one countdown video.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationRequest {
    pub duration_secs: f64,
    pub resolution: Resolution,
    pub format: OutputFormat,
}

impl GenerationRequest {
    /// Validate raw parameters. The format is checked first so an unsupported container is
    /// reported even when other fields are also off.
    pub fn new(duration_secs: f64, width: u32, height: u32, format: &str) -> CountdownResult<Self> {
        let format: OutputFormat = format.parse()?;
        Self::with_format(duration_secs, width, height, format)
    }

    pub fn with_format(
        duration_secs: f64,
        width: u32,
        height: u32,
        format: OutputFormat,
    ) -> CountdownResult<Self> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(CountdownError::validation(format!(
                "duration must be a positive number of seconds, got {duration_secs}"
            )));
        }
        let resolution = Resolution::new(width, height)?;
        Ok(Self {
            duration_secs,
            resolution,
            format,
        })
    }

    pub fn frame_count(&self) -> u64 {
        frame_count(self.duration_secs)
    }

    /// `time_<whole seconds>`, shared by the CLI output file and the HTTP attachment name.
    pub fn output_name_base(&self) -> String {
        output_name_base(self.duration_secs)
    }

    pub fn file_name(&self, name_base: &str) -> String {
        format!("{name_base}.{}", self.format.extension())
    }
}

pub fn output_name_base(duration_secs: f64) -> String {
    format!("time_{}", duration_secs.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_parameters() {
        let req = GenerationRequest::new(2.0, 320, 240, "mp4").unwrap();
        assert_eq!(req.format, OutputFormat::Mp4);
        assert_eq!(req.frame_count(), 48);
        assert_eq!(req.output_name_base(), "time_2");
        assert_eq!(req.file_name("time_2"), "time_2.mp4");
    }

    #[test]
    fn name_base_truncates_duration() {
        assert_eq!(output_name_base(90.9), "time_90");
        assert_eq!(output_name_base(0.4), "time_0");
        assert_eq!(output_name_base(3661.0), "time_3661");
    }

    #[test]
    fn rejects_unsupported_format_before_other_checks() {
        let err = GenerationRequest::new(-1.0, 0, 0, "flv").unwrap_err();
        assert!(matches!(err, CountdownError::UnsupportedFormat { .. }));
    }

    #[test]
    fn rejects_non_positive_duration_and_resolution() {
        assert!(matches!(
            GenerationRequest::new(0.0, 320, 240, "mp4"),
            Err(CountdownError::Validation(_))
        ));
        assert!(matches!(
            GenerationRequest::new(f64::INFINITY, 320, 240, "mp4"),
            Err(CountdownError::Validation(_))
        ));
        assert!(matches!(
            GenerationRequest::new(1.0, 0, 240, "avi"),
            Err(CountdownError::Validation(_))
        ));
    }
}
