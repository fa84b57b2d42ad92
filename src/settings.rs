//! Per-submission processing settings.
//!
//! [`ProcessingSettings`] is an immutable value built once per submission and
//! read only to produce the request query string — there is no process-wide
//! default to mutate mid-task. Built via [`ProcessingSettings::builder()`] or
//! [`ProcessingSettings::default()`].

use crate::error::OcrError;

/// The number of export formats (and therefore result files) one task may
/// request. The service produces one output location per format.
pub const MAX_EXPORT_FORMATS: usize = 3;

/// Settings for one processing submission.
///
/// # Example
/// ```rust
/// use ocrcloud::ProcessingSettings;
///
/// let settings = ProcessingSettings::builder()
///     .language("English")
///     .language("French")
///     .export_format("txt")
///     .export_format("pdfSearchable")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingSettings {
    languages: Vec<String>,
    export_formats: Vec<String>,
    custom_options: String,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            languages: vec!["English".to_string()],
            export_formats: vec!["txt".to_string()],
            custom_options: String::new(),
        }
    }
}

impl ProcessingSettings {
    pub fn builder() -> ProcessingSettingsBuilder {
        ProcessingSettingsBuilder {
            languages: Vec::new(),
            export_formats: Vec::new(),
            custom_options: String::new(),
        }
    }

    /// Recognition languages, comma-joined on the wire.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Requested output formats, in order. One result URL and one target
    /// file extension correspond to each entry.
    pub fn export_formats(&self) -> &[String] {
        &self.export_formats
    }

    /// Raw passthrough query fragment (`key=value&key=value`), untouched by
    /// the library apart from splitting into pairs.
    pub fn custom_options(&self) -> &str {
        &self.custom_options
    }

    /// Encode the settings as request query parameters.
    pub(crate) fn query_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("language".to_string(), self.languages.join(",")),
            ("exportFormat".to_string(), self.export_formats.join(",")),
        ];
        for pair in self.custom_options.split('&').filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some((k, v)) => params.push((k.to_string(), v.to_string())),
                None => params.push((pair.to_string(), String::new())),
            }
        }
        params
    }
}

/// Builder for [`ProcessingSettings`].
#[derive(Debug)]
pub struct ProcessingSettingsBuilder {
    languages: Vec<String>,
    export_formats: Vec<String>,
    custom_options: String,
}

impl ProcessingSettingsBuilder {
    /// Add one recognition language. Defaults to `English` when none is set.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.languages.push(language.into());
        self
    }

    /// Add one export format. Defaults to `txt` when none is set.
    pub fn export_format(mut self, format: impl Into<String>) -> Self {
        self.export_formats.push(format.into());
        self
    }

    /// Raw query fragment forwarded to the service verbatim, for options the
    /// library has no setter for (e.g. `profile=documentConversion`).
    pub fn custom_options(mut self, options: impl Into<String>) -> Self {
        self.custom_options = options.into();
        self
    }

    /// Build the settings, validating constraints.
    pub fn build(self) -> Result<ProcessingSettings, OcrError> {
        let languages = if self.languages.is_empty() {
            vec!["English".to_string()]
        } else {
            self.languages
        };
        let export_formats = if self.export_formats.is_empty() {
            vec!["txt".to_string()]
        } else {
            self.export_formats
        };

        if export_formats.len() > MAX_EXPORT_FORMATS {
            return Err(OcrError::Configuration {
                reason: format!(
                    "at most {MAX_EXPORT_FORMATS} export formats per task, got {}",
                    export_formats.len()
                ),
            });
        }
        if export_formats.iter().any(|f| f.trim().is_empty()) {
            return Err(OcrError::Configuration {
                reason: "export format must not be empty".into(),
            });
        }

        Ok(ProcessingSettings {
            languages,
            export_formats,
            custom_options: self.custom_options,
        })
    }
}
