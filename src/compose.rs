//! Instruction composition for project tasks.
//!
//! Turns the fields collected by the CLI or the form into the single
//! instruction string sent to the listener. Composition is pure and never
//! fails; validation is a separate step run only before sending.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Where the additional information was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InfoSource {
    #[default]
    PaperTechnology,
    PaperBenchmark,
    HomepageTechnology,
    HomepageBenchmark,
    Custom,
}

impl InfoSource {
    /// All sources in selector order.
    pub const ALL: [InfoSource; 5] = [
        InfoSource::PaperTechnology,
        InfoSource::PaperBenchmark,
        InfoSource::HomepageTechnology,
        InfoSource::HomepageBenchmark,
        InfoSource::Custom,
    ];

    /// Short key used on the command line and in config.
    pub fn key(self) -> &'static str {
        match self {
            InfoSource::PaperTechnology => "paper-technology",
            InfoSource::PaperBenchmark => "paper-benchmark",
            InfoSource::HomepageTechnology => "homepage-technology",
            InfoSource::HomepageBenchmark => "homepage-benchmark",
            InfoSource::Custom => "custom",
        }
    }

    /// Template shown in the form selector.
    pub fn template(self) -> &'static str {
        match self {
            InfoSource::PaperTechnology => "the paper that proposed {technology}",
            InfoSource::PaperBenchmark => "the paper that proposed {benchmark}",
            InfoSource::HomepageTechnology => "the homepage of {technology}",
            InfoSource::HomepageBenchmark => "the homepage of {benchmark}",
            InfoSource::Custom => "custom source...",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for InfoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for InfoSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|source| source.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let keys: Vec<_> = Self::ALL.iter().map(|s| s.key()).collect();
                format!("unknown information source '{}' (expected one of: {})", s, keys.join(", "))
            })
    }
}

/// Fields describing a project task. Unset fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFields {
    pub technology_name: String,
    pub benchmark_name: String,
    pub technology_path: String,
    pub benchmark_path: String,
    pub info_source: InfoSource,
    pub custom_source: String,
    pub additional_info: String,
}

impl ProjectFields {
    /// Resolve the information source into text, substituting names.
    pub fn resolved_source(&self) -> String {
        if self.info_source == InfoSource::Custom {
            let custom = self.custom_source.trim();
            return if custom.is_empty() {
                "custom source".to_string()
            } else {
                custom.to_string()
            };
        }

        let technology = non_empty_or(&self.technology_name, "technology");
        let benchmark = non_empty_or(&self.benchmark_name, "benchmark");
        self.info_source
            .template()
            .replace("{technology}", technology)
            .replace("{benchmark}", benchmark)
    }

    /// Check the fields required before sending.
    ///
    /// Preview rendering does not call this.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("technology name", &self.technology_name),
            ("benchmark name", &self.benchmark_name),
            ("technology path", &self.technology_path),
            ("benchmark path", &self.benchmark_path),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(label));
            }
        }

        if self.info_source == InfoSource::Custom
            && !self.additional_info.trim().is_empty()
            && self.custom_source.trim().is_empty()
        {
            return Err(ValidationError::MissingCustomSource);
        }

        for (label, path) in [
            ("technology path", &self.technology_path),
            ("benchmark path", &self.benchmark_path),
        ] {
            let path = Path::new(path.trim());
            if !path.exists() {
                return Err(ValidationError::PathNotFound {
                    label,
                    path: path.to_path_buf(),
                });
            }
        }

        Ok(())
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let value = value.trim();
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

/// Build the instruction text for a project task.
pub fn compose_message(fields: &ProjectFields) -> String {
    let mut parts = vec![
        format!(
            "I want to apply a log parsing technology named {} on {} benchmark. \
             Here is the path of this technology: {}, and the path of the benchmark: {}.",
            fields.technology_name.trim(),
            fields.benchmark_name.trim(),
            fields.technology_path.trim(),
            fields.benchmark_path.trim(),
        ),
        "Please give me a plan to follow. Then generate scripts and edit existing codes \
         in the technology to complete the task."
            .to_string(),
    ];

    let additional = fields.additional_info.trim();
    if !additional.is_empty() {
        parts.push(format!(
            "You should read the following text from {} to learn how to adapt this dataset \
             to ROCODE: {}",
            fields.resolved_source(),
            additional
        ));
    }

    parts.push(
        "If it is necessary to execute commands, just execute them without asking the user \
         to decide. If something is unclear, read the related code in the project for reference."
            .to_string(),
    );

    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
