//! BIDS sidecar descriptions for the localizer runs.
//!
//! Sidecars are written with sorted keys and four-space indentation so they
//! diff cleanly against the files already committed to dataset repositories.

use crate::config::TaskDesign;
use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Cognitive Atlas term for the motor/visual/auditory localizer.
pub const COG_ATLAS_ID: &str = "trm_553e85265f51e";

// Field order is alphabetical so output keys stay sorted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColumnDescription {
    #[serde(rename = "Description")]
    pub description: &'static str,
    #[serde(rename = "LongName")]
    pub long_name: &'static str,
    #[serde(rename = "Units", skip_serializing_if = "Option::is_none")]
    pub units: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BoldDescription {
    #[serde(rename = "CogAtlasID")]
    pub cog_atlas_id: &'static str,
    #[serde(rename = "TaskName")]
    pub task_name: &'static str,
}

/// Columns the task adds to `_events.tsv` beyond onset/duration/trial_type.
pub fn events_description() -> BTreeMap<&'static str, ColumnDescription> {
    BTreeMap::from([
        (
            "trial_number",
            ColumnDescription {
                description: "Index of the trial in time.",
                long_name: "trial number",
                units: None,
            },
        ),
        (
            "tap_count",
            ColumnDescription {
                description: "Number of button presses within duration of trial, including \
                              fixation following presentation of the stimulus.",
                long_name: "Tap count",
                units: None,
            },
        ),
        (
            "tap_duration",
            ColumnDescription {
                description: "Duration of finger-tapping, from first button press to last \
                              button press within duration of trial and following fixation.",
                long_name: "Tap duration",
                units: Some("[s] second"),
            },
        ),
    ])
}

pub fn bold_description(design: TaskDesign) -> BoldDescription {
    let task_name = match design {
        TaskDesign::Detection => "M1/V1/A1 localization",
        TaskDesign::Estimation => "M1/V1/A1 HRF estimation",
    };
    BoldDescription {
        cog_atlas_id: COG_ATLAS_ID,
        task_name,
    }
}

pub fn events_file_name(design: TaskDesign) -> String {
    format!("task-localizer{}_events.json", design.label())
}

pub fn bold_file_name(design: TaskDesign) -> String {
    format!("task-localizer{}_bold.json", design.label())
}

/// Pretty-print with four-space indentation.
pub fn render_sidecar<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .context("failed to serialize sidecar")?;
    String::from_utf8(buf).context("sidecar is not valid UTF-8")
}

fn write_sidecar<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, render_sidecar(value)?)
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    Ok(path)
}

/// Write the events and bold sidecars for each design into `output_dir`.
pub fn write_sidecars(output_dir: &Path, designs: &[TaskDesign]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create '{}'", output_dir.display()))?;
    let events = events_description();
    let mut written = Vec::with_capacity(designs.len() * 2);
    for &design in designs {
        written.push(write_sidecar(output_dir, &events_file_name(design), &events)?);
        written.push(write_sidecar(
            output_dir,
            &bold_file_name(design),
            &bold_description(design),
        )?);
    }
    Ok(written)
}
