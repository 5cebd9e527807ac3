use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;

/// Opaque handle for a backend generation job
///
/// The backend hands out integer ids today; strings are accepted too so the
/// client does not care.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => JobId(n.to_string()),
            Raw::Text(s) => JobId(s),
        })
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    #[default]
    None,
    #[serde(alias = "pending")]
    Running,
    Completed,
    #[serde(alias = "cancelled")]
    Failed,
}

impl GenerationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, GenerationStatus::Completed | GenerationStatus::Failed)
    }
}

/// Outcome of asking the backend to compute more candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    /// `false` means the backend declined; not an error
    pub generating: bool,
    pub job_id: Option<JobId>,
    pub estimated_seconds: Option<u32>,
    pub message: Option<String>,
}

/// Reads a best-effort duration in seconds
///
/// The backend averages past job durations, so estimates usually arrive as floats.
/// They are rounded; negative, non-numeric or non-finite values read as unknown.
pub(crate) fn lenient_seconds<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u32>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_f64)
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| secs.round().min(u32::MAX as f64) as u32))
}

fn lenient_progress<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_f64)
        .filter(|pct| pct.is_finite())
        .map(|pct| pct.round().clamp(0.0, 100.0) as u8))
}

/// One answer from the generation status endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusReport {
    #[serde(default)]
    pub has_job: bool,
    #[serde(default)]
    pub status: GenerationStatus,
    #[serde(default, deserialize_with = "lenient_progress")]
    pub progress: Option<u8>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub estimated_seconds_remaining: Option<u32>,
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub estimated_total_seconds: Option<u32>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl StatusReport {
    pub fn running(progress: u8, stage: &str) -> Self {
        Self {
            has_job: true,
            status: GenerationStatus::Running,
            progress: Some(progress),
            stage: Some(stage.to_string()),
            ..Default::default()
        }
    }

    pub fn completed() -> Self {
        Self {
            has_job: true,
            status: GenerationStatus::Completed,
            progress: Some(100),
            ..Default::default()
        }
    }

    pub fn failed(message: &str) -> Self {
        Self {
            has_job: true,
            status: GenerationStatus::Failed,
            error_message: Some(message.to_string()),
            ..Default::default()
        }
    }
}

/// Client-side view of the generation job tracked for the current epoch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationJob {
    pub id: Option<JobId>,
    pub status: GenerationStatus,
    pub progress: u8,
    pub stage: Option<String>,
    pub estimated_seconds_remaining: Option<u32>,
    pub estimated_total_seconds: Option<u32>,
    pub error_message: Option<String>,
}

impl GenerationJob {
    pub fn idle() -> Self {
        Self::default()
    }

    /// Starts tracking a job the backend just accepted
    pub fn started(id: Option<JobId>, estimated_seconds: Option<u32>) -> Self {
        Self {
            id,
            status: GenerationStatus::Running,
            estimated_seconds_remaining: estimated_seconds,
            estimated_total_seconds: estimated_seconds,
            ..Default::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == GenerationStatus::Running
    }

    /// Folds a status report into the view
    ///
    /// Progress is advisory. A report that moves it backwards is still taken as is.
    pub fn apply(&mut self, report: &StatusReport) {
        self.status = report.status;
        if let Some(progress) = report.progress {
            self.progress = progress.min(100);
        }
        if report.stage.is_some() {
            self.stage = report.stage.clone();
        }
        self.estimated_seconds_remaining = report.estimated_seconds_remaining;
        if report.estimated_total_seconds.is_some() {
            self.estimated_total_seconds = report.estimated_total_seconds;
        }

        self.error_message = match report.status {
            GenerationStatus::Failed => Some(
                report
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "Recommendation generation failed".to_string()),
            ),
            _ => None,
        };
    }

    /// Marks the job failed from the client side (e.g. poll backstop)
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = GenerationStatus::Failed;
        self.estimated_seconds_remaining = None;
        self.error_message = Some(message.into());
    }
}
