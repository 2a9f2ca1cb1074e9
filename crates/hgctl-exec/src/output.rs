use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Output captured from a finished command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Combined stdout and stderr, in the order the process wrote them
    pub output: String,
    /// Exit code from the process
    pub exit_code: i32,
    /// Duration of execution
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

impl ExecutionResult {
    pub fn new(output: String, exit_code: i32, duration: Duration) -> Self {
        Self {
            output,
            exit_code,
            duration,
        }
    }

    /// Check if the command exited successfully
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn lines(&self) -> usize {
        self.output.lines().count()
    }

    pub fn into_output(self) -> String {
        self.output
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}
