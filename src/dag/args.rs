use crate::error::DagError;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Arguments every task in a DAG inherits unless the task overrides them.
///
/// The retry fields are declarative: the orchestrator that runs the tasks is
/// expected to retry a failed task up to `retries` times, waiting
/// `retry_delay` between attempts.
///
/// # Fields
/// * `owner`: Who the DAG is attributed to
/// * `depends_on_past`: Whether a run waits for the previous run of the same task to succeed
/// * `email_on_failure`: Whether to send a notification when a task fails
/// * `email_on_retry`: Whether to send a notification when a task is retried
/// * `retries`: How many times a failed task is retried
/// * `retry_delay`: Wait between two attempts
///
/// Deserializing runs [`validate`](DefaultArgs::validate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDefaultArgs")]
pub struct DefaultArgs {
    pub owner: String,
    pub depends_on_past: bool,
    pub email_on_failure: bool,
    pub email_on_retry: bool,
    pub retries: u32,
    #[serde(rename = "retry_delay_secs", with = "super::duration_secs")]
    pub retry_delay: Duration,
}

impl Default for DefaultArgs {
    fn default() -> Self {
        Self {
            owner: "airflow".to_string(),
            depends_on_past: false,
            email_on_failure: false,
            email_on_retry: false,
            retries: 0,
            retry_delay: Duration::zero(),
        }
    }
}

/// Per-task replacements for the retry settings of [`DefaultArgs`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTaskOverrides")]
pub struct TaskOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    #[serde(
        default,
        rename = "retry_delay_secs",
        skip_serializing_if = "Option::is_none",
        with = "super::duration_secs::option"
    )]
    pub retry_delay: Option<Duration>,
}

// Unchecked wire forms, validated on the way in.
#[derive(Deserialize)]
struct RawDefaultArgs {
    owner: String,
    depends_on_past: bool,
    email_on_failure: bool,
    email_on_retry: bool,
    retries: u32,
    #[serde(rename = "retry_delay_secs", with = "super::duration_secs")]
    retry_delay: Duration,
}

#[derive(Deserialize)]
struct RawTaskOverrides {
    #[serde(default)]
    retries: Option<u32>,
    #[serde(
        default,
        rename = "retry_delay_secs",
        with = "super::duration_secs::option"
    )]
    retry_delay: Option<Duration>,
}

impl TryFrom<RawDefaultArgs> for DefaultArgs {
    type Error = DagError;

    fn try_from(raw: RawDefaultArgs) -> Result<Self, Self::Error> {
        let args = DefaultArgs {
            owner: raw.owner,
            depends_on_past: raw.depends_on_past,
            email_on_failure: raw.email_on_failure,
            email_on_retry: raw.email_on_retry,
            retries: raw.retries,
            retry_delay: raw.retry_delay,
        };
        args.validate()?;
        Ok(args)
    }
}

impl TryFrom<RawTaskOverrides> for TaskOverrides {
    type Error = DagError;

    fn try_from(raw: RawTaskOverrides) -> Result<Self, Self::Error> {
        let overrides = TaskOverrides {
            retries: raw.retries,
            retry_delay: raw.retry_delay,
        };
        overrides.validate()?;
        Ok(overrides)
    }
}

impl DefaultArgs {
    /// Checks that the owner is set and the retry delay is not negative.
    ///
    /// # Errors
    /// * [`DagError::EmptyOwner`] if `owner` is blank
    /// * [`DagError::NegativeRetryDelay`] if `retry_delay` is below zero
    pub fn validate(&self) -> Result<(), DagError> {
        if self.owner.trim().is_empty() {
            return Err(DagError::EmptyOwner);
        }
        check_delay(self.retry_delay)
    }

    /// Returns the arguments a task actually runs with.
    pub fn apply(&self, overrides: &TaskOverrides) -> DefaultArgs {
        DefaultArgs {
            retries: overrides.retries.unwrap_or(self.retries),
            retry_delay: overrides.retry_delay.unwrap_or(self.retry_delay),
            ..self.clone()
        }
    }
}

impl TaskOverrides {
    /// # Errors
    /// [`DagError::NegativeRetryDelay`] if an overriding delay is below zero.
    pub fn validate(&self) -> Result<(), DagError> {
        match self.retry_delay {
            Some(delay) => check_delay(delay),
            None => Ok(()),
        }
    }
}

fn check_delay(delay: Duration) -> Result<(), DagError> {
    if delay < Duration::zero() {
        return Err(DagError::NegativeRetryDelay {
            secs: delay.num_seconds(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let args = DefaultArgs::default();
        assert_eq!(args.owner, "airflow");
        assert_eq!(args.retries, 0);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_blank_owner_rejected() {
        let args = DefaultArgs {
            owner: "   ".to_string(),
            ..DefaultArgs::default()
        };
        assert_eq!(args.validate(), Err(DagError::EmptyOwner));
    }

    #[test]
    fn test_negative_delay_rejected() {
        let args = DefaultArgs {
            retry_delay: Duration::seconds(-30),
            ..DefaultArgs::default()
        };
        assert_eq!(
            args.validate(),
            Err(DagError::NegativeRetryDelay { secs: -30 })
        );
    }

    #[test]
    fn test_apply_overrides_only_retry_fields() {
        let base = DefaultArgs {
            retries: 1,
            retry_delay: Duration::minutes(5),
            ..DefaultArgs::default()
        };
        let overrides = TaskOverrides {
            retries: Some(3),
            retry_delay: None,
        };

        let effective = base.apply(&overrides);
        assert_eq!(effective.retries, 3);
        assert_eq!(effective.retry_delay, Duration::minutes(5));
        assert_eq!(effective.owner, base.owner);

        assert_eq!(base.apply(&TaskOverrides::default()), base);
    }

    #[test]
    fn test_serializes_delay_as_seconds() {
        let args = DefaultArgs {
            retry_delay: Duration::minutes(5),
            ..DefaultArgs::default()
        };
        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(json["retry_delay_secs"], 300);

        let back: DefaultArgs = serde_json::from_value(json).unwrap();
        assert_eq!(back, args);
    }

    #[test]
    fn test_deserialize_validates() {
        let blank_owner = serde_json::json!({
            "owner": "",
            "depends_on_past": false,
            "email_on_failure": false,
            "email_on_retry": false,
            "retries": 1,
            "retry_delay_secs": 60
        });
        let err = serde_json::from_value::<DefaultArgs>(blank_owner).unwrap_err();
        assert!(err.to_string().contains("owner must not be empty"));

        let negative_delay = serde_json::json!({
            "owner": "airflow",
            "depends_on_past": false,
            "email_on_failure": false,
            "email_on_retry": false,
            "retries": 1,
            "retry_delay_secs": -5
        });
        assert!(serde_json::from_value::<DefaultArgs>(negative_delay).is_err());

        let overrides = serde_json::json!({ "retry_delay_secs": -5 });
        assert!(serde_json::from_value::<TaskOverrides>(overrides).is_err());
    }

    #[test]
    fn test_overrides_serde() {
        let overrides = TaskOverrides {
            retries: None,
            retry_delay: Some(Duration::minutes(2)),
        };
        let json = serde_json::to_value(&overrides).unwrap();
        assert_eq!(json, serde_json::json!({ "retry_delay_secs": 120 }));
        assert_eq!(serde_json::from_value::<TaskOverrides>(json).unwrap(), overrides);

        let empty = serde_json::to_value(TaskOverrides::default()).unwrap();
        assert_eq!(empty, serde_json::json!({}));
        assert_eq!(
            serde_json::from_value::<TaskOverrides>(empty).unwrap(),
            TaskOverrides::default()
        );
    }
}
