pub mod args;
pub mod descriptor;
pub mod graph;
pub mod schedule;

pub use args::{DefaultArgs, TaskOverrides};
pub use descriptor::{Dag, DagBuilder};
pub use graph::{TaskGraph, TaskSpec};
pub use schedule::{DataInterval, Schedule};

/// Serializes a `chrono::Duration` as whole seconds.
pub(crate) mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        Duration::try_seconds(secs)
            .ok_or_else(|| serde::de::Error::custom(format!("duration out of range: {}s", secs)))
    }

    pub mod option {
        use chrono::Duration;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(d) => serializer.serialize_some(&d.num_seconds()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Duration>, D::Error> {
            match Option::<i64>::deserialize(deserializer)? {
                Some(secs) => Duration::try_seconds(secs).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("duration out of range: {}s", secs))
                }),
                None => Ok(None),
            }
        }
    }
}
