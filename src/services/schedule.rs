//! Mapping between the dashboard's schedule choices and cron expressions.
//!
//! The forward direction is total over the closed option set. The reverse
//! direction is best-effort: the backend's cron formatting is not
//! contractually fixed, so anything unrecognized is reported as such and
//! the caller keeps its previous selection instead of guessing.

use std::fmt;

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOption {
    Every30m,
    Every1h,
    Every2h,
    Every3h,
    Every5h,
    Every8h,
    Every12h,
}

impl ScheduleOption {
    pub const ALL: [Self; 7] = [
        Self::Every30m,
        Self::Every1h,
        Self::Every2h,
        Self::Every3h,
        Self::Every5h,
        Self::Every8h,
        Self::Every12h,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Every30m => "30m",
            Self::Every1h => "1h",
            Self::Every2h => "2h",
            Self::Every3h => "3h",
            Self::Every5h => "5h",
            Self::Every8h => "8h",
            Self::Every12h => "12h",
        }
    }

    /// Canonical cron string sent to the backend.
    #[must_use]
    pub const fn cron(self) -> &'static str {
        match self {
            Self::Every30m => "*/30 * * * *",
            Self::Every1h => "0 * * * *",
            Self::Every2h => "0 */2 * * *",
            Self::Every3h => "0 */3 * * *",
            Self::Every5h => "0 */5 * * *",
            Self::Every8h => "0 */8 * * *",
            Self::Every12h => "0 */12 * * *",
        }
    }

    /// Resolves a UI label. The option set is closed, so an unknown label
    /// here is a programming error upstream, reported as `Config`.
    pub fn from_label(label: &str) -> Result<Self, PipelineError> {
        Self::ALL
            .into_iter()
            .find(|option| option.label() == label)
            .ok_or_else(|| {
                PipelineError::Config(format!("unrecognized schedule label '{label}'"))
            })
    }

    /// Best-effort reverse mapping from a backend-supplied cron string.
    ///
    /// Tries the canonical table first, then looks for a `*/N` step in the
    /// minutes or hours field (tolerating an optional leading seconds
    /// field), then the literal hourly pattern. Returns `None` for
    /// everything else.
    #[must_use]
    pub fn from_cron(cron: &str) -> Option<Self> {
        let trimmed = cron.trim();
        if let Some(option) = Self::ALL.into_iter().find(|o| o.cron() == trimmed) {
            return Some(option);
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let (minute_idx, hour_idx) = match fields.len() {
            5 => (0, 1),
            // Seconds-first variants, the format the local scheduler uses.
            6 | 7 => (1, 2),
            _ => return None,
        };

        if let Some(step) = fields[minute_idx].strip_prefix("*/")
            && step.parse::<u32>().ok() == Some(30)
        {
            return Some(Self::Every30m);
        }

        if let Some(step) = fields[hour_idx].strip_prefix("*/") {
            match step.parse::<u32>().ok()? {
                2 => return Some(Self::Every2h),
                3 => return Some(Self::Every3h),
                5 => return Some(Self::Every5h),
                8 => return Some(Self::Every8h),
                12 => return Some(Self::Every12h),
                _ => return None,
            }
        }

        if fields[minute_idx] == "0" && fields[hour_idx] == "*" {
            return Some(Self::Every1h);
        }

        None
    }
}

impl fmt::Display for ScheduleOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_cron_round_trip() {
        for option in ScheduleOption::ALL {
            assert_eq!(ScheduleOption::from_cron(option.cron()), Some(option));
            assert_eq!(
                ScheduleOption::from_label(option.label()).unwrap(),
                option
            );
        }
    }

    #[test]
    fn tolerates_seconds_prefixed_crons() {
        assert_eq!(
            ScheduleOption::from_cron("0 */30 * * * *"),
            Some(ScheduleOption::Every30m)
        );
        assert_eq!(
            ScheduleOption::from_cron("0 0 */12 * * *"),
            Some(ScheduleOption::Every12h)
        );
        assert_eq!(
            ScheduleOption::from_cron("0 0 * * * *"),
            Some(ScheduleOption::Every1h)
        );
    }

    #[test]
    fn unknown_patterns_stay_unrecognized() {
        assert_eq!(ScheduleOption::from_cron("15 4 * * 2"), None);
        assert_eq!(ScheduleOption::from_cron("*/7 * * * *"), None);
        assert_eq!(ScheduleOption::from_cron("0 */4 * * *"), None);
        assert_eq!(ScheduleOption::from_cron("not a cron"), None);
    }

    #[test]
    fn unknown_label_is_a_config_error() {
        let err = ScheduleOption::from_label("45m").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
