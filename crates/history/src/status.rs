//! Cook status classification.
//!
//! A pure function of one snapshot; nothing in the sampling pipeline depends
//! on it.

use std::fmt;

use contracts::{Snapshot, StatusThresholds};

/// Severity of a cook status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Ok,
    Warn,
    Alert,
    Done,
    Unknown,
}

impl StatusLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLevel::Ok => "ok",
            StatusLevel::Warn => "warn",
            StatusLevel::Alert => "alert",
            StatusLevel::Done => "done",
            StatusLevel::Unknown => "unknown",
        }
    }
}

/// Human-readable status of the cook
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CookStatus {
    pub label: &'static str,
    pub level: StatusLevel,
    pub pit: Option<f64>,
    pub meat: Option<f64>,
}

impl fmt::Display for CookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.level.as_str())?;
        if let Some(pit) = self.pit {
            write!(f, " pit={pit:.1}C")?;
        }
        if let Some(meat) = self.meat {
            write!(f, " meat={meat:.1}C")?;
        }
        Ok(())
    }
}

/// Classify a snapshot using the pit and meat probe ids
pub fn classify(
    snapshot: &Snapshot,
    thresholds: &StatusThresholds,
    pit_id: Option<&str>,
    meat_id: Option<&str>,
) -> CookStatus {
    let pit = pit_id.and_then(|id| snapshot.value(id));
    let meat = meat_id.and_then(|id| snapshot.value(id));

    let (label, level) = match (pit, meat) {
        (Some(pit), Some(meat)) => classify_values(pit, meat, thresholds),
        _ => ("No data", StatusLevel::Unknown),
    };

    CookStatus {
        label,
        level,
        pit,
        meat,
    }
}

fn classify_values(pit: f64, meat: f64, t: &StatusThresholds) -> (&'static str, StatusLevel) {
    if meat >= t.meat_done {
        ("Cook finished", StatusLevel::Done)
    } else if pit > t.pit_target + t.alert_margin {
        ("Pit too hot", StatusLevel::Alert)
    } else if pit > t.pit_target + t.warn_margin {
        ("Pit warm", StatusLevel::Warn)
    } else if pit < t.pit_target - t.cool_margin {
        ("Pit too cool", StatusLevel::Warn)
    } else {
        ("Running", StatusLevel::Ok)
    }
}
