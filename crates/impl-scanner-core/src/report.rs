//! Report types for scan results.

use serde::{Deserialize, Serialize};

use crate::errors::ScanError;
use crate::populator::PopulationStats;

/// Summary of one scan call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Base type the scan was run against.
    pub base_type: String,
    /// Label of the filter that selected candidates.
    pub filter: String,
    /// Seed of the value generator, if it was seeded.
    pub seed: Option<u64>,
    /// Number of candidate types the filter matched.
    pub candidates: usize,
    /// Number of instances generated.
    pub generated: usize,
    /// Concrete types generated, in discovery order.
    pub generated_types: Vec<String>,
    /// Candidates dropped from the result, with the reason.
    pub skipped: Vec<ScanError>,
    /// Field counters across all generated instances.
    pub population: PopulationStats,
    /// Elapsed time in milliseconds.
    pub elapsed_ms: u64,
}

impl ScanReport {
    /// Whether every candidate produced an instance.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.generated == self.candidates
    }

    /// Names of the dropped candidates.
    pub fn skipped_types(&self) -> Vec<&str> {
        self.skipped.iter().filter_map(|e| e.type_name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(skipped: Vec<ScanError>) -> ScanReport {
        ScanReport {
            base_type: "BaseEvent".into(),
            filter: "concrete subtypes of BaseEvent".into(),
            seed: Some(7),
            candidates: 2,
            generated: 2 - skipped.len(),
            generated_types: vec!["UserCreatedEvent".into()],
            skipped,
            population: PopulationStats::default(),
            elapsed_ms: 0,
        }
    }

    #[test]
    fn test_complete_report() {
        let mut r = report(vec![]);
        r.generated_types.push("Transaction".into());
        assert!(r.is_complete());
        assert!(r.skipped_types().is_empty());
    }

    #[test]
    fn test_incomplete_report() {
        let r = report(vec![ScanError::population_failure("Broken", "panic: boom")]);
        assert!(!r.is_complete());
        assert_eq!(r.skipped_types(), vec!["Broken"]);
    }

    #[test]
    fn test_report_serialization() {
        let r = report(vec![ScanError::unbuildable("Orphan")]);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"base_type\":\"BaseEvent\""));
        assert!(json.contains("\"kind\":\"UnbuildableType\""));
        let back: ScanReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.skipped, r.skipped);
    }
}
