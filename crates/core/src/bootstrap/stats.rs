use std::time::Duration;

use serde::Serialize;

/// Timings and counters collected by one bootstrap run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BootstrapStats {
    pub roots_scanned: usize,
    pub descriptors_discovered: usize,
    pub scan_issues: usize,
    /// Descriptors excluded because they target another platform
    pub descriptors_filtered: usize,
    pub components_activated: usize,
    /// Number of dependency levels in the activation plan
    pub activation_levels: usize,
    pub identification_time: Duration,
    pub scan_time: Duration,
    pub registration_time: Duration,
    pub activation_time: Duration,
    pub total_time: Duration,
    pub slowest_component: Option<String>,
    pub slowest_activation: Duration,
}

impl BootstrapStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_activation(&mut self, component: &str, duration: Duration) {
        self.components_activated += 1;
        if duration >= self.slowest_activation {
            self.slowest_activation = duration;
            self.slowest_component = Some(component.to_string());
        }
    }

    pub fn avg_activation_time(&self) -> Duration {
        if self.components_activated == 0 {
            Duration::ZERO
        } else {
            self.activation_time / self.components_activated as u32
        }
    }
}

impl std::fmt::Display for BootstrapStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Bootstrap summary:")?;
        writeln!(f, "  Roots scanned: {}", self.roots_scanned)?;
        writeln!(
            f,
            "  Descriptors: {} discovered, {} filtered, {} issue(s)",
            self.descriptors_discovered, self.descriptors_filtered, self.scan_issues
        )?;
        writeln!(
            f,
            "  Components: {} activated in {} level(s)",
            self.components_activated, self.activation_levels
        )?;
        writeln!(f, "  Identification: {:?}", self.identification_time)?;
        writeln!(f, "  Scan: {:?}", self.scan_time)?;
        writeln!(f, "  Registration: {:?}", self.registration_time)?;
        writeln!(f, "  Activation: {:?}", self.activation_time)?;
        if let Some(slowest) = &self.slowest_component {
            writeln!(f, "  Slowest component: {} ({:?})", slowest, self.slowest_activation)?;
        }
        write!(f, "  Total: {:?}", self.total_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slowest_component_tracking() {
        let mut stats = BootstrapStats::new();
        stats.record_activation("fast", Duration::from_millis(1));
        stats.record_activation("slow", Duration::from_millis(9));
        stats.record_activation("medium", Duration::from_millis(4));

        assert_eq!(stats.components_activated, 3);
        assert_eq!(stats.slowest_component.as_deref(), Some("slow"));
        assert_eq!(stats.slowest_activation, Duration::from_millis(9));
    }

    #[test]
    fn test_average_with_no_components() {
        assert_eq!(BootstrapStats::new().avg_activation_time(), Duration::ZERO);
    }
}
