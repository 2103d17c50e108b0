//! Energy state definitions

use serde::{Deserialize, Serialize};

/// The six named energy states the detection backend reports
///
/// Labels arrive with arbitrary casing; `from_label` matches case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyState {
    /// Smooth, controlled, mask on
    Slickveil,
    /// High energy, activated, ready
    Voltage,
    /// Frayed, scattered, dysregulated
    Fraymark,
    /// Grounded, present, clear
    Clearmark,
    /// Low energy, withdrawn, quiet
    Lowline,
    /// Dissociated, elsewhere, floating
    OtherPlace,
}

impl EnergyState {
    pub const ALL: [EnergyState; 6] = [
        EnergyState::Slickveil,
        EnergyState::Voltage,
        EnergyState::Fraymark,
        EnergyState::Clearmark,
        EnergyState::Lowline,
        EnergyState::OtherPlace,
    ];

    /// Resolve a detected-state label, ignoring case
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.label().eq_ignore_ascii_case(label))
    }

    /// Canonical lower-case label
    pub fn label(&self) -> &'static str {
        match self {
            EnergyState::Slickveil => "slickveil",
            EnergyState::Voltage => "voltage",
            EnergyState::Fraymark => "fraymark",
            EnergyState::Clearmark => "clearmark",
            EnergyState::Lowline => "lowline",
            EnergyState::OtherPlace => "other_place",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EnergyState::Slickveil => "smooth, controlled, mask on",
            EnergyState::Voltage => "high energy, activated, ready",
            EnergyState::Fraymark => "frayed, scattered, dysregulated",
            EnergyState::Clearmark => "grounded, present, clear",
            EnergyState::Lowline => "low energy, withdrawn, quiet",
            EnergyState::OtherPlace => "dissociated, elsewhere, floating",
        }
    }

    /// Truecolor RGB for terminal display
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            EnergyState::Slickveil => (167, 139, 250),
            EnergyState::Voltage => (249, 115, 22),
            EnergyState::Fraymark => (239, 68, 68),
            EnergyState::Clearmark => (74, 222, 128),
            EnergyState::Lowline => (59, 130, 246),
            EnergyState::OtherPlace => (139, 92, 246),
        }
    }

    /// Color for an arbitrary label; unknown labels get the default green
    pub fn rgb_for_label(label: Option<&str>) -> (u8, u8, u8) {
        label
            .and_then(Self::from_label)
            .map(|s| s.rgb())
            .unwrap_or((74, 222, 128))
    }
}

impl std::fmt::Display for EnergyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EnergyState::Slickveil => "Slickveil",
            EnergyState::Voltage => "Voltage",
            EnergyState::Fraymark => "Fraymark",
            EnergyState::Clearmark => "Clearmark",
            EnergyState::Lowline => "Lowline",
            EnergyState::OtherPlace => "Other Place",
        };
        write!(f, "{}", name)
    }
}
