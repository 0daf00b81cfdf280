pub const UNKNOWN_MODEL: &str = "Unknown model";

/// Station hardware reported by the model query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationModel {
    WizardIII,
    WizardII,
    Monitor,
    Perception,
    GroWeather,
    EnergyEnviromonitor,
    HealthEnviromonitor,
    VantagePro,
}

impl StationModel {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(StationModel::WizardIII),
            1 => Some(StationModel::WizardII),
            2 => Some(StationModel::Monitor),
            3 => Some(StationModel::Perception),
            4 => Some(StationModel::GroWeather),
            5 => Some(StationModel::EnergyEnviromonitor),
            6 => Some(StationModel::HealthEnviromonitor),
            16 => Some(StationModel::VantagePro),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StationModel::WizardIII => "Wizard III",
            StationModel::WizardII => "Wizard II",
            StationModel::Monitor => "Monitor",
            StationModel::Perception => "Perception",
            StationModel::GroWeather => "GroWeather",
            StationModel::EnergyEnviromonitor => "Energy Enviromonitor",
            StationModel::HealthEnviromonitor => "Health Enviromonitor",
            StationModel::VantagePro => "Vantage Pro",
        }
    }
}

/// Display name for a model code; unmapped codes give [`UNKNOWN_MODEL`]
pub fn model_name(code: u8) -> &'static str {
    StationModel::from_code(code).map_or(UNKNOWN_MODEL, |m| m.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        assert_eq!(model_name(0), "Wizard III");
        assert_eq!(model_name(1), "Wizard II");
        assert_eq!(model_name(2), "Monitor");
        assert_eq!(model_name(3), "Perception");
        assert_eq!(model_name(4), "GroWeather");
        assert_eq!(model_name(5), "Energy Enviromonitor");
        assert_eq!(model_name(6), "Health Enviromonitor");
        assert_eq!(model_name(16), "Vantage Pro");
    }

    #[test]
    fn every_byte_has_a_name() {
        let known = [0u8, 1, 2, 3, 4, 5, 6, 16];
        for code in 0..=u8::MAX {
            let name = model_name(code);
            assert!(!name.is_empty());
            assert_eq!(name == UNKNOWN_MODEL, !known.contains(&code), "code {}", code);
        }
        assert_eq!(model_name(99), UNKNOWN_MODEL);
        assert_eq!(model_name(255), UNKNOWN_MODEL);
    }
}
