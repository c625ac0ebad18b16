//! Record field catalog
//!
//! The fixed set of scalar fields a record message may carry, with the field
//! numbers assigned by the FIT profile. Array-valued fields (compressed speed
//! and distance, 1 s speed, power phases) are not part of the catalog.

use crate::error::ConvertError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

macro_rules! record_fields {
    ($($variant:ident = $num:literal => $name:literal,)+) => {
        /// A scalar field of the record message
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum RecordField {
            $($variant,)+
        }

        impl RecordField {
            /// Every catalog field, in declaration order
            pub const ALL: &'static [RecordField] = &[$(RecordField::$variant,)+];

            /// Field number in the FIT profile
            pub fn number(self) -> u8 {
                match self {
                    $(RecordField::$variant => $num,)+
                }
            }

            /// Snake-case field name used by decoders
            pub fn name(self) -> &'static str {
                match self {
                    $(RecordField::$variant => $name,)+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(RecordField::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

record_fields! {
    PositionLat = 0 => "position_lat",
    PositionLong = 1 => "position_long",
    Altitude = 2 => "altitude",
    HeartRate = 3 => "heart_rate",
    Cadence = 4 => "cadence",
    Distance = 5 => "distance",
    Speed = 6 => "speed",
    Power = 7 => "power",
    Grade = 9 => "grade",
    Resistance = 10 => "resistance",
    TimeFromCourse = 11 => "time_from_course",
    CycleLength = 12 => "cycle_length",
    Temperature = 13 => "temperature",
    Cycles = 18 => "cycles",
    TotalCycles = 19 => "total_cycles",
    CompressedAccumulatedPower = 28 => "compressed_accumulated_power",
    AccumulatedPower = 29 => "accumulated_power",
    LeftRightBalance = 30 => "left_right_balance",
    GpsAccuracy = 31 => "gps_accuracy",
    VerticalSpeed = 32 => "vertical_speed",
    Calories = 33 => "calories",
    VerticalOscillation = 39 => "vertical_oscillation",
    StanceTimePercent = 40 => "stance_time_percent",
    StanceTime = 41 => "stance_time",
    ActivityType = 42 => "activity_type",
    LeftTorqueEffectiveness = 43 => "left_torque_effectiveness",
    RightTorqueEffectiveness = 44 => "right_torque_effectiveness",
    LeftPedalSmoothness = 45 => "left_pedal_smoothness",
    RightPedalSmoothness = 46 => "right_pedal_smoothness",
    CombinedPedalSmoothness = 47 => "combined_pedal_smoothness",
    Time128 = 48 => "time128",
    StrokeType = 49 => "stroke_type",
    Zone = 50 => "zone",
    BallSpeed = 51 => "ball_speed",
    Cadence256 = 52 => "cadence256",
    FractionalCadence = 53 => "fractional_cadence",
    TotalHemoglobinConc = 54 => "total_hemoglobin_conc",
    TotalHemoglobinConcMin = 55 => "total_hemoglobin_conc_min",
    TotalHemoglobinConcMax = 56 => "total_hemoglobin_conc_max",
    SaturatedHemoglobinPercent = 57 => "saturated_hemoglobin_percent",
    SaturatedHemoglobinPercentMin = 58 => "saturated_hemoglobin_percent_min",
    SaturatedHemoglobinPercentMax = 59 => "saturated_hemoglobin_percent_max",
    DeviceIndex = 62 => "device_index",
    LeftPco = 67 => "left_pco",
    RightPco = 68 => "right_pco",
    EnhancedSpeed = 73 => "enhanced_speed",
    EnhancedAltitude = 78 => "enhanced_altitude",
    BatterySoc = 81 => "battery_soc",
    MotorPower = 82 => "motor_power",
    VerticalRatio = 83 => "vertical_ratio",
    StanceTimeBalance = 84 => "stance_time_balance",
    StepLength = 85 => "step_length",
    CycleLength16 = 87 => "cycle_length16",
    AbsolutePressure = 91 => "absolute_pressure",
    Depth = 92 => "depth",
    NextStopDepth = 93 => "next_stop_depth",
    NextStopTime = 94 => "next_stop_time",
    TimeToSurface = 95 => "time_to_surface",
    NdlTime = 96 => "ndl_time",
    CnsLoad = 97 => "cns_load",
    N2Load = 98 => "n2_load",
    RespirationRate = 99 => "respiration_rate",
    EnhancedRespirationRate = 108 => "enhanced_respiration_rate",
    Grit = 114 => "grit",
    Flow = 115 => "flow",
    CurrentStress = 116 => "current_stress",
    EbikeTravelRange = 117 => "ebike_travel_range",
    EbikeBatteryLevel = 118 => "ebike_battery_level",
    EbikeAssistMode = 119 => "ebike_assist_mode",
    EbikeAssistLevelPercent = 120 => "ebike_assist_level_percent",
    AirTimeRemaining = 123 => "air_time_remaining",
    PressureSac = 124 => "pressure_sac",
    VolumeSac = 125 => "volume_sac",
    Rmv = 126 => "rmv",
    AscentRate = 127 => "ascent_rate",
    Po2 = 129 => "po2",
    CoreTemperature = 139 => "core_temperature",
}

impl RecordField {
    /// Position of this field in [`RecordField::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for RecordField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for RecordField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        RecordField::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown record field: {name}")))
    }
}

/// Emission order for record fields.
///
/// Some readers fail to pick up values when a record's fields are not written in
/// profile order, so consolidated records are always re-sorted by this table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOrder {
    ranks: Vec<usize>,
}

impl Default for FieldOrder {
    fn default() -> Self {
        Self::by_profile_number()
    }
}

impl FieldOrder {
    /// Ascending FIT field number
    pub fn by_profile_number() -> Self {
        let mut fields = RecordField::ALL.to_vec();
        fields.sort_by_key(|f| f.number());
        Self::rank_sequence(&fields)
    }

    /// Build an order from an explicit list.
    ///
    /// Listed fields come first, in the given order; fields left out follow in
    /// profile order. A field listed twice is rejected.
    pub fn from_sequence(fields: &[RecordField]) -> Result<Self, ConvertError> {
        let mut seen = vec![false; RecordField::ALL.len()];
        let mut sequence = Vec::with_capacity(RecordField::ALL.len());

        for &field in fields {
            if seen[field.index()] {
                return Err(ConvertError::InvalidParameter(format!(
                    "field '{field}' listed more than once in field order"
                )));
            }
            seen[field.index()] = true;
            sequence.push(field);
        }

        let mut rest: Vec<RecordField> = RecordField::ALL
            .iter()
            .copied()
            .filter(|f| !seen[f.index()])
            .collect();
        rest.sort_by_key(|f| f.number());
        sequence.extend(rest);

        Ok(Self::rank_sequence(&sequence))
    }

    fn rank_sequence(sequence: &[RecordField]) -> Self {
        let mut ranks = vec![0; RecordField::ALL.len()];
        for (rank, field) in sequence.iter().enumerate() {
            ranks[field.index()] = rank;
        }
        Self { ranks }
    }

    pub fn rank(&self, field: RecordField) -> usize {
        self.ranks[field.index()]
    }
}
