use std::fmt::{Display, Formatter};

/// Lists the supported sensor kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SensorKind {
    CarbonMonoxide,
    CarbonDioxide,
    Contact,
    Leak,
    Motion,
    Occupancy,
    Smoke,
}

/// Lists the accessory characteristics a sensor value is forwarded to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Characteristic {
    CarbonMonoxideDetected,
    CarbonDioxideDetected,
    ContactSensorState,
    LeakDetected,
    MotionDetected,
    OccupancyDetected,
    SmokeDetected,
}

impl Display for Characteristic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The detected / not-detected value of a sensor, as understood by its accessory characteristic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DomainValue {
    LevelsNormal,
    LevelsAbnormal,
    ContactDetected,
    ContactNotDetected,
    LeakDetected,
    LeakNotDetected,
    MotionDetected,
    MotionNotDetected,
    OccupancyDetected,
    OccupancyNotDetected,
    SmokeDetected,
    SmokeNotDetected,
}

impl DomainValue {
    /// Returns the characteristic value on the wire (HAP encoding).
    pub fn hap_value(&self) -> u8 {
        match self {
            DomainValue::LevelsNormal
            | DomainValue::ContactDetected
            | DomainValue::LeakNotDetected
            | DomainValue::MotionNotDetected
            | DomainValue::OccupancyNotDetected
            | DomainValue::SmokeNotDetected => 0,
            DomainValue::LevelsAbnormal
            | DomainValue::ContactNotDetected
            | DomainValue::LeakDetected
            | DomainValue::MotionDetected
            | DomainValue::OccupancyDetected
            | DomainValue::SmokeDetected => 1,
        }
    }
}

impl Display for DomainValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            DomainValue::LevelsNormal => "levels-normal",
            DomainValue::LevelsAbnormal => "levels-abnormal",
            DomainValue::ContactDetected => "contact-detected",
            DomainValue::ContactNotDetected => "contact-not-detected",
            DomainValue::LeakDetected => "leak-detected",
            DomainValue::LeakNotDetected => "leak-not-detected",
            DomainValue::MotionDetected => "motion-detected",
            DomainValue::MotionNotDetected => "motion-not-detected",
            DomainValue::OccupancyDetected => "occupancy-detected",
            DomainValue::OccupancyNotDetected => "occupancy-not-detected",
            DomainValue::SmokeDetected => "smoke-detected",
            DomainValue::SmokeNotDetected => "smoke-not-detected",
        };
        write!(f, "{}", value)
    }
}

struct KindDefinition {
    kind: SensorKind,
    service_type: &'static str,
    characteristic: Characteristic,
    /// Raw level => domain value.
    polarity: fn(bool) -> DomainValue,
}

/// One row per kind: adding a kind means adding a row (and its variants above).
static KINDS: [KindDefinition; 7] = [
    KindDefinition {
        kind: SensorKind::CarbonMonoxide,
        service_type: "CarbonMonoxideSensor",
        characteristic: Characteristic::CarbonMonoxideDetected,
        polarity: |raw| match raw {
            true => DomainValue::LevelsAbnormal,
            false => DomainValue::LevelsNormal,
        },
    },
    KindDefinition {
        kind: SensorKind::CarbonDioxide,
        service_type: "CarbonDioxideSensor",
        characteristic: Characteristic::CarbonDioxideDetected,
        polarity: |raw| match raw {
            true => DomainValue::LevelsAbnormal,
            false => DomainValue::LevelsNormal,
        },
    },
    // Inverted: an open circuit (raw HIGH through the pull-up) means no contact.
    KindDefinition {
        kind: SensorKind::Contact,
        service_type: "ContactSensor",
        characteristic: Characteristic::ContactSensorState,
        polarity: |raw| match raw {
            true => DomainValue::ContactNotDetected,
            false => DomainValue::ContactDetected,
        },
    },
    KindDefinition {
        kind: SensorKind::Leak,
        service_type: "LeakSensor",
        characteristic: Characteristic::LeakDetected,
        polarity: |raw| match raw {
            true => DomainValue::LeakDetected,
            false => DomainValue::LeakNotDetected,
        },
    },
    KindDefinition {
        kind: SensorKind::Motion,
        service_type: "MotionSensor",
        characteristic: Characteristic::MotionDetected,
        polarity: |raw| match raw {
            true => DomainValue::MotionDetected,
            false => DomainValue::MotionNotDetected,
        },
    },
    KindDefinition {
        kind: SensorKind::Occupancy,
        service_type: "OccupancySensor",
        characteristic: Characteristic::OccupancyDetected,
        polarity: |raw| match raw {
            true => DomainValue::OccupancyDetected,
            false => DomainValue::OccupancyNotDetected,
        },
    },
    KindDefinition {
        kind: SensorKind::Smoke,
        service_type: "SmokeSensor",
        characteristic: Characteristic::SmokeDetected,
        polarity: |raw| match raw {
            true => DomainValue::SmokeDetected,
            false => DomainValue::SmokeNotDetected,
        },
    },
];

impl SensorKind {
    pub const ALL: [SensorKind; 7] = [
        SensorKind::CarbonMonoxide,
        SensorKind::CarbonDioxide,
        SensorKind::Contact,
        SensorKind::Leak,
        SensorKind::Motion,
        SensorKind::Occupancy,
        SensorKind::Smoke,
    ];

    fn definition(&self) -> &'static KindDefinition {
        // KINDS is ordered like the enum.
        let definition = &KINDS[*self as usize];
        debug_assert_eq!(definition.kind, *self);
        definition
    }

    /// Maps a raw pin level to the kind's domain value.
    pub fn map(&self, raw: bool) -> DomainValue {
        (self.definition().polarity)(raw)
    }

    /// Returns the characteristic the domain value is forwarded to.
    pub fn characteristic(&self) -> Characteristic {
        self.definition().characteristic
    }

    /// Returns the accessory service type (`ContactSensor`, `MotionSensor`, ...).
    pub fn service_type(&self) -> &'static str {
        self.definition().service_type
    }

    /// Finds the kind matching a configuration type name (case-insensitive).
    ///
    /// Accepted names: `C0`/`CARBONMONOXIDE`, `C02`/`CARBONDIOXIDE`, `CONTACT`, `LEAK`,
    /// `MOTION`, `OCCUPANCY`, `SMOKE`.
    pub fn from_type_name(name: &str) -> Option<SensorKind> {
        match name.trim().to_uppercase().as_str() {
            "C0" | "CARBONMONOXIDE" => Some(SensorKind::CarbonMonoxide),
            "C02" | "CARBONDIOXIDE" => Some(SensorKind::CarbonDioxide),
            "CONTACT" => Some(SensorKind::Contact),
            "LEAK" => Some(SensorKind::Leak),
            "MOTION" => Some(SensorKind::Motion),
            "OCCUPANCY" => Some(SensorKind::Occupancy),
            "SMOKE" => Some(SensorKind::Smoke),
            _ => None,
        }
    }
}

impl Display for SensorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.service_type())
    }
}
