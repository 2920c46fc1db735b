//! Static classification vocabulary and validation patterns.
//!
//! Built once at first use and never mutated; lookups normalize the probe
//! instead of touching the table.

use std::collections::HashMap;

use regex::Regex;

lazy_static::lazy_static! {
    /// Normalized directory token -> canonical device-category label.
    static ref DEVICE_TYPES: HashMap<&'static str, &'static str> = HashMap::from([
        ("ACS", "AC"),
        ("AIR_PURIFIERS", "Air Purifier"),
        ("AUDIO_AND_VIDEO_RECEIVERS", "AV Receiver"),
        ("BIDET", "Bidet"),
        ("BLU-RAY", "Blu-Ray"),
        ("CCTV", "CCTV"),
        ("CD_PLAYERS", "CD Player"),
        ("CABLE_BOXES", "Cable Box"),
        ("CAMERAS", "Camera"),
        ("CAR_MULTIMEDIA", "Car Multimedia"),
        ("CONSOLES", "Game Console"),
        ("CONVERTERS", "Converter"),
        ("DVB-T", "DVB-T"),
        ("DVD_PLAYERS", "DVD Player"),
        ("DIGITAL_SIGNS", "Digital Sign"),
        ("FANS", "Fan"),
        ("FIREPLACES", "Fireplace"),
        ("HEAD_UNITS", "Head Unit"),
        ("HEATERS", "Heater"),
        ("HUMIDIFIERS", "Humidifier"),
        ("LED_LIGHTING", "LED Light"),
        ("MONITORS", "Monitor"),
        ("PROJECTORS", "Projector"),
        ("SOUNDBARS", "Soundbar"),
        ("SPEAKERS", "Speaker"),
        ("STREAMING_DEVICES", "Streaming Device"),
        ("TVS", "TV"),
        ("VACUUM_CLEANERS", "Vacuum"),
        ("VIDEOCONFERENCING", "Video Conference"),
    ]);

    /// Brand shape: 2 to 15 uppercase letters, nothing else.
    pub static ref BRAND_PATTERN: Regex = Regex::new(r"^[A-Z]{2,15}$").unwrap();

    /// The three accepted model-number shapes. Reproduced as observed in the
    /// wild; treat as a fixed acceptance rule, not something to generalize.
    pub static ref MODEL_PATTERNS: [Regex; 3] = [
        Regex::new(r"^[A-Z]{0,3}\d{2,3}[A-Z]{2,3}\d{3,4}[A-Z]?$").unwrap(),
        Regex::new(r"^[A-Z]+\d{3,4}[A-Z]?$").unwrap(),
        Regex::new(r"^[A-Z]{2,3}\d{2,3}[A-Z]\d{2,3}[A-Z]?(_20\d{2})?$").unwrap(),
    ];

    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Normalize a path segment the way vocabulary keys are normalized:
/// uppercase, whitespace runs collapsed to a single underscore.
pub fn normalize_token(segment: &str) -> String {
    WHITESPACE_RUN.replace_all(&segment.to_uppercase(), "_").into_owned()
}

/// Category label for a raw path segment, if the segment is a known token.
pub fn device_type_for(segment: &str) -> Option<&'static str> {
    DEVICE_TYPES.get(normalize_token(segment).as_str()).copied()
}

/// True when the model candidate matches at least one accepted shape.
pub fn is_valid_model(model: &str) -> bool {
    MODEL_PATTERNS.iter().any(|p| p.is_match(model))
}
