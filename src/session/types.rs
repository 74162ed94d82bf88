//! Value types of the capture flow.

use crate::upload::DataUri;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Issuing country of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Country {
    #[default]
    CN,
    SG,
}

impl Country {
    /// All countries in menu order.
    pub const ALL: [Country; 2] = [Country::CN, Country::SG];

    /// Two-letter country code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CN => "CN",
            Self::SG => "SG",
        }
    }

    /// Menu label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CN => "China (CN)",
            Self::SG => "Singapore (SG)",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Country {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CN" => Ok(Self::CN),
            "SG" => Ok(Self::SG),
            other => Err(format!("unknown country: {other}")),
        }
    }
}

/// Kind of identity document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DocType {
    #[default]
    #[serde(rename = "National ID")]
    NationalId,
    #[serde(rename = "Passport")]
    Passport,
    #[serde(rename = "Driver's License")]
    DriversLicense,
    #[serde(rename = "Residence Permit")]
    ResidencePermit,
}

/// One entry of the document type menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocOption {
    pub doc_type: DocType,
    pub enabled: bool,
}

impl DocType {
    /// Menu order of the document types.
    pub const MENU: [DocType; 4] = [
        DocType::Passport,
        DocType::DriversLicense,
        DocType::NationalId,
        DocType::ResidencePermit,
    ];

    /// Display label, also used on the wire.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NationalId => "National ID",
            Self::Passport => "Passport",
            Self::DriversLicense => "Driver's License",
            Self::ResidencePermit => "Residence Permit",
        }
    }

    /// Whether this type can be selected for `country`.
    ///
    /// National ID is always offered and passports only for Singapore.
    /// Driver's licenses and residence permits are placeholders.
    pub fn is_enabled_for(&self, country: Country) -> bool {
        match self {
            Self::NationalId => true,
            Self::Passport => country == Country::SG,
            Self::DriversLicense | Self::ResidencePermit => false,
        }
    }

    /// The document menu for `country`.
    pub fn options_for(country: Country) -> [DocOption; 4] {
        Self::MENU.map(|doc_type| DocOption {
            doc_type,
            enabled: doc_type.is_enabled_for(country),
        })
    }

    /// Whether the document has a back side to capture.
    pub fn is_two_sided(&self) -> bool {
        *self != Self::Passport
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "nationalid" | "id" => Ok(Self::NationalId),
            "passport" => Ok(Self::Passport),
            "driverslicense" | "driverslicence" => Ok(Self::DriversLicense),
            "residencepermit" => Ok(Self::ResidencePermit),
            _ => Err(format!("unknown document type: {s}")),
        }
    }
}

/// Screen of the capture flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
    #[default]
    Selection,
    ChooseMethod,
    Camera,
    Upload,
    Success,
}

impl Step {
    /// Returns true on the camera and upload screens.
    pub fn is_capture(&self) -> bool {
        matches!(self, Self::Camera | Self::Upload)
    }
}

/// Face of a document being captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    #[default]
    Front,
    Back,
}

/// Reference to a captured image, normally a data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<DataUri> for ImageRef {
    fn from(uri: DataUri) -> Self {
        Self(uri.to_string())
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Captured images per side.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageSlots {
    pub front: Option<ImageRef>,
    pub back: Option<ImageRef>,
}

impl ImageSlots {
    /// The slot for `side`.
    pub fn get(&self, side: Side) -> Option<&ImageRef> {
        match side {
            Side::Front => self.front.as_ref(),
            Side::Back => self.back.as_ref(),
        }
    }

    pub fn clear(&mut self) {
        self.front = None;
        self.back = None;
    }
}
