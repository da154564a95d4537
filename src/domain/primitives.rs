//! Domain primitives: identifiers and calendar month codes.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub fn new(id: Uuid) -> Self {
                $name(id)
            }

            /// Generate a fresh random identifier.
            pub fn random() -> Self {
                $name(Uuid::new_v4())
            }

            /// Get the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map($name)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Authenticated caller / vehicle owner.
    UserId
);
uuid_id!(
    /// Vehicle identifier.
    VehicleId
);
uuid_id!(
    /// Fuel fill identifier.
    FillId
);

/// Calendar month keyed by its 3-letter uppercase code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MonthCode {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl MonthCode {
    /// All months in calendar order.
    pub const ALL: [MonthCode; 12] = [
        MonthCode::Jan,
        MonthCode::Feb,
        MonthCode::Mar,
        MonthCode::Apr,
        MonthCode::May,
        MonthCode::Jun,
        MonthCode::Jul,
        MonthCode::Aug,
        MonthCode::Sep,
        MonthCode::Oct,
        MonthCode::Nov,
        MonthCode::Dec,
    ];

    /// Month of a calendar date.
    pub fn of(date: NaiveDate) -> Self {
        // month0() is always in 0..12
        Self::ALL[date.month0() as usize]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MonthCode::Jan => "JAN",
            MonthCode::Feb => "FEB",
            MonthCode::Mar => "MAR",
            MonthCode::Apr => "APR",
            MonthCode::May => "MAY",
            MonthCode::Jun => "JUN",
            MonthCode::Jul => "JUL",
            MonthCode::Aug => "AUG",
            MonthCode::Sep => "SEP",
            MonthCode::Oct => "OCT",
            MonthCode::Nov => "NOV",
            MonthCode::Dec => "DEC",
        }
    }
}

impl std::fmt::Display for MonthCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
