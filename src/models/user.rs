//! User model

use std::fmt;
use serde::{Deserialize, Serialize};

/// A student account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing)]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(rename = "facultyID")]
    pub faculty: Faculty,
    pub year_of_study: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Faculty, stored as its numeric code 1-10
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Faculty {
    ComputerScience,
    Engineering,
    Business,
    Medicine,
    Law,
    Science,
    Education,
    Arts,
    BuiltEnvironment,
    Economics,
}

impl Faculty {
    pub const ALL: [Faculty; 10] = [
        Faculty::ComputerScience,
        Faculty::Engineering,
        Faculty::Business,
        Faculty::Medicine,
        Faculty::Law,
        Faculty::Science,
        Faculty::Education,
        Faculty::Arts,
        Faculty::BuiltEnvironment,
        Faculty::Economics,
    ];

    pub fn code(self) -> u8 {
        Faculty::ALL
            .iter()
            .position(|faculty| *faculty == self)
            .map(|index| index as u8 + 1)
            .unwrap_or(0)
    }

    pub fn name(self) -> &'static str {
        match self {
            Faculty::ComputerScience => "Faculty of Computer Science and Information Technology",
            Faculty::Engineering => "Faculty of Engineering",
            Faculty::Business => "Faculty of Business and Accountancy",
            Faculty::Medicine => "Faculty of Medicine",
            Faculty::Law => "Faculty of Law",
            Faculty::Science => "Faculty of Science",
            Faculty::Education => "Faculty of Education",
            Faculty::Arts => "Faculty of Arts and Social Sciences",
            Faculty::BuiltEnvironment => "Faculty of Built Environment",
            Faculty::Economics => "Faculty of Economics and Administration",
        }
    }
}

impl TryFrom<u8> for Faculty {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1..=10 => Ok(Faculty::ALL[code as usize - 1]),
            _ => Err(format!("unknown faculty {}", code)),
        }
    }
}

impl From<Faculty> for u8 {
    fn from(faculty: Faculty) -> Self {
        faculty.code()
    }
}

impl fmt::Display for Faculty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
