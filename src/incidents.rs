/*
 * Copyright 2019 Michael Lodato <zvxryb@gmail.com>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use serde::Deserialize;
use thiserror::Error;

use std::fmt;

const INCIDENTS_JSON: &str = include_str!("incidents.json");

pub const INCIDENT_COUNT: usize = 5;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Takeoff,
    Cruise,
    Descent,
    Approach,
    Landing,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Takeoff  => "TAKEOFF",
            Phase::Cruise   => "CRUISE",
            Phase::Descent  => "DESCENT",
            Phase::Approach => "APPROACH",
            Phase::Landing  => "LANDING",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Which of the five incidents a slot in the list is. The order is fixed
/// and each kind owns the side effects run when its panel closes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IncidentKind {
    Takeoff,
    Turbulence,
    Navigation,
    BirdStrike,
    Landing,
}

impl IncidentKind {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(IncidentKind::Takeoff),
            1 => Some(IncidentKind::Turbulence),
            2 => Some(IncidentKind::Navigation),
            3 => Some(IncidentKind::BirdStrike),
            4 => Some(IncidentKind::Landing),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Incident {
    pub hud_alt: String,
    pub phase: Phase,
    pub target_altitude: i32,
    pub scenario: String,
    pub options: Vec<String>,
    pub correct: usize,
    pub companion: String,
    pub feedback_correct: String,
    pub feedback_incorrect: String,
}

impl Incident {
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct
    }
}

#[derive(Debug, Error)]
pub enum IncidentError {
    #[error("malformed incident data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("expected {} incidents, found {0}", INCIDENT_COUNT)]
    Count(usize),
    #[error("incident {index} marks option {correct} correct but has {options} options")]
    CorrectOutOfRange {
        index: usize,
        correct: usize,
        options: usize,
    },
}

pub fn parse_incidents(source: &str) -> Result<Vec<Incident>, IncidentError> {
    let incidents: Vec<Incident> = serde_json::from_str(source)?;
    if incidents.len() != INCIDENT_COUNT {
        return Err(IncidentError::Count(incidents.len()));
    }
    for (index, incident) in incidents.iter().enumerate() {
        if incident.correct >= incident.options.len() {
            return Err(IncidentError::CorrectOutOfRange{
                index,
                correct: incident.correct,
                options: incident.options.len(),
            });
        }
    }
    Ok(incidents)
}

pub fn builtin_incidents() -> Result<Vec<Incident>, IncidentError> {
    parse_incidents(INCIDENTS_JSON)
}
