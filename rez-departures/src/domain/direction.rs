//! Direction classification from passenger headsigns.
//!
//! The upstream board has no structured direction field, so the direction of
//! a record is inferred from substrings of its headsign. The rules are an
//! ordered table and the first matching rule wins. This is best-effort: a
//! headsign naming both ends of a route classifies by rule order, not by
//! any ground truth.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::stops::{HUSINEC, KOBYLISY, LINE_371, LINE_S4, MASARYKOVO, REZ};

/// Canonical direction of travel on one of the dashboard's lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// S4 towards Praha Masarykovo nádraží.
    ToMasarykovo,
    /// S4 towards Řež (and on to Kralupy / Ústí).
    ToRez,
    /// 371 towards Praha Kobylisy.
    ToKobylisy,
    /// 371 towards Husinec / Řež.
    ToHusinec,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::ToMasarykovo,
        Direction::ToRez,
        Direction::ToKobylisy,
        Direction::ToHusinec,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::ToMasarykovo => "to-masarykovo",
            Direction::ToRez => "to-rez",
            Direction::ToKobylisy => "to-kobylisy",
            Direction::ToHusinec => "to-husinec",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| DomainError::UnknownDirection(s.to_string()))
    }
}

/// One headsign rule: any of `include` present and none of `exclude`.
struct Rule {
    line: &'static str,
    include: &'static [&'static str],
    exclude: &'static [&'static str],
    direction: Direction,
}

impl Rule {
    fn matches(&self, headsign: &str, line: &str) -> bool {
        self.line == line
            && self.include.iter().any(|s| headsign.contains(s))
            && !self.exclude.iter().any(|s| headsign.contains(s))
    }
}

const RULES: &[Rule] = &[
    Rule {
        line: LINE_S4,
        include: &["Masarykovo", "Praha"],
        exclude: &[],
        direction: Direction::ToMasarykovo,
    },
    Rule {
        line: LINE_S4,
        include: &["Ústí", "Kralupy", "Řež"],
        exclude: &["Praha"],
        direction: Direction::ToRez,
    },
    Rule {
        line: LINE_371,
        include: &["Kobylisy"],
        exclude: &[],
        direction: Direction::ToKobylisy,
    },
    Rule {
        line: LINE_371,
        include: &["Husinec", "Řež"],
        exclude: &["Klecany", "Astrapark", "Klecánky"],
        direction: Direction::ToHusinec,
    },
];

/// Classify a raw headsign on `line` into a canonical direction.
///
/// Returns `None` when no rule matches ("unclassified").
///
/// # Examples
///
/// ```
/// use rez_departures::domain::{Direction, classify};
///
/// assert_eq!(classify("Praha Masarykovo n.", "S4"), Some(Direction::ToMasarykovo));
/// assert_eq!(classify("Kralupy nad Vltavou", "S4"), Some(Direction::ToRez));
/// assert_eq!(classify("Klecany", "371"), None);
/// ```
pub fn classify(headsign: &str, line: &str) -> Option<Direction> {
    RULES
        .iter()
        .find(|rule| rule.matches(headsign, line))
        .map(|rule| rule.direction)
}

/// Departure and arrival stop ids for travel on `line` in `direction`.
///
/// Returns `None` when the direction doesn't belong to the line.
pub fn stop_pair(line: &str, direction: Direction) -> Option<(&'static str, &'static str)> {
    match (line, direction) {
        (LINE_S4, Direction::ToMasarykovo) => Some((REZ, MASARYKOVO)),
        (LINE_S4, Direction::ToRez) => Some((MASARYKOVO, REZ)),
        (LINE_371, Direction::ToKobylisy) => Some((HUSINEC, KOBYLISY)),
        (LINE_371, Direction::ToHusinec) => Some((KOBYLISY, HUSINEC)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s4_towards_prague() {
        assert_eq!(
            classify("Praha Masarykovo n.", "S4"),
            Some(Direction::ToMasarykovo)
        );
        assert_eq!(
            classify("Praha Masarykovo nádraží", "S4"),
            Some(Direction::ToMasarykovo)
        );
    }

    #[test]
    fn s4_towards_rez() {
        assert_eq!(classify("Kralupy nad Vltavou", "S4"), Some(Direction::ToRez));
        assert_eq!(classify("Ústí nad Labem hl.n.", "S4"), Some(Direction::ToRez));
        assert_eq!(classify("Řež", "S4"), Some(Direction::ToRez));
    }

    #[test]
    fn s4_ambiguous_headsign_takes_first_rule() {
        // Best-effort: both ends named, the Prague rule is checked first.
        assert_eq!(
            classify("Praha Masarykovo n. (Řež)", "S4"),
            Some(Direction::ToMasarykovo)
        );
    }

    #[test]
    fn bus_371_towards_kobylisy() {
        assert_eq!(classify("Kobylisy", "371"), Some(Direction::ToKobylisy));
        assert_eq!(classify("Praha Kobylisy", "371"), Some(Direction::ToKobylisy));
        assert_eq!(
            classify("Kobylisy via Klecany", "371"),
            Some(Direction::ToKobylisy)
        );
    }

    #[test]
    fn bus_371_towards_husinec() {
        assert_eq!(classify("Husinec,Řež", "371"), Some(Direction::ToHusinec));
        assert_eq!(classify("Řež,Husinec", "371"), Some(Direction::ToHusinec));
    }

    #[test]
    fn bus_371_short_turns_are_unclassified() {
        assert_eq!(classify("Klecany", "371"), None);
        assert_eq!(classify("Husinec,Klecánky", "371"), None);
        assert_eq!(classify("Řež,Astrapark", "371"), None);
    }

    #[test]
    fn rules_are_line_specific() {
        assert_eq!(classify("Praha Masarykovo n.", "371"), None);
        assert_eq!(classify("Kobylisy", "S4"), None);
        assert_eq!(classify("Praha", "S9"), None);
    }

    #[test]
    fn parse_direction_tokens() {
        for direction in Direction::ALL {
            assert_eq!(direction.as_str().parse::<Direction>(), Ok(direction));
        }
        assert_eq!(
            "from-rez".parse::<Direction>(),
            Err(DomainError::UnknownDirection("from-rez".into()))
        );
    }

    #[test]
    fn serde_uses_kebab_tokens() {
        let json = serde_json::to_string(&Direction::ToMasarykovo).unwrap();
        assert_eq!(json, r#""to-masarykovo""#);
        let parsed: Direction = serde_json::from_str(r#""to-husinec""#).unwrap();
        assert_eq!(parsed, Direction::ToHusinec);
    }

    #[test]
    fn stop_pairs() {
        assert_eq!(
            stop_pair("S4", Direction::ToMasarykovo),
            Some((REZ, MASARYKOVO))
        );
        assert_eq!(stop_pair("S4", Direction::ToRez), Some((MASARYKOVO, REZ)));
        assert_eq!(
            stop_pair("371", Direction::ToKobylisy),
            Some((HUSINEC, KOBYLISY))
        );
        assert_eq!(
            stop_pair("371", Direction::ToHusinec),
            Some((KOBYLISY, HUSINEC))
        );
        assert_eq!(stop_pair("S4", Direction::ToKobylisy), None);
        assert_eq!(stop_pair("S9", Direction::ToRez), None);
    }
}
