//! The fixed rotation set every display is built in.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Orientation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Orientation {
    /// Every orientation, in the order artifacts are produced and listed.
    pub const ALL: [Orientation; 4] = [
        Orientation::Deg0,
        Orientation::Deg90,
        Orientation::Deg180,
        Orientation::Deg270,
    ];

    pub fn degrees(&self) -> u16 {
        match self {
            Orientation::Deg0 => 0,
            Orientation::Deg90 => 90,
            Orientation::Deg180 => 180,
            Orientation::Deg270 => 270,
        }
    }

    /// File-name component, e.g. `90` in `p1-d1-90.tft`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Deg0 => "0",
            Orientation::Deg90 => "90",
            Orientation::Deg180 => "180",
            Orientation::Deg270 => "270",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_ascending_quarter_turns() {
        let degrees: Vec<u16> = Orientation::ALL.iter().map(Orientation::degrees).collect();
        assert_eq!(degrees, vec![0, 90, 180, 270]);
    }

    #[test]
    fn displays_as_file_name_component() {
        assert_eq!(Orientation::Deg270.to_string(), "270");
        assert_eq!(Orientation::Deg0.as_str(), "0");
    }
}
