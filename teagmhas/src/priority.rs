use std::fmt;

use serde::{Deserialize, Serialize};

/// How important a listener's say over an event is.
///
/// Handlers run from `Lowest` to `Monitor`, so higher priorities see the changes made by lower
/// ones and get the last say on the outcome.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Priority {
    Lowest,
    Low,
    Normal,
    High,
    Highest,
    /// Reserved for listeners that only observe the outcome of an event and leave it untouched.
    /// Not enforced.
    Monitor,
}

impl Priority {
    /// Every priority in invocation order.
    pub const ALL: [Priority; 6] = [
        Priority::Lowest,
        Priority::Low,
        Priority::Normal,
        Priority::High,
        Priority::Highest,
        Priority::Monitor,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Priority::Lowest => "Lowest",
            Priority::Low => "Low",
            Priority::Normal => "Normal",
            Priority::High => "High",
            Priority::Highest => "Highest",
            Priority::Monitor => "Monitor",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert!(Priority::ALL.windows(2).all(|pair| pair[0] < pair[1]));
        for (i, priority) in Priority::ALL.iter().enumerate() {
            assert_eq!(priority.index(), i);
        }
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn test_priority_in_config_data() {
        let bytes = serde_cbor::to_vec(&vec![Priority::Monitor, Priority::Lowest]).unwrap();
        let priorities: Vec<Priority> = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(priorities, vec![Priority::Monitor, Priority::Lowest]);
    }
}
