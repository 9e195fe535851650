//! Native library version, as reported by `nk_get_version`.

use std::fmt::{self, Formatter, Display};
use serde::{
    Serialize,
    Deserialize,
};


/// Ordered lexicographically, major first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 3]", into = "[i32; 3]")]
pub struct Version {
    pub major: i32,
    pub minor: i32,
    pub rev: i32,
}

/// Oldest native library accepted by the search.
pub const MIN_VERSION: Version = Version::new(3, 0, 0);

impl Version {
    pub const fn new(major: i32, minor: i32, rev: i32) -> Self {
        Version { major, minor, rev }
    }
}

impl From<[i32; 3]> for Version {
    fn from([major, minor, rev]: [i32; 3]) -> Self {
        Version { major, minor, rev }
    }
}

impl From<Version> for [i32; 3] {
    fn from(v: Version) -> Self {
        [v.major, v.minor, v.rev]
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.rev)
    }
}


#[test]
fn test_version_order() {
    assert!(Version::new(3, 0, 0) >= MIN_VERSION);
    assert!(Version::new(2, 99, 99) < MIN_VERSION);
    assert!(Version::new(4, 0, 0) > Version::new(3, 12, 1));
    assert!(Version::new(3, 1, 2) > Version::new(3, 1, 1));
    assert_eq!(Version::new(4, 1, 0).to_string(), "4.1.0");
}

#[test]
fn test_version_json_shape() {
    let v = Version::new(4, 1, 0);
    assert_eq!(serde_json::to_string(&v).unwrap(), "[4,1,0]");
    assert_eq!(serde_json::from_str::<Version>("[4, 1, 0]").unwrap(), v);
    assert!(serde_json::from_str::<Version>("[4, 1]").is_err());
}
