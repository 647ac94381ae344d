//! Naming convention utilities for code generation.
//!
//! Every backend derives type names, file names and qualified references from
//! schema identifiers through these functions, so generated documentation and
//! comments name things the same way in every target language.
//!
//! # Supported Conversions
//!
//! | Input | Function | Output |
//! |-------|----------|--------|
//! | `sensor_data` | [`to_upper_camel`] | `SensorData` |
//! | `pose_t` | [`strip_type_suffix`] | `pose` |
//! | `robot.sensors` | [`package_to_path`] | `robot/sensors` |
//! | `robot.sensors` | [`package_to_scope`] | `robot::sensors` |

use std::path::PathBuf;

/// Convert an underscore-separated identifier to UpperCamelCase.
///
/// The first letter of each segment is upper-cased and the rest lower-cased.
///
/// # Examples
///
/// ```
/// use lcm_core::naming::to_upper_camel;
///
/// assert_eq!(to_upper_camel("sensor_data"), "SensorData");
/// assert_eq!(to_upper_camel("GPS_fix"), "GpsFix");
/// ```
pub fn to_upper_camel(identifier: &str) -> String {
    identifier
        .split('_')
        .flat_map(|segment| {
            let mut chars = segment.chars();
            let first = chars.next().into_iter().flat_map(char::to_uppercase);
            first.chain(chars.flat_map(char::to_lowercase))
        })
        .collect()
}

/// Remove the legacy C `_t` type suffix, if present.
///
/// # Examples
///
/// ```
/// use lcm_core::naming::strip_type_suffix;
///
/// assert_eq!(strip_type_suffix("pose_t"), "pose");
/// assert_eq!(strip_type_suffix("pose"), "pose");
/// ```
pub fn strip_type_suffix(identifier: &str) -> &str {
    identifier.strip_suffix("_t").unwrap_or(identifier)
}

/// Type name used by backends: suffix stripped, then UpperCamelCase.
pub fn type_name(short_name: &str) -> String {
    to_upper_camel(strip_type_suffix(short_name))
}

/// Convert a dotted package name to a relative directory path.
pub fn package_to_path(package: &str) -> PathBuf {
    package
        .split('.')
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Replace each `.` in a dotted package name with a scope separator token.
///
/// # Examples
///
/// ```
/// use lcm_core::naming::package_to_scope;
///
/// assert_eq!(package_to_scope("robot.sensors", "::"), "robot::sensors");
/// ```
pub fn package_to_scope(package: &str, separator: &str) -> String {
    package.replace('.', separator)
}

/// Check whether a string is a plain identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use std::path::Path;
    use test_case::test_case;

    #[test_case("sensor_data", "SensorData" ; "snake case")]
    #[test_case("foo_bar", "FooBar" ; "two segments")]
    #[test_case("SENSOR_DATA", "SensorData" ; "upper case lowered")]
    #[test_case("pose", "Pose" ; "single word")]
    #[test_case("a__b", "AB" ; "consecutive underscores")]
    #[test_case("_leading", "Leading" ; "leading underscore")]
    #[test_case("", "" ; "empty")]
    fn to_upper_camel___converts(input: &str, expected: &str) {
        assert_eq!(to_upper_camel(input), expected);
    }

    #[test]
    fn strip_type_suffix___removes_trailing_t() {
        assert_eq!(strip_type_suffix("pose_t"), "pose");
        assert_eq!(strip_type_suffix("example_t"), "example");
    }

    #[test]
    fn strip_type_suffix___leaves_other_names_unchanged() {
        assert_eq!(strip_type_suffix("pose"), "pose");
        assert_eq!(strip_type_suffix("_t"), "");
        assert_eq!(strip_type_suffix("t"), "t");
        assert_eq!(strip_type_suffix("post"), "post");
    }

    #[test]
    fn type_name___strips_then_camel_cases() {
        assert_eq!(type_name("example_t"), "Example");
        assert_eq!(type_name("laser_scan_t"), "LaserScan");
    }

    #[test]
    fn package_to_path___two_levels() {
        assert_eq!(
            package_to_path("robot.sensors"),
            Path::new("robot").join("sensors")
        );
    }

    #[test]
    fn package_to_path___empty_package___is_empty_path() {
        assert_eq!(package_to_path(""), PathBuf::new());
    }

    #[test]
    fn package_to_scope___uses_separator() {
        assert_eq!(package_to_scope("robot.sensors", "::"), "robot::sensors");
        assert_eq!(package_to_scope("robot.sensors", "."), "robot.sensors");
        assert_eq!(package_to_scope("single", "::"), "single");
    }

    #[test]
    fn is_identifier___accepts_and_rejects() {
        assert!(is_identifier("count"));
        assert!(is_identifier("_private1"));
        assert!(!is_identifier("1count"));
        assert!(!is_identifier("has-dash"));
        assert!(!is_identifier(""));
    }
}
