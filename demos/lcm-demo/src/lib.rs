//! lcm-demo - Generated message types in use
//!
//! `build.rs` runs lcm-gen over `types/*.json` and writes a single
//! `lcmtypes.rs` into `OUT_DIR`, mounted here as [`generated`]. The types
//! implement [`lcm::Marshal`] and [`lcm::Message`]:
//!
//! ```
//! use lcm::Message;
//! use lcm_demo::telemetry::Reading;
//!
//! let reading = Reading {
//!     count: 1,
//!     values: vec![0.5],
//!     raw: vec![[1, 2, 3]],
//!     labels: vec!["ch0".to_string()],
//!     ..Reading::default()
//! };
//! let bytes = reading.encode_with_fingerprint().unwrap();
//! assert_eq!(Reading::decode_with_fingerprint(&bytes).unwrap(), reading);
//! ```

#[allow(clippy::all, non_snake_case)]
pub mod generated {
    include!(concat!(env!("OUT_DIR"), "/lcmtypes.rs"));
}

pub use generated::demo::{geometry, telemetry};

use geometry::{Pose, Vector3};

/// Identity orientation at `(x, y, z)`
pub fn pose_at(x: f64, y: f64, z: f64) -> Pose {
    Pose {
        position: Vector3 { x, y, z },
        orientation: [1.0, 0.0, 0.0, 0.0],
    }
}
