//! Data model, validation and remapping engine for segmap.
//!
//! This crate turns a device-independent "which segments are lit" table into
//! the values to write on the pins of a driving device, for any wiring,
//! any segment count and either polarity.

pub mod canonical;
pub mod config;
pub mod error;
pub mod input;
pub mod pattern;
pub mod pins;
pub mod presets;
pub mod remap;
pub mod segment;

pub use canonical::{
    CanonicalMapping, CanonicalOptions, CanonicalOrder, build_canonical, build_canonical_with,
};
pub use config::GeneratorConfig;
pub use error::CoreError;
pub use pattern::SegmentPattern;
pub use pins::{PinAssignment, build_pin_assignment};
pub use remap::{RemappedMapping, Routing, remap, remap_both};
pub use segment::{Polarity, SegmentId};
