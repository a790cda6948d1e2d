pub mod geometry {
    pub mod point;
    pub mod segment;

    pub use point::Point;
    pub use segment::Segment;
}

pub mod darkness;
mod error;
pub mod field;
mod float;
pub mod grid;
pub mod pins;
mod result;
pub mod sampler;
pub mod sequencer;
pub mod verboser;
mod view;

pub use darkness::{Darkness, DarknessMode, FlatDarkness, PercentageDarkness};
pub use error::{Error, Result};
pub use field::{build_darkness_field, DarknessField, FieldOptions, Sampling, SourceImage};
pub use float::Float;
pub use grid::Grid;
pub use pins::{generate_pins, Pin, PinLayout, Shape};
pub use result::StringArtResult;
pub use sampler::LineSampler;
pub use sequencer::{
    generate_sequence, generate_sequence_with, Options, Sequencer, Step, Termination,
};
pub use view::ViewTransform;
