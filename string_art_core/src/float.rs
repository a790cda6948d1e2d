use std::{
    fmt::{Debug, Display},
    ops::{AddAssign, DivAssign, MulAssign, SubAssign},
};

use num_traits::{ConstOne, ConstZero};

pub trait Float:
    'static
    + Debug
    + Display
    + Sync
    + Send
    + Into<svg::node::Value>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
    + num_traits::Float
    + num_traits::NumCast
    + ConstZero
    + ConstOne
{
    const HALF: Self;
    const EPSILON: Self;
    const TWO: Self;
    const PI: Self;
    const TWO_FIVE_FIVE: Self;

    // Rec. 601 luma weights.
    const LUMA_RED: Self;
    const LUMA_GREEN: Self;
    const LUMA_BLUE: Self;

    fn from_f64(value: f64) -> Self;
}

impl Float for f32 {
    const HALF: Self = 0.5;
    const EPSILON: Self = f32::EPSILON;
    const TWO: Self = 2.0;
    const PI: Self = core::f32::consts::PI;
    const TWO_FIVE_FIVE: Self = 255.0;

    const LUMA_RED: Self = 0.299;
    const LUMA_GREEN: Self = 0.587;
    const LUMA_BLUE: Self = 0.114;

    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Float for f64 {
    const HALF: Self = 0.5;
    const EPSILON: Self = f64::EPSILON;
    const TWO: Self = 2.0;
    const PI: Self = core::f64::consts::PI;
    const TWO_FIVE_FIVE: Self = 255.0;

    const LUMA_RED: Self = 0.299;
    const LUMA_GREEN: Self = 0.587;
    const LUMA_BLUE: Self = 0.114;

    fn from_f64(value: f64) -> Self {
        value
    }
}
