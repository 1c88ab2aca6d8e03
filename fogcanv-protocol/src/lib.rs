//! Wire types shared between the fog editor and its observers.

pub mod fog;
pub mod sync;
