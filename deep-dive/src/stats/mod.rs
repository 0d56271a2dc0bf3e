// Season-stat engine: normalization, innings codec, slicing, and merging.

pub mod classify;
pub mod innings;
pub mod merge;
pub mod row;
pub mod slice;
