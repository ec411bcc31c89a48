pub mod anchors;
pub mod decoder;
pub mod roi;
