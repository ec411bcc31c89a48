pub mod engine;
pub mod ort_engine;
