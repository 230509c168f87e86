pub mod downstream;
pub mod upstream;
