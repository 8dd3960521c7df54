pub mod analysis;
pub mod posting;
pub mod profile;
