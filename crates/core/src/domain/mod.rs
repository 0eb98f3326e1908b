pub mod confidence;
pub mod declaration;
