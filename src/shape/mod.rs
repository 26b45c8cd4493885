pub mod decompose;
pub mod outline;
