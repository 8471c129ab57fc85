pub mod add;
pub mod scan;
pub mod status;
