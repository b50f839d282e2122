pub mod check;
pub mod compare;
pub mod daemon;
pub mod status;
pub mod sync;
