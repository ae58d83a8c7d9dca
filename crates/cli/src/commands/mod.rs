pub mod check;
pub mod doctor;
pub mod serve;
pub mod status;
