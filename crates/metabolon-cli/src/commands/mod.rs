pub mod pathway;
pub mod run;
