pub mod class_vocabulary;
pub mod detection;
pub mod object_detector;
