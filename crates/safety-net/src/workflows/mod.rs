pub mod intervention;
