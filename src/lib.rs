pub mod analysis;
pub mod components;
pub mod config;
pub mod elements;
pub mod error;
pub mod external;
pub mod frames;
pub mod input;
pub mod interp;
pub mod laminate;
pub mod quadrature;
pub mod util;
