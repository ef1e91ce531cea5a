pub mod buckling;
pub mod curvature;
pub mod loads;
pub mod margins;
pub mod mass;
pub mod modal;
pub mod resize;
pub mod root_moment;
pub mod section;
pub mod structure;
pub mod tip;
