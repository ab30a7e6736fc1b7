// Domain layer: core models and ports (interfaces). No dependencies on the
// service layer; serde/chrono only.

pub mod model;
pub mod ports;
